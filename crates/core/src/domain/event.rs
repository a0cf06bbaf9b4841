use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<i64> for UserId {
    fn from(value: i64) -> Self {
        Self(value.to_string())
    }
}

/// A user interaction, already stripped of any messaging-client detail.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum InboundEvent {
    StartRequested { user_id: UserId },
    WordSubmitted { user_id: UserId, text: String },
    SaveRequested { user_id: UserId },
    DismissRequested { user_id: UserId },
}

impl InboundEvent {
    pub fn user_id(&self) -> &UserId {
        match self {
            Self::StartRequested { user_id }
            | Self::WordSubmitted { user_id, .. }
            | Self::SaveRequested { user_id }
            | Self::DismissRequested { user_id } => user_id,
        }
    }

    pub fn event_type(&self) -> InboundEventType {
        match self {
            Self::StartRequested { .. } => InboundEventType::StartRequested,
            Self::WordSubmitted { .. } => InboundEventType::WordSubmitted,
            Self::SaveRequested { .. } => InboundEventType::SaveRequested,
            Self::DismissRequested { .. } => InboundEventType::DismissRequested,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InboundEventType {
    StartRequested,
    WordSubmitted,
    SaveRequested,
    DismissRequested,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutboundAction {
    ShowExplanationWithSaveButton { user_id: UserId, word: String, explanation: String },
    Confirm { user_id: UserId, message: String },
    ReportError { user_id: UserId, message: String },
}

impl OutboundAction {
    pub fn confirm(user_id: UserId, message: impl Into<String>) -> Self {
        Self::Confirm { user_id, message: message.into() }
    }

    pub fn report_error(user_id: UserId, message: impl Into<String>) -> Self {
        Self::ReportError { user_id, message: message.into() }
    }

    pub fn user_id(&self) -> &UserId {
        match self {
            Self::ShowExplanationWithSaveButton { user_id, .. }
            | Self::Confirm { user_id, .. }
            | Self::ReportError { user_id, .. } => user_id,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::ReportError { .. })
    }
}
