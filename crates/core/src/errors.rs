use std::fmt;

use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProviderErrorKind {
    Network,
    Authentication,
    MalformedResponse,
}

impl ProviderErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Authentication => "authentication",
            Self::MalformedResponse => "malformed_response",
        }
    }
}

impl fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("explanation provider failed ({kind}): {reason}")]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    pub reason: String,
}

impl ProviderError {
    pub fn new(kind: ProviderErrorKind, reason: impl Into<String>) -> Self {
        Self { kind, reason: reason.into() }
    }

    pub fn network(reason: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Network, reason)
    }

    pub fn authentication(reason: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Authentication, reason)
    }

    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::MalformedResponse, reason)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StoreErrorKind {
    Authentication,
    PermissionDenied,
    NotFound,
    Network,
}

impl StoreErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Authentication => "authentication",
            Self::PermissionDenied => "permission_denied",
            Self::NotFound => "not_found",
            Self::Network => "network",
        }
    }
}

impl fmt::Display for StoreErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("row store failed ({kind}): {reason}")]
pub struct StoreError {
    pub kind: StoreErrorKind,
    pub reason: String,
}

impl StoreError {
    pub fn new(kind: StoreErrorKind, reason: impl Into<String>) -> Self {
        Self { kind, reason: reason.into() }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StateError {
    #[error("nothing to save")]
    NothingToSave,
    #[error("nothing to dismiss")]
    NothingToDismiss,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("empty input")]
    Empty,
    #[error("{0}")]
    Rejected(String),
}

/// Every failure the interaction core can run into while handling one event.
///
/// All variants are recoverable: the core turns each into a single `ReportError`
/// action for the user that triggered it.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InteractionError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    State(#[from] StateError),
}

impl InteractionError {
    pub fn error_class(&self) -> &'static str {
        match self {
            Self::Input(_) => "input",
            Self::Provider(_) => "provider",
            Self::Store(_) => "store",
            Self::State(_) => "state",
        }
    }

    /// Text shown to the user. Never includes upstream response bodies.
    pub fn user_message(&self) -> String {
        match self {
            Self::Input(error) => error.to_string(),
            Self::State(error) => error.to_string(),
            Self::Provider(error) => match error.kind {
                ProviderErrorKind::Network => {
                    "could not reach the explanation service, please send the word again".to_owned()
                }
                ProviderErrorKind::Authentication => {
                    "the explanation service rejected our credentials".to_owned()
                }
                ProviderErrorKind::MalformedResponse => {
                    "the explanation service returned an unreadable answer".to_owned()
                }
            },
            Self::Store(error) => match error.kind {
                StoreErrorKind::Authentication => {
                    "save failed: the spreadsheet rejected our credentials".to_owned()
                }
                StoreErrorKind::PermissionDenied => {
                    "save failed: no permission to write to the spreadsheet".to_owned()
                }
                StoreErrorKind::NotFound => "save failed: the spreadsheet was not found".to_owned(),
                StoreErrorKind::Network => {
                    "save failed: could not reach the spreadsheet, tap save to retry".to_owned()
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::errors::{
        InputError, InteractionError, ProviderError, StateError, StoreError, StoreErrorKind,
    };

    #[test]
    fn input_and_state_errors_surface_their_own_text() {
        assert_eq!(InteractionError::from(InputError::Empty).user_message(), "empty input");
        assert_eq!(
            InteractionError::from(StateError::NothingToSave).user_message(),
            "nothing to save"
        );
    }

    #[test]
    fn provider_message_does_not_leak_reason() {
        let error = InteractionError::from(ProviderError::authentication("401: key sk-abc"));

        assert_eq!(error.error_class(), "provider");
        assert!(!error.user_message().contains("sk-abc"));
        assert!(error.user_message().contains("credentials"));
    }

    #[test]
    fn store_network_failure_invites_retry() {
        let error =
            InteractionError::from(StoreError::new(StoreErrorKind::Network, "connection reset"));

        assert_eq!(error.error_class(), "store");
        assert!(error.user_message().contains("retry"));
        assert_eq!(error.to_string(), "row store failed (network): connection reset");
    }
}
