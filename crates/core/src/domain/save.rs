use serde::{Deserialize, Serialize};

use crate::domain::event::UserId;

/// One word awaiting the user's save decision.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingSave {
    pub user_id: UserId,
    pub word: String,
    pub explanation: String,
}

impl PendingSave {
    pub fn into_row(self, timestamp: Option<String>) -> Row {
        Row { word: self.word, explanation: self.explanation, timestamp }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    pub word: String,
    pub explanation: String,
    pub timestamp: Option<String>,
}

impl Row {
    pub fn new(word: impl Into<String>, explanation: impl Into<String>) -> Self {
        Self { word: word.into(), explanation: explanation.into(), timestamp: None }
    }

    /// Cell values in column order: word, explanation, timestamp.
    pub fn cells(&self) -> [&str; 3] {
        [&self.word, &self.explanation, self.timestamp.as_deref().unwrap_or("")]
    }
}
