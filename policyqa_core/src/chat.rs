use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One answered question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatEntry {
    pub question: String,
    pub answer: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatEntry {
    /// Create an entry stamped with the current time.
    #[must_use]
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
            timestamp: Utc::now(),
        }
    }
}
