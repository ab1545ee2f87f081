use chrono::{DateTime, Utc};
use policyqa_conversation::ConversationContext;
use std::fmt;
use uuid::Uuid;

/// Opaque session token carried in the session cookie.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    /// Fresh identifier with 122 random bits and no embedded timestamp.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    #[must_use]
    pub const fn new(value: String) -> Self {
        Self(value)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Everything the server remembers about one logged-in user.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub id: SessionId,
    pub username: String,
    pub context: ConversationContext,
    pub created_at: DateTime<Utc>,
}

impl SessionState {
    /// New session for `username` with a fresh id and the given empty context.
    #[must_use]
    pub fn new(username: impl Into<String>, context: ConversationContext) -> Self {
        Self {
            id: SessionId::generate(),
            username: username.into(),
            context,
            created_at: Utc::now(),
        }
    }
}
