//! JSON configuration for the policyqa server and CLI.

mod schema;

pub use schema::{
    API_KEY_ENV, Config, ConversationSettings, LlmConfig, ProviderKind, ServerConfig,
    UserCredential,
};
