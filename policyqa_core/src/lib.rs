#![deny(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

use async_trait::async_trait;

pub mod chat;
pub mod document;
pub mod error;
pub mod util;

pub use chat::ChatEntry;
pub use document::{DocumentContext, DocumentMetadata, ExtractedDocument, FileType};
pub use error::{Error, Result};

#[derive(Debug, Clone)]
pub struct LLMResponse {
    pub content: String,
    pub usage: Option<Usage>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// A generative text backend. One prompt in, one answer out.
#[async_trait]
pub trait LLMProvider: Send + Sync {
    async fn generate(&self, prompt: &str, model: &str) -> anyhow::Result<LLMResponse>;
    fn get_default_model(&self) -> &str;
}

#[async_trait]
impl<P: LLMProvider + ?Sized> LLMProvider for std::sync::Arc<P> {
    async fn generate(&self, prompt: &str, model: &str) -> anyhow::Result<LLMResponse> {
        (**self).generate(prompt, model).await
    }

    fn get_default_model(&self) -> &str {
        (**self).get_default_model()
    }
}

/// Turns uploaded file bytes into plain text.
///
/// The file type is taken from the extension of `filename`.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, bytes: &[u8], filename: &str) -> Result<ExtractedDocument>;
}

/// Credential check used by the login route.
pub trait Authenticator: Send + Sync {
    fn verify(&self, username: &str, password: &str) -> bool;
}
