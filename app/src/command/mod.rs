//! Static strategy pattern for CLI commands.
//!
//! Each command is a separate strategy type with its own input, dispatched
//! statically from `main`.

use policyqa_config::{Config, LlmConfig, ProviderKind};
use policyqa_conversation::{
    ConversationConfig, ConversationContext, ConversationManager, HistoryConfig,
};
use policyqa_core::LLMProvider;
use policyqa_providers::{GeminiProvider, HuggingFaceProvider, OllamaProvider};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

mod ask;
mod hash_password;
mod info;
mod init;
mod serve;
mod version;

pub use ask::{AskInput, AskStrategy};
pub use hash_password::HashPasswordStrategy;
pub use info::InfoStrategy;
pub use init::InitStrategy;
pub use serve::{ServeInput, ServeStrategy};
pub use version::VersionStrategy;

/// Core trait defining the contract for all command strategies.
///
/// Each strategy defines its own input type, so `main` passes parameters
/// without boxing or runtime casting.
pub trait CommandStrategy: Send + Sync + 'static {
    /// The input type this strategy accepts.
    type Input;

    /// Execute the command with the given input.
    async fn execute(&self, input: Self::Input) -> anyhow::Result<()>;
}

/// Load the config from `path`, or from the default location.
fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
}

fn build_provider(llm: &LlmConfig) -> Arc<dyn LLMProvider> {
    match llm.provider {
        ProviderKind::Gemini => {
            let mut provider = GeminiProvider::new(llm.api_key.clone());
            if let Some(base_url) = &llm.base_url {
                provider = provider.with_base_url(base_url.clone());
            }
            Arc::new(provider)
        }
        ProviderKind::HuggingFace => {
            let mut provider = HuggingFaceProvider::new(llm.api_key.clone());
            if let Some(base_url) = &llm.base_url {
                provider = provider.with_base_url(base_url.clone());
            }
            Arc::new(provider)
        }
        ProviderKind::Ollama => {
            let mut provider = OllamaProvider::new();
            if let Some(base_url) = &llm.base_url {
                provider = provider.with_base_url(base_url.clone());
            }
            Arc::new(provider)
        }
    }
}

/// Model precedence: command line, then config, then the provider's default.
fn resolve_model(
    model_override: Option<String>,
    config: &Config,
    provider: &dyn LLMProvider,
) -> String {
    model_override
        .or_else(|| config.llm.model.clone())
        .unwrap_or_else(|| provider.get_default_model().to_string())
}

fn build_conversation(
    config: &Config,
    provider: Arc<dyn LLMProvider>,
    model_override: Option<String>,
) -> ConversationManager {
    let model = resolve_model(model_override, config, provider.as_ref());
    let timeout = Duration::from_secs(config.llm.timeout_secs);
    info!(
        "Using {} model {model} (timeout {}s)",
        config.llm.provider.label(),
        timeout.as_secs()
    );

    ConversationManager::new(
        provider,
        ConversationConfig::default()
            .with_model(model)
            .with_timeout(timeout),
    )
}

fn history_config(config: &Config) -> HistoryConfig {
    HistoryConfig::default()
        .with_window_size(config.conversation.history_window)
        .with_max_stored_entries(config.conversation.max_stored_entries)
}

fn new_context(config: &Config) -> ConversationContext {
    let context = ConversationContext::with_config(history_config(config));
    match &config.conversation.preamble {
        Some(preamble) => context.with_preamble(preamble.clone()),
        None => context,
    }
}
