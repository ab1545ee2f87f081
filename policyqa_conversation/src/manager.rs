//! Question answering over a session's conversation context.
//!
//! The `ConversationManager` is the entry point used by the web layer and
//! the CLI to run one question through the model.

use policyqa_core::{ChatEntry, Error, LLMProvider, Result, Usage};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::context::ConversationContext;

/// Configuration for answering questions.
#[derive(Debug, Clone)]
pub struct ConversationConfig {
    /// Model to use for completions
    pub model: String,
    /// Upper bound on a single model call
    pub timeout: Duration,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            model: "gemini-1.5-flash".to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

impl ConversationConfig {
    /// Set the model name.
    #[must_use]
    pub fn with_model(mut self, model: String) -> Self {
        self.model = model;
        self
    }

    /// Set the per-request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Result of answering one question.
#[derive(Debug, Clone)]
pub struct TurnResult {
    /// The recorded exchange
    pub entry: ChatEntry,
    /// Token usage reported by the provider, if any
    pub usage: Option<Usage>,
    /// Position of this exchange in the chat log, starting at 1
    pub turn_number: usize,
}

impl TurnResult {
    #[must_use]
    pub fn answer(&self) -> &str {
        &self.entry.answer
    }
}

/// Runs questions through an `LLMProvider` against a [`ConversationContext`].
pub struct ConversationManager<P = Arc<dyn LLMProvider>>
where
    P: Send + Sync,
{
    provider: P,
    config: ConversationConfig,
}

impl<P> ConversationManager<P>
where
    P: LLMProvider + Send + Sync,
{
    pub const fn new(provider: P, config: ConversationConfig) -> Self {
        Self { provider, config }
    }

    #[must_use]
    pub const fn config(&self) -> &ConversationConfig {
        &self.config
    }

    /// Answer `question` about the document in `context`.
    ///
    /// The exchange is recorded only after the model produced a non-blank
    /// answer within the timeout. Any failure leaves `context` untouched.
    pub async fn ask(
        &self,
        context: &mut ConversationContext,
        question: &str,
    ) -> Result<TurnResult> {
        let prompt = context.build_prompt(question)?;
        let question = question.trim();
        info!(
            "Asking {} ({} prompt chars, {} prior exchanges)",
            self.config.model,
            prompt.len(),
            context.history().len()
        );

        let response = tokio::time::timeout(
            self.config.timeout,
            self.provider.generate(&prompt, &self.config.model),
        )
        .await
        .map_err(|_| {
            warn!("Model call timed out after {:?}", self.config.timeout);
            Error::Llm(format!(
                "request timed out after {}s",
                self.config.timeout.as_secs()
            ))
        })?
        .map_err(|e| {
            warn!("Model call failed: {e:#}");
            Error::Llm(format!("{e:#}"))
        })?;

        if response.content.trim().is_empty() {
            return Err(Error::Llm("empty response from model".to_string()));
        }

        let entry = context.record(question, response.content).clone();
        let turn_number = context.history().len();

        if let Some(usage) = response.usage {
            debug!(
                "Tokens: {} prompt + {} completion = {} total",
                usage.prompt_tokens, usage.completion_tokens, usage.total_tokens
            );
        }

        Ok(TurnResult {
            entry,
            usage: response.usage,
            turn_number,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use policyqa_core::{DocumentMetadata, FileType, LLMResponse};
    use std::sync::Mutex;

    /// Provider returning a scripted outcome and remembering the last prompt.
    struct ScriptedProvider {
        reply: std::result::Result<String, String>,
        delay: Duration,
        last_prompt: Mutex<Option<String>>,
    }

    impl ScriptedProvider {
        fn answering(answer: &str) -> Self {
            Self {
                reply: Ok(answer.to_string()),
                delay: Duration::ZERO,
                last_prompt: Mutex::new(None),
            }
        }

        fn failing(message: &str) -> Self {
            Self {
                reply: Err(message.to_string()),
                delay: Duration::ZERO,
                last_prompt: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl LLMProvider for ScriptedProvider {
        async fn generate(&self, prompt: &str, _model: &str) -> anyhow::Result<LLMResponse> {
            if let Ok(mut last) = self.last_prompt.lock() {
                *last = Some(prompt.to_string());
            }
            tokio::time::sleep(self.delay).await;
            match &self.reply {
                Ok(answer) => Ok(LLMResponse {
                    content: answer.clone(),
                    usage: None,
                }),
                Err(message) => Err(anyhow::anyhow!("{message}")),
            }
        }

        fn get_default_model(&self) -> &'static str {
            "scripted"
        }
    }

    fn seeded_context() -> ConversationContext {
        let text = "Vacation policy: 20 days per year.";
        let mut ctx = ConversationContext::new();
        ctx.seed(text, DocumentMetadata::derive("policy.txt", 34, FileType::Txt, text))
            .unwrap_or_else(|e| panic!("{e}"));
        ctx
    }

    #[test]
    fn test_config_default() {
        let config = ConversationConfig::default();
        assert!(!config.model.is_empty());
        assert!(config.timeout > Duration::ZERO);
    }

    #[tokio::test]
    async fn test_successful_turn_is_recorded() {
        let provider = ScriptedProvider::answering("**20 days** per year.");
        let manager = ConversationManager::new(provider, ConversationConfig::default());
        let mut ctx = seeded_context();

        let result = manager
            .ask(&mut ctx, "How many vacation days?")
            .await
            .unwrap_or_else(|e| panic!("{e}"));

        assert_eq!(result.answer(), "**20 days** per year.");
        assert_eq!(result.turn_number, 1);
        assert_eq!(ctx.history().len(), 1);
        assert_eq!(ctx.history()[0].question, "How many vacation days?");

        let sent = manager.provider.last_prompt.lock().ok().and_then(|p| p.clone());
        assert!(sent.is_some_and(|p| p.contains("Vacation policy: 20 days per year.")));
    }

    #[tokio::test]
    async fn test_provider_failure_leaves_history_unchanged() {
        let manager = ConversationManager::new(
            ScriptedProvider::failing("quota exceeded"),
            ConversationConfig::default(),
        );
        let mut ctx = seeded_context();
        ctx.record("earlier", "answer");

        let err = manager.ask(&mut ctx, "How many vacation days?").await.err();

        assert_eq!(err, Some(Error::Llm("quota exceeded".to_string())));
        assert_eq!(ctx.history().len(), 1);
    }

    #[tokio::test]
    async fn test_blank_answer_is_a_failure() {
        let manager =
            ConversationManager::new(ScriptedProvider::answering("  \n"), ConversationConfig::default());
        let mut ctx = seeded_context();

        let err = manager.ask(&mut ctx, "Anything?").await.err();

        assert!(matches!(err, Some(Error::Llm(_))));
        assert!(ctx.history().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_leaves_history_unchanged() {
        let mut provider = ScriptedProvider::answering("too late");
        provider.delay = Duration::from_secs(120);
        let manager = ConversationManager::new(
            provider,
            ConversationConfig::default().with_timeout(Duration::from_secs(5)),
        );
        let mut ctx = seeded_context();

        let err = manager.ask(&mut ctx, "Still there?").await.err();

        assert_eq!(
            err,
            Some(Error::Llm("request timed out after 5s".to_string()))
        );
        assert!(ctx.history().is_empty());
    }

    #[tokio::test]
    async fn test_precondition_errors_skip_the_provider() {
        let manager = ConversationManager::new(
            ScriptedProvider::answering("unused"),
            ConversationConfig::default(),
        );

        let mut empty = ConversationContext::new();
        assert_eq!(
            manager.ask(&mut empty, "Hello?").await.err(),
            Some(Error::NoDocument)
        );

        let mut ctx = seeded_context();
        assert_eq!(manager.ask(&mut ctx, "  ").await.err(), Some(Error::NoQuestion));
        assert!(
            manager
                .provider
                .last_prompt
                .lock()
                .ok()
                .is_some_and(|p| p.is_none())
        );
    }
}
