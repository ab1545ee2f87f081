use policyqa_extract::DocumentExtractor;
use policyqa_session::{InMemorySessionStore, SessionStore};
use policyqa_web::{AppState, CredentialTable, WebSettings, spawn_session_cleanup};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use super::{build_conversation, build_provider, history_config, load_config};

/// Input parameters for the Serve command strategy.
#[derive(Debug, Clone)]
pub struct ServeInput {
    pub config_path: Option<PathBuf>,
    /// Listen address override
    pub bind: Option<String>,
}

/// Strategy for running the web server.
///
/// Wires the configured provider, the in-memory session store, the document
/// extractor and the configured users into the router, then serves until
/// Ctrl+C.
#[derive(Debug, Clone, Copy)]
pub struct ServeStrategy;

impl super::CommandStrategy for ServeStrategy {
    type Input = ServeInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let config = load_config(input.config_path.as_deref())?;
        config.validate()?;

        let provider = build_provider(&config.llm);
        let conversation = build_conversation(&config, provider, None);

        let session_ttl =
            Duration::from_secs(config.server.session_ttl_minutes.saturating_mul(60));
        let sessions: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new(session_ttl));
        let cleanup = spawn_session_cleanup(
            Arc::clone(&sessions),
            Duration::from_secs(config.server.cleanup_interval_seconds.max(1)),
        );

        let authenticator = CredentialTable::new(
            config
                .users
                .iter()
                .map(|user| (user.username.clone(), user.password_hash.clone())),
        );
        info!("Loaded {} user(s)", authenticator.len());

        let state = Arc::new(AppState {
            sessions,
            extractor: Arc::new(DocumentExtractor::new()),
            authenticator: Arc::new(authenticator),
            conversation,
            settings: WebSettings {
                secure_cookies: config.server.secure_cookies,
                session_ttl,
                max_upload_bytes: config.server.max_upload_bytes,
                history: history_config(&config),
                preamble: config.conversation.preamble.clone(),
            },
        });

        let bind = input.bind.unwrap_or_else(|| config.server.bind.clone());
        let result = policyqa_web::serve(state, &bind).await;
        cleanup.abort();
        result
    }
}
