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

//! HTTP surface: login, upload, ask, chat history.

pub mod auth;
pub mod error;
pub mod handler;
pub mod pages;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
};
use policyqa_conversation::{ConversationContext, ConversationManager, HistoryConfig};
use policyqa_core::{Authenticator, TextExtractor};
use policyqa_session::SessionStore;
use std::{sync::Arc, time::Duration};
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

pub use auth::{CredentialTable, RequireSession, SESSION_COOKIE};
pub use error::{Error, Result};

/// Request-independent settings of the web layer.
#[derive(Debug, Clone)]
pub struct WebSettings {
    pub secure_cookies: bool,
    pub session_ttl: Duration,
    pub max_upload_bytes: usize,
    pub history: HistoryConfig,
    pub preamble: Option<String>,
}

impl Default for WebSettings {
    fn default() -> Self {
        Self {
            secure_cookies: false,
            session_ttl: Duration::from_secs(60 * 60),
            max_upload_bytes: 16 * 1024 * 1024,
            history: HistoryConfig::default(),
            preamble: None,
        }
    }
}

/// Shared application state.
pub struct AppState {
    pub sessions: Arc<dyn SessionStore>,
    pub extractor: Arc<dyn TextExtractor>,
    pub authenticator: Arc<dyn Authenticator>,
    pub conversation: ConversationManager,
    pub settings: WebSettings,
}

impl AppState {
    /// Empty conversation context for a freshly logged-in session.
    #[must_use]
    pub fn new_context(&self) -> ConversationContext {
        let context = ConversationContext::with_config(self.settings.history);
        match &self.settings.preamble {
            Some(preamble) => context.with_preamble(preamble.clone()),
            None => context,
        }
    }
}

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    let max_upload = state.settings.max_upload_bytes;

    Router::new()
        .route("/", get(pages::index))
        .route("/login", get(pages::login_page).post(auth::login))
        .route("/logout", get(auth::logout))
        .route("/dashboard", get(pages::dashboard))
        .route("/static/app.js", get(pages::app_js))
        .route(
            "/upload",
            post(handler::upload).layer(DefaultBodyLimit::max(max_upload)),
        )
        .route("/ask", post(handler::ask))
        .route("/history", get(handler::history))
        .route("/clear", post(handler::clear_chat))
        .layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            auth::refresh_session_cookie,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Periodically drop idle sessions.
pub fn spawn_session_cleanup(sessions: Arc<dyn SessionStore>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            let purged = sessions.purge_expired().await;
            if purged > 0 {
                debug!(purged, "Periodic session cleanup");
            }
        }
    })
}

/// Serve until Ctrl+C.
pub async fn serve(state: Arc<AppState>, bind: &str) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!("listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl+C: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
