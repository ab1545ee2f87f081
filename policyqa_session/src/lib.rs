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

//! Per-user session state keyed by an opaque session id.

mod manager;
mod state;

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;

pub use manager::InMemorySessionStore;
pub use state::{SessionId, SessionState};

/// Shared, individually locked session.
///
/// Every read-modify-write of one session (upload, ask, clear) happens while
/// holding this lock, so concurrent requests on the same session serialize.
pub type SessionHandle = Arc<Mutex<SessionState>>;

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Look up a live session, refreshing its idle timer.
    async fn get(&self, id: &SessionId) -> Option<SessionHandle>;
    /// Insert or replace the session stored under `state.id`.
    async fn put(&self, state: SessionState) -> SessionHandle;
    /// Remove a session. Returns whether it existed.
    async fn delete(&self, id: &SessionId) -> bool;
    /// Remove every session idle for longer than the store's TTL.
    async fn purge_expired(&self) -> usize;
    /// Number of stored sessions, expired or not.
    async fn count(&self) -> usize;
}
