#![warn(
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

//! Session-scoped conversation state around an uploaded document.
//!
//! A [`ConversationContext`] holds the current document and the chat log for
//! one session and turns them into the prompt text sent to the model. The
//! [`ConversationManager`] runs a single question through an `LLMProvider`
//! and records the exchange only when the model answered.
//!
//! # Key Features
//! - Document replaced wholesale on upload, chat log reset with it
//! - Fixed-order prompt: preamble, file info, full text, recent Q/A, question
//! - Trailing history window (five exchanges by default)
//! - Failed or timed-out model calls leave the session untouched

mod context;
mod history;
mod manager;
mod prompt;

pub use context::{ContextState, ConversationContext};
pub use history::{HistoryConfig, HistoryWindow};
pub use manager::{ConversationConfig, ConversationManager, TurnResult};
pub use prompt::{DEFAULT_PREAMBLE, render_prompt};
