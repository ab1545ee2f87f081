//! Per-session document and chat state.

use policyqa_core::{ChatEntry, DocumentContext, DocumentMetadata, Error, Result};
use tracing::debug;

use crate::history::{HistoryConfig, HistoryWindow};
use crate::prompt::{DEFAULT_PREAMBLE, render_prompt};

/// Whether a document has been uploaded into the context yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextState {
    NoDocument,
    HasDocument,
}

/// Document text, metadata and chat log owned by a single session.
///
/// Invariants: a present document always has non-blank text, and the chat
/// log only ever holds exchanges about the current document.
#[derive(Debug, Clone)]
pub struct ConversationContext {
    document: Option<DocumentContext>,
    log: Vec<ChatEntry>,
    window: HistoryWindow,
    preamble: String,
}

impl ConversationContext {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(HistoryConfig::default())
    }

    #[must_use]
    pub fn with_config(config: HistoryConfig) -> Self {
        Self {
            document: None,
            log: Vec::new(),
            window: HistoryWindow::with_config(config),
            preamble: DEFAULT_PREAMBLE.to_string(),
        }
    }

    /// Replace the instruction preamble placed at the top of every prompt.
    #[must_use]
    pub fn with_preamble(mut self, preamble: impl Into<String>) -> Self {
        self.preamble = preamble.into();
        self
    }

    /// Replace the current document and start a fresh chat log.
    ///
    /// Blank text is rejected with [`Error::EmptyDocument`] and leaves the
    /// context exactly as it was.
    pub fn seed(&mut self, text: impl Into<String>, metadata: DocumentMetadata) -> Result<()> {
        let document = DocumentContext::new(text, metadata)?;
        self.replace_document(document);
        Ok(())
    }

    /// Same as [`seed`](Self::seed) for an already validated document.
    pub fn replace_document(&mut self, document: DocumentContext) {
        debug!(
            "Seeding context with {} ({} chars), dropping {} chat entries",
            document.metadata().filename,
            document.metadata().char_count,
            self.log.len()
        );
        self.document = Some(document);
        self.log.clear();
    }

    /// Assemble the prompt for `question`.
    pub fn build_prompt(&self, question: &str) -> Result<String> {
        let document = self.document.as_ref().ok_or(Error::NoDocument)?;
        let question = question.trim();
        if question.is_empty() {
            return Err(Error::NoQuestion);
        }

        let history = self.window.select(&self.log);
        Ok(render_prompt(&self.preamble, document, history, question))
    }

    /// Append an answered question to the chat log.
    pub fn record(&mut self, question: impl Into<String>, answer: impl Into<String>) -> &ChatEntry {
        self.log.push(ChatEntry::new(question, answer));
        self.window.enforce_cap(&mut self.log);
        let last = self.log.len() - 1;
        &self.log[last]
    }

    /// Empty the chat log, keeping the document.
    pub fn clear_chat(&mut self) {
        debug!("Clearing {} chat entries", self.log.len());
        self.log.clear();
    }

    /// Snapshot of the chat log, oldest first.
    #[must_use]
    pub fn get_history(&self) -> Vec<ChatEntry> {
        self.log.clone()
    }

    /// Borrowed view of the chat log, oldest first.
    #[must_use]
    pub fn history(&self) -> &[ChatEntry] {
        &self.log
    }

    #[must_use]
    pub const fn document(&self) -> Option<&DocumentContext> {
        self.document.as_ref()
    }

    #[must_use]
    pub const fn has_document(&self) -> bool {
        self.document.is_some()
    }

    #[must_use]
    pub const fn state(&self) -> ContextState {
        if self.document.is_some() {
            ContextState::HasDocument
        } else {
            ContextState::NoDocument
        }
    }
}

impl Default for ConversationContext {
    fn default() -> Self {
        Self::new()
    }
}
