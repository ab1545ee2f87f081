//! Chat log windowing.
//!
//! Only a trailing window of the log is shown to the model; the stored log
//! itself may optionally be capped.

use policyqa_core::ChatEntry;

/// Default number of past exchanges included in a prompt.
pub const DEFAULT_WINDOW_SIZE: usize = 5;

/// Configuration for chat history handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryConfig {
    /// Maximum number of past exchanges rendered into a prompt
    pub window_size: usize,
    /// Maximum number of exchanges kept in the session, `None` for no limit
    pub max_stored_entries: Option<usize>,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            max_stored_entries: None,
        }
    }
}

impl HistoryConfig {
    #[must_use]
    pub const fn with_window_size(mut self, size: usize) -> Self {
        self.window_size = size;
        self
    }

    #[must_use]
    pub const fn with_max_stored_entries(mut self, max: Option<usize>) -> Self {
        self.max_stored_entries = max;
        self
    }
}

/// A sliding window over the chat log.
#[derive(Debug, Clone, Copy, Default)]
pub struct HistoryWindow {
    config: HistoryConfig,
}

impl HistoryWindow {
    #[must_use]
    pub const fn with_config(config: HistoryConfig) -> Self {
        Self { config }
    }

    /// The most recent entries that fit the window, oldest first.
    #[must_use]
    pub fn select<'a>(&self, entries: &'a [ChatEntry]) -> &'a [ChatEntry] {
        let start = entries.len().saturating_sub(self.config.window_size);
        &entries[start..]
    }

    /// Drop the oldest entries beyond the storage cap, if one is set.
    ///
    /// The newest entry is always kept, so a cap of zero behaves like one.
    pub fn enforce_cap(&self, entries: &mut Vec<ChatEntry>) {
        if let Some(max) = self.config.max_stored_entries {
            let max = max.max(1);
            let excess = entries.len().saturating_sub(max);
            if excess > 0 {
                entries.drain(..excess);
            }
        }
    }
}
