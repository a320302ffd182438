//! Reactive wrapper around the chat session.

#[cfg(test)]
#[path = "chat_test.rs"]
mod chat_test;

use chat::{ChatSession, SessionConfig};

/// Chat page state. Mutated only through `RwSignal::update`, so socket and
/// timer callbacks stay serialized on the UI thread.
#[derive(Clone, Debug)]
pub struct ChatState {
    pub session: ChatSession,
    /// Set once the page has started its history load and socket.
    pub started: bool,
}

impl ChatState {
    pub fn new(seed: u64) -> Self {
        Self { session: ChatSession::new(SessionConfig::default(), seed), started: false }
    }

    /// Composer input is disabled until history has loaded.
    pub fn composer_enabled(&self) -> bool {
        !self.session.is_loading_history()
    }
}

impl Default for ChatState {
    fn default() -> Self {
        Self::new(0)
    }
}
