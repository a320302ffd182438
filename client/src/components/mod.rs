//! Reusable UI component modules.
//!
//! SYSTEM CONTEXT
//! ==============
//! Components render the chat page chrome and read the shared
//! `RwSignal<ChatState>` from context. Outbound actions are passed in as
//! callbacks so only the page talks to the socket driver.

pub mod composer;
pub mod connection_badge;
pub mod stats_bar;
pub mod timeline;
