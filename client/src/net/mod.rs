//! Networking modules for the REST API and the chat socket.
//!
//! SYSTEM CONTEXT
//! ==============
//! `api` performs the authenticated history and profile fetches, and `socket`
//! executes `chat::Effect`s against a browser WebSocket and timers.

pub mod api;
pub mod socket;
