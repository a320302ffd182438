//! Shared reactive state provided through Leptos context.
//!
//! SYSTEM CONTEXT
//! ==============
//! `App` wraps each state struct in an `RwSignal` and provides it; pages and
//! components read it with `expect_context`.

pub mod auth;
pub mod chat;
