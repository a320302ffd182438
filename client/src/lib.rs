//! Browser client for the wellness chat portal.
//!
//! ARCHITECTURE
//! ============
//! `chat::ChatSession` holds all conversation state behind a Leptos signal.
//! `net::socket` executes the session's effects against a browser WebSocket
//! and timers, `net::api` performs the REST calls, and `pages`/`components`
//! render the signal.
//!
//! The crate compiles in two modes: `hydrate` for the WASM bundle and `ssr`
//! for server-side rendering inside the host.

pub mod app;
pub mod components;
pub mod net;
pub mod pages;
pub mod state;
pub mod util;

/// WASM entry point invoked by the generated JS glue after the SSR HTML loads.
#[cfg(feature = "hydrate")]
#[wasm_bindgen::prelude::wasm_bindgen]
pub fn hydrate() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Debug);
    leptos::mount::hydrate_body(app::App);
}
