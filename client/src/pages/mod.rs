//! Page modules for route-level screens.
//!
//! ARCHITECTURE
//! ============
//! Each page owns route-scoped orchestration (auth redirects, history load,
//! socket driver) and delegates rendering details to `components`.

pub mod chat;
pub mod signin;
