//! Realtime chat client state for the wellness portal.
//!
//! This crate is UI-framework agnostic and performs no I/O, so the browser
//! client and the terminal client drive the same [`ChatSession`]. Operations
//! return [`Effect`]s (connect, transmit, close, schedule a timer) which the
//! caller executes on its own event loop and feeds results back in.

pub mod endpoints;
pub mod fallback;
pub mod history;
pub mod message;
pub mod session;
pub mod stats;
pub mod timeline;

pub use endpoints::Endpoints;
pub use history::History;
pub use message::{ChatUser, Message, Sender};
pub use session::{ChatSession, ConnectionState, Effect, Presentation, SessionConfig, StatusBadge, Timer};
pub use stats::WellnessStats;
pub use timeline::{DayBucket, DayGroup, group_by_day};
