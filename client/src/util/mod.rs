//! Utility helpers shared across client UI modules.
//!
//! SYSTEM CONTEXT
//! ==============
//! Utility modules isolate browser concerns (storage, clock) and pure
//! formatting from page and component logic so both stay testable.

pub mod clock;
pub mod counter;
pub mod markdown;
pub mod storage;
