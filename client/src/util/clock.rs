//! Wall clock and viewer offset.
//!
//! The browser reports its offset as minutes *behind* UTC, so `-330` means
//! `+05:30`. Outside the browser both helpers fall back to UTC.

#[cfg(test)]
#[path = "clock_test.rs"]
mod clock_test;

use time::{OffsetDateTime, UtcOffset};

pub fn now() -> OffsetDateTime {
    OffsetDateTime::now_utc()
}

/// The viewer's current UTC offset.
pub fn local_offset() -> UtcOffset {
    #[cfg(feature = "hydrate")]
    {
        offset_from_js_minutes(js_sys::Date::new_0().get_timezone_offset())
    }
    #[cfg(not(feature = "hydrate"))]
    {
        UtcOffset::UTC
    }
}

/// Convert `Date.prototype.getTimezoneOffset` minutes into a `UtcOffset`.
#[allow(clippy::cast_possible_truncation)]
pub fn offset_from_js_minutes(minutes: f64) -> UtcOffset {
    if !minutes.is_finite() {
        return UtcOffset::UTC;
    }
    let seconds = (-minutes * 60.0).round().clamp(-86_399.0, 86_399.0) as i32;
    UtcOffset::from_whole_seconds(seconds).unwrap_or(UtcOffset::UTC)
}

/// Seed for the session's fallback randomness.
#[allow(clippy::cast_possible_truncation)]
pub fn seed() -> u64 {
    now().unix_timestamp_nanos().unsigned_abs() as u64
}
