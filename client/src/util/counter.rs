//! Count-up animation for the points display.

#[cfg(test)]
#[path = "counter_test.rs"]
mod counter_test;

/// Length of one count-up animation.
pub const COUNTER_DURATION_MS: f64 = 1000.0;
/// Tick interval while animating.
pub const COUNTER_FRAME_MS: u64 = 16;

/// Value shown `elapsed_ms` into an animation towards `target`.
///
/// Linear from zero, exact at and after `duration_ms`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn counter_value(target: u32, elapsed_ms: f64, duration_ms: f64) -> u32 {
    if target == 0 {
        return 0;
    }
    if duration_ms <= 0.0 || elapsed_ms >= duration_ms {
        return target;
    }
    let progress = (elapsed_ms.max(0.0) / duration_ms) * f64::from(target);
    (progress.floor() as u32).min(target)
}
