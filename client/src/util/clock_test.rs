use super::*;
use time::macros::offset;

#[test]
fn offset_from_js_minutes_inverts_sign() {
    assert_eq!(offset_from_js_minutes(-330.0), offset!(+5:30));
    assert_eq!(offset_from_js_minutes(300.0), offset!(-5));
    assert_eq!(offset_from_js_minutes(0.0), UtcOffset::UTC);
}

#[test]
fn offset_from_js_minutes_rejects_nonsense() {
    assert_eq!(offset_from_js_minutes(f64::NAN), UtcOffset::UTC);
    assert_eq!(offset_from_js_minutes(f64::INFINITY), UtcOffset::UTC);
}

#[test]
fn local_offset_outside_browser_is_utc() {
    assert_eq!(local_offset(), UtcOffset::UTC);
}
