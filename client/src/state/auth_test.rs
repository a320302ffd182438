use super::*;

#[test]
fn normalize_token_trims_and_strips_scheme() {
    assert_eq!(normalize_token("  abc.def  "), Some("abc.def".to_owned()));
    assert_eq!(normalize_token("Bearer abc"), Some("abc".to_owned()));
    assert_eq!(normalize_token("bearer  abc "), Some("abc".to_owned()));
}

#[test]
fn normalize_token_rejects_blank() {
    assert_eq!(normalize_token(""), None);
    assert_eq!(normalize_token("   "), None);
    assert_eq!(normalize_token("Bearer "), None);
}

#[test]
fn sign_in_and_out_update_state() {
    let mut auth = AuthState::default();
    assert!(!auth.sign_in("  "));
    assert_eq!(auth.token, None);

    assert!(auth.sign_in("Bearer tok-1"));
    assert_eq!(auth.token.as_deref(), Some("tok-1"));

    auth.sign_out();
    assert_eq!(auth.token, None);
}

#[test]
fn restore_outside_browser_is_signed_out() {
    assert_eq!(AuthState::restore(), AuthState::default());
}
