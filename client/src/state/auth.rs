//! Bearer-token session for the current browser user.
//!
//! SYSTEM CONTEXT
//! ==============
//! The token lives in `localStorage` so it survives reloads. The chat page
//! redirects to sign-in whenever the token is missing or rejected.

#[cfg(test)]
#[path = "auth_test.rs"]
mod auth_test;

use crate::util::storage;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AuthState {
    pub token: Option<String>,
}

impl AuthState {
    /// Read the persisted token. Always empty during SSR.
    pub fn restore() -> Self {
        Self { token: storage::load_token().as_deref().and_then(normalize_token) }
    }

    /// Persist a token entered on the sign-in page. Returns `false` for blank input.
    pub fn sign_in(&mut self, raw: &str) -> bool {
        let Some(token) = normalize_token(raw) else {
            return false;
        };
        storage::store_token(&token);
        self.token = Some(token);
        true
    }

    /// Forget the token, e.g. after a 401.
    pub fn sign_out(&mut self) {
        storage::clear_token();
        self.token = None;
    }
}

/// Trim pasted input and drop a leading `Bearer ` scheme.
pub fn normalize_token(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let token = match trimmed.split_once(char::is_whitespace) {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case("bearer") => rest.trim(),
        _ if trimmed.eq_ignore_ascii_case("bearer") => "",
        _ => trimmed,
    };
    if token.is_empty() { None } else { Some(token.to_owned()) }
}
