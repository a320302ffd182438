//! URL construction for the portal's REST and socket endpoints.

#[cfg(test)]
#[path = "endpoints_test.rs"]
mod endpoints_test;

const HISTORY_PATH: &str = "/a/api/v1/emp/details/user/chats";
const PROFILE_PATH: &str = "/a/api/v1/emp/details/user";
const SOCKET_PATH: &str = "/c/ws/wsconnect";

/// Endpoint set rooted at one API base, e.g. `http://portal.example`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoints {
    api_base: String,
}

impl Endpoints {
    #[must_use]
    pub fn new(api_base: impl Into<String>) -> Self {
        let api_base = api_base.into().trim_end_matches('/').to_owned();
        Self { api_base }
    }

    #[must_use]
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// `GET` chat history for the bearer token's owner.
    #[must_use]
    pub fn history_url(&self) -> String {
        format!("{}{HISTORY_PATH}", self.api_base)
    }

    /// `GET` the signed-in employee; used to validate a stored token.
    #[must_use]
    pub fn profile_url(&self) -> String {
        format!("{}{PROFILE_PATH}", self.api_base)
    }

    /// Socket URL with the token embedded in the path.
    #[must_use]
    pub fn socket_url(&self, token: &str) -> String {
        format!("{}{SOCKET_PATH}/{token}", socket_base(&self.api_base))
    }
}

/// Swap an `http(s)` scheme for the matching `ws(s)` scheme.
fn socket_base(api_base: &str) -> String {
    if let Some(rest) = api_base.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = api_base.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        api_base.to_owned()
    }
}
