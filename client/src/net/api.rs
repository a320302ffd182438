//! REST calls to the wellness API.
//!
//! Client-side (hydrate): real HTTP calls via `gloo-net`.
//! Server-side (SSR): stubs returning an error since these endpoints need the
//! browser's stored token.
//!
//! ERROR HANDLING
//! ==============
//! Responses are reduced to [`FetchError`]. `Unauthorized` tells the caller to
//! drop the token and redirect; everything else is logged and the page
//! continues with empty state.

#![allow(clippy::unused_async)]

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use chat::Endpoints;
use frames::{ApiError, ChatHistoryData, Envelope, UserChats};
use serde::de::DeserializeOwned;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FetchError {
    /// The token was rejected (HTTP or envelope code 401).
    Unauthorized,
    Failed(String),
}

impl FetchError {
    pub fn message(&self) -> String {
        match self {
            Self::Unauthorized => "unauthorized".to_owned(),
            Self::Failed(message) => message.clone(),
        }
    }
}

impl From<ApiError> for FetchError {
    fn from(err: ApiError) -> Self {
        if err.is_unauthorized() { Self::Unauthorized } else { Self::Failed(err.to_string()) }
    }
}

/// API base baked in at build time, else the page's own origin.
pub fn endpoints() -> Endpoints {
    if let Some(base) = option_env!("WELLNESS_API_BASE") {
        return Endpoints::new(base);
    }
    #[cfg(feature = "hydrate")]
    {
        let origin = web_sys::window()
            .and_then(|w| w.location().origin().ok())
            .unwrap_or_default();
        Endpoints::new(origin)
    }
    #[cfg(not(feature = "hydrate"))]
    {
        Endpoints::new("")
    }
}

#[cfg(any(test, feature = "hydrate"))]
fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

fn request_failed_message(what: &str, status: u16) -> String {
    format!("{what} request failed: {status}")
}

/// Reduce an HTTP status and body to the envelope's payload.
fn decode_envelope<T: DeserializeOwned>(what: &str, status: u16, body: &str) -> Result<T, FetchError> {
    if status == 401 {
        return Err(FetchError::Unauthorized);
    }
    match serde_json::from_str::<Envelope<T>>(body) {
        Ok(envelope) => Ok(envelope.into_data()?),
        Err(_) if !(200..300).contains(&status) => Err(FetchError::Failed(request_failed_message(what, status))),
        Err(e) => Err(FetchError::Failed(format!("{what} response malformed: {e}"))),
    }
}

/// Decode the chat history endpoint's response.
///
/// # Errors
///
/// See [`fetch_history`].
pub fn decode_history(status: u16, body: &str) -> Result<UserChats, FetchError> {
    decode_envelope::<ChatHistoryData>("history", status, body).map(|data| data.user_chats)
}

#[cfg(feature = "hydrate")]
async fn get_text(url: &str, token: &str) -> Result<(u16, String), FetchError> {
    let resp = gloo_net::http::Request::get(url)
        .header("Authorization", &bearer(token))
        .send()
        .await
        .map_err(|e| FetchError::Failed(e.to_string()))?;
    let status = resp.status();
    let body = resp.text().await.map_err(|e| FetchError::Failed(e.to_string()))?;
    Ok((status, body))
}

/// Fetch prior chat turns, identity and counters.
///
/// # Errors
///
/// Returns [`FetchError::Unauthorized`] when the token is rejected and
/// [`FetchError::Failed`] for transport or envelope failures.
pub async fn fetch_history(endpoints: &Endpoints, token: &str) -> Result<UserChats, FetchError> {
    #[cfg(feature = "hydrate")]
    {
        let (status, body) = get_text(&endpoints.history_url(), token).await?;
        decode_history(status, &body)
    }
    #[cfg(not(feature = "hydrate"))]
    {
        let _ = (endpoints, token);
        Err(FetchError::Failed("not available on server".to_owned()))
    }
}

/// Check a token against the profile endpoint before storing it.
///
/// # Errors
///
/// Same as [`fetch_history`].
pub async fn verify_token(endpoints: &Endpoints, token: &str) -> Result<(), FetchError> {
    #[cfg(feature = "hydrate")]
    {
        let (status, body) = get_text(&endpoints.profile_url(), token).await?;
        decode_envelope::<serde_json::Value>("profile", status, &body).map(|_| ())
    }
    #[cfg(not(feature = "hydrate"))]
    {
        let _ = (endpoints, token);
        Err(FetchError::Failed("not available on server".to_owned()))
    }
}
