//! Authenticated REST calls.

use chat::Endpoints;
use frames::{ApiError, ChatHistoryData, Envelope, UserChats};

use crate::CliError;

/// Fetch the signed-in user's history payload.
pub async fn fetch_history(http: &reqwest::Client, endpoints: &Endpoints, token: &str) -> Result<UserChats, CliError> {
    let response = http.get(endpoints.history_url()).bearer_auth(token).send().await?;
    let status = response.status();
    let body = response.text().await?;
    decode_history(status.as_u16(), &body)
}

fn decode_history(status: u16, body: &str) -> Result<UserChats, CliError> {
    if status == 401 {
        return Err(ApiError::Unauthorized("history request rejected".to_owned()).into());
    }
    if !(200..300).contains(&status) && serde_json::from_str::<serde_json::Value>(body).is_err() {
        return Err(ApiError::from_status(status, body.trim()).into());
    }
    let envelope = serde_json::from_str::<Envelope<ChatHistoryData>>(body)?;
    Ok(envelope.into_data()?.user_chats)
}
