//! Shared wire model for the wellness chat socket and REST envelope.
//!
//! This crate owns the representation used by both `client` and `cli`.
//! Socket frames are JSON text objects discriminated by a `type` field; REST
//! responses share a uniform `{ success, message, data, code }` envelope.
//!
//! DECODING POLICY
//! ===============
//! Inbound decoding never fails. Text that is not JSON, or JSON whose `type`
//! is unknown, degrades to [`InboundFrame::Text`] so the caller can render it
//! as a plain bot message. Blank text decodes to `None`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Literal keepalive reply sent by the chat service.
pub const PONG_FRAME: &str = r#"{"type":"pong"}"#;

/// Content substituted when a `message` frame carries no `content`.
pub const EMPTY_MESSAGE_CONTENT: &str = "Message received with no content";

/// Error returned when a REST envelope does not carry a usable payload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// Token missing, expired or rejected. Callers should clear it and sign in again.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// The service answered with `success: false`.
    #[error("request rejected ({code}): {message}")]
    Rejected { code: u16, message: String },
    /// `success: true` but `data` was absent or null.
    #[error("response envelope carried no data")]
    MissingData,
}

impl ApiError {
    /// Map a non-2xx HTTP status into an error.
    #[must_use]
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        if status == 401 {
            Self::Unauthorized(message)
        } else {
            Self::Rejected { code: status, message }
        }
    }

    /// Whether the error means the stored token is no longer usable.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }
}

/// Uniform REST response envelope.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    pub data: Option<T>,
    #[serde(default = "default_code")]
    pub code: u16,
}

fn default_code() -> u16 {
    200
}

impl<T> Envelope<T> {
    /// Unwrap the payload, mapping unsuccessful envelopes to [`ApiError`].
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unauthorized`] for code 401, [`ApiError::Rejected`]
    /// for any other unsuccessful envelope and [`ApiError::MissingData`] when
    /// the payload is absent.
    pub fn into_data(self) -> Result<T, ApiError> {
        if !self.success {
            return Err(ApiError::from_status(self.code, self.message));
        }
        self.data.ok_or(ApiError::MissingData)
    }
}

/// `data` payload of the chat history endpoint.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatHistoryData {
    pub user_chats: UserChats,
}

/// Prior chat turns plus the user's identity and gamification counters.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserChats {
    pub chats: Option<Vec<HistoryTurn>>,
    pub name: Option<String>,
    pub empid: Option<String>,
    pub last_active: Option<String>,
    pub level: Option<u32>,
    pub level_progress: Option<f64>,
    pub streak_days: Option<u32>,
    pub wellness_points: Option<u32>,
}

/// One persisted chat turn.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct HistoryTurn {
    pub message: Option<String>,
    pub timestamp: Option<String>,
    pub sender: Option<String>,
}

impl HistoryTurn {
    /// Text to show for this turn, or `None` when it should be skipped.
    ///
    /// Turns persisted as JSON objects are unwrapped to their `content`;
    /// `ping`/`presence` control frames that leaked into history are skipped.
    #[must_use]
    pub fn display_content(&self) -> Option<String> {
        let raw = self.message.as_deref().filter(|m| !m.is_empty())?;
        if !raw.trim_start().starts_with('{') {
            return Some(raw.to_owned());
        }
        let Ok(value) = serde_json::from_str::<Value>(raw) else {
            return Some(raw.to_owned());
        };
        if let Some(content) = pick_str(&value, &["content"]).filter(|c| !c.is_empty()) {
            return Some(content.to_owned());
        }
        match pick_str(&value, &["type"]) {
            Some("ping" | "presence") => None,
            _ => Some(raw.to_owned()),
        }
    }
}

/// Presence values announced by the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresenceStatus {
    Online,
    Offline,
}

/// Frame sent from the client to the chat service.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundFrame {
    /// A user chat message. `id` matches the optimistic local copy.
    Message {
        content: String,
        id: String,
        /// RFC 3339 send time.
        timestamp: String,
    },
    /// Presence announcement, sent as `offline` on teardown.
    Presence { status: PresenceStatus },
}

/// Encode an outbound frame as JSON text.
#[must_use]
pub fn encode_frame(frame: &OutboundFrame) -> String {
    // Serializing plain strings and unit enums into a String cannot fail.
    serde_json::to_string(frame).unwrap_or_default()
}

/// Payload of an inbound `message` frame.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MessagePayload {
    pub id: Option<String>,
    pub content: Option<String>,
    /// Wellness points awarded alongside the reply.
    pub points: Option<u32>,
}

impl MessagePayload {
    /// Content to display, substituting [`EMPTY_MESSAGE_CONTENT`] when absent.
    #[must_use]
    pub fn content_or_default(&self) -> &str {
        self.content
            .as_deref()
            .filter(|c| !c.is_empty())
            .unwrap_or(EMPTY_MESSAGE_CONTENT)
    }
}

/// Payload of an inbound `stats_update` frame. Absent counters are left untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StatsPayload {
    pub streak_days: Option<u32>,
    pub streak_change: Option<i64>,
    pub wellness_points: Option<u32>,
    pub level: Option<u32>,
}

/// Decoded inbound frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InboundFrame {
    Message(MessagePayload),
    Typing,
    StatsUpdate(StatsPayload),
    Pong,
    /// Anything that is not a recognised JSON frame, kept verbatim.
    Text(String),
}

/// Decode one inbound text frame. Returns `None` for blank input.
#[must_use]
pub fn decode_frame(raw: &str) -> Option<InboundFrame> {
    if raw == PONG_FRAME {
        return Some(InboundFrame::Pong);
    }
    let Ok(value) = serde_json::from_str::<Value>(raw) else {
        return text_frame(raw);
    };

    match pick_str(&value, &["type"]) {
        Some("message") => Some(InboundFrame::Message(parse_message_payload(&value))),
        Some("typing") => Some(InboundFrame::Typing),
        Some("stats_update") => Some(InboundFrame::StatsUpdate(parse_stats_payload(&value))),
        Some("pong") => Some(InboundFrame::Pong),
        _ => text_frame(raw),
    }
}

fn text_frame(raw: &str) -> Option<InboundFrame> {
    if raw.trim().is_empty() {
        None
    } else {
        Some(InboundFrame::Text(raw.to_owned()))
    }
}

fn parse_message_payload(value: &Value) -> MessagePayload {
    MessagePayload {
        id: pick_str(value, &["id"]).map(str::to_owned),
        content: pick_str(value, &["content"]).map(str::to_owned),
        points: pick_count(value, &["points"]).filter(|p| *p > 0),
    }
}

#[allow(clippy::cast_possible_truncation)]
fn parse_stats_payload(value: &Value) -> StatsPayload {
    StatsPayload {
        streak_days: pick_count(value, &["streakDays", "streak_days"]),
        streak_change: pick_number(value, &["streakChange", "streak_change"]).map(|n| n.trunc() as i64),
        wellness_points: pick_count(value, &["wellnessPoints", "wellness_points"]),
        level: pick_count(value, &["level"]),
    }
}

/// First string value found under any of `keys`.
#[must_use]
pub fn pick_str<'a>(payload: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter().find_map(|k| payload.get(*k).and_then(Value::as_str))
}

/// First numeric value found under any of `keys`.
#[must_use]
pub fn pick_number(payload: &Value, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|k| payload.get(*k).and_then(Value::as_f64))
}

/// Like [`pick_number`], floored and clamped into a non-negative counter.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn pick_count(payload: &Value, keys: &[&str]) -> Option<u32> {
    pick_number(payload, keys)
        .filter(|n| n.is_finite())
        .map(|n| n.floor().clamp(0.0, f64::from(u32::MAX)) as u32)
}

#[cfg(test)]
#[path = "lib_test.rs"]
mod tests;
