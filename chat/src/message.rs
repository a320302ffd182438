//! Timeline message model.

use time::OffsetDateTime;

/// Who authored a timeline entry.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Sender {
    Bot,
    User,
    /// A human counsellor or other participant shown by display name.
    Named(String),
}

impl Sender {
    /// Map a persisted sender label. The service stores its own replies as `"ai"`.
    #[must_use]
    pub fn from_label(label: Option<&str>) -> Self {
        match label {
            Some("user") => Self::User,
            None | Some("ai" | "bot" | "") => Self::Bot,
            Some(name) => Self::Named(name.to_owned()),
        }
    }

    /// Name to print above a bubble; bots and the local user get none.
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        match self {
            Self::Named(name) => Some(name),
            Self::Bot | Self::User => None,
        }
    }
}

/// One immutable timeline entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    pub id: String,
    pub content: String,
    pub sender: Sender,
    pub timestamp: OffsetDateTime,
}

impl Message {
    /// Optimistic local copy of something the user typed.
    #[must_use]
    pub fn user(content: &str, now: OffsetDateTime) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            content: content.to_owned(),
            sender: Sender::User,
            timestamp: now,
        }
    }

    #[must_use]
    pub fn bot(id: Option<String>, content: &str, now: OffsetDateTime) -> Self {
        Self {
            id: id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            content: content.to_owned(),
            sender: Sender::Bot,
            timestamp: now,
        }
    }

    #[must_use]
    pub fn is_from_user(&self) -> bool {
        self.sender == Sender::User
    }
}

/// Identity of the signed-in employee, taken from the history payload.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChatUser {
    pub name: String,
    pub emp_id: String,
}

impl ChatUser {
    /// Header greeting, e.g. `Hello, Asha (EMP0042)`.
    #[must_use]
    pub fn greeting(&self) -> String {
        format!("Hello, {} ({})", self.name, self.emp_id)
    }
}
