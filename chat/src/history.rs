//! Conversion of the history payload into timeline state.

#[cfg(test)]
#[path = "history_test.rs"]
mod history_test;

use frames::UserChats;
use time::{OffsetDateTime, UtcOffset};

use crate::message::{ChatUser, Message, Sender};
use crate::stats::WellnessStats;
use crate::timeline::parse_timestamp;

/// Everything a page load restores from the server.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct History {
    pub messages: Vec<Message>,
    pub user: Option<ChatUser>,
    pub stats: WellnessStats,
}

impl History {
    /// Normalise a history payload.
    ///
    /// Message ids are the turn's position in the persisted list. Timestamps
    /// that cannot be parsed fall back to `fetched_at`.
    #[must_use]
    pub fn from_user_chats(chats: UserChats, offset: UtcOffset, fetched_at: OffsetDateTime) -> Self {
        let messages = chats
            .chats
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .filter_map(|(index, turn)| {
                let content = turn.display_content()?;
                let timestamp = turn
                    .timestamp
                    .as_deref()
                    .and_then(|raw| parse_timestamp(raw, offset))
                    .unwrap_or(fetched_at);
                Some(Message {
                    id: index.to_string(),
                    content,
                    sender: Sender::from_label(turn.sender.as_deref()),
                    timestamp,
                })
            })
            .collect::<Vec<_>>();

        let user = chats.name.filter(|n| !n.is_empty()).map(|name| ChatUser {
            name,
            emp_id: chats.empid.unwrap_or_default(),
        });

        let stats = WellnessStats {
            streak_days: chats.streak_days.unwrap_or(0),
            wellness_points: chats.wellness_points.unwrap_or(0),
            level: chats.level.unwrap_or(0),
            level_progress: chats.level_progress.unwrap_or(0.0),
        };

        Self { messages, user, stats }
    }
}
