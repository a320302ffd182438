//! Day-grouped presentation of the message timeline.
//!
//! Messages are bucketed by calendar day in the viewer's offset. Dated buckets
//! sort chronologically, then `Yesterday`, then `Today`, so the newest
//! conversation is always at the bottom. Within a bucket messages are ordered
//! by timestamp, ties keeping insertion order.

#[cfg(test)]
#[path = "timeline_test.rs"]
mod timeline_test;

use std::collections::BTreeMap;

use time::format_description::well_known::{Iso8601, Rfc3339};
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime, UtcOffset};

use crate::message::Message;

/// Display bucket for one calendar day. Variant order is display order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DayBucket {
    Dated(Date),
    Yesterday,
    Today,
}

impl DayBucket {
    /// Header label, e.g. `Today` or `Monday, March 3`.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Today => "Today".to_owned(),
            Self::Yesterday => "Yesterday".to_owned(),
            Self::Dated(date) => format!("{}, {} {}", date.weekday(), date.month(), date.day()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DayGroup {
    pub bucket: DayBucket,
    pub messages: Vec<Message>,
}

impl DayGroup {
    #[must_use]
    pub fn label(&self) -> String {
        self.bucket.label()
    }
}

#[must_use]
pub fn bucket_for(timestamp: OffsetDateTime, today: Date, offset: UtcOffset) -> DayBucket {
    let date = timestamp.to_offset(offset).date();
    if date == today {
        DayBucket::Today
    } else if today.previous_day() == Some(date) {
        DayBucket::Yesterday
    } else {
        DayBucket::Dated(date)
    }
}

/// Group messages by day. Idempotent: regrouping the flattened output yields
/// the same groups in the same order.
#[must_use]
pub fn group_by_day(messages: &[Message], today: Date, offset: UtcOffset) -> Vec<DayGroup> {
    let mut buckets: BTreeMap<DayBucket, Vec<Message>> = BTreeMap::new();
    for message in messages {
        buckets
            .entry(bucket_for(message.timestamp, today, offset))
            .or_default()
            .push(message.clone());
    }

    buckets
        .into_iter()
        .map(|(bucket, mut messages)| {
            messages.sort_by_key(|m| m.timestamp);
            DayGroup { bucket, messages }
        })
        .collect()
}

/// Bubble time in 12-hour form, e.g. `09:05 AM`.
#[must_use]
pub fn format_time(timestamp: OffsetDateTime, offset: UtcOffset) -> String {
    let local = timestamp.to_offset(offset);
    let (hour, suffix) = match local.hour() {
        0 => (12, "AM"),
        h @ 1..=11 => (h, "AM"),
        12 => (12, "PM"),
        h => (h - 12, "PM"),
    };
    format!("{hour:02}:{:02} {suffix}", local.minute())
}

/// RFC 3339 text for outbound frames.
#[must_use]
pub fn to_rfc3339(timestamp: OffsetDateTime) -> String {
    timestamp.format(&Rfc3339).unwrap_or_default()
}

/// Parse a persisted timestamp. Text without an offset is read in `offset`,
/// the viewer's local offset.
#[must_use]
pub fn parse_timestamp(raw: &str, offset: UtcOffset) -> Option<OffsetDateTime> {
    let raw = raw.trim();
    if let Ok(ts) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Some(ts);
    }
    if let Ok(ts) = OffsetDateTime::parse(raw, &Iso8601::DEFAULT) {
        return Some(ts);
    }
    let naive = PrimitiveDateTime::parse(raw, &Iso8601::DEFAULT)
        .or_else(|_| {
            PrimitiveDateTime::parse(
                raw,
                format_description!("[year]-[month]-[day] [hour]:[minute]:[second][optional [.[subsecond]]]"),
            )
        })
        .ok()?;
    Some(naive.assume_offset(offset))
}
