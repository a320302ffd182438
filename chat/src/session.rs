//! Chat session state machine.
//!
//! `ChatSession` owns the connection state, the message timeline, the
//! composing indicator and the wellness counters. It never performs I/O:
//! each operation returns the [`Effect`]s the driver must execute, and the
//! driver reports socket events (`on_open`, `on_close`, `receive`) and fired
//! timers (`on_timer`) back. All calls are expected on one logical thread.
//!
//! CONNECTION LIFECYCLE
//! ====================
//! `Disconnected -> Connecting -> Open -> Closed`. A closed session only
//! reconnects when the user sends again, and a send attempts at most one
//! reconnect before falling back to a locally synthesized reply. There is no
//! outbound queue and no retry loop.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::time::Duration;

use frames::{InboundFrame, MessagePayload, OutboundFrame, PresenceStatus, StatsPayload};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use time::{Date, OffsetDateTime, UtcOffset};

use crate::fallback;
use crate::history::History;
use crate::message::{ChatUser, Message};
use crate::stats::{self, WellnessStats};
use crate::timeline::{self, DayGroup};

/// WebSocket normal-closure code.
pub const NORMAL_CLOSURE: u16 = 1000;
/// Code recorded when the transport fails without a close frame.
pub const ABNORMAL_CLOSURE: u16 = 1006;

pub const AUTH_MISSING_NOTICE: &str = "Authentication token not found. Please log in again.";
pub const HISTORY_FAILED_NOTICE: &str = "Failed to load chat history. Will try to connect to chat service.";
pub const TRANSPORT_ERROR_NOTICE: &str = "Connection error. Please try again.";
pub const CLOSED_NOTICE: &str = "Connection closed. Please try sending a message to reconnect.";

/// Timing and reward knobs. Defaults match the portal's behaviour.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionConfig {
    /// How long a send waits for a reconnect before falling back.
    pub reconnect_grace: Duration,
    pub fallback_reply_delay: Duration,
    pub fallback_points_delay: Duration,
    pub fallback_streak_delay: Duration,
    /// Probability that a fallback reply also bumps the streak.
    pub fallback_streak_chance: f64,
    /// Delay between showing a `+N` badge and adding the points.
    pub points_apply_delay: Duration,
    pub points_badge_linger: Duration,
    /// How long level-up and streak badges stay visible.
    pub celebration_linger: Duration,
    /// Points awarded optimistically for every user message.
    pub user_message_points: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            reconnect_grace: Duration::from_millis(1000),
            fallback_reply_delay: Duration::from_millis(1500),
            fallback_points_delay: Duration::from_millis(500),
            fallback_streak_delay: Duration::from_millis(2000),
            fallback_streak_chance: 0.3,
            points_apply_delay: Duration::from_millis(500),
            points_badge_linger: Duration::from_millis(1000),
            celebration_linger: Duration::from_millis(3000),
            user_message_points: 10,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Open,
    Closed { code: u16, reason: String },
}

impl ConnectionState {
    #[must_use]
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }
}

/// Three-way indicator shown in the chat header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusBadge {
    Offline,
    Online,
    Connecting,
}

impl StatusBadge {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Offline => "Offline",
            Self::Online => "Online",
            Self::Connecting => "Connecting...",
        }
    }
}

/// Transient celebration flags. Each is cleared again by a scheduled timer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Presentation {
    pub level_up: bool,
    pub streak_bump: bool,
    /// Points shown in a `+N` badge while an award is pending.
    pub points_badge: Option<u32>,
}

/// Work the driver must perform on behalf of the session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    /// Open the socket. Report the outcome via `on_open`, `on_close` or
    /// `on_transport_error`.
    Connect,
    /// Send one text frame on the open socket.
    Transmit(String),
    /// Close the socket with the given code.
    Close { code: u16, reason: String },
    /// Call `on_timer(timer)` once `after` has elapsed.
    Schedule { after: Duration, timer: Timer },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Timer {
    /// Grace period after a reconnecting send; transmit or fall back.
    ReconnectCheck { message_id: String, content: String },
    AwardPoints(u32),
    ApplyPoints(u32),
    HidePointsBadge,
    HideLevelUp,
    HideStreakBump,
    FallbackStreak,
    FallbackReply,
}

#[derive(Clone, Debug)]
pub struct ChatSession {
    config: SessionConfig,
    connection: ConnectionState,
    messages: Vec<Message>,
    typing: bool,
    stats: WellnessStats,
    user: Option<ChatUser>,
    notice: Option<String>,
    loading_history: bool,
    presentation: Presentation,
    rng: StdRng,
}

impl ChatSession {
    /// Create a session waiting for its history load. `seed` drives the
    /// fallback reply and points choices.
    #[must_use]
    pub fn new(config: SessionConfig, seed: u64) -> Self {
        Self {
            config,
            connection: ConnectionState::Disconnected,
            messages: Vec::new(),
            typing: false,
            stats: WellnessStats::default(),
            user: None,
            notice: None,
            loading_history: true,
            presentation: Presentation::default(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    // =========================================================
    // Observers
    // =========================================================

    #[must_use]
    pub fn connection(&self) -> &ConnectionState {
        &self.connection
    }

    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Whether the remote side is composing a reply.
    #[must_use]
    pub fn is_typing(&self) -> bool {
        self.typing
    }

    #[must_use]
    pub fn stats(&self) -> &WellnessStats {
        &self.stats
    }

    #[must_use]
    pub fn user(&self) -> Option<&ChatUser> {
        self.user.as_ref()
    }

    /// User-visible connection problem, if any.
    #[must_use]
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    #[must_use]
    pub fn is_loading_history(&self) -> bool {
        self.loading_history
    }

    #[must_use]
    pub fn presentation(&self) -> Presentation {
        self.presentation
    }

    #[must_use]
    pub fn status_badge(&self) -> StatusBadge {
        if self.notice.is_some() {
            StatusBadge::Offline
        } else if self.connection.is_open() {
            StatusBadge::Online
        } else {
            StatusBadge::Connecting
        }
    }

    #[must_use]
    pub fn grouped(&self, today: Date, offset: UtcOffset) -> Vec<DayGroup> {
        timeline::group_by_day(&self.messages, today, offset)
    }

    // =========================================================
    // History
    // =========================================================

    /// Replace the timeline and counters with a fresh history load.
    pub fn load_history(&mut self, history: History) {
        tracing::debug!(messages = history.messages.len(), "chat history loaded");
        self.messages = history.messages;
        self.user = history.user;
        self.stats = history.stats;
        self.loading_history = false;
    }

    /// The history fetch failed; start from an empty timeline.
    pub fn history_failed(&mut self) {
        self.messages.clear();
        self.notice = Some(HISTORY_FAILED_NOTICE.to_owned());
        self.loading_history = false;
    }

    /// No stored token; nothing can be fetched or connected.
    pub fn token_missing(&mut self) {
        self.notice = Some(AUTH_MISSING_NOTICE.to_owned());
        self.loading_history = false;
    }

    // =========================================================
    // Connection events
    // =========================================================

    /// Request a connection unless one is open or already being opened.
    pub fn connect(&mut self) -> Vec<Effect> {
        match self.connection {
            ConnectionState::Open | ConnectionState::Connecting => Vec::new(),
            ConnectionState::Disconnected | ConnectionState::Closed { .. } => {
                tracing::debug!(from = ?self.connection, "chat socket connecting");
                self.connection = ConnectionState::Connecting;
                vec![Effect::Connect]
            }
        }
    }

    /// Handshake completed. Returns `false` when no connect was pending, in
    /// which case the driver should close the stray socket.
    pub fn on_open(&mut self) -> bool {
        if self.connection != ConnectionState::Connecting {
            tracing::debug!(state = ?self.connection, "ignoring open without pending connect");
            return false;
        }
        tracing::debug!("chat socket open");
        self.connection = ConnectionState::Open;
        self.notice = None;
        true
    }

    /// Socket closed, locally or remotely.
    pub fn on_close(&mut self, code: u16, reason: &str) {
        tracing::debug!(code, reason, "chat socket closed");
        self.connection = ConnectionState::Closed { code, reason: reason.to_owned() };
        if code != NORMAL_CLOSURE {
            self.notice = Some(CLOSED_NOTICE.to_owned());
        }
    }

    /// Transport failed before or during the connection.
    pub fn on_transport_error(&mut self, detail: &str) {
        tracing::warn!(detail, "chat socket error");
        self.connection = ConnectionState::Closed { code: ABNORMAL_CLOSURE, reason: detail.to_owned() };
        self.notice = Some(TRANSPORT_ERROR_NOTICE.to_owned());
    }

    /// Session end: announce offline presence and close normally.
    pub fn teardown(&mut self) -> Vec<Effect> {
        let reason = "session ended".to_owned();
        let effects = match self.connection {
            ConnectionState::Open => vec![
                Effect::Transmit(frames::encode_frame(&OutboundFrame::Presence {
                    status: PresenceStatus::Offline,
                })),
                Effect::Close { code: NORMAL_CLOSURE, reason: reason.clone() },
            ],
            ConnectionState::Connecting => vec![Effect::Close { code: NORMAL_CLOSURE, reason: reason.clone() }],
            ConnectionState::Disconnected | ConnectionState::Closed { .. } => return Vec::new(),
        };
        self.connection = ConnectionState::Closed { code: NORMAL_CLOSURE, reason };
        effects
    }

    // =========================================================
    // Outbound
    // =========================================================

    /// Submit user text. Blank input is ignored.
    ///
    /// The optimistic local message is appended before anything touches the
    /// network. When the socket is not open, one reconnect is requested and a
    /// [`Timer::ReconnectCheck`] decides between transmitting and falling back.
    pub fn send(&mut self, content: &str, now: OffsetDateTime) -> Vec<Effect> {
        let content = content.trim();
        if content.is_empty() {
            return Vec::new();
        }

        let message = Message::user(content, now);
        let message_id = message.id.clone();
        self.messages.push(message);

        let mut effects = self.award_points(self.config.user_message_points);
        if self.connection.is_open() {
            effects.push(self.transmit(&message_id, content, now));
        } else {
            effects.extend(self.connect());
            effects.push(Effect::Schedule {
                after: self.config.reconnect_grace,
                timer: Timer::ReconnectCheck { message_id, content: content.to_owned() },
            });
        }
        effects
    }

    fn transmit(&mut self, message_id: &str, content: &str, now: OffsetDateTime) -> Effect {
        self.typing = true;
        Effect::Transmit(frames::encode_frame(&OutboundFrame::Message {
            content: content.to_owned(),
            id: message_id.to_owned(),
            timestamp: timeline::to_rfc3339(now),
        }))
    }

    fn fallback(&mut self) -> Vec<Effect> {
        tracing::debug!("chat service unreachable, synthesizing reply");
        self.typing = true;
        let points = fallback::pick_points(&mut self.rng);
        let mut effects = vec![Effect::Schedule {
            after: self.config.fallback_points_delay,
            timer: Timer::AwardPoints(points),
        }];
        let chance = self.config.fallback_streak_chance.clamp(0.0, 1.0);
        if self.rng.random_bool(chance) {
            effects.push(Effect::Schedule {
                after: self.config.fallback_streak_delay,
                timer: Timer::FallbackStreak,
            });
        }
        effects.push(Effect::Schedule { after: self.config.fallback_reply_delay, timer: Timer::FallbackReply });
        effects
    }

    // =========================================================
    // Inbound
    // =========================================================

    /// Apply one inbound socket frame.
    pub fn receive(&mut self, raw: &str, now: OffsetDateTime) -> Vec<Effect> {
        let Some(frame) = frames::decode_frame(raw) else {
            tracing::trace!("dropping blank frame");
            return Vec::new();
        };

        match frame {
            InboundFrame::Pong => Vec::new(),
            InboundFrame::Typing => {
                self.typing = true;
                Vec::new()
            }
            InboundFrame::Text(text) => {
                self.append_remote(Message::bot(None, &text, now));
                Vec::new()
            }
            InboundFrame::Message(payload) => self.apply_message(payload, now),
            InboundFrame::StatsUpdate(payload) => self.apply_stats(payload),
        }
    }

    fn apply_message(&mut self, payload: MessagePayload, now: OffsetDateTime) -> Vec<Effect> {
        let message = Message::bot(payload.id.clone(), payload.content_or_default(), now);
        self.append_remote(message);
        payload.points.map(|points| self.award_points(points)).unwrap_or_default()
    }

    /// Append a remote message unless its id is already on the timeline.
    fn append_remote(&mut self, message: Message) {
        self.typing = false;
        if self.messages.iter().any(|m| m.id == message.id) {
            tracing::trace!(id = %message.id, "skipping duplicate message");
            return;
        }
        self.messages.push(message);
    }

    fn apply_stats(&mut self, payload: StatsPayload) -> Vec<Effect> {
        let mut effects = Vec::new();
        if let Some(days) = payload.streak_days {
            self.stats.streak_days = days;
            if payload.streak_change.unwrap_or(0) > 0 {
                effects.extend(self.show_streak_bump());
            }
        }
        if let Some(points) = payload.wellness_points {
            if self.stats.set_points(points) {
                effects.extend(self.show_level_up());
            }
        }
        // A reported level never undercuts the one implied by the points.
        if let Some(level) = payload.level {
            self.stats.level = level.max(stats::level_for_points(self.stats.wellness_points));
        }
        effects
    }

    // =========================================================
    // Timers and celebrations
    // =========================================================

    /// A previously scheduled timer fired.
    pub fn on_timer(&mut self, timer: Timer, now: OffsetDateTime) -> Vec<Effect> {
        match timer {
            Timer::ReconnectCheck { message_id, content } => {
                if self.connection.is_open() {
                    vec![self.transmit(&message_id, &content, now)]
                } else {
                    self.fallback()
                }
            }
            Timer::AwardPoints(points) => self.award_points(points),
            Timer::ApplyPoints(points) => {
                let mut effects = Vec::new();
                if self.stats.add_points(points) {
                    effects.extend(self.show_level_up());
                }
                effects.push(Effect::Schedule {
                    after: self.config.points_badge_linger,
                    timer: Timer::HidePointsBadge,
                });
                effects
            }
            Timer::HidePointsBadge => {
                self.presentation.points_badge = None;
                Vec::new()
            }
            Timer::HideLevelUp => {
                self.presentation.level_up = false;
                Vec::new()
            }
            Timer::HideStreakBump => {
                self.presentation.streak_bump = false;
                Vec::new()
            }
            Timer::FallbackStreak => {
                self.stats.streak_days = self.stats.streak_days.saturating_add(1);
                self.show_streak_bump()
            }
            Timer::FallbackReply => {
                let reply = fallback::pick_reply(&mut self.rng);
                self.append_remote(Message::bot(None, reply, now));
                Vec::new()
            }
        }
    }

    fn award_points(&mut self, points: u32) -> Vec<Effect> {
        self.presentation.points_badge = Some(points);
        vec![Effect::Schedule { after: self.config.points_apply_delay, timer: Timer::ApplyPoints(points) }]
    }

    fn show_level_up(&mut self) -> Vec<Effect> {
        tracing::debug!(level = self.stats.level, "level up");
        self.presentation.level_up = true;
        vec![Effect::Schedule { after: self.config.celebration_linger, timer: Timer::HideLevelUp }]
    }

    fn show_streak_bump(&mut self) -> Vec<Effect> {
        self.presentation.streak_bump = true;
        vec![Effect::Schedule { after: self.config.celebration_linger, timer: Timer::HideStreakBump }]
    }
}
