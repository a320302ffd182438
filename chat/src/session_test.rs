use super::*;
use crate::fallback::FALLBACK_REPLIES;
use crate::message::Sender;
use serde_json::Value;
use time::macros::datetime;

const NOW: OffsetDateTime = datetime!(2025-03-20 10:00 UTC);

fn session() -> ChatSession {
    let mut session = ChatSession::new(SessionConfig::default(), 7);
    session.load_history(History::default());
    session
}

fn open_session() -> ChatSession {
    let mut session = session();
    assert_eq!(session.connect(), vec![Effect::Connect]);
    assert!(session.on_open());
    session
}

fn transmitted(effects: &[Effect]) -> Vec<Value> {
    effects
        .iter()
        .filter_map(|e| match e {
            Effect::Transmit(text) => Some(serde_json::from_str(text).expect("outbound json")),
            _ => None,
        })
        .collect()
}

fn scheduled(effects: &[Effect]) -> Vec<Timer> {
    effects
        .iter()
        .filter_map(|e| match e {
            Effect::Schedule { timer, .. } => Some(timer.clone()),
            _ => None,
        })
        .collect()
}

fn reconnect_check(effects: &[Effect]) -> Timer {
    scheduled(effects)
        .into_iter()
        .find(|t| matches!(t, Timer::ReconnectCheck { .. }))
        .expect("reconnect check scheduled")
}

// =============================================================
// Connection lifecycle
// =============================================================

#[test]
fn new_session_is_loading_and_connecting() {
    let session = ChatSession::new(SessionConfig::default(), 1);
    assert!(session.is_loading_history());
    assert_eq!(session.connection(), &ConnectionState::Disconnected);
    assert_eq!(session.status_badge(), StatusBadge::Connecting);
}

#[test]
fn connect_is_not_repeated_while_pending_or_open() {
    let mut session = session();
    assert_eq!(session.connect(), vec![Effect::Connect]);
    assert!(session.connect().is_empty());
    assert!(session.on_open());
    assert!(session.connect().is_empty());
    assert_eq!(session.status_badge(), StatusBadge::Online);
}

#[test]
fn on_open_without_pending_connect_is_rejected() {
    let mut session = session();
    assert!(!session.on_open());
    assert_eq!(session.connection(), &ConnectionState::Disconnected);
}

#[test]
fn abnormal_close_sets_notice_and_offline_badge() {
    let mut session = open_session();
    session.on_close(1011, "server restart");
    assert_eq!(session.connection(), &ConnectionState::Closed { code: 1011, reason: "server restart".to_owned() });
    assert_eq!(session.notice(), Some(CLOSED_NOTICE));
    assert_eq!(session.status_badge(), StatusBadge::Offline);
}

#[test]
fn normal_close_leaves_no_notice() {
    let mut session = open_session();
    session.on_close(NORMAL_CLOSURE, "");
    assert_eq!(session.notice(), None);
    assert_eq!(session.status_badge(), StatusBadge::Connecting);
}

#[test]
fn transport_error_records_abnormal_closure() {
    let mut session = session();
    session.connect();
    session.on_transport_error("dns failure");
    assert!(matches!(session.connection(), ConnectionState::Closed { code: ABNORMAL_CLOSURE, .. }));
    assert_eq!(session.notice(), Some(TRANSPORT_ERROR_NOTICE));
}

#[test]
fn reopening_clears_notice() {
    let mut session = open_session();
    session.on_close(1006, "");
    session.connect();
    assert!(session.on_open());
    assert_eq!(session.notice(), None);
    assert_eq!(session.status_badge(), StatusBadge::Online);
}

#[test]
fn teardown_when_open_sends_offline_presence_then_closes() {
    let mut session = open_session();
    let effects = session.teardown();

    assert_eq!(effects.len(), 2);
    let presence = transmitted(&effects);
    assert_eq!(presence, vec![serde_json::json!({"type": "presence", "status": "offline"})]);
    assert!(matches!(&effects[1], Effect::Close { code: NORMAL_CLOSURE, .. }));
    assert!(matches!(session.connection(), ConnectionState::Closed { code: NORMAL_CLOSURE, .. }));
}

#[test]
fn teardown_while_connecting_only_closes() {
    let mut session = session();
    session.connect();
    let effects = session.teardown();
    assert_eq!(effects.len(), 1);
    assert!(matches!(&effects[0], Effect::Close { code: NORMAL_CLOSURE, .. }));
}

#[test]
fn teardown_without_socket_is_a_no_op() {
    let mut session = session();
    assert!(session.teardown().is_empty());
}

// =============================================================
// History and notices
// =============================================================

#[test]
fn load_history_replaces_timeline_and_stats() {
    let mut session = ChatSession::new(SessionConfig::default(), 1);
    session.load_history(History {
        messages: vec![Message::bot(Some("0".to_owned()), "welcome back", NOW)],
        user: Some(ChatUser { name: "Asha".to_owned(), emp_id: "EMP1".to_owned() }),
        stats: WellnessStats { streak_days: 4, wellness_points: 120, level: 1, level_progress: 20.0 },
    });
    assert!(!session.is_loading_history());
    assert_eq!(session.messages().len(), 1);
    assert_eq!(session.user().map(|u| u.name.as_str()), Some("Asha"));
    assert_eq!(session.stats().streak_days, 4);
}

#[test]
fn history_failure_starts_empty_with_notice() {
    let mut session = ChatSession::new(SessionConfig::default(), 1);
    session.history_failed();
    assert!(!session.is_loading_history());
    assert!(session.messages().is_empty());
    assert_eq!(session.notice(), Some(HISTORY_FAILED_NOTICE));
}

#[test]
fn missing_token_sets_auth_notice() {
    let mut session = ChatSession::new(SessionConfig::default(), 1);
    session.token_missing();
    assert_eq!(session.notice(), Some(AUTH_MISSING_NOTICE));
    assert_eq!(session.status_badge(), StatusBadge::Offline);
}

// =============================================================
// Sending
// =============================================================

#[test]
fn send_blank_is_ignored() {
    let mut session = open_session();
    assert!(session.send("   \n", NOW).is_empty());
    assert!(session.messages().is_empty());
}

#[test]
fn send_when_open_appends_once_and_transmits_matching_id() {
    let mut session = open_session();
    let effects = session.send("  Feeling down  ", NOW);

    assert_eq!(session.messages().len(), 1);
    let local = &session.messages()[0];
    assert_eq!(local.sender, Sender::User);
    assert_eq!(local.content, "Feeling down");

    let frames = transmitted(&effects);
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0]["type"], "message");
    assert_eq!(frames[0]["content"], "Feeling down");
    assert_eq!(frames[0]["id"], local.id.as_str());
    assert_eq!(frames[0]["timestamp"], "2025-03-20T10:00:00Z");
    assert!(session.is_typing());
}

#[test]
fn send_awards_user_points_through_badge() {
    let mut session = open_session();
    let effects = session.send("hello", NOW);

    assert_eq!(session.presentation().points_badge, Some(10));
    assert!(scheduled(&effects).contains(&Timer::ApplyPoints(10)));
    assert_eq!(session.stats().wellness_points, 0);

    let effects = session.on_timer(Timer::ApplyPoints(10), NOW);
    assert_eq!(session.stats().wellness_points, 10);
    assert_eq!(scheduled(&effects), vec![Timer::HidePointsBadge]);

    session.on_timer(Timer::HidePointsBadge, NOW);
    assert_eq!(session.presentation().points_badge, None);
}

#[test]
fn send_when_closed_reconnects_once_then_transmits() {
    let mut session = session();
    let effects = session.send("hi there", NOW);

    assert_eq!(session.messages().len(), 1);
    assert_eq!(effects.iter().filter(|e| **e == Effect::Connect).count(), 1);
    assert!(transmitted(&effects).is_empty());

    assert!(session.on_open());
    let effects = session.on_timer(reconnect_check(&effects), NOW);
    let frames = transmitted(&effects);
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0]["id"], session.messages()[0].id.as_str());
    assert_eq!(session.messages().len(), 1);
}

#[test]
fn send_while_connecting_does_not_connect_again() {
    let mut session = session();
    session.connect();
    let effects = session.send("hi", NOW);
    assert!(!effects.contains(&Effect::Connect));
    assert!(matches!(reconnect_check(&effects), Timer::ReconnectCheck { .. }));
}

#[test]
fn offline_send_produces_exactly_one_fallback_reply() {
    let mut session = session();
    session.on_transport_error("refused");
    let effects = session.send("hello?", NOW);
    session.on_transport_error("refused");

    let effects = session.on_timer(reconnect_check(&effects), NOW);
    assert!(transmitted(&effects).is_empty());
    let timers = scheduled(&effects);
    assert!(timers.iter().any(|t| matches!(t, Timer::AwardPoints(p) if (5..20).contains(p))));
    assert_eq!(timers.iter().filter(|t| **t == Timer::FallbackReply).count(), 1);
    assert!(session.is_typing());

    session.on_timer(Timer::FallbackReply, NOW);
    let messages = session.messages();
    assert_eq!(messages.len(), 2);
    assert!(messages[0].is_from_user());
    assert_eq!(messages[1].sender, Sender::Bot);
    assert!(FALLBACK_REPLIES.contains(&messages[1].content.as_str()));
    assert!(!session.is_typing());
}

#[test]
fn fallback_streak_fires_only_when_chance_is_certain() {
    let config = SessionConfig { fallback_streak_chance: 1.0, ..SessionConfig::default() };
    let mut session = ChatSession::new(config, 3);
    session.load_history(History::default());
    let effects = session.send("hi", NOW);
    let effects = session.on_timer(reconnect_check(&effects), NOW);
    assert!(scheduled(&effects).contains(&Timer::FallbackStreak));

    let effects = session.on_timer(Timer::FallbackStreak, NOW);
    assert_eq!(session.stats().streak_days, 1);
    assert!(session.presentation().streak_bump);
    assert_eq!(scheduled(&effects), vec![Timer::HideStreakBump]);

    let config = SessionConfig { fallback_streak_chance: 0.0, ..SessionConfig::default() };
    let mut session = ChatSession::new(config, 3);
    let effects = session.send("hi", NOW);
    let effects = session.on_timer(reconnect_check(&effects), NOW);
    assert!(!scheduled(&effects).contains(&Timer::FallbackStreak));
}

#[test]
fn fallback_is_reproducible_for_a_seed() {
    let run = |seed| {
        let mut session = ChatSession::new(SessionConfig::default(), seed);
        let effects = session.send("hi", NOW);
        let effects = session.on_timer(reconnect_check(&effects), NOW);
        session.on_timer(Timer::FallbackReply, NOW);
        (scheduled(&effects), session.messages()[1].content.clone())
    };
    assert_eq!(run(42), run(42));
}

// =============================================================
// Receiving
// =============================================================

#[test]
fn pong_changes_nothing() {
    let mut session = open_session();
    session.send("hi", NOW);
    let before = format!("{session:?}");
    assert!(session.receive(frames::PONG_FRAME, NOW).is_empty());
    assert_eq!(format!("{session:?}"), before);
}

#[test]
fn typing_frame_sets_indicator() {
    let mut session = open_session();
    session.receive(r#"{"type":"typing"}"#, NOW);
    assert!(session.is_typing());
}

#[test]
fn message_frame_appends_bot_reply_and_clears_typing() {
    let mut session = open_session();
    session.send("hi", NOW);
    let effects = session.receive(r#"{"type":"message","id":"srv-1","content":"Hello!","points":15}"#, NOW);

    let reply = &session.messages()[1];
    assert_eq!(reply.id, "srv-1");
    assert_eq!(reply.content, "Hello!");
    assert_eq!(reply.sender, Sender::Bot);
    assert!(!session.is_typing());
    assert_eq!(session.presentation().points_badge, Some(15));
    assert_eq!(scheduled(&effects), vec![Timer::ApplyPoints(15)]);
}

#[test]
fn message_frame_without_content_uses_placeholder() {
    let mut session = open_session();
    let effects = session.receive(r#"{"type":"message"}"#, NOW);
    assert!(effects.is_empty());
    assert_eq!(session.messages()[0].content, frames::EMPTY_MESSAGE_CONTENT);
    assert!(!session.messages()[0].id.is_empty());
}

#[test]
fn duplicate_message_id_is_not_appended_twice() {
    let mut session = open_session();
    let frame = r#"{"type":"message","id":"srv-1","content":"Hello!"}"#;
    session.receive(frame, NOW);
    session.receive(frame, NOW);
    assert_eq!(session.messages().len(), 1);
}

#[test]
fn non_json_frame_becomes_one_bot_message() {
    let mut session = open_session();
    session.receive("not json", NOW);
    assert_eq!(session.messages().len(), 1);
    assert_eq!(session.messages()[0].content, "not json");
    assert_eq!(session.messages()[0].sender, Sender::Bot);
}

#[test]
fn stats_crossing_level_boundary_fires_level_up_once() {
    let mut session = open_session();
    session.receive(r#"{"type":"stats_update","wellnessPoints":95}"#, NOW);
    assert!(!session.presentation().level_up);

    let effects = session.receive(r#"{"type":"stats_update","wellnessPoints":105}"#, NOW);
    assert_eq!(session.stats().level, 1);
    assert!(session.presentation().level_up);
    assert_eq!(scheduled(&effects), vec![Timer::HideLevelUp]);

    let effects = session.receive(r#"{"type":"stats_update","wellnessPoints":130}"#, NOW);
    assert!(scheduled(&effects).is_empty());

    session.on_timer(Timer::HideLevelUp, NOW);
    assert!(!session.presentation().level_up);
}

#[test]
fn stats_positive_streak_change_shows_badge() {
    let mut session = open_session();
    let effects = session.receive(r#"{"type":"stats_update","streakDays":5,"streakChange":1}"#, NOW);
    assert_eq!(session.stats().streak_days, 5);
    assert!(session.presentation().streak_bump);
    assert_eq!(scheduled(&effects), vec![Timer::HideStreakBump]);

    let effects = session.receive(r#"{"type":"stats_update","streakDays":0,"streakChange":-5}"#, NOW);
    assert_eq!(session.stats().streak_days, 0);
    assert!(effects.is_empty());
}

#[test]
fn stats_reported_level_raises_but_never_undercuts_points() {
    let mut session = open_session();
    session.receive(r#"{"type":"stats_update","wellnessPoints":40,"level":3}"#, NOW);
    assert_eq!(session.stats().level, 3);
    assert_eq!(session.stats().wellness_points, 40);

    session.receive(r#"{"type":"stats_update","wellnessPoints":250,"level":1}"#, NOW);
    assert_eq!(session.stats().level, 2);
}

#[test]
fn stats_stale_level_does_not_undo_level_up() {
    let mut session = open_session();
    session.receive(r#"{"type":"stats_update","wellnessPoints":95,"level":0}"#, NOW);
    assert_eq!(session.stats().level, 0);

    session.receive(r#"{"type":"stats_update","wellnessPoints":105,"level":0}"#, NOW);
    assert!(session.presentation().level_up);
    assert_eq!(session.stats().level, 1);
    assert_eq!(session.stats().wellness_points, 105);
}

#[test]
fn grouped_buckets_session_messages() {
    let mut session = open_session();
    session.send("hi", NOW);
    let groups = session.grouped(NOW.date(), UtcOffset::UTC);
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].label(), "Today");
}
