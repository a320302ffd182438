use super::*;

use chat::SessionConfig;
use chat::fallback::FALLBACK_REPLIES;
use time::macros::datetime;
use tokio::io::AsyncBufReadExt;
use tokio::net::TcpListener;

fn quick_config() -> SessionConfig {
    SessionConfig {
        reconnect_grace: Duration::from_millis(20),
        fallback_reply_delay: Duration::from_millis(10),
        fallback_points_delay: Duration::from_millis(5),
        fallback_streak_delay: Duration::from_millis(10),
        points_apply_delay: Duration::from_millis(5),
        points_badge_linger: Duration::from_millis(5),
        celebration_linger: Duration::from_millis(5),
        ..SessionConfig::default()
    }
}

/// A socket server that answers the first frame with one chat message.
async fn echo_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        while let Some(Ok(frame)) = ws.next().await {
            if frame.is_text() {
                let reply = r#"{"type":"message","id":"srv-1","content":"Hi back"}"#;
                let _ = ws.send(WsMessage::text(reply)).await;
            }
            if frame.is_close() {
                break;
            }
        }
    });
    format!("ws://{addr}/ws/test-token")
}

/// A listener that accepts connections but never answers the handshake.
async fn silent_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((stream, _)) = listener.accept().await {
            held.push(stream);
        }
    });
    format!("ws://{addr}/ws/test-token")
}

async fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("ws://{addr}/ws/test-token")
}

#[tokio::test]
async fn send_and_wait_returns_server_reply() {
    let url = echo_server().await;
    let mut driver = Driver::new(ChatSession::new(quick_config(), 7), url, UtcOffset::UTC);
    driver.connect().await;
    assert!(driver.wait_until(Duration::from_secs(5), |s| s.connection().is_open()).await);

    let reply = driver.send_and_wait("Hello", Duration::from_secs(5)).await.unwrap();
    assert_eq!(reply.content, "Hi back");
    assert_eq!(reply.id, "srv-1");

    driver.shutdown().await;
    assert!(!driver.session().connection().is_open());
}

#[tokio::test]
async fn unreachable_server_falls_back_to_canned_reply() {
    let url = closed_port_url().await;
    let mut driver = Driver::new(ChatSession::new(quick_config(), 7), url, UtcOffset::UTC);
    driver.connect().await;
    assert!(driver.wait_until(Duration::from_secs(5), |s| s.notice().is_some()).await);

    let reply = driver.send_and_wait("Anyone there?", Duration::from_secs(5)).await.unwrap();
    assert!(FALLBACK_REPLIES.contains(&reply.content.as_str()));
}

#[tokio::test]
async fn blank_send_times_out_without_reply() {
    let url = closed_port_url().await;
    let mut driver = Driver::new(ChatSession::new(quick_config(), 7), url, UtcOffset::UTC);
    let reply = driver.send_and_wait("   ", Duration::from_millis(50)).await;
    assert!(reply.is_none());
    assert!(driver.session().messages().is_empty());
}

#[tokio::test]
async fn run_interactive_stops_on_quit() {
    let url = closed_port_url().await;
    let mut driver = Driver::new(ChatSession::new(quick_config(), 7), url, UtcOffset::UTC);
    let input: &[u8] = b"/quit\nnever sent\n";
    driver.run_interactive(tokio::io::BufReader::new(input).lines()).await.unwrap();
    assert!(driver.session().messages().is_empty());
}

#[tokio::test]
async fn drain_output_reports_each_message_once() {
    let url = closed_port_url().await;
    let mut driver = Driver::new(ChatSession::new(quick_config(), 7), url, UtcOffset::UTC);
    driver.send("Hi").await;
    assert!(driver.wait_until(Duration::from_secs(5), |s| s.notice().is_some()).await);

    let first = driver.drain_output();
    assert!(first.iter().any(|line| line.ends_with("You: Hi")));
    assert!(first.iter().any(|line| line.starts_with("! ")));
    assert!(first.iter().any(|line| line == "-- Offline --"));

    let second = driver.drain_output();
    assert!(second.iter().all(|line| !line.contains("You: Hi")));
}

#[tokio::test]
async fn hung_handshake_still_falls_back_after_grace() {
    let url = silent_server().await;
    let mut driver = Driver::new(ChatSession::new(quick_config(), 7), url, UtcOffset::UTC);

    let started = tokio::time::Instant::now();
    let reply = driver.send_and_wait("hello", Duration::from_secs(4)).await.unwrap();
    assert!(started.elapsed() < Duration::from_secs(2));
    assert!(FALLBACK_REPLIES.contains(&reply.content.as_str()));
    assert_eq!(driver.session().connection(), &chat::ConnectionState::Connecting);
}

#[tokio::test]
async fn send_and_wait_honours_limit_during_hung_handshake() {
    let url = silent_server().await;
    let config = SessionConfig { reconnect_grace: Duration::from_secs(30), ..quick_config() };
    let mut driver = Driver::new(ChatSession::new(config, 7), url, UtcOffset::UTC);

    let started = tokio::time::Instant::now();
    let reply = driver.send_and_wait("hello", Duration::from_millis(200)).await;
    assert!(reply.is_none());
    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(driver.session().messages().len(), 1);
}

#[tokio::test]
async fn handshake_finishing_after_shutdown_is_discarded() {
    let url = echo_server().await;
    let mut driver = Driver::new(ChatSession::new(quick_config(), 7), url, UtcOffset::UTC);
    driver.connect().await;
    driver.shutdown().await;

    let opened = driver.wait_until(Duration::from_millis(500), |s| s.connection().is_open()).await;
    assert!(!opened);
    assert!(driver.session().notice().is_none());
    assert!(matches!(driver.session().connection(), chat::ConnectionState::Closed { code: 1000, .. }));
}

#[test]
fn format_line_names_sender() {
    let at = datetime!(2024-03-05 14:05 UTC);
    let user = Message::user("Hello", at);
    assert_eq!(format_line(&user, UtcOffset::UTC), "[02:05 PM] You: Hello");

    let bot = Message::bot(None, "Hi", at);
    assert_eq!(format_line(&bot, UtcOffset::UTC), "[02:05 PM] Bot: Hi");

    let named = Message { sender: Sender::Named("Dana".into()), ..bot };
    assert_eq!(format_line(&named, UtcOffset::UTC), "[02:05 PM] Dana: Hi");
}

#[test]
fn stats_line_shows_level_progress() {
    let stats = WellnessStats { wellness_points: 140, level: 2, streak_days: 3, ..WellnessStats::default() };
    let line = stats_line(&stats);
    assert!(line.starts_with("Level 2 (40/100)"));
    assert!(line.ends_with("140 pts"));
}

#[test]
fn redact_hides_token_segment() {
    assert_eq!(redact("wss://host/ws/secret"), "wss://host/ws/***");
}
