//! Tokio driver for `ChatSession` effects.
//!
//! The session never touches the network. This driver executes its effects:
//! `Connect` spawns a `tokio-tungstenite` handshake that posts its outcome
//! back on a channel, `Transmit`/`Close` write to the open socket, and
//! `Schedule` spawns a sleep that posts the timer back the same way. Handshake
//! outcomes, socket frames and fired timers are fed into the session one at a
//! time from `wait`, so every session call happens on the driving task and a
//! slow handshake never holds up input or timers.
//!
//! Each `Connect` gets a generation number. A handshake that finishes after a
//! newer `Connect` or a `Close` is discarded and its socket closed.

#[cfg(test)]
#[path = "driver_test.rs"]
mod driver_test;

use std::time::Duration;

use chat::session::{ABNORMAL_CLOSURE, Presentation, StatusBadge};
use chat::{ChatSession, Effect, Message, Sender, Timer, WellnessStats};
use futures_util::{SinkExt, StreamExt};
use time::{OffsetDateTime, UtcOffset};
use tokio::io::{AsyncBufRead, Lines};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use crate::CliError;

/// Typed line that ends an interactive session.
pub const QUIT_COMMAND: &str = "/quit";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;
type Inbound = Option<Result<WsMessage, tokio_tungstenite::tungstenite::Error>>;
type ConnectOutcome = Result<Socket, String>;

enum Wake {
    Timer(Timer),
    Connected(u64, Box<ConnectOutcome>),
    Inbound(Inbound),
}

pub struct Driver {
    session: ChatSession,
    socket_url: String,
    socket: Option<Socket>,
    timer_tx: mpsc::UnboundedSender<Timer>,
    timer_rx: mpsc::UnboundedReceiver<Timer>,
    connect_tx: mpsc::UnboundedSender<(u64, ConnectOutcome)>,
    connect_rx: mpsc::UnboundedReceiver<(u64, ConnectOutcome)>,
    /// Generation of the handshake whose outcome is still wanted.
    connect_generation: u64,
    offset: UtcOffset,
    printed: usize,
    shown_notice: Option<String>,
    shown_presentation: Presentation,
    shown_badge: Option<StatusBadge>,
}

impl Driver {
    pub fn new(session: ChatSession, socket_url: String, offset: UtcOffset) -> Self {
        let (timer_tx, timer_rx) = mpsc::unbounded_channel();
        let (connect_tx, connect_rx) = mpsc::unbounded_channel();
        Self {
            session,
            socket_url,
            socket: None,
            timer_tx,
            timer_rx,
            connect_tx,
            connect_rx,
            connect_generation: 0,
            offset,
            printed: 0,
            shown_notice: None,
            shown_presentation: Presentation::default(),
            shown_badge: None,
        }
    }

    #[cfg(test)]
    pub fn session(&self) -> &ChatSession {
        &self.session
    }

    pub fn status_line(&self) -> String {
        format!("[{}] {}", self.session.status_badge().label(), stats_line(self.session.stats()))
    }

    /// Start opening the socket ahead of the first send. The outcome is
    /// applied from the event loop.
    pub async fn connect(&mut self) {
        let effects = self.session.connect();
        self.apply(effects).await;
    }

    /// Submit user text. Blank input does nothing.
    pub async fn send(&mut self, text: &str) {
        let effects = self.session.send(text, OffsetDateTime::now_utc());
        self.apply(effects).await;
    }

    /// Send `text` and wait up to `limit` for the first reply after it.
    pub async fn send_and_wait(&mut self, text: &str, limit: Duration) -> Option<Message> {
        let before = self.session.messages().len();
        self.send(text).await;
        let replied = self
            .wait_until(limit, |session| session.messages().iter().skip(before).any(|m| !m.is_from_user()))
            .await;
        if !replied {
            return None;
        }
        self.session.messages().iter().skip(before).find(|m| !m.is_from_user()).cloned()
    }

    /// Process socket frames and timers until `done` holds or `limit` passes.
    pub async fn wait_until(&mut self, limit: Duration, done: impl Fn(&ChatSession) -> bool) -> bool {
        let deadline = tokio::time::Instant::now() + limit;
        while !done(&self.session) {
            match tokio::time::timeout_at(deadline, self.wait()).await {
                Ok(wake) => self.handle(wake).await,
                Err(_) => return false,
            }
        }
        true
    }

    /// Read lines from `input` until `/quit` or end of input, printing the
    /// conversation as it changes.
    pub async fn run_interactive<R>(&mut self, mut input: Lines<R>) -> Result<(), CliError>
    where
        R: AsyncBufRead + Unpin,
    {
        enum Turn {
            Line(std::io::Result<Option<String>>),
            Wake(Wake),
        }

        self.print_new();
        loop {
            let turn = tokio::select! {
                line = input.next_line() => Turn::Line(line),
                wake = self.wait() => Turn::Wake(wake),
            };
            match turn {
                Turn::Line(line) => match line? {
                    Some(line) if line.trim() == QUIT_COMMAND => break,
                    Some(line) => {
                        self.send(&line).await;
                        // The echo of the user's own line is already on screen.
                        self.skip_printed();
                    }
                    None => break,
                },
                Turn::Wake(wake) => self.handle(wake).await,
            }
            self.print_new();
        }

        self.shutdown().await;
        Ok(())
    }

    /// Offline presence and a normal close.
    pub async fn shutdown(&mut self) {
        let effects = self.session.teardown();
        self.apply(effects).await;
    }

    pub fn print_new(&mut self) {
        for line in self.drain_output() {
            println!("{line}");
        }
    }

    /// Mark everything currently on the timeline as printed.
    pub fn skip_printed(&mut self) {
        self.printed = self.session.messages().len();
    }

    /// Lines describing what changed since the last call.
    pub fn drain_output(&mut self) -> Vec<String> {
        let mut lines = Vec::new();

        let badge = self.session.status_badge();
        if self.shown_badge != Some(badge) {
            lines.push(format!("-- {} --", badge.label()));
            self.shown_badge = Some(badge);
        }

        let notice = self.session.notice().map(str::to_owned);
        if notice != self.shown_notice {
            if let Some(text) = &notice {
                lines.push(format!("! {text}"));
            }
            self.shown_notice = notice;
        }

        let messages = self.session.messages();
        lines.extend(messages.iter().skip(self.printed).map(|m| format_line(m, self.offset)));
        self.printed = messages.len();

        let presentation = self.session.presentation();
        let stats = self.session.stats();
        if presentation.level_up && !self.shown_presentation.level_up {
            lines.push(format!("* Level up! You reached level {}.", stats.level));
        }
        if presentation.streak_bump && !self.shown_presentation.streak_bump {
            lines.push(format!("* Streak: {}", stats.streak_label()));
        }
        if let Some(points) = presentation.points_badge {
            if self.shown_presentation.points_badge != Some(points) {
                lines.push(format!("* +{points} pts"));
            }
        }
        self.shown_presentation = presentation;

        lines
    }

    // =========================================================
    // Event loop
    // =========================================================

    async fn wait(&mut self) -> Wake {
        tokio::select! {
            Some(timer) = self.timer_rx.recv() => Wake::Timer(timer),
            Some((generation, outcome)) = self.connect_rx.recv() => Wake::Connected(generation, Box::new(outcome)),
            inbound = next_inbound(&mut self.socket), if self.socket.is_some() => Wake::Inbound(inbound),
        }
    }

    async fn handle(&mut self, wake: Wake) {
        let now = OffsetDateTime::now_utc();
        let effects = match wake {
            Wake::Timer(timer) => self.session.on_timer(timer, now),
            Wake::Connected(generation, outcome) => {
                self.finish_connect(generation, *outcome).await;
                Vec::new()
            }
            Wake::Inbound(Some(Ok(WsMessage::Text(text)))) => self.session.receive(text.as_str(), now),
            Wake::Inbound(Some(Ok(WsMessage::Binary(bytes)))) => {
                self.session.receive(&String::from_utf8_lossy(&bytes), now)
            }
            Wake::Inbound(Some(Ok(WsMessage::Close(frame)))) => {
                let (code, reason) = frame.map_or((ABNORMAL_CLOSURE, String::new()), |f| {
                    (u16::from(f.code), f.reason.as_str().to_owned())
                });
                self.socket = None;
                self.session.on_close(code, &reason);
                Vec::new()
            }
            Wake::Inbound(Some(Ok(_))) => Vec::new(),
            Wake::Inbound(Some(Err(e))) => {
                tracing::warn!(error = %e, "chat socket failed");
                self.socket = None;
                self.session.on_transport_error(&e.to_string());
                Vec::new()
            }
            Wake::Inbound(None) => {
                self.socket = None;
                self.session.on_close(ABNORMAL_CLOSURE, "stream ended");
                Vec::new()
            }
        };
        self.apply(effects).await;
    }

    async fn apply(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Connect => self.start_connect(),
                Effect::Transmit(text) => self.transmit(text).await,
                Effect::Close { code, reason } => {
                    self.connect_generation += 1;
                    if let Some(mut socket) = self.socket.take() {
                        let frame = CloseFrame { code: CloseCode::from(code), reason: reason.into() };
                        if let Err(e) = socket.close(Some(frame)).await {
                            tracing::debug!(error = %e, "close handshake failed");
                        }
                    }
                }
                Effect::Schedule { after, timer } => {
                    let tx = self.timer_tx.clone();
                    tokio::spawn(async move {
                        tokio::time::sleep(after).await;
                        let _ = tx.send(timer);
                    });
                }
            }
        }
    }

    fn start_connect(&mut self) {
        self.connect_generation += 1;
        let generation = self.connect_generation;
        let url = self.socket_url.clone();
        let tx = self.connect_tx.clone();
        tracing::debug!(url = %redact(&url), generation, "connecting chat socket");
        tokio::spawn(async move {
            let outcome = match tokio::time::timeout(CONNECT_TIMEOUT, connect_async(url.as_str())).await {
                Ok(Ok((socket, _))) => Ok(socket),
                Ok(Err(e)) => Err(e.to_string()),
                Err(_) => Err("connect timed out".to_owned()),
            };
            let _ = tx.send((generation, outcome));
        });
    }

    async fn finish_connect(&mut self, generation: u64, outcome: ConnectOutcome) {
        let current = generation == self.connect_generation;
        match outcome {
            Ok(mut socket) => {
                if current && self.session.on_open() {
                    self.socket = Some(socket);
                } else {
                    tracing::debug!(generation, "closing superseded chat socket");
                    let _ = socket.close(None).await;
                }
            }
            Err(detail) if current => {
                tracing::warn!(error = %detail, "chat socket connect failed");
                self.session.on_transport_error(&detail);
            }
            Err(detail) => tracing::debug!(generation, error = %detail, "ignoring superseded connect failure"),
        }
    }

    async fn transmit(&mut self, text: String) {
        let Some(socket) = self.socket.as_mut() else {
            tracing::warn!("dropping outbound frame: socket not open");
            return;
        };
        if let Err(e) = socket.send(WsMessage::text(text)).await {
            tracing::warn!(error = %e, "chat socket send failed");
            self.socket = None;
            self.session.on_transport_error(&e.to_string());
        }
    }
}

async fn next_inbound(socket: &mut Option<Socket>) -> Inbound {
    match socket {
        Some(socket) => socket.next().await,
        None => std::future::pending().await,
    }
}

/// Socket URLs embed the token; keep it out of logs.
fn redact(url: &str) -> String {
    match url.rsplit_once('/') {
        Some((prefix, _)) => format!("{prefix}/***"),
        None => "***".to_owned(),
    }
}

/// `[09:05 AM] Bot: hello`.
pub fn format_line(message: &Message, offset: UtcOffset) -> String {
    let who = match &message.sender {
        Sender::User => "You",
        Sender::Bot => "Bot",
        Sender::Named(name) => name.as_str(),
    };
    format!("[{}] {who}: {}", chat::timeline::format_time(message.timestamp, offset), message.content)
}

pub fn stats_line(stats: &WellnessStats) -> String {
    format!(
        "Level {} ({}/{}) | Streak {} | {} pts",
        stats.level,
        stats.points_into_level(),
        chat::stats::POINTS_PER_LEVEL,
        stats.streak_label(),
        stats.wellness_points
    )
}

/// Seed for the session's fallback randomness.
#[allow(clippy::cast_possible_truncation)]
pub fn seed() -> u64 {
    OffsetDateTime::now_utc().unix_timestamp_nanos().unsigned_abs() as u64
}
