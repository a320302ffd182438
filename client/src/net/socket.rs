//! Browser driver for the chat session's effects.
//!
//! `SocketDriver::run` executes the `chat::Effect`s returned by every session
//! call: `Connect` spawns the socket task, `Transmit`/`Close` go to that task
//! over a channel, and `Schedule` spawns a `gloo-timers` sleep that feeds the
//! timer back through `on_timer`. Every session mutation goes through the
//! `RwSignal<ChatState>`, so socket and timer callbacks are serialized on the
//! UI thread.
//!
//! The live connection handle is module-scoped (`thread_local!`), so it
//! survives component re-renders; a new `Connect` replaces it and the old task
//! winds down when its channel closes. Every handle carries a generation, and
//! a socket task reports to the session only while its generation is still
//! installed, so a handshake that outlives a teardown or remount cannot
//! touch the newer connection's state.
//!
//! ERROR HANDLING
//! ==============
//! Transport failures are reported to the session (which shows the offline
//! notice) and logged. Nothing is retried here; the session decides when to
//! reconnect. Callbacks arriving after the signal is disposed are ignored.

#[cfg(test)]
#[path = "socket_test.rs"]
mod socket_test;

use chat::{Effect, Endpoints};
use leptos::prelude::{RwSignal, Update};

use crate::state::chat::ChatState;

/// How often the socket task polls for the handshake to finish.
#[cfg(feature = "hydrate")]
const OPEN_POLL_MS: u64 = 25;

/// Instruction for the socket task.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SocketCommand {
    Transmit(String),
    Close { code: u16, reason: String },
}

/// Socket-bound part of an effect, if any.
pub fn command_for(effect: &Effect) -> Option<SocketCommand> {
    match effect {
        Effect::Transmit(text) => Some(SocketCommand::Transmit(text.clone())),
        Effect::Close { code, reason } => Some(SocketCommand::Close { code: *code, reason: reason.clone() }),
        Effect::Connect | Effect::Schedule { .. } => None,
    }
}

/// The one live connection handle plus the generation it was installed under.
#[derive(Debug)]
pub struct ConnectionSlot<T> {
    generation: u64,
    handle: Option<T>,
}

impl<T> ConnectionSlot<T> {
    pub const fn new() -> Self {
        Self { generation: 0, handle: None }
    }

    /// Replace the live handle. Returns the new handle's generation.
    pub fn install(&mut self, handle: T) -> u64 {
        self.generation = self.generation.wrapping_add(1);
        self.handle = Some(handle);
        self.generation
    }

    /// Whether the task started under `generation` still owns the slot.
    pub fn is_current(&self, generation: u64) -> bool {
        self.handle.is_some() && self.generation == generation
    }

    pub fn handle(&self) -> Option<&T> {
        self.handle.as_ref()
    }

    /// Drop the live handle; its task stops reporting to the session.
    pub fn release(&mut self) -> Option<T> {
        self.handle.take()
    }

    /// Release only if `generation` still owns the slot.
    pub fn release_if_current(&mut self, generation: u64) {
        if self.is_current(generation) {
            self.handle = None;
        }
    }
}

impl<T> Default for ConnectionSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "hydrate")]
type CommandSender = futures::channel::mpsc::UnboundedSender<SocketCommand>;

#[cfg(feature = "hydrate")]
thread_local! {
    static SOCKET: std::cell::RefCell<ConnectionSlot<CommandSender>> =
        const { std::cell::RefCell::new(ConnectionSlot::new()) };
}

#[derive(Clone, Debug)]
pub struct SocketDriver {
    chat: RwSignal<ChatState>,
    socket_url: String,
}

impl SocketDriver {
    pub fn new(chat: RwSignal<ChatState>, endpoints: &Endpoints, token: &str) -> Self {
        Self { chat, socket_url: endpoints.socket_url(token) }
    }

    pub fn socket_url(&self) -> &str {
        &self.socket_url
    }

    /// Execute effects in order.
    pub fn run(&self, effects: Vec<Effect>) {
        for effect in effects {
            #[cfg(feature = "hydrate")]
            {
                match effect {
                    Effect::Connect => self.connect(),
                    Effect::Schedule { after, timer } => self.schedule(after, timer),
                    other => {
                        if let Some(command) = command_for(&other) {
                            self.dispatch(command);
                        }
                    }
                }
            }
            #[cfg(not(feature = "hydrate"))]
            {
                let _ = effect;
            }
        }
    }

    /// Apply a session call and run whatever it returns.
    pub fn apply<F>(&self, call: F)
    where
        F: FnOnce(&mut chat::ChatSession) -> Vec<Effect>,
    {
        let effects = self.chat.try_update(|state| call(&mut state.session)).unwrap_or_default();
        self.run(effects);
    }

    /// Session end: offline presence and a normal close, best effort.
    pub fn teardown(&self) {
        self.apply(chat::ChatSession::teardown);
    }

    #[cfg(feature = "hydrate")]
    fn dispatch(&self, command: SocketCommand) {
        let closing = matches!(command, SocketCommand::Close { .. });
        let delivered = SOCKET.with(|slot| {
            let mut slot = slot.borrow_mut();
            let delivered = slot.handle().is_some_and(|tx| tx.unbounded_send(command).is_ok());
            if closing {
                slot.release();
            }
            delivered
        });
        if !delivered {
            leptos::logging::warn!("chat socket command dropped: no live connection");
        }
    }

    #[cfg(feature = "hydrate")]
    fn connect(&self) {
        let (tx, rx) = futures::channel::mpsc::unbounded::<SocketCommand>();
        let generation = SOCKET.with(|slot| slot.borrow_mut().install(tx));
        let driver = self.clone();
        leptos::task::spawn_local(async move {
            driver.socket_task(generation, rx).await;
            SOCKET.with(|slot| slot.borrow_mut().release_if_current(generation));
        });
    }

    #[cfg(feature = "hydrate")]
    fn schedule(&self, after: std::time::Duration, timer: chat::Timer) {
        let driver = self.clone();
        leptos::task::spawn_local(async move {
            gloo_timers::future::sleep(after).await;
            let now = crate::util::clock::now();
            driver.apply(move |session| session.on_timer(timer, now));
        });
    }

    /// Run `call` on the session if the task of `generation` still owns the
    /// connection slot.
    #[cfg(feature = "hydrate")]
    fn report<R>(&self, generation: u64, call: impl FnOnce(&mut chat::ChatSession) -> R) -> Option<R> {
        if !SOCKET.with(|slot| slot.borrow().is_current(generation)) {
            return None;
        }
        self.chat.try_update(|state| call(&mut state.session))
    }

    /// Own one connection from handshake to close.
    #[cfg(feature = "hydrate")]
    async fn socket_task(&self, generation: u64, mut commands: futures::channel::mpsc::UnboundedReceiver<SocketCommand>) {
        use futures::future::{Either, select};
        use futures::{SinkExt, StreamExt};
        use gloo_net::websocket::futures::WebSocket;
        use gloo_net::websocket::{Message, State, WebSocketError};

        enum Step {
            Inbound(Option<Result<Message, WebSocketError>>),
            Command(Option<SocketCommand>),
        }

        let mut ws = match WebSocket::open(&self.socket_url) {
            Ok(ws) => ws,
            Err(e) => {
                leptos::logging::warn!("chat socket open failed: {e}");
                self.report(generation, |s| s.on_transport_error(&e.to_string()));
                return;
            }
        };

        loop {
            match ws.state() {
                State::Connecting => gloo_timers::future::sleep(std::time::Duration::from_millis(OPEN_POLL_MS)).await,
                State::Open => break,
                State::Closing | State::Closed => {
                    leptos::logging::warn!("chat socket closed during handshake");
                    self.report(generation, |s| s.on_transport_error("closed during handshake"));
                    return;
                }
            }
        }

        if !self.report(generation, chat::ChatSession::on_open).unwrap_or(false) {
            let _ = ws.close(Some(chat::session::NORMAL_CLOSURE), None);
            return;
        }
        leptos::logging::log!("chat socket open");

        loop {
            let step = match select(ws.next(), commands.next()).await {
                Either::Left((inbound, _)) => Step::Inbound(inbound),
                Either::Right((command, _)) => Step::Command(command),
            };

            match step {
                Step::Inbound(Some(Ok(message))) => {
                    let text = match message {
                        Message::Text(text) => text,
                        Message::Bytes(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
                    };
                    if !SOCKET.with(|slot| slot.borrow().is_current(generation)) {
                        continue;
                    }
                    let now = crate::util::clock::now();
                    self.apply(move |session| session.receive(&text, now));
                }
                Step::Inbound(Some(Err(WebSocketError::ConnectionClose(event)))) => {
                    self.report(generation, |s| s.on_close(event.code, &event.reason));
                    break;
                }
                Step::Inbound(Some(Err(e))) => {
                    leptos::logging::warn!("chat socket error: {e}");
                    self.report(generation, |s| s.on_transport_error(&e.to_string()));
                    break;
                }
                Step::Inbound(None) => {
                    self.report(generation, |s| s.on_close(chat::session::ABNORMAL_CLOSURE, ""));
                    break;
                }
                Step::Command(Some(SocketCommand::Transmit(text))) => {
                    if let Err(e) = ws.send(Message::Text(text)).await {
                        leptos::logging::warn!("chat socket send failed: {e}");
                    }
                }
                Step::Command(Some(SocketCommand::Close { code, reason })) => {
                    let _ = ws.close(Some(code), Some(&reason));
                    self.report(generation, |s| s.on_close(code, &reason));
                    break;
                }
                // Handle replaced by a newer connection.
                Step::Command(None) => {
                    let _ = ws.close(Some(chat::session::NORMAL_CLOSURE), None);
                    break;
                }
            }
        }
    }
}
