//! Chat page: greeting, stats, timeline and composer.
//!
//! SYSTEM CONTEXT
//! ==============
//! On mount the page loads history with the stored token, then opens the
//! socket. A missing or rejected token clears auth and redirects to
//! `/auth/signin`. Leaving the page (route change or unload) tears the
//! session down with an offline presence frame and a normal close.

#[cfg(test)]
#[path = "chat_test.rs"]
mod chat_test;

use chat::ChatUser;
use leptos::prelude::*;
#[cfg(feature = "hydrate")]
use leptos_router::NavigateOptions;
#[cfg(feature = "hydrate")]
use leptos_router::hooks::use_navigate;

use crate::components::composer::Composer;
use crate::components::connection_badge::ConnectionBadge;
use crate::components::stats_bar::StatsBar;
use crate::components::timeline::Timeline;
use crate::net::api;
use crate::net::socket::SocketDriver;
use crate::state::auth::AuthState;
use crate::state::chat::ChatState;
use crate::util::clock;

pub const SIGNIN_PATH: &str = "/auth/signin";

#[component]
pub fn ChatPage() -> impl IntoView {
    let auth = expect_context::<RwSignal<AuthState>>();
    let chat = expect_context::<RwSignal<ChatState>>();

    #[cfg(feature = "hydrate")]
    start_session(auth, chat, use_navigate());

    #[cfg(feature = "hydrate")]
    {
        let unload = window_event_listener(leptos::ev::beforeunload, move |_| {
            if let Some(driver) = driver_for(auth, chat) {
                driver.teardown();
            }
        });
        on_cleanup(move || {
            unload.remove();
            if let Some(driver) = driver_for(auth, chat) {
                driver.teardown();
            }
            chat.try_update(|c| c.started = false);
        });
    }

    let on_send = Callback::new(move |text: String| {
        let Some(driver) = driver_for(auth, chat) else {
            return;
        };
        let now = clock::now();
        driver.apply(move |session| session.send(&text, now));
    });

    let greeting = move || chat.with(|c| greeting_text(c.session.user()));
    let composer_disabled = Signal::derive(move || !chat.with(ChatState::composer_enabled));

    view! {
        <div class="chat-page">
            <header class="chat-page__header">
                <h1 class="chat-page__greeting">{greeting}</h1>
                <ConnectionBadge />
            </header>
            <StatsBar />
            <Timeline />
            <Composer disabled=composer_disabled on_send=on_send />
        </div>
    }
}

/// Header text; generic until history names the user.
pub fn greeting_text(user: Option<&ChatUser>) -> String {
    user.map_or_else(|| "Hello there".to_owned(), ChatUser::greeting)
}

fn driver_for(auth: RwSignal<AuthState>, chat: RwSignal<ChatState>) -> Option<SocketDriver> {
    let token = auth.try_with_untracked(|a| a.token.clone()).flatten()?;
    Some(SocketDriver::new(chat, &api::endpoints(), &token))
}

/// Load history once per mount, then connect.
#[cfg(feature = "hydrate")]
fn start_session<F>(auth: RwSignal<AuthState>, chat: RwSignal<ChatState>, navigate: F)
where
    F: Fn(&str, NavigateOptions) + Clone + 'static,
{
    use chat::History;

    use crate::net::api::FetchError;

    Effect::new(move || {
        let Some(token) = auth.with(|a| a.token.clone()) else {
            chat.update(|c| c.session.token_missing());
            navigate(SIGNIN_PATH, NavigateOptions::default());
            return;
        };
        if chat.with_untracked(|c| c.started) {
            return;
        }
        chat.update(|c| {
            *c = ChatState::new(clock::seed());
            c.started = true;
        });

        let endpoints = api::endpoints();
        let driver = SocketDriver::new(chat, &endpoints, &token);
        let navigate = navigate.clone();
        leptos::task::spawn_local(async move {
            match api::fetch_history(&endpoints, &token).await {
                Ok(chats) => {
                    let history = History::from_user_chats(chats, clock::local_offset(), clock::now());
                    chat.try_update(|c| c.session.load_history(history));
                }
                Err(FetchError::Unauthorized) => {
                    auth.try_update(AuthState::sign_out);
                    navigate(SIGNIN_PATH, NavigateOptions::default());
                    return;
                }
                Err(e) => {
                    leptos::logging::warn!("chat history fetch failed: {}", e.message());
                    chat.try_update(|c| c.session.history_failed());
                }
            }
            driver.apply(chat::ChatSession::connect);
        });
    });
}
