//! Day-grouped message list with typing and loading indicators.

#[cfg(test)]
#[path = "timeline_test.rs"]
mod timeline_test;

use chat::timeline::format_time;
use chat::{Message, Sender};
use leptos::prelude::*;
use leptos::tachys::view::any_view::IntoAny;

use crate::state::chat::ChatState;
use crate::util::clock;
use crate::util::markdown::render_markdown_html;

#[component]
pub fn Timeline() -> impl IntoView {
    let chat = expect_context::<RwSignal<ChatState>>();
    let loading = move || chat.with(|c| c.session.is_loading_history());
    let typing = move || chat.with(|c| c.session.is_typing());

    let groups = move || {
        let offset = clock::local_offset();
        let today = clock::now().to_offset(offset).date();
        (chat.with(|c| c.session.grouped(today, offset)), offset)
    };

    view! {
        <div class="timeline">
            <Show when=loading>
                <div class="timeline__loading">"Loading chat history..."</div>
            </Show>
            {move || {
                let (groups, offset) = groups();
                if groups.is_empty() && !loading() {
                    return view! { <div class="timeline__empty">"Say hello to start the conversation."</div> }
                        .into_any();
                }
                groups
                    .into_iter()
                    .map(|group| {
                        let label = group.label();
                        let bubbles = group
                            .messages
                            .iter()
                            .map(|message| view! { <MessageBubble message=message.clone() offset=offset /> })
                            .collect::<Vec<_>>();
                        view! {
                            <section class="timeline__day">
                                <h3 class="timeline__day-label">{label}</h3>
                                {bubbles}
                            </section>
                        }
                    })
                    .collect::<Vec<_>>()
                    .into_any()
            }}
            <Show when=typing>
                <div class="timeline__typing">
                    <span></span>
                    <span></span>
                    <span></span>
                </div>
            </Show>
        </div>
    }
}

#[component]
fn MessageBubble(message: Message, offset: time::UtcOffset) -> impl IntoView {
    let class = bubble_class(&message);
    let caption = sender_caption(&message);
    let time = format_time(message.timestamp, offset);
    let body = if message.is_from_user() {
        view! { <p class="bubble__text">{message.content.clone()}</p> }.into_any()
    } else {
        let rendered = render_markdown_html(&message.content);
        view! { <div class="bubble__text bubble__markdown" inner_html=rendered></div> }.into_any()
    };

    view! {
        <div class=class>
            {caption.map(|name| view! { <span class="bubble__sender">{name}</span> })}
            {body}
            <span class="bubble__time">{time}</span>
        </div>
    }
}

pub fn bubble_class(message: &Message) -> &'static str {
    match message.sender {
        Sender::User => "bubble bubble--user",
        Sender::Bot => "bubble bubble--bot",
        Sender::Named(_) => "bubble bubble--named",
    }
}

/// Name shown above bubbles from a named participant.
pub fn sender_caption(message: &Message) -> Option<String> {
    match &message.sender {
        Sender::Named(name) => Some(name.clone()),
        Sender::User | Sender::Bot => None,
    }
}
