//! Online/offline indicator and connection notice.

#[cfg(test)]
#[path = "connection_badge_test.rs"]
mod connection_badge_test;

use chat::StatusBadge;
use leptos::prelude::*;

use crate::state::chat::ChatState;

#[component]
pub fn ConnectionBadge() -> impl IntoView {
    let chat = expect_context::<RwSignal<ChatState>>();
    let badge = move || chat.with(|c| c.session.status_badge());
    let notice = move || chat.with(|c| c.session.notice().map(str::to_owned));

    view! {
        <div class="connection">
            <span class=move || badge_class(badge())>{move || badge().label()}</span>
            {move || notice().map(|text| view! { <p class="connection__notice">{text}</p> })}
        </div>
    }
}

pub fn badge_class(badge: StatusBadge) -> &'static str {
    match badge {
        StatusBadge::Online => "connection__badge connection__badge--online",
        StatusBadge::Offline => "connection__badge connection__badge--offline",
        StatusBadge::Connecting => "connection__badge connection__badge--connecting",
    }
}
