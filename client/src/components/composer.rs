//! Quick responses and message input.

#[cfg(test)]
#[path = "composer_test.rs"]
mod composer_test;

use chat::fallback::QUICK_RESPONSES;
use leptos::prelude::*;

/// Input row. `on_send` receives trimmed, non-empty text.
#[component]
pub fn Composer(#[prop(into)] disabled: Signal<bool>, on_send: Callback<String>) -> impl IntoView {
    let draft = RwSignal::new(String::new());

    let submit = move || {
        if disabled.get_untracked() {
            return;
        }
        if let Some(text) = submittable(&draft.get_untracked()) {
            draft.set(String::new());
            on_send.run(text);
        }
    };

    let on_keydown = move |ev: leptos::ev::KeyboardEvent| {
        if ev.key() == "Enter" && !ev.shift_key() {
            ev.prevent_default();
            submit();
        }
    };
    let can_send = move || !disabled.get() && submittable(&draft.get()).is_some();

    view! {
        <div class="composer">
            <div class="composer__quick">
                {QUICK_RESPONSES
                    .iter()
                    .map(|reply| {
                        let text = (*reply).to_owned();
                        view! {
                            <button
                                class="composer__quick-reply"
                                disabled=move || disabled.get()
                                on:click=move |_| on_send.run(text.clone())
                            >
                                {*reply}
                            </button>
                        }
                    })
                    .collect::<Vec<_>>()}
            </div>
            <div class="composer__row">
                <input
                    class="composer__input"
                    type="text"
                    placeholder="Type your message..."
                    disabled=move || disabled.get()
                    prop:value=move || draft.get()
                    on:input=move |ev| draft.set(event_target_value(&ev))
                    on:keydown=on_keydown
                />
                <button class="composer__send" on:click=move |_| submit() disabled=move || !can_send()>
                    "Send"
                </button>
            </div>
        </div>
    }
}

/// Trimmed draft, or `None` when there is nothing to send.
pub fn submittable(draft: &str) -> Option<String> {
    let text = draft.trim();
    if text.is_empty() { None } else { Some(text.to_owned()) }
}
