//! Token sign-in page.
//!
//! The portal's identity provider hands users a bearer token; this page
//! checks it against the profile endpoint, stores it, and returns to chat.

use leptos::prelude::*;

use crate::state::auth::{AuthState, normalize_token};

#[component]
pub fn SignInPage() -> impl IntoView {
    let auth = expect_context::<RwSignal<AuthState>>();
    let token = RwSignal::new(String::new());
    let info = RwSignal::new(String::new());
    let busy = RwSignal::new(false);

    let on_submit = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        if busy.get() {
            return;
        }
        let Some(candidate) = normalize_token(&token.get()) else {
            info.set("Paste your access token first.".to_owned());
            return;
        };
        busy.set(true);
        info.set("Checking token...".to_owned());

        #[cfg(feature = "hydrate")]
        leptos::task::spawn_local(async move {
            use crate::net::api::{self, FetchError};

            match api::verify_token(&api::endpoints(), &candidate).await {
                Ok(()) => {
                    auth.update(|a| {
                        a.sign_in(&candidate);
                    });
                    if let Some(window) = web_sys::window() {
                        let _ = window.location().set_href("/");
                    }
                }
                Err(FetchError::Unauthorized) => {
                    info.set("That token was rejected. Please sign in again.".to_owned());
                    busy.set(false);
                }
                Err(e) => {
                    info.set(format!("Could not verify token: {}", e.message()));
                    busy.set(false);
                }
            }
        });
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = (candidate, auth);
        }
    };

    view! {
        <div class="signin-page">
            <div class="signin-card">
                <h1>"Wellness Chat"</h1>
                <p class="signin-card__subtitle">"Sign in with your access token"</p>
                <form class="signin-form" on:submit=on_submit>
                    <input
                        class="signin-input"
                        type="password"
                        placeholder="Access token"
                        prop:value=move || token.get()
                        on:input=move |ev| token.set(event_target_value(&ev))
                    />
                    <button class="signin-button" type="submit" disabled=move || busy.get()>
                        "Sign In"
                    </button>
                </form>
                <Show when=move || !info.get().is_empty()>
                    <p class="signin-message">{move || info.get()}</p>
                </Show>
            </div>
        </div>
    }
}
