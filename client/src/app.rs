//! Root component, HTML shell, and route table.

use leptos::prelude::*;
use leptos_meta::{MetaTags, Stylesheet, Title, provide_meta_context};
use leptos_router::components::{Route, Router, Routes};
use leptos_router::path;

use crate::pages::chat::ChatPage;
use crate::pages::signin::SignInPage;
use crate::state::auth::AuthState;
use crate::state::chat::ChatState;

/// Document shell rendered by the host for every SSR request.
pub fn shell(options: LeptosOptions) -> impl IntoView {
    view! {
        <!DOCTYPE html>
        <html lang="en">
            <head>
                <meta charset="utf-8" />
                <meta name="viewport" content="width=device-width, initial-scale=1" />
                <AutoReload options=options.clone() />
                <HydrationScripts options />
                <MetaTags />
            </head>
            <body>
                <App />
            </body>
        </html>
    }
}

/// Application root. Provides the shared auth and chat signals.
#[component]
pub fn App() -> impl IntoView {
    provide_meta_context();

    let auth = RwSignal::new(AuthState::restore());
    let chat = RwSignal::new(ChatState::default());
    provide_context(auth);
    provide_context(chat);

    view! {
        <Stylesheet id="leptos" href="/pkg/portal.css" />
        <Title text="Wellness Chat" />
        <Router>
            <main class="app">
                <Routes fallback=|| view! { <p class="app__missing">"Page not found."</p> }>
                    <Route path=path!("/") view=ChatPage />
                    <Route path=path!("/auth/signin") view=SignInPage />
                </Routes>
            </main>
        </Router>
    }
}
