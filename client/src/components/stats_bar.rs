//! Level, streak and points header with transient celebration badges.

#[cfg(test)]
#[path = "stats_bar_test.rs"]
mod stats_bar_test;

use chat::WellnessStats;
use chat::stats::POINTS_PER_LEVEL;
use leptos::prelude::*;

use crate::state::chat::ChatState;
#[cfg(feature = "hydrate")]
use crate::util::counter::{COUNTER_DURATION_MS, COUNTER_FRAME_MS, counter_value};

#[component]
pub fn StatsBar() -> impl IntoView {
    let chat = expect_context::<RwSignal<ChatState>>();
    let stats = move || chat.with(|c| *c.session.stats());
    let presentation = move || chat.with(|c| c.session.presentation());
    let points = Signal::derive(move || stats().wellness_points);

    view! {
        <div class="stats-bar">
            <span class="stats-bar__item stats-bar__level">
                {move || level_label(&stats())}
                <Show when=move || presentation().level_up>
                    <span class="stats-bar__badge stats-bar__badge--level">"Level up!"</span>
                </Show>
            </span>
            <span class="stats-bar__item stats-bar__streak">
                {move || stats().streak_label()}
                <Show when=move || presentation().streak_bump>
                    <span class="stats-bar__badge stats-bar__badge--streak">"+1"</span>
                </Show>
            </span>
            <span class="stats-bar__item stats-bar__points">
                <AnimatedCounter target=points />
                " pts"
                {move || {
                    presentation()
                        .points_badge
                        .map(|n| view! { <span class="stats-bar__badge stats-bar__badge--points">{points_badge_label(n)}</span> })
                }}
            </span>
        </div>
    }
}

/// Counts up from zero to `target` whenever it changes.
#[component]
pub fn AnimatedCounter(#[prop(into)] target: Signal<u32>) -> impl IntoView {
    let shown = RwSignal::new(target.get_untracked());

    #[cfg(feature = "hydrate")]
    {
        let generation = RwSignal::new(0_u64);
        Effect::new(move || {
            let goal = target.get();
            let run = generation.get_untracked().wrapping_add(1);
            generation.set(run);
            leptos::task::spawn_local(async move {
                let started = js_sys::Date::now();
                loop {
                    if generation.try_get_untracked() != Some(run) {
                        return;
                    }
                    let elapsed = js_sys::Date::now() - started;
                    if shown.try_set(counter_value(goal, elapsed, COUNTER_DURATION_MS)).is_some() {
                        return;
                    }
                    if elapsed >= COUNTER_DURATION_MS {
                        return;
                    }
                    gloo_timers::future::sleep(std::time::Duration::from_millis(COUNTER_FRAME_MS)).await;
                }
            });
        });
    }

    view! { <span class="stats-bar__counter">{move || shown.get()}</span> }
}

/// `Level 2 (40/100)`.
pub fn level_label(stats: &WellnessStats) -> String {
    format!("Level {} ({}/{POINTS_PER_LEVEL})", stats.level, stats.points_into_level())
}

pub fn points_badge_label(points: u32) -> String {
    format!("+{points}")
}
