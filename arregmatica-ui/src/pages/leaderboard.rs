//! Leaderboard Page
//!
//! Quiz standings, refreshed live over the WebSocket.

use leptos::*;

use crate::api;
use crate::api::LeaderboardEntry;
use crate::components::ListSkeleton;
use crate::state::global::GlobalState;

/// Leaderboard page component
#[component]
pub fn Leaderboard() -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");

    let entries = create_rw_signal(Vec::<LeaderboardEntry>::new());
    let loaded = create_rw_signal(false);

    // Refetch whenever a score changes
    let state_for_effect = state.clone();
    create_effect(move |_| {
        state_for_effect.scores_version.get();
        let state = state_for_effect.clone();
        spawn_local(async move {
            match api::fetch_leaderboard().await {
                Ok(list) => entries.set(list),
                Err(e) => state.show_error(&e),
            }
            loaded.set(true);
        });
    });

    let my_uid = move || state.session.get().map(|s| s.uid);

    view! {
        <div class="max-w-xl mx-auto space-y-6">
            <div>
                <h1 class="text-3xl font-bold">"Leaderboard"</h1>
                <p class="text-gray-400 mt-1">"Quiz standings across all players."</p>
            </div>

            {move || {
                if !loaded.get() {
                    view! { <ListSkeleton count=5 /> }.into_view()
                } else if entries.get().is_empty() {
                    view! {
                        <p class="text-center text-gray-400 py-8">
                            "No scores yet. Be the first to play!"
                        </p>
                    }.into_view()
                } else {
                    view! {
                        <div class="bg-gray-800 rounded-xl divide-y divide-gray-700">
                            {entries.get().into_iter().map(|entry| {
                                let mine = my_uid() == Some(entry.uid.clone());
                                let medal = match entry.rank {
                                    1 => "🥇",
                                    2 => "🥈",
                                    3 => "🥉",
                                    _ => "",
                                };
                                view! {
                                    <div class=if mine {
                                        "flex items-center justify-between px-4 py-3 bg-gray-700/50"
                                    } else {
                                        "flex items-center justify-between px-4 py-3"
                                    }>
                                        <div class="flex items-center space-x-3">
                                            <span class="text-gray-400 w-8">{format!("#{}", entry.rank)}</span>
                                            <span class="font-medium">{format!("@{}", entry.username)}</span>
                                            <span>{medal}</span>
                                        </div>
                                        <span class="font-bold">{entry.total_score}</span>
                                    </div>
                                }
                            }).collect_view()}
                        </div>
                    }.into_view()
                }
            }}
        </div>
    }
}
