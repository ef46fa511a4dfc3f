//! Navigation Component
//!
//! Header navigation bar with logo, links and the sign-out button.

use leptos::*;
use leptos_router::*;

use crate::api;
use crate::state::global::GlobalState;

/// Navigation header component
#[component]
pub fn Nav() -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");

    let sign_out = {
        let state = state.clone();
        move |_| {
            let state = state.clone();
            spawn_local(async move {
                if let Some(token) = state.token() {
                    let _ = api::sign_out(&token).await;
                }
                state.clear_session();
                state.show_success("Signed out");
            });
        }
    };

    view! {
        <nav class="bg-gray-800 border-b border-gray-700">
            <div class="container mx-auto px-4">
                <div class="flex items-center justify-between h-16">
                    // Logo and brand
                    <A href="/" class="flex items-center space-x-3">
                        <span class="text-2xl">"✒️"</span>
                        <span class="text-xl font-bold text-white">"Arregmatica"</span>
                    </A>

                    // Navigation links
                    <div class="flex items-center space-x-1">
                        <NavLink href="/" label="Feed" />
                        <NavLink href="/tools" label="Tools" />
                        <NavLink href="/quiz" label="Quiz" />
                        <NavLink href="/chat" label="Chat" />
                        <NavLink href="/leaderboard" label="Leaderboard" />
                        <NavLink href="/admin" label="Admin" />

                        {move || {
                            if state.signed_in() {
                                view! {
                                    <button
                                        class="px-4 py-2 rounded-lg text-gray-300 hover:text-white hover:bg-gray-700 transition-colors"
                                        on:click=sign_out.clone()
                                    >
                                        "Sign out"
                                    </button>
                                }.into_view()
                            } else {
                                view! { <NavLink href="/login" label="Sign in" /> }.into_view()
                            }
                        }}
                    </div>
                </div>
            </div>
        </nav>
    }
}

/// Individual navigation link
#[component]
fn NavLink(
    href: &'static str,
    label: &'static str,
) -> impl IntoView {
    view! {
        <A
            href=href
            class="px-4 py-2 rounded-lg text-gray-300 hover:text-white hover:bg-gray-700 transition-colors"
            active_class="bg-gray-700 text-white"
        >
            {label}
        </A>
    }
}
