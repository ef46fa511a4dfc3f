//! Login Page
//!
//! Sign-in and registration forms.

use leptos::*;
use leptos_router::use_navigate;

use crate::api;
use crate::state::global::GlobalState;

/// Login / registration page component
#[component]
pub fn Login() -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");

    let registering = create_rw_signal(false);
    let username = create_rw_signal(String::new());
    let email = create_rw_signal(String::new());
    let password = create_rw_signal(String::new());
    let busy = create_rw_signal(false);

    let navigate = use_navigate();

    let on_submit = {
        let state = state.clone();
        move |ev: leptos::ev::SubmitEvent| {
            ev.prevent_default();
            if busy.get() {
                return;
            }

            let state = state.clone();
            let navigate = navigate.clone();
            spawn_local(async move {
                busy.set(true);

                let result = if registering.get_untracked() {
                    api::register(
                        username.get_untracked().trim(),
                        email.get_untracked().trim(),
                        &password.get_untracked(),
                    )
                    .await
                } else {
                    api::sign_in(email.get_untracked().trim(), &password.get_untracked()).await
                };

                match result {
                    Ok(session) => {
                        state.show_success(&format!("Welcome, @{}", session.username));
                        state.set_session(session);
                        navigate("/", Default::default());
                    }
                    Err(e) => state.show_error(&e),
                }

                busy.set(false);
            });
        }
    };

    view! {
        <div class="max-w-md mx-auto mt-12">
            <div class="bg-gray-800 rounded-xl p-8 space-y-6">
                <div class="text-center">
                    <div class="text-4xl mb-2">"✒️"</div>
                    <h1 class="text-2xl font-bold">
                        {move || if registering.get() { "Create an account" } else { "Sign in" }}
                    </h1>
                </div>

                <form class="space-y-4" on:submit=on_submit>
                    {move || registering.get().then(|| view! {
                        <div>
                            <label class="block text-sm text-gray-400 mb-1">"Username"</label>
                            <input
                                type="text"
                                class="w-full bg-gray-700 rounded-lg px-3 py-2"
                                prop:value=move || username.get()
                                on:input=move |ev| username.set(event_target_value(&ev))
                            />
                        </div>
                    })}

                    <div>
                        <label class="block text-sm text-gray-400 mb-1">"Email"</label>
                        <input
                            type="email"
                            class="w-full bg-gray-700 rounded-lg px-3 py-2"
                            prop:value=move || email.get()
                            on:input=move |ev| email.set(event_target_value(&ev))
                        />
                    </div>

                    <div>
                        <label class="block text-sm text-gray-400 mb-1">"Password"</label>
                        <input
                            type="password"
                            class="w-full bg-gray-700 rounded-lg px-3 py-2"
                            prop:value=move || password.get()
                            on:input=move |ev| password.set(event_target_value(&ev))
                        />
                    </div>

                    <button
                        type="submit"
                        class="w-full py-2 bg-primary-600 hover:bg-primary-700 rounded-lg font-medium transition-colors"
                        disabled=move || busy.get()
                    >
                        {move || {
                            if busy.get() {
                                "Working..."
                            } else if registering.get() {
                                "Register"
                            } else {
                                "Sign in"
                            }
                        }}
                    </button>
                </form>

                <button
                    class="w-full text-sm text-gray-400 hover:text-white transition-colors"
                    on:click=move |_| registering.update(|r| *r = !*r)
                >
                    {move || {
                        if registering.get() {
                            "Already have an account? Sign in"
                        } else {
                            "New here? Create an account"
                        }
                    }}
                </button>
            </div>
        </div>
    }
}
