//! Chat Page
//!
//! Group list, message view and composer.

use leptos::*;
use leptos_router::*;

use crate::api;
use crate::api::{Group, Message};
use crate::components::post_card::format_time;
use crate::state::global::GlobalState;

/// Chat page component
#[component]
pub fn Chat() -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");

    let groups = create_rw_signal(Vec::<Group>::new());
    let selected = create_rw_signal(None::<String>);
    let messages = create_rw_signal(Vec::<Message>::new());
    let new_group = create_rw_signal(String::new());
    let draft = create_rw_signal(String::new());

    // Refetch groups and the open conversation on chat events
    let state_for_effect = state.clone();
    create_effect(move |_| {
        state_for_effect.chat_version.get();
        let state = state_for_effect.clone();
        let open = selected.get();
        spawn_local(async move {
            match api::fetch_groups().await {
                Ok(list) => groups.set(list),
                Err(e) => state.show_error(&e),
            }
            if let Some(name) = open {
                match api::fetch_messages(&name).await {
                    Ok(list) => messages.set(list),
                    Err(e) => state.show_error(&e),
                }
            }
        });
    });

    let open_group = {
        let state = state.clone();
        move |name: String| {
            selected.set(Some(name.clone()));
            let state = state.clone();
            spawn_local(async move {
                match api::fetch_messages(&name).await {
                    Ok(list) => messages.set(list),
                    Err(e) => state.show_error(&e),
                }
            });
        }
    };

    let on_create = {
        let state = state.clone();
        let open_group = open_group.clone();
        move |ev: leptos::ev::SubmitEvent| {
            ev.prevent_default();
            let name = new_group.get();
            if name.trim().is_empty() {
                return;
            }
            let Some(token) = state.token() else {
                state.show_error("Sign in to create a group");
                return;
            };
            let state = state.clone();
            let open_group = open_group.clone();
            spawn_local(async move {
                match api::create_group(&token, name.trim()).await {
                    Ok(group) => {
                        new_group.set(String::new());
                        state.chat_version.update(|v| *v += 1);
                        open_group(group.name);
                    }
                    Err(e) => state.show_error(&e),
                }
            });
        }
    };

    let on_join = {
        let state = state.clone();
        move |name: String| {
            let Some(token) = state.token() else {
                state.show_error("Sign in to join a group");
                return;
            };
            let state = state.clone();
            spawn_local(async move {
                match api::join_group(&token, &name).await {
                    Ok(()) => state.show_success(&format!("Joined {}", name)),
                    Err(e) => state.show_error(&e),
                }
            });
        }
    };

    let on_send = {
        let state = state.clone();
        move |ev: leptos::ev::SubmitEvent| {
            ev.prevent_default();
            let text = draft.get();
            if text.trim().is_empty() {
                return;
            }
            let Some(name) = selected.get() else { return };
            let Some(token) = state.token() else {
                state.show_error("Sign in to send messages");
                return;
            };
            let state = state.clone();
            spawn_local(async move {
                match api::send_message(&token, &name, text.trim(), None).await {
                    Ok(message) => {
                        messages.update(|list| list.push(message));
                        draft.set(String::new());
                    }
                    Err(e) => state.show_error(&e),
                }
            });
        }
    };

    view! {
        <div class="max-w-4xl mx-auto">
            <div class="grid md:grid-cols-3 gap-6">
                // Group list
                <div class="space-y-4">
                    <h2 class="text-xl font-bold">"Groups"</h2>

                    <form class="flex space-x-2" on:submit=on_create>
                        <input
                            type="text"
                            class="flex-1 bg-gray-700 rounded-lg px-3 py-2 text-sm"
                            placeholder="New group name"
                            prop:value=move || new_group.get()
                            on:input=move |ev| new_group.set(event_target_value(&ev))
                        />
                        <button
                            type="submit"
                            class="px-3 py-2 bg-primary-600 hover:bg-primary-700 rounded-lg text-sm"
                        >
                            "+"
                        </button>
                    </form>

                    <div class="space-y-2">
                        {move || {
                            let open_group = open_group.clone();
                            let on_join = on_join.clone();
                            groups.get().into_iter().map(|group| {
                                let name = group.name.clone();
                                let open_group = open_group.clone();
                                let on_join = on_join.clone();
                                let join_name = group.name.clone();
                                let is_open = selected.get().as_deref() == Some(group.name.as_str());
                                view! {
                                    <div class=if is_open {
                                        "bg-gray-700 rounded-lg p-3 cursor-pointer"
                                    } else {
                                        "bg-gray-800 hover:bg-gray-700 rounded-lg p-3 cursor-pointer transition-colors"
                                    }>
                                        <div on:click=move |_| open_group(name.clone())>
                                            <div class="font-medium">{group.name.clone()}</div>
                                            <div class="text-sm text-gray-400">
                                                {format!("{} members", group.member_count)}
                                            </div>
                                        </div>
                                        <button
                                            class="text-xs text-primary-400 hover:underline mt-1"
                                            on:click=move |_| on_join(join_name.clone())
                                        >
                                            "Join"
                                        </button>
                                    </div>
                                }
                            }).collect_view()
                        }}
                    </div>
                </div>

                // Conversation
                <div class="md:col-span-2 space-y-4">
                    {move || {
                        match selected.get() {
                            None => view! {
                                <div class="bg-gray-800 rounded-xl p-12 text-center text-gray-400">
                                    "Pick a group to start chatting."
                                </div>
                            }.into_view(),
                            Some(name) => {
                                let on_send = on_send.clone();
                                view! {
                                    <h2 class="text-xl font-bold">{name}</h2>

                                    <div class="bg-gray-800 rounded-xl p-4 h-96 overflow-y-auto space-y-3">
                                        {move || {
                                            messages.get().into_iter().map(|msg| {
                                                if msg.system {
                                                    view! {
                                                        <div class="text-center text-xs text-gray-500">
                                                            {msg.text}
                                                        </div>
                                                    }.into_view()
                                                } else {
                                                    view! {
                                                        <div>
                                                            <div class="flex items-baseline space-x-2">
                                                                <span class="font-semibold text-sm">{msg.sender}</span>
                                                                <span class="text-xs text-gray-500">{format_time(msg.sent_at)}</span>
                                                            </div>
                                                            <p class="text-sm text-gray-200">{msg.text}</p>
                                                            {msg.attachment_id.map(|id| view! {
                                                                <img
                                                                    src=api::media_url(&id)
                                                                    class="mt-1 max-w-xs rounded-lg"
                                                                />
                                                            })}
                                                        </div>
                                                    }.into_view()
                                                }
                                            }).collect_view()
                                        }}
                                    </div>

                                    <form class="flex space-x-2" on:submit=on_send>
                                        <input
                                            type="text"
                                            class="flex-1 bg-gray-700 rounded-lg px-3 py-2"
                                            placeholder="Message (members only)"
                                            prop:value=move || draft.get()
                                            on:input=move |ev| draft.set(event_target_value(&ev))
                                        />
                                        <button
                                            type="submit"
                                            class="px-6 py-2 bg-primary-600 hover:bg-primary-700 rounded-lg font-medium transition-colors"
                                        >
                                            "Send"
                                        </button>
                                    </form>
                                }.into_view()
                            }
                        }
                    }}

                    {move || {
                        (!state.signed_in()).then(|| view! {
                            <div class="text-center text-sm text-gray-400">
                                <A href="/login" class="text-primary-400 hover:underline">"Sign in"</A>
                                " to join groups and send messages."
                            </div>
                        })
                    }}
                </div>
            </div>
        </div>
    }
}
