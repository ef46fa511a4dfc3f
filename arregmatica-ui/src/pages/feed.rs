//! Feed Page
//!
//! Stories strip, post composer and the timeline.

use leptos::*;
use leptos_router::*;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use crate::api;
use crate::api::{Post, Story};
use crate::components::{ListSkeleton, PostCard};
use crate::state::global::GlobalState;

/// Read a picked file as (base64 payload, content type) via a data URL
fn read_file(file: web_sys::File, on_ready: impl Fn(String, String) + 'static) {
    let content_type = file.type_();
    let reader = match web_sys::FileReader::new() {
        Ok(reader) => reader,
        Err(_) => return,
    };

    let reader_clone = reader.clone();
    let onload = Closure::wrap(Box::new(move |_: web_sys::Event| {
        if let Ok(result) = reader_clone.result() {
            if let Some(data_url) = result.as_string() {
                // "data:image/png;base64,AAAA" -> payload after the comma
                if let Some((_, payload)) = data_url.split_once(',') {
                    on_ready(payload.to_string(), content_type.clone());
                }
            }
        }
    }) as Box<dyn FnMut(web_sys::Event)>);

    reader.set_onloadend(Some(onload.as_ref().unchecked_ref()));
    onload.forget();
    let _ = reader.read_as_data_url(&file);
}

/// Pull the first picked file out of an input change event
fn picked_file(ev: &leptos::ev::Event) -> Option<web_sys::File> {
    let input: web_sys::HtmlInputElement = ev.target()?.dyn_into().ok()?;
    input.files()?.get(0)
}

/// Feed page component
#[component]
pub fn Feed() -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");

    let posts = create_rw_signal(Vec::<Post>::new());
    let stories = create_rw_signal(Vec::<Story>::new());
    let loaded = create_rw_signal(false);

    // Refetch whenever a store event touches posts
    let state_for_feed = state.clone();
    create_effect(move |_| {
        state_for_feed.feed_version.get();
        let state = state_for_feed.clone();
        spawn_local(async move {
            match api::fetch_timeline().await {
                Ok(list) => posts.set(list),
                Err(e) => state.show_error(&e),
            }
            loaded.set(true);
        });
    });

    // Refetch stories on story events
    let state_for_stories = state.clone();
    create_effect(move |_| {
        state_for_stories.stories_version.get();
        let state = state_for_stories.clone();
        spawn_local(async move {
            match api::fetch_stories().await {
                Ok(list) => stories.set(list),
                Err(e) => state.show_error(&e),
            }
        });
    });

    view! {
        <div class="max-w-2xl mx-auto space-y-6">
            <StoriesStrip stories=stories />

            {move || {
                if state.signed_in() {
                    view! { <Composer /> }.into_view()
                } else {
                    view! {
                        <div class="bg-gray-800 rounded-xl p-4 text-center text-gray-400">
                            <A href="/login" class="text-primary-400 hover:underline">
                                "Sign in"
                            </A>
                            " to post, like and comment."
                        </div>
                    }.into_view()
                }
            }}

            // Timeline
            {move || {
                if !loaded.get() {
                    view! { <ListSkeleton count=4 /> }.into_view()
                } else if posts.get().is_empty() {
                    view! {
                        <p class="text-center text-gray-400 py-8">"Nothing here yet. Say something!"</p>
                    }.into_view()
                } else {
                    posts.get().into_iter().map(|post| view! {
                        <PostCard post=post />
                    }).collect_view()
                }
            }}
        </div>
    }
}

/// Horizontal strip of active stories with the upload button
#[component]
fn StoriesStrip(stories: RwSignal<Vec<Story>>) -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");

    let on_pick = {
        let state = state.clone();
        move |ev: leptos::ev::Event| {
            let Some(file) = picked_file(&ev) else { return };
            let Some(token) = state.token() else {
                state.show_error("Sign in to post a story");
                return;
            };
            let state = state.clone();
            read_file(file, move |payload, content_type| {
                let state = state.clone();
                let token = token.clone();
                spawn_local(async move {
                    let upload = match api::upload_media(&token, &payload, &content_type).await {
                        Ok(upload) => upload,
                        Err(e) => return state.show_error(&e),
                    };
                    match api::post_story(&token, &upload.id, None).await {
                        Ok(_) => state.show_success("Story posted"),
                        Err(e) => state.show_error(&e),
                    }
                });
            });
        }
    };

    view! {
        <div class="flex items-center space-x-3 overflow-x-auto pb-2">
            {move || {
                let signed_in = state.signed_in();
                signed_in.then(|| view! {
                    <label class="flex-shrink-0 w-16 h-16 rounded-full bg-gray-800 border-2 border-dashed border-gray-600 flex items-center justify-center cursor-pointer hover:border-gray-400 transition-colors">
                        <span class="text-2xl">"+"</span>
                        <input
                            type="file"
                            accept="image/*"
                            class="hidden"
                            on:change=on_pick.clone()
                        />
                    </label>
                })
            }}

            {move || {
                stories.get().into_iter().map(|story| view! {
                    <div class="flex-shrink-0 text-center" title=story.caption.clone().unwrap_or_default()>
                        <img
                            src=api::media_url(&story.image_id)
                            class="w-16 h-16 rounded-full object-cover border-2 border-primary-500"
                        />
                    </div>
                }).collect_view()
            }}
        </div>
    }
}

/// Post composer with optional image attachments
#[component]
fn Composer() -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");

    let text = create_rw_signal(String::new());
    let image_ids = create_rw_signal(Vec::<String>::new());
    let busy = create_rw_signal(false);

    let on_attach = {
        let state = state.clone();
        move |ev: leptos::ev::Event| {
            let Some(file) = picked_file(&ev) else { return };
            let Some(token) = state.token() else { return };
            let state = state.clone();
            read_file(file, move |payload, content_type| {
                let state = state.clone();
                let token = token.clone();
                spawn_local(async move {
                    match api::upload_media(&token, &payload, &content_type).await {
                        Ok(upload) => image_ids.update(|ids| ids.push(upload.id)),
                        Err(e) => state.show_error(&e),
                    }
                });
            });
        }
    };

    let on_submit = {
        let state = state.clone();
        move |ev: leptos::ev::SubmitEvent| {
            ev.prevent_default();
            if busy.get() {
                return;
            }
            let body = text.get();
            let images = image_ids.get();
            if body.trim().is_empty() && images.is_empty() {
                return;
            }
            let Some(token) = state.token() else { return };
            let state = state.clone();
            spawn_local(async move {
                busy.set(true);
                match api::create_post(&token, body.trim(), &images).await {
                    Ok(_) => {
                        text.set(String::new());
                        image_ids.set(Vec::new());
                        state.feed_version.update(|v| *v += 1);
                    }
                    Err(e) => state.show_error(&e),
                }
                busy.set(false);
            });
        }
    };

    view! {
        <form class="bg-gray-800 rounded-xl p-4 space-y-3" on:submit=on_submit>
            <textarea
                class="w-full bg-gray-700 rounded-lg px-3 py-2 resize-none"
                rows=3
                placeholder="What's on your mind?"
                prop:value=move || text.get()
                on:input=move |ev| text.set(event_target_value(&ev))
            />

            // Attached image previews
            {move || {
                let ids = image_ids.get();
                (!ids.is_empty()).then(|| view! {
                    <div class="flex space-x-2">
                        {ids.into_iter().map(|id| view! {
                            <img src=api::media_url(&id) class="w-16 h-16 rounded-lg object-cover" />
                        }).collect_view()}
                    </div>
                })
            }}

            <div class="flex items-center justify-between">
                <label class="text-gray-400 hover:text-white cursor-pointer transition-colors">
                    "📷 Attach"
                    <input type="file" accept="image/*" class="hidden" on:change=on_attach />
                </label>
                <button
                    type="submit"
                    class="px-6 py-2 bg-primary-600 hover:bg-primary-700 rounded-lg font-medium transition-colors"
                    disabled=move || busy.get()
                >
                    {move || if busy.get() { "Posting..." } else { "Post" }}
                </button>
            </div>
        </form>
    }
}
