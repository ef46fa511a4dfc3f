//! Post Card Component
//!
//! One feed post with its images, like and repost buttons and an
//! expandable comment thread.

use leptos::*;

use crate::api;
use crate::api::{Comment, Post};
use crate::state::global::GlobalState;

/// Render a millisecond timestamp the way the feed shows times
pub fn format_time(ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(ms)
        .map(|dt| dt.format("%b %d, %H:%M").to_string())
        .unwrap_or_default()
}

/// One post in the feed
#[component]
pub fn PostCard(post: Post) -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");

    let uid = post.uid.clone();
    let post_id = post.post_id.clone();
    let like_count = create_rw_signal(post.like_count);
    let show_comments = create_rw_signal(false);
    let comments = create_rw_signal(Vec::<Comment>::new());
    let comment_text = create_rw_signal(String::new());

    let on_like = {
        let state = state.clone();
        let uid = uid.clone();
        let post_id = post_id.clone();
        move |_| {
            let Some(token) = state.token() else {
                state.show_error("Sign in to like posts");
                return;
            };
            let state = state.clone();
            let uid = uid.clone();
            let post_id = post_id.clone();
            spawn_local(async move {
                match api::toggle_like(&token, &uid, &post_id).await {
                    Ok(liked) => like_count.set(liked.like_count),
                    Err(e) => state.show_error(&e),
                }
            });
        }
    };

    let on_repost = {
        let state = state.clone();
        let uid = uid.clone();
        let post_id = post_id.clone();
        move |_| {
            let Some(token) = state.token() else {
                state.show_error("Sign in to repost");
                return;
            };
            let state = state.clone();
            let uid = uid.clone();
            let post_id = post_id.clone();
            spawn_local(async move {
                match api::repost(&token, &uid, &post_id).await {
                    Ok(_) => state.show_success("Reposted"),
                    Err(e) => state.show_error(&e),
                }
            });
        }
    };

    let toggle_comments = {
        let state = state.clone();
        let uid = uid.clone();
        let post_id = post_id.clone();
        move |_| {
            let open = !show_comments.get();
            show_comments.set(open);
            if open {
                let state = state.clone();
                let uid = uid.clone();
                let post_id = post_id.clone();
                spawn_local(async move {
                    match api::fetch_comments(&uid, &post_id).await {
                        Ok(list) => comments.set(list),
                        Err(e) => state.show_error(&e),
                    }
                });
            }
        }
    };

    let on_comment = {
        let state = state.clone();
        let uid = uid.clone();
        let post_id = post_id.clone();
        move |ev: leptos::ev::SubmitEvent| {
            ev.prevent_default();
            let text = comment_text.get();
            if text.trim().is_empty() {
                return;
            }
            let Some(token) = state.token() else {
                state.show_error("Sign in to comment");
                return;
            };
            let state = state.clone();
            let uid = uid.clone();
            let post_id = post_id.clone();
            spawn_local(async move {
                match api::add_comment(&token, &uid, &post_id, &text).await {
                    Ok(comment) => {
                        comments.update(|list| list.push(comment));
                        comment_text.set(String::new());
                    }
                    Err(e) => state.show_error(&e),
                }
            });
        }
    };

    view! {
        <article class="bg-gray-800 rounded-xl p-4 space-y-3">
            // Author line
            <div class="flex items-center justify-between">
                <span class="font-semibold">{format!("@{}", post.author)}</span>
                <span class="text-gray-400 text-sm">{format_time(post.created_at)}</span>
            </div>

            // Repost marker
            {post.repost_of.as_ref().map(|_| view! {
                <div class="text-gray-400 text-sm">"🔁 reposted"</div>
            })}

            // Body
            <p class="whitespace-pre-wrap">{post.text.clone()}</p>

            // Images
            {(!post.image_ids.is_empty()).then(|| view! {
                <div class="grid grid-cols-2 gap-2">
                    {post.image_ids.iter().map(|id| view! {
                        <img
                            src=api::media_url(id)
                            class="rounded-lg object-cover w-full"
                        />
                    }).collect_view()}
                </div>
            })}

            // Action row
            <div class="flex items-center space-x-6 text-sm text-gray-400">
                <button class="hover:text-white transition-colors" on:click=on_like>
                    {move || format!("❤️ {}", like_count.get())}
                </button>
                <button class="hover:text-white transition-colors" on:click=toggle_comments>
                    {format!("💬 {}", post.comment_count)}
                </button>
                <button class="hover:text-white transition-colors" on:click=on_repost>
                    {format!("🔁 {}", post.repost_count)}
                </button>
            </div>

            // Comment thread
            {move || {
                if !show_comments.get() {
                    return view! {}.into_view();
                }
                let on_comment = on_comment.clone();
                view! {
                    <div class="border-t border-gray-700 pt-3 space-y-2">
                        {move || {
                            comments.get().into_iter().map(|c| view! {
                                <div class="text-sm">
                                    <span class="font-semibold">{format!("@{}", c.author)}</span>
                                    <span class="text-gray-300 ml-2">{c.text}</span>
                                </div>
                            }).collect_view()
                        }}

                        <form class="flex space-x-2" on:submit=on_comment>
                            <input
                                type="text"
                                class="flex-1 bg-gray-700 rounded-lg px-3 py-2 text-sm"
                                placeholder="Write a comment..."
                                prop:value=move || comment_text.get()
                                on:input=move |ev| comment_text.set(event_target_value(&ev))
                            />
                            <button
                                type="submit"
                                class="px-4 py-2 bg-primary-600 hover:bg-primary-700 rounded-lg text-sm"
                            >
                                "Reply"
                            </button>
                        </form>
                    </div>
                }.into_view()
            }}
        </article>
    }
}
