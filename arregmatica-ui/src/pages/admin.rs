//! Admin Page
//!
//! Back-office: admin sign-in, user moderation and the usage report.

use leptos::*;

use crate::api;
use crate::api::{AdminView, Profile, UsageReport};
use crate::components::post_card::format_time;
use crate::state::global::GlobalState;

/// Admin page component
#[component]
pub fn Admin() -> impl IntoView {
    let token = create_rw_signal(None::<String>);

    view! {
        <div class="max-w-3xl mx-auto space-y-6">
            <div>
                <h1 class="text-3xl font-bold">"Back-office"</h1>
                <p class="text-gray-400 mt-1">"Admin accounts, user moderation and usage."</p>
            </div>

            {move || match token.get() {
                None => view! { <AdminLogin token=token /> }.into_view(),
                Some(t) => view! { <AdminPanel token=t /> }.into_view(),
            }}
        </div>
    }
}

/// Admin sign-in and bootstrap registration
#[component]
fn AdminLogin(token: RwSignal<Option<String>>) -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");

    let registering = create_rw_signal(false);
    let name = create_rw_signal(String::new());
    let password = create_rw_signal(String::new());

    let on_submit = {
        let state = state.clone();
        move |ev: leptos::ev::SubmitEvent| {
            ev.prevent_default();
            let state = state.clone();
            spawn_local(async move {
                let admin_name = name.get_untracked();
                let admin_name = admin_name.trim();
                let pass = password.get_untracked();

                if registering.get_untracked() {
                    // Only the very first admin registers without a token
                    match api::admin_register(admin_name, &pass, None).await {
                        Ok(_) => {
                            state.show_success("Admin account created, sign in now");
                            registering.set(false);
                        }
                        Err(e) => state.show_error(&e),
                    }
                    return;
                }

                match api::admin_login(admin_name, &pass).await {
                    Ok(result) => token.set(Some(result.token)),
                    Err(e) => state.show_error(&e),
                }
            });
        }
    };

    view! {
        <div class="max-w-md bg-gray-800 rounded-xl p-6 space-y-4">
            <h2 class="text-xl font-bold">
                {move || if registering.get() { "Bootstrap admin" } else { "Admin sign-in" }}
            </h2>

            <form class="space-y-3" on:submit=on_submit>
                <input
                    type="text"
                    class="w-full bg-gray-700 rounded-lg px-3 py-2"
                    placeholder="Admin name"
                    prop:value=move || name.get()
                    on:input=move |ev| name.set(event_target_value(&ev))
                />
                <input
                    type="password"
                    class="w-full bg-gray-700 rounded-lg px-3 py-2"
                    placeholder="Password"
                    prop:value=move || password.get()
                    on:input=move |ev| password.set(event_target_value(&ev))
                />
                <button
                    type="submit"
                    class="w-full py-2 bg-primary-600 hover:bg-primary-700 rounded-lg font-medium transition-colors"
                >
                    {move || if registering.get() { "Create" } else { "Sign in" }}
                </button>
            </form>

            <button
                class="w-full text-sm text-gray-400 hover:text-white transition-colors"
                on:click=move |_| registering.update(|r| *r = !*r)
            >
                {move || {
                    if registering.get() {
                        "Back to sign-in"
                    } else {
                        "First run? Bootstrap the first admin"
                    }
                }}
            </button>
        </div>
    }
}

/// The signed-in back-office view
#[component]
fn AdminPanel(token: String) -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");

    let users = create_rw_signal(Vec::<Profile>::new());
    let admins = create_rw_signal(Vec::<AdminView>::new());
    let report = create_rw_signal(None::<UsageReport>);

    let reload = {
        let state = state.clone();
        let token = token.clone();
        move || {
            let state = state.clone();
            let token = token.clone();
            spawn_local(async move {
                match api::fetch_profiles().await {
                    Ok(list) => users.set(list),
                    Err(e) => state.show_error(&e),
                }
                match api::admin_list(&token).await {
                    Ok(list) => admins.set(list),
                    Err(e) => state.show_error(&e),
                }
                match api::admin_analytics(&token).await {
                    Ok(r) => report.set(Some(r)),
                    Err(e) => state.show_error(&e),
                }
            });
        }
    };
    reload();

    let on_restrict = {
        let state = state.clone();
        let token = token.clone();
        let reload = reload.clone();
        move |uid: String, restricted: bool| {
            let state = state.clone();
            let token = token.clone();
            let reload = reload.clone();
            spawn_local(async move {
                match api::admin_restrict(&token, &uid, restricted).await {
                    Ok(()) => {
                        state.show_success(if restricted { "Restricted" } else { "Unrestricted" });
                        reload();
                    }
                    Err(e) => state.show_error(&e),
                }
            });
        }
    };

    let on_delete = {
        let state = state.clone();
        let token = token.clone();
        let reload = reload.clone();
        move |uid: String| {
            let state = state.clone();
            let token = token.clone();
            let reload = reload.clone();
            spawn_local(async move {
                match api::admin_delete_user(&token, &uid).await {
                    Ok(()) => {
                        state.show_success("Account deleted");
                        reload();
                    }
                    Err(e) => state.show_error(&e),
                }
            });
        }
    };

    view! {
        // Usage report
        <section class="bg-gray-800 rounded-xl p-6 space-y-4">
            <h2 class="text-xl font-semibold">"Usage"</h2>
            {move || report.get().map(|r| view! {
                <div class="grid grid-cols-2 md:grid-cols-5 gap-4 text-center">
                    <UsageCell label="Accounts" value=r.accounts.to_string() />
                    <UsageCell label="Posts" value=r.posts.to_string() />
                    <UsageCell label="Messages" value=r.messages.to_string() />
                    <UsageCell label="Stories" value=r.stories.to_string() />
                    <UsageCell label="Quiz plays" value=r.quiz_plays.to_string() />
                </div>
                {r.top_tool.as_ref().map(|tool| view! {
                    <p class="text-sm text-gray-400">
                        {format!(
                            "Most used tool: {} ({} runs)",
                            tool,
                            r.tool_counts.get(tool).copied().unwrap_or(0)
                        )}
                    </p>
                })}
            })}
        </section>

        // User moderation
        <section class="bg-gray-800 rounded-xl p-6 space-y-4">
            <h2 class="text-xl font-semibold">"Users"</h2>
            <div class="divide-y divide-gray-700">
                {move || {
                    let on_restrict = on_restrict.clone();
                    let on_delete = on_delete.clone();
                    users.get().into_iter().map(|user| {
                        let on_restrict = on_restrict.clone();
                        let on_delete = on_delete.clone();
                        let uid_restrict = user.uid.clone();
                        let uid_delete = user.uid.clone();
                        let restricted = user.restricted;
                        view! {
                            <div class="flex items-center justify-between py-3">
                                <div>
                                    <div class="font-medium">
                                        {format!("@{}", user.username)}
                                        {restricted.then(|| view! {
                                            <span class="ml-2 text-xs bg-red-900 text-red-300 px-2 py-0.5 rounded">
                                                "restricted"
                                            </span>
                                        })}
                                    </div>
                                    <div class="text-sm text-gray-400">{user.email.clone()}</div>
                                </div>
                                <div class="flex items-center space-x-2 text-sm">
                                    <button
                                        class="px-3 py-1 bg-yellow-700 hover:bg-yellow-600 rounded transition-colors"
                                        on:click=move |_| on_restrict(uid_restrict.clone(), !restricted)
                                    >
                                        {if restricted { "Unrestrict" } else { "Restrict" }}
                                    </button>
                                    <button
                                        class="px-3 py-1 bg-red-700 hover:bg-red-600 rounded transition-colors"
                                        on:click=move |_| on_delete(uid_delete.clone())
                                    >
                                        "Delete"
                                    </button>
                                </div>
                            </div>
                        }
                    }).collect_view()
                }}
            </div>
        </section>

        // Admin accounts
        <section class="bg-gray-800 rounded-xl p-6 space-y-4">
            <h2 class="text-xl font-semibold">"Admins"</h2>
            <div class="divide-y divide-gray-700">
                {move || admins.get().into_iter().map(|admin| view! {
                    <div class="flex items-center justify-between py-3">
                        <span class="font-medium">{admin.name.clone()}</span>
                        <span class="text-sm text-gray-400">
                            {format!("since {}", format_time(admin.created_at))}
                        </span>
                    </div>
                }).collect_view()}
            </div>
        </section>
    }
}

#[component]
fn UsageCell(label: &'static str, value: String) -> impl IntoView {
    view! {
        <div>
            <div class="text-2xl font-bold">{value}</div>
            <div class="text-sm text-gray-400">{label}</div>
        </div>
    }
}
