//! Writing Tools Page
//!
//! Grammar correction, paraphrasing, dictionary, essay checking and
//! humanizing over the model gateway.

use leptos::*;
use leptos_router::*;

use crate::api;
use crate::api::{Definition, EssayReport, GrammarReport};
use crate::state::global::GlobalState;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Tool {
    Grammar,
    Paraphrase,
    Dictionary,
    Essay,
    Humanize,
}

impl Tool {
    fn label(self) -> &'static str {
        match self {
            Tool::Grammar => "Grammar",
            Tool::Paraphrase => "Paraphrase",
            Tool::Dictionary => "Dictionary",
            Tool::Essay => "Essay Check",
            Tool::Humanize => "Humanize",
        }
    }

    fn all() -> [Tool; 5] {
        [
            Tool::Grammar,
            Tool::Paraphrase,
            Tool::Dictionary,
            Tool::Essay,
            Tool::Humanize,
        ]
    }
}

/// What the last tool run produced
#[derive(Clone)]
enum ToolOutput {
    Grammar(GrammarReport),
    Text(String),
    Definition(Definition),
    Essay(EssayReport),
}

/// Writing tools page component
#[component]
pub fn Tools() -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");

    let tool = create_rw_signal(Tool::Grammar);
    let input = create_rw_signal(String::new());
    let mode = create_rw_signal("standard".to_string());
    let output = create_rw_signal(None::<ToolOutput>);
    let busy = create_rw_signal(false);

    let on_run = {
        let state = state.clone();
        move |ev: leptos::ev::SubmitEvent| {
            ev.prevent_default();
            if busy.get() {
                return;
            }
            let text = input.get();
            if text.trim().is_empty() {
                return;
            }
            let Some(token) = state.token() else {
                state.show_error("Sign in to use the writing tools");
                return;
            };
            let state = state.clone();
            let selected = tool.get();
            let mode = mode.get();
            spawn_local(async move {
                busy.set(true);
                output.set(None);

                let text = text.trim();
                let result = match selected {
                    Tool::Grammar => api::tool_grammar(&token, text)
                        .await
                        .map(ToolOutput::Grammar),
                    Tool::Paraphrase => api::tool_paraphrase(&token, text, &mode)
                        .await
                        .map(|r| ToolOutput::Text(r.text)),
                    Tool::Dictionary => api::tool_define(&token, text)
                        .await
                        .map(ToolOutput::Definition),
                    Tool::Essay => api::tool_essay(&token, text).await.map(ToolOutput::Essay),
                    Tool::Humanize => api::tool_humanize(&token, text)
                        .await
                        .map(|r| ToolOutput::Text(r.text)),
                };

                match result {
                    Ok(out) => output.set(Some(out)),
                    Err(e) => state.show_error(&e),
                }
                busy.set(false);
            });
        }
    };

    view! {
        <div class="max-w-3xl mx-auto space-y-6">
            <div>
                <h1 class="text-3xl font-bold">"Writing Tools"</h1>
                <p class="text-gray-400 mt-1">"Pick a tool, paste your text, let the model work."</p>
            </div>

            {move || {
                (!state.signed_in()).then(|| view! {
                    <div class="bg-gray-800 rounded-xl p-4 text-center text-gray-400">
                        <A href="/login" class="text-primary-400 hover:underline">"Sign in"</A>
                        " to use the writing tools."
                    </div>
                })
            }}

            // Tool selector
            <div class="flex flex-wrap gap-2">
                {Tool::all().into_iter().map(|t| view! {
                    <button
                        class=move || {
                            if tool.get() == t {
                                "px-4 py-2 rounded-lg bg-primary-600 text-white"
                            } else {
                                "px-4 py-2 rounded-lg bg-gray-800 text-gray-300 hover:bg-gray-700"
                            }
                        }
                        on:click=move |_| {
                            tool.set(t);
                            output.set(None);
                        }
                    >
                        {t.label()}
                    </button>
                }).collect_view()}
            </div>

            // Input form
            <form class="bg-gray-800 rounded-xl p-4 space-y-3" on:submit=on_run>
                {move || {
                    if tool.get() == Tool::Dictionary {
                        view! {
                            <input
                                type="text"
                                class="w-full bg-gray-700 rounded-lg px-3 py-2"
                                placeholder="Word to look up"
                                prop:value=move || input.get()
                                on:input=move |ev| input.set(event_target_value(&ev))
                            />
                        }.into_view()
                    } else {
                        view! {
                            <textarea
                                class="w-full bg-gray-700 rounded-lg px-3 py-2 resize-y"
                                rows=6
                                placeholder="Your text"
                                prop:value=move || input.get()
                                on:input=move |ev| input.set(event_target_value(&ev))
                            />
                        }.into_view()
                    }
                }}

                {move || {
                    (tool.get() == Tool::Paraphrase).then(|| view! {
                        <select
                            class="bg-gray-700 rounded-lg px-3 py-2"
                            on:change=move |ev| mode.set(event_target_value(&ev))
                        >
                            <option value="standard">"Standard"</option>
                            <option value="formal">"Formal"</option>
                            <option value="fluent">"Fluent"</option>
                            <option value="creative">"Creative"</option>
                        </select>
                    })
                }}

                <button
                    type="submit"
                    class="px-6 py-2 bg-primary-600 hover:bg-primary-700 rounded-lg font-medium transition-colors"
                    disabled=move || busy.get()
                >
                    {move || if busy.get() { "Thinking..." } else { "Run" }}
                </button>
            </form>

            // Output panel
            {move || {
                output.get().map(|out| match out {
                    ToolOutput::Text(text) => view! {
                        <div class="bg-gray-800 rounded-xl p-4">
                            <p class="whitespace-pre-wrap">{text}</p>
                        </div>
                    }.into_view(),
                    ToolOutput::Grammar(report) => view! {
                        <div class="bg-gray-800 rounded-xl p-4 space-y-3">
                            <p class="whitespace-pre-wrap">{report.corrected}</p>
                            {(!report.issues.is_empty()).then(|| view! {
                                <div class="border-t border-gray-700 pt-3 space-y-1 text-sm">
                                    {report.issues.into_iter().map(|issue| view! {
                                        <div>
                                            <span class="text-red-400 line-through">{issue.original}</span>
                                            <span class="mx-2">"→"</span>
                                            <span class="text-green-400">{issue.replacement}</span>
                                            {issue.reason.map(|r| view! {
                                                <span class="text-gray-400 ml-2">{format!("({})", r)}</span>
                                            })}
                                        </div>
                                    }).collect_view()}
                                </div>
                            })}
                        </div>
                    }.into_view(),
                    ToolOutput::Definition(def) => view! {
                        <div class="bg-gray-800 rounded-xl p-4 space-y-3">
                            <div class="flex items-baseline space-x-3">
                                <h2 class="text-xl font-bold">{def.word}</h2>
                                {def.phonetic.map(|p| view! {
                                    <span class="text-gray-400">{p}</span>
                                })}
                            </div>
                            {def.meanings.into_iter().map(|meaning| view! {
                                <div class="space-y-1">
                                    <div class="text-sm text-primary-400 italic">{meaning.part_of_speech}</div>
                                    <ol class="list-decimal list-inside space-y-1 text-sm">
                                        {meaning.definitions.into_iter().map(|d| view! {
                                            <li>{d}</li>
                                        }).collect_view()}
                                    </ol>
                                    {(!meaning.synonyms.is_empty()).then(|| view! {
                                        <div class="text-sm text-gray-400">
                                            {format!("Synonyms: {}", meaning.synonyms.join(", "))}
                                        </div>
                                    })}
                                </div>
                            }).collect_view()}
                        </div>
                    }.into_view(),
                    ToolOutput::Essay(report) => view! {
                        <div class="bg-gray-800 rounded-xl p-4 space-y-3">
                            <div class="flex items-center space-x-6">
                                <div class="text-center">
                                    <div class="text-2xl font-bold text-green-400">
                                        {format!("{}%", report.correct_percent)}
                                    </div>
                                    <div class="text-sm text-gray-400">
                                        {format!("{} of {} sentences fine", report.correct, report.total)}
                                    </div>
                                </div>
                                <div class="text-center">
                                    <div class="text-2xl font-bold text-red-400">
                                        {format!("{}%", report.wrong_percent)}
                                    </div>
                                    <div class="text-sm text-gray-400">
                                        {format!("{} need work", report.wrong)}
                                    </div>
                                </div>
                            </div>
                            <div class="border-t border-gray-700 pt-3 space-y-2 text-sm">
                                {report.sentences.into_iter().map(|s| view! {
                                    <div class=if s.correct { "text-gray-300" } else { "text-red-300" }>
                                        {if s.correct { "✓ " } else { "✕ " }}
                                        {s.text}
                                        {s.issue.map(|i| view! {
                                            <span class="text-gray-400 ml-2">{format!("({})", i)}</span>
                                        })}
                                    </div>
                                }).collect_view()}
                            </div>
                        </div>
                    }.into_view(),
                })
            }}
        </div>
    }
}
