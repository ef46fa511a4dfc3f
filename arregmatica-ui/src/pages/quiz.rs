//! Quiz Page
//!
//! Word-scramble rounds with a per-question countdown.

use leptos::*;
use leptos_router::*;

use crate::api;
use crate::api::QuizQuestion;
use crate::state::global::GlobalState;

const CATEGORIES: [(&str, &str); 3] = [
    ("easy", "Easy"),
    ("medium", "Medium"),
    ("hard", "Hard"),
];

#[derive(Clone, PartialEq)]
enum Phase {
    Pick,
    Playing,
    Done { score: u64 },
}

/// Quiz page component
#[component]
pub fn Quiz() -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");

    let phase = create_rw_signal(Phase::Pick);
    let session_id = create_rw_signal(String::new());
    let question = create_rw_signal(None::<QuizQuestion>);
    let answer = create_rw_signal(String::new());
    let verdict = create_rw_signal(None::<(bool, Option<String>)>);
    let now_ms = create_rw_signal(js_sys::Date::now() as i64);

    // Drives the countdown display
    gloo_timers::callback::Interval::new(250, move || {
        now_ms.set(js_sys::Date::now() as i64);
    })
    .forget();

    let start = {
        let state = state.clone();
        move |category: &'static str| {
            let Some(token) = state.token() else {
                state.show_error("Sign in to play the quiz");
                return;
            };
            let state = state.clone();
            spawn_local(async move {
                match api::quiz_start(&token, category).await {
                    Ok(started) => {
                        session_id.set(started.session_id);
                        question.set(Some(started.question));
                        verdict.set(None);
                        answer.set(String::new());
                        phase.set(Phase::Playing);
                    }
                    Err(e) => state.show_error(&e),
                }
            });
        }
    };

    let on_answer = {
        let state = state.clone();
        move |ev: leptos::ev::SubmitEvent| {
            ev.prevent_default();
            let Some(token) = state.token() else { return };
            let guess = answer.get();
            if guess.trim().is_empty() {
                return;
            }
            let state = state.clone();
            let session = session_id.get();
            spawn_local(async move {
                match api::quiz_answer(&token, &session, guess.trim()).await {
                    Ok(outcome) => {
                        verdict.set(Some((outcome.correct, outcome.expected)));
                        answer.set(String::new());
                        if outcome.finished {
                            question.set(None);
                            phase.set(Phase::Done { score: outcome.score });
                        } else {
                            question.set(outcome.next);
                        }
                    }
                    Err(e) => state.show_error(&e),
                }
            });
        }
    };

    view! {
        <div class="max-w-xl mx-auto space-y-6">
            <div>
                <h1 class="text-3xl font-bold">"Word Scramble"</h1>
                <p class="text-gray-400 mt-1">"Unscramble the word before the clock runs out."</p>
            </div>

            {move || {
                (!state.signed_in()).then(|| view! {
                    <div class="bg-gray-800 rounded-xl p-4 text-center text-gray-400">
                        <A href="/login" class="text-primary-400 hover:underline">"Sign in"</A>
                        " to play and climb the leaderboard."
                    </div>
                })
            }}

            {move || match phase.get() {
                Phase::Pick => {
                    let start = start.clone();
                    view! {
                        <div class="grid grid-cols-3 gap-4">
                            {CATEGORIES.into_iter().map(|(value, label)| {
                                let start = start.clone();
                                view! {
                                    <button
                                        class="bg-gray-800 hover:bg-gray-700 rounded-xl p-6 text-center transition-colors"
                                        on:click=move |_| start(value)
                                    >
                                        <div class="text-lg font-semibold">{label}</div>
                                    </button>
                                }
                            }).collect_view()}
                        </div>
                    }.into_view()
                }
                Phase::Playing => {
                    let on_answer = on_answer.clone();
                    view! {
                        <div class="bg-gray-800 rounded-xl p-6 space-y-4">
                            {move || question.get().map(|q| {
                                let remaining = ((q.deadline - now_ms.get()).max(0) / 1000) as u64;
                                view! {
                                    <div class="flex items-center justify-between text-sm text-gray-400">
                                        <span>{format!("Question {} of {}", q.index + 1, q.total)}</span>
                                        <span>{format!("Score: {}", q.score)}</span>
                                        <span class=if remaining <= 5 { "text-red-400 font-bold" } else { "" }>
                                            {format!("⏱ {}s", remaining)}
                                        </span>
                                    </div>
                                    <div class="text-center text-4xl font-bold tracking-widest py-6">
                                        {q.scrambled.clone()}
                                    </div>
                                }
                            })}

                            <form class="flex space-x-2" on:submit=on_answer>
                                <input
                                    type="text"
                                    class="flex-1 bg-gray-700 rounded-lg px-3 py-2"
                                    placeholder="Your answer"
                                    prop:value=move || answer.get()
                                    on:input=move |ev| answer.set(event_target_value(&ev))
                                />
                                <button
                                    type="submit"
                                    class="px-6 py-2 bg-primary-600 hover:bg-primary-700 rounded-lg font-medium transition-colors"
                                >
                                    "Submit"
                                </button>
                            </form>

                            {move || verdict.get().map(|(correct, expected)| {
                                if correct {
                                    view! {
                                        <p class="text-green-400 text-sm">"Correct!"</p>
                                    }.into_view()
                                } else {
                                    view! {
                                        <p class="text-red-400 text-sm">
                                            {match expected {
                                                Some(word) => format!("Not quite. It was \"{}\".", word),
                                                None => "Not quite.".to_string(),
                                            }}
                                        </p>
                                    }.into_view()
                                }
                            })}
                        </div>
                    }.into_view()
                }
                Phase::Done { score } => view! {
                    <div class="bg-gray-800 rounded-xl p-8 text-center space-y-4">
                        <div class="text-5xl">"🏆"</div>
                        <h2 class="text-2xl font-bold">{format!("Round over: {} points", score)}</h2>
                        <div class="flex justify-center space-x-4">
                            <button
                                class="px-6 py-2 bg-primary-600 hover:bg-primary-700 rounded-lg font-medium transition-colors"
                                on:click=move |_| phase.set(Phase::Pick)
                            >
                                "Play again"
                            </button>
                            <A
                                href="/leaderboard"
                                class="px-6 py-2 bg-gray-700 hover:bg-gray-600 rounded-lg font-medium transition-colors"
                            >
                                "Leaderboard"
                            </A>
                        </div>
                    </div>
                }.into_view(),
            }}
        </div>
    }
}
