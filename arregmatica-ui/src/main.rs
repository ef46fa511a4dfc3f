//! Arregmatica Web Client
//!
//! AI writing tools with a social side, built with Leptos (WASM).
//!
//! # Features
//!
//! - Grammar correction, paraphrasing, dictionary, essay checking, humanizing
//! - Word-scramble quiz with a live leaderboard
//! - Post feed, group chat and 24-hour stories
//! - Admin back-office
//!
//! # Architecture
//!
//! This is a client-side rendered (CSR) Leptos application that compiles to
//! WebAssembly. It communicates with the Arregmatica API via HTTP and keeps
//! the feed, chat, stories and leaderboard fresh over a WebSocket.

use leptos::*;

mod api;
mod app;
mod components;
mod pages;
mod state;

fn main() {
    // Set up panic hook for better error messages in WASM
    console_error_panic_hook::set_once();

    // Mount the app to the document body
    mount_to_body(|| view! { <app::App /> });
}
