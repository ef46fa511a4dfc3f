//! Text Model Integration
//!
//! Integrates Arregmatica with the hosted generative-text API that powers
//! the writing tools.
//!
//! ## Architecture
//!
//! - **Client**: REST API client with timeout/retry handling
//! - **Parse**: Lenient extraction of JSON from model replies
//! - **Tools**: The writing tools engine (grammar, paraphrase, dictionary,
//!   essay, humanize)
//!
//! ## Data Flow
//!
//! 1. A tool builds a prompt for the operation
//! 2. `TextModelClient::generate` calls the model API
//! 3. The reply is parsed leniently (fences stripped, JSON located)
//! 4. Successful calls bump `analytics/tools/{tool}` in the store

mod client;
mod parse;
mod tools;

pub use client::{ModelError, TextModelClient, TextModelConfig};
pub use parse::{extract_json, strip_code_fences};
pub use tools::{
    Definition, EssayReport, GrammarIssue, GrammarReport, Meaning, ParaphraseMode,
    SentenceVerdict, ToolError, ToolResult, WritingTools,
};
