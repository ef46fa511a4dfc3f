//! Writing Tools Engine
//!
//! The five text operations the application offers: grammar correction,
//! paraphrasing, dictionary lookup, essay checking and humanization. Each
//! builds a prompt, calls the model through `TextModelClient`, and parses
//! the reply leniently. Reply parsing lives in pure functions so the
//! fallback rules are testable without a model.

use crate::ai::client::{ModelError, TextModelClient};
use crate::ai::parse::{extract_json, strip_code_fences};
use crate::store::StoreEngine;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

/// Errors surfaced by the writing tools
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Unparseable model reply: {0}")]
    Parse(String),
}

/// Result type alias for tool operations
pub type ToolResult<T> = Result<T, ToolError>;

// ============================================
// Reports
// ============================================

/// One correction the model applied
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrammarIssue {
    #[serde(default)]
    pub original: String,
    #[serde(default)]
    pub replacement: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Grammar correction result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrammarReport {
    pub corrected: String,
    #[serde(default)]
    pub issues: Vec<GrammarIssue>,
}

/// Paraphrasing register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParaphraseMode {
    Standard,
    Formal,
    Fluent,
    Creative,
}

impl Default for ParaphraseMode {
    fn default() -> Self {
        ParaphraseMode::Standard
    }
}

impl ParaphraseMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParaphraseMode::Standard => "standard",
            ParaphraseMode::Formal => "formal",
            ParaphraseMode::Fluent => "fluent",
            ParaphraseMode::Creative => "creative",
        }
    }
}

/// One sense of a word
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meaning {
    #[serde(default)]
    pub part_of_speech: String,
    #[serde(default)]
    pub definitions: Vec<String>,
    #[serde(default)]
    pub synonyms: Vec<String>,
}

/// Dictionary lookup result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Definition {
    pub word: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phonetic: Option<String>,
    #[serde(default)]
    pub meanings: Vec<Meaning>,
}

/// The model's judgement of one sentence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentenceVerdict {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub correct: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue: Option<String>,
}

/// Essay analysis result
///
/// `correct + wrong == total` always holds. The two percentages are rounded
/// independently from `correct/total` and `wrong/total`, so their sum can
/// land on 99, 100 or 101.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EssayReport {
    pub total: usize,
    pub correct: usize,
    pub wrong: usize,
    pub correct_percent: u32,
    pub wrong_percent: u32,
    pub sentences: Vec<SentenceVerdict>,
}

// ============================================
// Engine
// ============================================

/// The writing tools engine
///
/// Holds the model client and the store (for per-tool usage counters under
/// `analytics/tools/{tool}`).
pub struct WritingTools {
    client: Arc<TextModelClient>,
    store: Arc<StoreEngine>,
}

impl WritingTools {
    pub fn new(client: Arc<TextModelClient>, store: Arc<StoreEngine>) -> Self {
        Self { client, store }
    }

    /// Correct grammar and spelling, reporting individual fixes
    pub async fn correct_grammar(&self, text: &str) -> ToolResult<GrammarReport> {
        let prompt = grammar_prompt(text);
        let reply = self.client.generate(&prompt).await?;
        let report = parse_grammar_reply(&reply);
        self.bump_tool_counter("grammar").await;
        Ok(report)
    }

    /// Rewrite text in the requested register
    pub async fn paraphrase(&self, text: &str, mode: ParaphraseMode) -> ToolResult<String> {
        let prompt = paraphrase_prompt(text, mode);
        let reply = self.client.generate(&prompt).await?;
        self.bump_tool_counter("paraphrase").await;
        Ok(clean_text_reply(&reply))
    }

    /// Look a word up
    pub async fn define_word(&self, word: &str) -> ToolResult<Definition> {
        let prompt = dictionary_prompt(word);
        let reply = self.client.generate(&prompt).await?;
        let definition = parse_definition_reply(&reply, word);
        self.bump_tool_counter("dictionary").await;
        Ok(definition)
    }

    /// Judge an essay sentence by sentence
    pub async fn check_essay(&self, text: &str) -> ToolResult<EssayReport> {
        let prompt = essay_prompt(text);
        let reply = self.client.generate(&prompt).await?;
        let report = parse_essay_reply(&reply)?;
        self.bump_tool_counter("essay").await;
        Ok(report)
    }

    /// Rewrite text to read naturally
    pub async fn humanize(&self, text: &str) -> ToolResult<String> {
        let prompt = humanize_prompt(text);
        let reply = self.client.generate(&prompt).await?;
        self.bump_tool_counter("humanize").await;
        Ok(clean_text_reply(&reply))
    }

    /// Increment `analytics/tools/{tool}`
    ///
    /// Usage counters are best-effort; a store failure is logged, not
    /// surfaced to the caller.
    async fn bump_tool_counter(&self, tool: &str) {
        let path = format!("analytics/tools/{}", tool);
        let current = match self.store.get(&path).await {
            Ok(Some(value)) => value.as_u64().unwrap_or(0),
            _ => 0,
        };
        if let Err(e) = self.store.set(&path, json!(current + 1)).await {
            tracing::warn!(tool = %tool, error = %e, "Failed to record tool usage");
        }
    }
}

// ============================================
// Prompts
// ============================================

fn grammar_prompt(text: &str) -> String {
    format!(
        "Correct the grammar and spelling of the text below. Reply with JSON only: \
         {{\"corrected\": string, \"issues\": [{{\"original\": string, \"replacement\": string, \"reason\": string}}]}}\n\nText:\n{}",
        text
    )
}

fn paraphrase_prompt(text: &str, mode: ParaphraseMode) -> String {
    format!(
        "Paraphrase the text below in a {} register. Keep the meaning. Reply with the rewritten text only.\n\nText:\n{}",
        mode.as_str(),
        text
    )
}

fn dictionary_prompt(word: &str) -> String {
    format!(
        "Define the word \"{}\". Reply with JSON only: \
         {{\"word\": string, \"phonetic\": string, \"meanings\": [{{\"part_of_speech\": string, \"definitions\": [string], \"synonyms\": [string]}}]}}",
        word
    )
}

fn essay_prompt(text: &str) -> String {
    format!(
        "Split the essay below into sentences and judge each one for grammatical correctness. \
         Reply with JSON only: {{\"sentences\": [{{\"text\": string, \"correct\": boolean, \"issue\": string}}]}}\n\nEssay:\n{}",
        text
    )
}

fn humanize_prompt(text: &str) -> String {
    format!(
        "Rewrite the text below so it reads like natural, conversational human writing. \
         Keep the meaning. Reply with the rewritten text only.\n\nText:\n{}",
        text
    )
}

// ============================================
// Reply parsing (pure)
// ============================================

/// Plain-text replies: drop fences and surrounding whitespace
fn clean_text_reply(reply: &str) -> String {
    strip_code_fences(reply).to_string()
}

/// Grammar replies fall back to "the whole reply is the corrected text"
fn parse_grammar_reply(reply: &str) -> GrammarReport {
    if let Some(value) = extract_json(reply) {
        if let Ok(report) = serde_json::from_value::<GrammarReport>(value) {
            return report;
        }
    }
    GrammarReport {
        corrected: clean_text_reply(reply),
        issues: Vec::new(),
    }
}

/// Dictionary replies fall back to a single unstructured meaning
fn parse_definition_reply(reply: &str, word: &str) -> Definition {
    if let Some(value) = extract_json(reply) {
        if let Ok(mut definition) = serde_json::from_value::<Definition>(value) {
            if definition.word.is_empty() {
                definition.word = word.to_string();
            }
            return definition;
        }
    }
    Definition {
        word: word.to_string(),
        phonetic: None,
        meanings: vec![Meaning {
            part_of_speech: "unknown".to_string(),
            definitions: vec![clean_text_reply(reply)],
            synonyms: Vec::new(),
        }],
    }
}

#[derive(Debug, Deserialize)]
struct EssayReply {
    #[serde(default)]
    sentences: Vec<SentenceVerdict>,
}

/// Essay replies need real structure; without verdicts there is no report
fn parse_essay_reply(reply: &str) -> ToolResult<EssayReport> {
    let value = extract_json(reply)
        .ok_or_else(|| ToolError::Parse("no JSON in essay reply".to_string()))?;

    // Accept either {"sentences": [...]} or a bare array of verdicts
    let sentences = if value.is_array() {
        serde_json::from_value::<Vec<SentenceVerdict>>(value)
            .map_err(|e| ToolError::Parse(e.to_string()))?
    } else {
        serde_json::from_value::<EssayReply>(value)
            .map_err(|e| ToolError::Parse(e.to_string()))?
            .sentences
    };

    if sentences.is_empty() {
        return Err(ToolError::Parse("essay reply held no sentences".to_string()));
    }

    let total = sentences.len();
    let correct = sentences.iter().filter(|s| s.correct).count();
    let wrong = total - correct;

    // Each percentage is rounded on its own, the documented tolerance
    let correct_percent = ((correct as f64 / total as f64) * 100.0).round() as u32;
    let wrong_percent = ((wrong as f64 / total as f64) * 100.0).round() as u32;

    Ok(EssayReport {
        total,
        correct,
        wrong,
        correct_percent,
        wrong_percent,
        sentences,
    })
}
