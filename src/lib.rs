//! # Arregmatica
//!
//! AI writing tools with a social side. A full-stack Rust application:
//! grammar correction, paraphrasing, dictionary lookups, essay checking and
//! text humanizing on top of a hosted text model, plus a word-scramble quiz
//! with a leaderboard, a post feed, group chat, 24-hour stories and an
//! admin back-office.
//!
//! ## Features
//!
//! - **Embedded realtime store**: a path-addressed JSON document tree with
//!   a write journal and LZ4 snapshots, events fanned out to subscribers
//! - **Writing tools**: prompt building and lenient reply parsing over a
//!   generative-text HTTP API
//! - **Realtime**: WebSocket subscriptions on path-prefix topics
//! - **Media**: content-addressed image store for avatars, posts, stories
//!   and chat attachments
//!
//! ## Modules
//!
//! - [`store`]: The document tree engine
//! - [`realtime`]: WebSocket subscription hub
//! - [`media`]: Binary object storage
//! - [`ai`]: Text model client and writing tools
//! - [`services`]: Accounts, feed, chat, stories, quiz, scores, admin
//! - [`api`]: REST API server with Axum
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use arregmatica::store::{StoreConfig, StoreEngine};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = StoreEngine::open(StoreConfig::default()).await?;
//!
//!     store.set("accounts/u1", json!({"username": "ada"})).await?;
//!     let account = store.get("accounts/u1").await?;
//!     println!("{:?}", account);
//!
//!     store.shutdown().await?;
//!     Ok(())
//! }
//! ```

pub mod ai;
pub mod api;
pub mod config;
pub mod media;
pub mod realtime;
pub mod services;
pub mod store;

// Re-export top-level types for convenience
pub use store::{
    EventKind, JournalSyncMode, StoreConfig, StoreEngine, StoreError, StoreEvent, StoreResult,
    StoreStats, TreePath,
};

pub use realtime::{
    websocket_handler, ClientMessage, HubConfig, HubError, ServerMessage, SubscriptionHub,
};

pub use media::{LocalMediaStore, MediaConfig, MediaError, MediaObject, MediaResult, MediaStore};

pub use ai::{
    Definition, EssayReport, GrammarReport, ModelError, ParaphraseMode, TextModelClient,
    TextModelConfig, ToolError, WritingTools,
};

pub use services::{
    AccountService, AdminService, ChatService, FeedService, QuizCategory, QuizService,
    ScoreService, ServiceError, ServiceResult, StoriesService,
};

pub use api::{build_router, serve, ApiConfig, ApiError, AppState};

pub use config::{
    Config, ConfigError, LoggingConfig, ApiConfig as ConfigApiConfig,
    MediaConfig as ConfigMediaConfig, ModelConfig as ConfigModelConfig,
    StoreConfig as ConfigStoreConfig,
};
