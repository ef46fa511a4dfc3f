//! Arregmatica Document Store
//!
//! This module provides the embedded real-time document tree every other
//! layer builds on:
//!
//! - **path**: Validated slash-separated paths (`TreePath`)
//! - **tree**: Pure navigation/mutation helpers over `serde_json::Value`
//! - **journal**: Append-only journal with per-entry CRC32
//! - **engine**: The store engine orchestrating tree, journal and events
//! - **error**: Error types
//!
//! # Architecture
//!
//! ```text
//! Write Path:
//!   set/update/remove → Tree (in memory) → Journal → Event broadcast
//!
//! Startup:
//!   Snapshot (LZ4) → Tree, then replay Journal
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use arregmatica::store::{StoreConfig, StoreEngine};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let engine = StoreEngine::open(StoreConfig::new("./data")).await?;
//!
//!     engine.set("accounts/u1", json!({"username": "ada"})).await?;
//!     let profile = engine.get("accounts/u1").await?;
//!     println!("{:?}", profile);
//!
//!     engine.shutdown().await?;
//!     Ok(())
//! }
//! ```

pub mod engine;
pub mod error;
pub mod journal;
pub mod path;
pub mod tree;

// Re-export commonly used types
pub use engine::{EventKind, StoreConfig, StoreEngine, StoreEvent, StoreStats};
pub use error::{StoreError, StoreResult};
pub use journal::{Journal, JournalEntry, JournalSyncMode};
pub use path::TreePath;
