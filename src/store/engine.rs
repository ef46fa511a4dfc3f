//! Document store engine
//!
//! The engine keeps the whole document tree in memory and persists it with
//! a journal + snapshot scheme:
//! - Write path: mutate tree → journal entry → event broadcast
//! - Startup: load snapshot → replay journal
//! - Compaction: when the journal exceeds the snapshot threshold, the tree
//!   is serialized, LZ4-compressed, written out, and the journal truncated.
//!
//! Thread-safe via Tokio's async RwLock; mutation, journaling and event
//! emission happen under one write lock so subscribers observe events in
//! commit order.

use crate::store::error::{StoreError, StoreResult};
use crate::store::journal::{Journal, JournalEntry, JournalSyncMode};
use crate::store::path::TreePath;
use crate::store::tree;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tokio::time::{interval, Duration};

/// Capacity of the committed-write broadcast channel
const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Configuration for the store engine
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Root directory for all data
    pub data_dir: PathBuf,
    /// Whether writes are journaled (disable for throwaway stores)
    pub journal_enabled: bool,
    /// Journal sync strategy
    pub journal_sync: JournalSyncMode,
    /// Background flush interval in milliseconds (default: 5000)
    pub flush_interval_ms: u64,
    /// Journal entries before a snapshot is written (default: 10000)
    pub snapshot_threshold: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("arregmatica_data"),
            journal_enabled: true,
            journal_sync: JournalSyncMode::Batched,
            flush_interval_ms: 5000,
            snapshot_threshold: 10_000,
        }
    }
}

impl StoreConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Default::default()
        }
    }

    /// Get path to the journal file
    pub fn journal_path(&self) -> PathBuf {
        self.data_dir.join("journal").join("current.journal")
    }

    /// Get path to the snapshot file
    pub fn snapshot_path(&self) -> PathBuf {
        self.data_dir.join("snapshot").join("tree.snap")
    }
}

/// What a committed write did at its path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Set,
    Remove,
}

/// A committed write, as seen by subscribers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreEvent {
    /// Path the write applied to
    pub path: String,
    /// Set or Remove
    pub kind: EventKind,
    /// New value at the path (None for removals)
    pub value: Option<Value>,
    /// Commit timestamp, milliseconds since epoch
    pub timestamp: i64,
}

/// Internal state guarded by one lock
struct StoreState {
    /// The whole document tree (objects are branches)
    tree: Value,
    /// Journal of committed writes (None when journaling is disabled)
    journal: Option<Journal>,
}

/// The document store engine
pub struct StoreEngine {
    /// Configuration
    config: StoreConfig,
    /// Tree + journal under a single lock (commit order = event order)
    state: Arc<RwLock<StoreState>>,
    /// Committed-write broadcast
    events: broadcast::Sender<StoreEvent>,
    /// Shutdown signal
    shutdown: Arc<RwLock<bool>>,
}

impl StoreEngine {
    /// Open a store: load the snapshot, replay the journal
    pub async fn open(config: StoreConfig) -> StoreResult<Self> {
        // Create directory structure
        std::fs::create_dir_all(&config.data_dir)?;
        std::fs::create_dir_all(config.data_dir.join("journal"))?;
        std::fs::create_dir_all(config.data_dir.join("snapshot"))?;

        let mut tree = Self::load_snapshot(&config.snapshot_path());

        let journal = if config.journal_enabled {
            let journal = Journal::open(config.journal_path(), config.journal_sync)?;

            // Replay journaled writes over the snapshot
            let entries = journal.replay()?;
            if !entries.is_empty() {
                tracing::info!("Replaying {} journal entries", entries.len());
            }
            for entry in entries {
                Self::apply_entry(&mut tree, &entry);
            }

            Some(journal)
        } else {
            None
        };

        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Ok(Self {
            config,
            state: Arc::new(RwLock::new(StoreState { tree, journal })),
            events,
            shutdown: Arc::new(RwLock::new(false)),
        })
    }

    /// Load the snapshot, falling back to an empty tree
    fn load_snapshot(path: &Path) -> Value {
        if !path.exists() {
            return Value::Object(Map::new());
        }

        match Self::read_snapshot(path) {
            Ok(tree) => {
                tracing::info!("Loaded snapshot from {:?}", path);
                tree
            }
            Err(e) => {
                tracing::warn!("Ignoring unreadable snapshot {:?}: {}", path, e);
                Value::Object(Map::new())
            }
        }
    }

    fn read_snapshot(path: &Path) -> StoreResult<Value> {
        let compressed = std::fs::read(path)?;
        let bytes = lz4_flex::decompress_size_prepended(&compressed)
            .map_err(|e| StoreError::Compression(e.to_string()))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Apply a journal entry to a tree (replay path)
    fn apply_entry(tree: &mut Value, entry: &JournalEntry) {
        match entry {
            JournalEntry::Set { path, value, .. } => {
                if let Ok(path) = TreePath::parse(path) {
                    tree::set_at(tree, &path, value.clone());
                }
            }
            JournalEntry::Update { path, fields, .. } => {
                if let Ok(path) = TreePath::parse(path) {
                    tree::merge_at(tree, &path, fields);
                }
            }
            JournalEntry::Remove { path, .. } => {
                if let Ok(path) = TreePath::parse(path) {
                    tree::remove_at(tree, &path);
                }
            }
        }
    }

    /// Subscribe to committed writes
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    /// Read the subtree at a path
    ///
    /// Absent paths read as `None`, never as an error.
    pub async fn get(&self, path: &str) -> StoreResult<Option<Value>> {
        let path = TreePath::parse(path)?;
        let state = self.state.read().await;
        Ok(tree::get_at(&state.tree, &path).cloned())
    }

    /// List the child keys at a path, sorted
    pub async fn children(&self, path: &str) -> StoreResult<Vec<String>> {
        let path = TreePath::parse(path)?;
        let state = self.state.read().await;
        let keys = match tree::get_at(&state.tree, &path) {
            Some(Value::Object(map)) => map.keys().cloned().collect(),
            _ => Vec::new(),
        };
        // serde_json objects iterate in key order, so this is already sorted
        Ok(keys)
    }

    /// Replace the subtree at a path
    ///
    /// Writing `Null` is equivalent to `remove`.
    pub async fn set(&self, path: &str, value: Value) -> StoreResult<()> {
        if value.is_null() {
            return self.remove(path).await;
        }

        let path = TreePath::parse(path)?;
        let ts = now_millis();

        let mut state = self.state.write().await;
        tree::set_at(&mut state.tree, &path, value.clone());

        if let Some(journal) = state.journal.as_mut() {
            journal.append(&JournalEntry::Set {
                path: path.to_string(),
                value: value.clone(),
                ts,
            })?;
        }

        let _ = self.events.send(StoreEvent {
            path: path.to_string(),
            kind: EventKind::Set,
            value: Some(value),
            timestamp: ts,
        });

        self.maybe_snapshot(&mut state)
    }

    /// Merge fields into the object at a path, one level deep
    ///
    /// Null-valued fields remove the corresponding child. The whole merge is
    /// one journal entry; subscribers see one event per changed child.
    pub async fn update(&self, path: &str, fields: Map<String, Value>) -> StoreResult<()> {
        if fields.is_empty() {
            return Ok(());
        }

        let path = TreePath::parse(path)?;
        // Field keys become child segments, so they validate like segments
        let mut child_paths = std::collections::HashMap::new();
        for key in fields.keys() {
            child_paths.insert(key.clone(), path.child(key)?.to_string());
        }
        let ts = now_millis();

        let mut state = self.state.write().await;
        let changes = tree::merge_at(&mut state.tree, &path, &fields);

        if let Some(journal) = state.journal.as_mut() {
            journal.append(&JournalEntry::Update {
                path: path.to_string(),
                fields,
                ts,
            })?;
        }

        for (key, value) in changes {
            let child_path = match child_paths.get(&key) {
                Some(p) => p.clone(),
                None => continue,
            };
            let kind = if value.is_some() {
                EventKind::Set
            } else {
                EventKind::Remove
            };
            let _ = self.events.send(StoreEvent {
                path: child_path,
                kind,
                value,
                timestamp: ts,
            });
        }

        self.maybe_snapshot(&mut state)
    }

    /// Remove the subtree at a path
    ///
    /// Removing a missing path is a no-op.
    pub async fn remove(&self, path: &str) -> StoreResult<()> {
        let path = TreePath::parse(path)?;
        let ts = now_millis();

        let mut state = self.state.write().await;
        if !tree::remove_at(&mut state.tree, &path) {
            return Ok(());
        }

        if let Some(journal) = state.journal.as_mut() {
            journal.append(&JournalEntry::Remove {
                path: path.to_string(),
                ts,
            })?;
        }

        let _ = self.events.send(StoreEvent {
            path: path.to_string(),
            kind: EventKind::Remove,
            value: None,
            timestamp: ts,
        });

        self.maybe_snapshot(&mut state)
    }

    /// Snapshot if the journal has grown past the threshold
    fn maybe_snapshot(&self, state: &mut StoreState) -> StoreResult<()> {
        let due = state
            .journal
            .as_ref()
            .map(|j| j.entry_count() >= self.config.snapshot_threshold)
            .unwrap_or(false);

        if due {
            self.write_snapshot(state)?;
        }
        Ok(())
    }

    /// Serialize the tree, compress it, write it out, truncate the journal
    ///
    /// The snapshot lands before the journal is truncated; replaying stale
    /// entries over a newer snapshot is idempotent.
    fn write_snapshot(&self, state: &mut StoreState) -> StoreResult<()> {
        let bytes = serde_json::to_vec(&state.tree)?;
        let compressed = lz4_flex::compress_prepend_size(&bytes);

        let path = self.config.snapshot_path();
        let tmp = path.with_extension("snap.tmp");
        std::fs::write(&tmp, &compressed)?;
        std::fs::rename(&tmp, &path)?;

        let entries = state
            .journal
            .as_ref()
            .map(|j| j.entry_count())
            .unwrap_or(0);
        if let Some(journal) = state.journal.as_mut() {
            journal.truncate()?;
        }

        tracing::info!(
            "Snapshot written: {} bytes, {} journal entries compacted",
            compressed.len(),
            entries
        );
        Ok(())
    }

    /// Sync the journal to disk, snapshotting if due
    pub async fn flush(&self) -> StoreResult<()> {
        let mut state = self.state.write().await;
        let due = match state.journal.as_mut() {
            Some(journal) => {
                journal.sync()?;
                journal.entry_count() >= self.config.snapshot_threshold
            }
            None => false,
        };

        if due {
            self.write_snapshot(&mut state)?;
        }
        Ok(())
    }

    /// Get store statistics
    pub async fn stats(&self) -> StoreStats {
        let state = self.state.read().await;

        let document_count = tree::count_leaves(&state.tree);
        let journal_entries = state
            .journal
            .as_ref()
            .map(|j| j.entry_count())
            .unwrap_or(0);
        let snapshot_bytes = std::fs::metadata(self.config.snapshot_path())
            .map(|m| m.len())
            .unwrap_or(0);

        StoreStats {
            document_count,
            journal_entries,
            snapshot_bytes,
            subscribers: self.events.receiver_count(),
        }
    }

    /// Start background flush task
    pub fn start_background_flush(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let engine = Arc::clone(self);
        let flush_interval = Duration::from_millis(engine.config.flush_interval_ms);

        tokio::spawn(async move {
            let mut ticker = interval(flush_interval);

            loop {
                ticker.tick().await;

                // Check shutdown
                if *engine.shutdown.read().await {
                    break;
                }

                // Sync if the journal has pending entries
                let has_pending = {
                    let state = engine.state.read().await;
                    state
                        .journal
                        .as_ref()
                        .map(|j| j.has_pending())
                        .unwrap_or(false)
                };
                if has_pending {
                    if let Err(e) = engine.flush().await {
                        tracing::error!("Background flush failed: {}", e);
                    }
                }
            }

            // Final flush on shutdown
            if let Err(e) = engine.flush().await {
                tracing::error!("Final flush failed: {}", e);
            }
        })
    }

    /// Shutdown the engine gracefully
    ///
    /// Writes a final snapshot so the next open replays nothing.
    pub async fn shutdown(&self) -> StoreResult<()> {
        *self.shutdown.write().await = true;

        let mut state = self.state.write().await;
        let has_pending = state
            .journal
            .as_ref()
            .map(|j| j.has_pending())
            .unwrap_or(false);

        if let Some(journal) = state.journal.as_mut() {
            journal.sync()?;
        }
        if has_pending {
            self.write_snapshot(&mut state)?;
        }

        Ok(())
    }

    /// Get the data directory path
    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Store statistics
#[derive(Debug, Clone)]
pub struct StoreStats {
    pub document_count: u64,
    pub journal_entries: u64,
    pub snapshot_bytes: u64,
    pub subscribers: usize,
}

impl std::fmt::Display for StoreStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Documents: {}, Journal: {}, Snapshot: {:.2} KB, Subscribers: {}",
            self.document_count,
            self.journal_entries,
            self.snapshot_bytes as f64 / 1024.0,
            self.subscribers
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    async fn create_test_store() -> (StoreEngine, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let mut config = StoreConfig::new(dir.path());
        config.journal_sync = JournalSyncMode::EveryWrite;
        let engine = StoreEngine::open(config).await.unwrap();
        (engine, dir)
    }

    #[tokio::test]
    async fn test_engine_creation() {
        let (engine, _dir) = create_test_store().await;
        let stats = engine.stats().await;
        assert_eq!(stats.document_count, 0);
        assert_eq!(stats.journal_entries, 0);
    }

    #[tokio::test]
    async fn test_set_and_get() {
        let (engine, _dir) = create_test_store().await;

        engine
            .set("accounts/u1", json!({"username": "ada", "online": true}))
            .await
            .unwrap();

        let profile = engine.get("accounts/u1").await.unwrap().unwrap();
        assert_eq!(profile["username"], "ada");

        let username = engine.get("accounts/u1/username").await.unwrap().unwrap();
        assert_eq!(username, json!("ada"));

        assert_eq!(engine.get("accounts/u2").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_null_removes() {
        let (engine, _dir) = create_test_store().await;

        engine.set("a/b", json!(1)).await.unwrap();
        engine.set("a/b", Value::Null).await.unwrap();

        assert_eq!(engine.get("a/b").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_update_merges_one_level() {
        let (engine, _dir) = create_test_store().await;

        engine
            .set("accounts/u1", json!({"username": "ada", "online": true}))
            .await
            .unwrap();

        let mut fields = Map::new();
        fields.insert("online".to_string(), json!(false));
        fields.insert("username".to_string(), Value::Null);
        engine.update("accounts/u1", fields).await.unwrap();

        let profile = engine.get("accounts/u1").await.unwrap().unwrap();
        assert_eq!(profile, json!({"online": false}));
    }

    #[tokio::test]
    async fn test_remove_and_children() {
        let (engine, _dir) = create_test_store().await;

        engine.set("groups/beta", json!({"n": 2})).await.unwrap();
        engine.set("groups/alpha", json!({"n": 1})).await.unwrap();
        engine.set("groups/gamma", json!({"n": 3})).await.unwrap();

        assert_eq!(
            engine.children("groups").await.unwrap(),
            vec!["alpha", "beta", "gamma"]
        );

        engine.remove("groups/beta").await.unwrap();
        assert_eq!(engine.get("groups/beta").await.unwrap(), None);
        assert_eq!(
            engine.children("groups").await.unwrap(),
            vec!["alpha", "gamma"]
        );

        // Removing a missing path succeeds quietly
        engine.remove("groups/beta").await.unwrap();
    }

    #[tokio::test]
    async fn test_invalid_path_rejected() {
        let (engine, _dir) = create_test_store().await;

        assert!(matches!(
            engine.set("accounts/u#1", json!(1)).await,
            Err(StoreError::InvalidPath(_))
        ));
        assert!(engine.get("a.b").await.is_err());
    }

    #[tokio::test]
    async fn test_events_in_commit_order() {
        let (engine, _dir) = create_test_store().await;
        let mut rx = engine.subscribe();

        engine.set("scores/u1", json!({"total_score": 3})).await.unwrap();
        engine.remove("scores/u1").await.unwrap();

        let first = rx.try_recv().unwrap();
        assert_eq!(first.path, "scores/u1");
        assert_eq!(first.kind, EventKind::Set);
        assert_eq!(first.value, Some(json!({"total_score": 3})));

        let second = rx.try_recv().unwrap();
        assert_eq!(second.kind, EventKind::Remove);
        assert!(second.value.is_none());
        assert!(second.timestamp >= first.timestamp);
    }

    #[tokio::test]
    async fn test_update_emits_child_events() {
        let (engine, _dir) = create_test_store().await;

        engine.set("accounts/u1", json!({"online": true})).await.unwrap();

        let mut rx = engine.subscribe();
        let mut fields = Map::new();
        fields.insert("online".to_string(), Value::Null);
        fields.insert("restricted".to_string(), json!(true));
        engine.update("accounts/u1", fields).await.unwrap();

        let mut seen = Vec::new();
        while let Ok(event) = rx.try_recv() {
            seen.push((event.path, event.kind));
        }
        assert!(seen.contains(&("accounts/u1/online".to_string(), EventKind::Remove)));
        assert!(seen.contains(&("accounts/u1/restricted".to_string(), EventKind::Set)));
    }

    #[tokio::test]
    async fn test_no_event_for_noop_remove() {
        let (engine, _dir) = create_test_store().await;
        let mut rx = engine.subscribe();

        engine.remove("nothing/here").await.unwrap();
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_journal_recovery() {
        let dir = tempdir().unwrap();
        let mut config = StoreConfig::new(dir.path());
        config.journal_sync = JournalSyncMode::EveryWrite;

        // First session: write without shutdown (simulating a crash)
        {
            let engine = StoreEngine::open(config.clone()).await.unwrap();
            engine.set("accounts/u1", json!({"username": "ada"})).await.unwrap();
            engine.set("scores/u1", json!({"total_score": 9})).await.unwrap();
        }

        // Second session: journal replay restores the tree
        {
            let engine = StoreEngine::open(config).await.unwrap();
            assert_eq!(
                engine.get("accounts/u1/username").await.unwrap(),
                Some(json!("ada"))
            );
            assert_eq!(
                engine.get("scores/u1/total_score").await.unwrap(),
                Some(json!(9))
            );
        }
    }

    #[tokio::test]
    async fn test_shutdown_snapshot_round_trip() {
        let dir = tempdir().unwrap();
        let mut config = StoreConfig::new(dir.path());
        config.journal_sync = JournalSyncMode::EveryWrite;

        {
            let engine = StoreEngine::open(config.clone()).await.unwrap();
            engine.set("groups/rust", json!({"created_by": "u1"})).await.unwrap();
            engine.shutdown().await.unwrap();

            // Shutdown compacts the journal into the snapshot
            let stats = engine.stats().await;
            assert_eq!(stats.journal_entries, 0);
            assert!(stats.snapshot_bytes > 0);
        }

        {
            let engine = StoreEngine::open(config).await.unwrap();
            assert_eq!(
                engine.get("groups/rust/created_by").await.unwrap(),
                Some(json!("u1"))
            );
        }
    }

    #[tokio::test]
    async fn test_snapshot_threshold_compaction() {
        let dir = tempdir().unwrap();
        let mut config = StoreConfig::new(dir.path());
        config.journal_sync = JournalSyncMode::EveryWrite;
        config.snapshot_threshold = 5;

        let engine = StoreEngine::open(config.clone()).await.unwrap();
        for i in 0..5 {
            engine.set(&format!("items/i{}", i), json!(i)).await.unwrap();
        }

        let stats = engine.stats().await;
        assert_eq!(stats.journal_entries, 0);
        assert!(stats.snapshot_bytes > 0);
        assert_eq!(stats.document_count, 5);

        // Reopen from the snapshot alone
        drop(engine);
        let engine = StoreEngine::open(config).await.unwrap();
        assert_eq!(engine.get("items/i4").await.unwrap(), Some(json!(4)));
    }

    #[tokio::test]
    async fn test_set_root_replaces_tree() {
        let (engine, _dir) = create_test_store().await;

        engine.set("a/b", json!(1)).await.unwrap();
        engine.set("", json!({"fresh": true})).await.unwrap();

        assert_eq!(engine.get("a/b").await.unwrap(), None);
        assert_eq!(engine.get("fresh").await.unwrap(), Some(json!(true)));

        engine.remove("").await.unwrap();
        assert_eq!(engine.get("fresh").await.unwrap(), None);
    }
}
