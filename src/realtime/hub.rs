//! Subscription Hub
//!
//! Manages all WebSocket connections and their path-prefix subscriptions,
//! and bridges the store's committed-write broadcast into per-connection
//! channels.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, RwLock};
use uuid::Uuid;

use super::messages::ServerMessage;
use crate::store::{StoreEngine, TreePath};

/// Unique identifier for a WebSocket connection
pub type ConnectionId = String;

/// Manages all WebSocket connections and subscriptions
pub struct SubscriptionHub {
    /// Active connections: ConnectionId → ConnectionHandle
    connections: Arc<RwLock<HashMap<ConnectionId, ConnectionHandle>>>,
    /// Topic subscriptions: path prefix → Set of ConnectionIds
    subscriptions: Arc<RwLock<HashMap<String, HashSet<ConnectionId>>>>,
    /// Configuration
    config: HubConfig,
}

/// Configuration for the subscription hub
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Maximum number of concurrent connections
    pub max_connections: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            max_connections: 1000,
        }
    }
}

/// Handle for sending messages to a specific connection
pub struct ConnectionHandle {
    /// Channel sender for this connection
    pub sender: mpsc::UnboundedSender<ServerMessage>,
    /// Topics this connection is subscribed to
    pub subscriptions: HashSet<String>,
}

impl SubscriptionHub {
    /// Create a new subscription hub
    pub fn new(config: HubConfig) -> Self {
        Self {
            connections: Arc::new(RwLock::new(HashMap::new())),
            subscriptions: Arc::new(RwLock::new(HashMap::new())),
            config,
        }
    }

    /// Register a new WebSocket connection
    ///
    /// Returns the connection ID on success, or an error if the connection
    /// limit has been reached.
    pub async fn register(
        &self,
        sender: mpsc::UnboundedSender<ServerMessage>,
    ) -> Result<ConnectionId, HubError> {
        let connections = self.connections.read().await;
        if connections.len() >= self.config.max_connections {
            return Err(HubError::TooManyConnections {
                limit: self.config.max_connections,
            });
        }
        drop(connections);

        let id = Uuid::new_v4().to_string();
        let handle = ConnectionHandle {
            sender,
            subscriptions: HashSet::new(),
        };

        self.connections.write().await.insert(id.clone(), handle);

        tracing::info!(connection_id = %id, "WebSocket connected");
        Ok(id)
    }

    /// Unregister a connection and clean up its subscriptions
    pub async fn unregister(&self, id: &str) {
        // Remove from connections
        let handle = self.connections.write().await.remove(id);

        // Remove from all subscriptions
        if let Some(handle) = handle {
            let mut subs = self.subscriptions.write().await;
            for topic in handle.subscriptions {
                if let Some(subscribers) = subs.get_mut(&topic) {
                    subscribers.remove(id);
                    // Clean up empty topic entries
                    if subscribers.is_empty() {
                        subs.remove(&topic);
                    }
                }
            }
        }

        tracing::info!(connection_id = %id, "WebSocket disconnected");
    }

    /// Subscribe a connection to path-prefix topics
    ///
    /// Topics that fail path validation are skipped.
    pub async fn subscribe(&self, id: &str, topics: Vec<String>) -> Result<Vec<String>, HubError> {
        let mut connections = self.connections.write().await;
        let handle = connections.get_mut(id).ok_or(HubError::ConnectionNotFound)?;

        let mut subs = self.subscriptions.write().await;
        let mut subscribed = Vec::new();

        for topic in topics {
            let topic = normalize_topic(&topic);
            if !is_valid_topic(&topic) {
                tracing::warn!(topic = %topic, "Invalid topic ignored");
                continue;
            }

            // Add to connection's subscriptions
            handle.subscriptions.insert(topic.clone());

            // Add to topic's subscribers
            subs.entry(topic.clone())
                .or_insert_with(HashSet::new)
                .insert(id.to_string());

            subscribed.push(topic);
        }

        tracing::debug!(
            connection_id = %id,
            topics = ?subscribed,
            "Subscribed to topics"
        );

        Ok(subscribed)
    }

    /// Unsubscribe a connection from topics
    pub async fn unsubscribe(
        &self,
        id: &str,
        topics: Vec<String>,
    ) -> Result<Vec<String>, HubError> {
        let mut connections = self.connections.write().await;
        let handle = connections.get_mut(id).ok_or(HubError::ConnectionNotFound)?;

        let mut subs = self.subscriptions.write().await;
        let mut unsubscribed = Vec::new();

        for topic in topics {
            let topic = normalize_topic(&topic);
            if handle.subscriptions.remove(&topic) {
                unsubscribed.push(topic.clone());

                if let Some(subscribers) = subs.get_mut(&topic) {
                    subscribers.remove(id);
                    if subscribers.is_empty() {
                        subs.remove(&topic);
                    }
                }
            }
        }

        tracing::debug!(
            connection_id = %id,
            topics = ?unsubscribed,
            "Unsubscribed from topics"
        );

        Ok(unsubscribed)
    }

    /// Fan a message out to every connection whose topic covers `path`
    pub async fn broadcast(&self, path: &str, message: ServerMessage) {
        let subs = self.subscriptions.read().await;
        let connections = self.connections.read().await;

        // A topic covers a path when it is a segment-wise prefix of it
        let mut targets: HashSet<&ConnectionId> = HashSet::new();
        for (topic, subscribers) in subs.iter() {
            if topic_covers(topic, path) {
                targets.extend(subscribers.iter());
            }
        }

        let mut sent_count = 0;
        for id in targets {
            if let Some(handle) = connections.get(id) {
                if handle.sender.send(message.clone()).is_ok() {
                    sent_count += 1;
                }
            }
        }

        if sent_count > 0 {
            tracing::trace!(
                path = %path,
                subscribers = sent_count,
                "Broadcast event"
            );
        }
    }

    /// Send a message directly to a specific connection
    pub async fn send_to(&self, id: &str, message: ServerMessage) -> Result<(), HubError> {
        let connections = self.connections.read().await;
        let handle = connections.get(id).ok_or(HubError::ConnectionNotFound)?;

        handle.sender.send(message).map_err(|_| HubError::SendFailed)
    }

    /// Start the task that feeds committed store writes into the hub
    pub fn start_store_bridge(
        self: &Arc<Self>,
        store: &Arc<StoreEngine>,
    ) -> tokio::task::JoinHandle<()> {
        let hub = Arc::clone(self);
        let mut events = store.subscribe();

        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => {
                        let path = event.path.clone();
                        hub.broadcast(&path, ServerMessage::event(event)).await;
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Store event stream lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }

    /// Get the current connection count
    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Get subscription count for a topic
    pub async fn subscription_count(&self, topic: &str) -> usize {
        self.subscriptions
            .read()
            .await
            .get(&normalize_topic(topic))
            .map(|s| s.len())
            .unwrap_or(0)
    }
}

/// Strip decorative slashes so equivalent topics collapse to one key
fn normalize_topic(topic: &str) -> String {
    topic.trim_matches('/').to_string()
}

/// A topic is any valid store path; the empty topic is the root
fn is_valid_topic(topic: &str) -> bool {
    TreePath::parse(topic).is_ok()
}

/// Whether `topic` is a segment-wise prefix of `path`
fn topic_covers(topic: &str, path: &str) -> bool {
    if topic.is_empty() {
        return true;
    }
    match path.strip_prefix(topic) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// Errors that can occur in the subscription hub
#[derive(Debug, Error)]
pub enum HubError {
    #[error("Too many connections (limit: {limit})")]
    TooManyConnections { limit: usize },

    #[error("Connection not found")]
    ConnectionNotFound,

    #[error("Failed to send message")]
    SendFailed,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{EventKind, JournalSyncMode, StoreConfig};
    use serde_json::json;
    use tempfile::tempdir;
    use tokio::time::{timeout, Duration};

    #[test]
    fn test_default_config() {
        let config = HubConfig::default();
        assert_eq!(config.max_connections, 1000);
    }

    #[test]
    fn test_valid_topics() {
        assert!(is_valid_topic(""));
        assert!(is_valid_topic("accounts/u1/posts"));
        assert!(is_valid_topic("leaderboard"));

        assert!(!is_valid_topic("accounts/u#1"));
        assert!(!is_valid_topic("a//b"));
    }

    #[test]
    fn test_topic_covers() {
        assert!(topic_covers("", "accounts/u1"));
        assert!(topic_covers("accounts/u1", "accounts/u1"));
        assert!(topic_covers("accounts/u1", "accounts/u1/posts/p1"));

        assert!(!topic_covers("accounts/u1", "accounts/u10/posts"));
        assert!(!topic_covers("accounts/u1/posts", "accounts/u1"));
    }

    #[tokio::test]
    async fn test_register_unregister() {
        let hub = SubscriptionHub::new(HubConfig::default());
        let (tx, _rx) = mpsc::unbounded_channel();

        let id = hub.register(tx).await.unwrap();
        assert!(!id.is_empty());
        assert_eq!(hub.connection_count().await, 1);

        hub.unregister(&id).await;
        assert_eq!(hub.connection_count().await, 0);
    }

    #[tokio::test]
    async fn test_subscribe_unsubscribe() {
        let hub = SubscriptionHub::new(HubConfig::default());
        let (tx, _rx) = mpsc::unbounded_channel();

        let id = hub.register(tx).await.unwrap();

        // Subscribe
        let subscribed = hub
            .subscribe(&id, vec!["groups/rustaceans/messages".to_string()])
            .await
            .unwrap();
        assert_eq!(subscribed, vec!["groups/rustaceans/messages"]);
        assert_eq!(hub.subscription_count("groups/rustaceans/messages").await, 1);

        // Unsubscribe
        let unsubscribed = hub
            .unsubscribe(&id, vec!["groups/rustaceans/messages".to_string()])
            .await
            .unwrap();
        assert_eq!(unsubscribed, vec!["groups/rustaceans/messages"]);
        assert_eq!(hub.subscription_count("groups/rustaceans/messages").await, 0);

        hub.unregister(&id).await;
    }

    #[tokio::test]
    async fn test_invalid_topic_skipped() {
        let hub = SubscriptionHub::new(HubConfig::default());
        let (tx, _rx) = mpsc::unbounded_channel();
        let id = hub.register(tx).await.unwrap();

        let subscribed = hub
            .subscribe(&id, vec!["bad#topic".to_string(), "feed".to_string()])
            .await
            .unwrap();
        assert_eq!(subscribed, vec!["feed"]);

        hub.unregister(&id).await;
    }

    #[tokio::test]
    async fn test_connection_limit() {
        let config = HubConfig { max_connections: 2 };
        let hub = SubscriptionHub::new(config);

        let (tx1, _) = mpsc::unbounded_channel();
        let (tx2, _) = mpsc::unbounded_channel();
        let (tx3, _) = mpsc::unbounded_channel();

        let id1 = hub.register(tx1).await.unwrap();
        let id2 = hub.register(tx2).await.unwrap();
        let result = hub.register(tx3).await;

        assert!(matches!(
            result,
            Err(HubError::TooManyConnections { limit: 2 })
        ));

        hub.unregister(&id1).await;
        hub.unregister(&id2).await;
    }

    #[tokio::test]
    async fn test_broadcast_respects_prefixes() {
        let hub = SubscriptionHub::new(HubConfig::default());

        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();

        let id1 = hub.register(tx1).await.unwrap();
        let id2 = hub.register(tx2).await.unwrap();

        // id1 watches one account's posts, id2 watches another account
        hub.subscribe(&id1, vec!["accounts/u1/posts".to_string()])
            .await
            .unwrap();
        hub.subscribe(&id2, vec!["accounts/u2".to_string()])
            .await
            .unwrap();

        hub.broadcast(
            "accounts/u1/posts/p1",
            ServerMessage::Event {
                path: "accounts/u1/posts/p1".to_string(),
                kind: EventKind::Set,
                value: Some(json!({"text": "hello"})),
                timestamp: 1,
            },
        )
        .await;

        assert!(rx1.try_recv().is_ok());
        assert!(rx2.try_recv().is_err());

        hub.unregister(&id1).await;
        hub.unregister(&id2).await;
    }

    #[tokio::test]
    async fn test_root_topic_sees_everything() {
        let hub = SubscriptionHub::new(HubConfig::default());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let id = hub.register(tx).await.unwrap();

        hub.subscribe(&id, vec!["".to_string()]).await.unwrap();

        hub.broadcast(
            "stories/u1/s1",
            ServerMessage::Event {
                path: "stories/u1/s1".to_string(),
                kind: EventKind::Set,
                value: Some(json!({"image_id": "m1"})),
                timestamp: 1,
            },
        )
        .await;

        assert!(rx.try_recv().is_ok());
        hub.unregister(&id).await;
    }

    #[tokio::test]
    async fn test_store_bridge_fans_out_writes() {
        let dir = tempdir().unwrap();
        let mut config = StoreConfig::new(dir.path());
        config.journal_sync = JournalSyncMode::EveryWrite;
        let store = Arc::new(crate::store::StoreEngine::open(config).await.unwrap());

        let hub = Arc::new(SubscriptionHub::new(HubConfig::default()));
        let bridge = hub.start_store_bridge(&store);

        let (tx, mut rx) = mpsc::unbounded_channel();
        let id = hub.register(tx).await.unwrap();
        hub.subscribe(&id, vec!["scores".to_string()]).await.unwrap();

        store
            .set("scores/u1", json!({"total_score": 7}))
            .await
            .unwrap();

        let msg = timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("timed out waiting for event")
            .expect("channel closed");
        match msg {
            ServerMessage::Event { path, kind, .. } => {
                assert_eq!(path, "scores/u1");
                assert_eq!(kind, EventKind::Set);
            }
            other => panic!("Expected Event, got {:?}", other),
        }

        hub.unregister(&id).await;
        bridge.abort();
    }
}
