//! Realtime Message Types
//!
//! Defines all message types for WebSocket communication between
//! clients (the web UI) and the Arregmatica server.

use crate::store::{EventKind, StoreEvent};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Messages sent from client to server
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Subscribe to path prefixes for real-time updates
    Subscribe {
        /// List of store path prefixes (e.g., "accounts/u1/posts", "leaderboard")
        topics: Vec<String>,
    },
    /// Unsubscribe from path prefixes
    Unsubscribe {
        /// List of topics to unsubscribe from
        topics: Vec<String>,
    },
    /// Ping for keepalive
    Ping,
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Connection established
    Connected {
        /// Unique connection identifier
        connection_id: String,
    },
    /// Subscription confirmed
    Subscribed {
        /// Topics successfully subscribed to
        topics: Vec<String>,
    },
    /// Unsubscription confirmed
    Unsubscribed {
        /// Topics successfully unsubscribed from
        topics: Vec<String>,
    },
    /// A committed write at or below one of the connection's topics
    Event {
        /// Path the write applied to
        path: String,
        /// Set or remove
        kind: EventKind,
        /// New value at the path (absent for removals)
        #[serde(skip_serializing_if = "Option::is_none")]
        value: Option<Value>,
        /// Commit timestamp in milliseconds
        timestamp: i64,
    },
    /// Pong response to ping
    Pong,
    /// Error message
    Error {
        /// Error description
        message: String,
    },
}

impl ServerMessage {
    /// Build an event message from a committed store write
    pub fn event(event: StoreEvent) -> Self {
        ServerMessage::Event {
            path: event.path,
            kind: event.kind,
            value: event.value,
            timestamp: event.timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_client_message_deserialize_subscribe() {
        let json = r#"{"type": "subscribe", "topics": ["accounts/u1/posts", "leaderboard"]}"#;
        let msg: ClientMessage = serde_json::from_str(json).unwrap();
        match msg {
            ClientMessage::Subscribe { topics } => {
                assert_eq!(topics.len(), 2);
                assert_eq!(topics[0], "accounts/u1/posts");
            }
            _ => panic!("Expected Subscribe"),
        }
    }

    #[test]
    fn test_client_message_deserialize_ping() {
        let json = r#"{"type": "ping"}"#;
        let msg: ClientMessage = serde_json::from_str(json).unwrap();
        assert!(matches!(msg, ClientMessage::Ping));
    }

    #[test]
    fn test_server_message_serialize_event() {
        let msg = ServerMessage::event(StoreEvent {
            path: "scores/u1".to_string(),
            kind: EventKind::Set,
            value: Some(json!({"total_score": 12})),
            timestamp: 1699000000000,
        });
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"type\":\"event\""));
        assert!(json.contains("\"path\":\"scores/u1\""));
        assert!(json.contains("\"kind\":\"set\""));
        assert!(json.contains("\"total_score\":12"));
    }

    #[test]
    fn test_server_message_removal_omits_value() {
        let msg = ServerMessage::event(StoreEvent {
            path: "admin/account1/a1".to_string(),
            kind: EventKind::Remove,
            value: None,
            timestamp: 1699000000000,
        });
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"kind\":\"remove\""));
        assert!(!json.contains("\"value\""));
    }

    #[test]
    fn test_server_message_serialize_connected() {
        let msg = ServerMessage::Connected {
            connection_id: "abc-123".to_string(),
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"type\":\"connected\""));
        assert!(json.contains("\"connection_id\":\"abc-123\""));
    }
}
