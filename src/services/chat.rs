//! Chat Service
//!
//! Groups and messages over `groups/{name}`. Membership is a per-user map
//! on the group; joins and leaves append system messages. Each membership
//! change is mirrored into `accounts/{uid}/groups/{name}` so a profile can
//! list its groups without scanning every group.

use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

use crate::services::{ServiceError, ServiceResult};
use crate::store::{StoreEngine, TreePath};

const MAX_MESSAGE_CHARS: usize = 2000;

/// A group as rendered to clients
#[derive(Debug, Clone, Serialize)]
pub struct GroupView {
    pub name: String,
    pub created_by: String,
    pub created_at: i64,
    pub member_count: usize,
}

/// A chat message
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub id: String,
    pub sender: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment_id: Option<String>,
    /// Join/leave notices carry this flag
    pub system: bool,
    pub sent_at: i64,
}

/// Group chat over the document tree
pub struct ChatService {
    store: Arc<StoreEngine>,
}

impl ChatService {
    pub fn new(store: Arc<StoreEngine>) -> Self {
        Self { store }
    }

    /// Create a group; the creator joins and a system notice is appended
    pub async fn create_group(&self, name: &str, uid: &str) -> ServiceResult<GroupView> {
        self.ensure_writable(uid).await?;

        // Group names become path segments, so they validate like one
        TreePath::parse(&format!("groups/{}", name)).map_err(|e| {
            ServiceError::Validation(format!("invalid group name '{}': {}", name, e))
        })?;
        if name.len() > 64 {
            return Err(ServiceError::Validation(
                "group name exceeds 64 characters".to_string(),
            ));
        }
        if self.store.get(&format!("groups/{}", name)).await?.is_some() {
            return Err(ServiceError::Conflict(format!(
                "group '{}' already exists",
                name
            )));
        }

        self.store
            .set(
                &format!("groups/{}", name),
                json!({
                    "created_by": uid,
                    "created_at": now_millis(),
                    "members": { uid: true },
                }),
            )
            .await?;
        self.mirror_membership(uid, name, true).await?;
        self.append_system(name, uid, &format!("{} joined the group", uid))
            .await?;

        tracing::info!(group = %name, uid = %uid, "Group created");
        self.group(name).await
    }

    /// List every group
    pub async fn list_groups(&self) -> ServiceResult<Vec<GroupView>> {
        let mut groups = Vec::new();
        for name in self.store.children("groups").await? {
            if let Some(value) = self.store.get(&format!("groups/{}", name)).await? {
                groups.push(to_view(&name, &value));
            }
        }
        Ok(groups)
    }

    /// Read one group
    pub async fn group(&self, name: &str) -> ServiceResult<GroupView> {
        let value = self
            .store
            .get(&format!("groups/{}", name))
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("group {}", name)))?;
        Ok(to_view(name, &value))
    }

    /// Join a group; joining twice is a no-op
    pub async fn join(&self, name: &str, uid: &str) -> ServiceResult<()> {
        self.ensure_writable(uid).await?;
        self.ensure_group_exists(name).await?;

        let member_path = format!("groups/{}/members/{}", name, uid);
        if self
            .store
            .get(&member_path)
            .await?
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
        {
            return Ok(());
        }

        self.store.set(&member_path, json!(true)).await?;
        self.mirror_membership(uid, name, true).await?;
        self.append_system(name, uid, &format!("{} joined the group", uid))
            .await?;
        Ok(())
    }

    /// Leave a group
    pub async fn leave(&self, name: &str, uid: &str) -> ServiceResult<()> {
        self.ensure_group_exists(name).await?;

        let member_path = format!("groups/{}/members/{}", name, uid);
        if self.store.get(&member_path).await?.is_none() {
            return Ok(());
        }

        self.store.remove(&member_path).await?;
        self.mirror_membership(uid, name, false).await?;
        self.append_system(name, uid, &format!("{} left the group", uid))
            .await?;
        Ok(())
    }

    /// Send a message (members only)
    pub async fn send(
        &self,
        name: &str,
        uid: &str,
        text: &str,
        attachment_id: Option<String>,
    ) -> ServiceResult<ChatMessage> {
        self.ensure_writable(uid).await?;
        self.ensure_group_exists(name).await?;

        let is_member = self
            .store
            .get(&format!("groups/{}/members/{}", name, uid))
            .await?
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        if !is_member {
            return Err(ServiceError::Forbidden(format!(
                "not a member of group '{}'",
                name
            )));
        }

        let text = text.trim();
        if text.is_empty() && attachment_id.is_none() {
            return Err(ServiceError::Validation(
                "a message needs text or an attachment".to_string(),
            ));
        }
        if text.len() > MAX_MESSAGE_CHARS {
            return Err(ServiceError::Validation(format!(
                "message exceeds {} characters",
                MAX_MESSAGE_CHARS
            )));
        }

        let message = ChatMessage {
            id: Uuid::new_v4().to_string(),
            sender: uid.to_string(),
            text: text.to_string(),
            attachment_id,
            system: false,
            sent_at: now_millis(),
        };
        self.write_message(name, &message).await?;
        Ok(message)
    }

    /// Messages in a group, oldest first
    pub async fn messages(&self, name: &str) -> ServiceResult<Vec<ChatMessage>> {
        self.ensure_group_exists(name).await?;

        let base = format!("groups/{}/messages", name);
        let mut messages = Vec::new();
        for id in self.store.children(&base).await? {
            if let Some(value) = self.store.get(&format!("{}/{}", base, id)).await? {
                messages.push(ChatMessage {
                    id: id.clone(),
                    sender: value["sender"].as_str().unwrap_or_default().to_string(),
                    text: value["text"].as_str().unwrap_or_default().to_string(),
                    attachment_id: value["attachment_id"].as_str().map(String::from),
                    system: value["system"].as_bool().unwrap_or(false),
                    sent_at: value["sent_at"].as_i64().unwrap_or(0),
                });
            }
        }
        messages.sort_by_key(|m| m.sent_at);
        Ok(messages)
    }

    // ---- internals ----

    async fn append_system(&self, name: &str, uid: &str, text: &str) -> ServiceResult<()> {
        let message = ChatMessage {
            id: Uuid::new_v4().to_string(),
            sender: uid.to_string(),
            text: text.to_string(),
            attachment_id: None,
            system: true,
            sent_at: now_millis(),
        };
        self.write_message(name, &message).await
    }

    async fn write_message(&self, name: &str, message: &ChatMessage) -> ServiceResult<()> {
        self.store
            .set(
                &format!("groups/{}/messages/{}", name, message.id),
                json!({
                    "sender": message.sender,
                    "text": message.text,
                    "attachment_id": message.attachment_id,
                    "system": message.system,
                    "sent_at": message.sent_at,
                }),
            )
            .await?;
        Ok(())
    }

    async fn mirror_membership(&self, uid: &str, name: &str, member: bool) -> ServiceResult<()> {
        let path = format!("accounts/{}/groups/{}", uid, name);
        if member {
            self.store.set(&path, json!(true)).await?;
        } else {
            self.store.remove(&path).await?;
        }
        Ok(())
    }

    async fn ensure_group_exists(&self, name: &str) -> ServiceResult<()> {
        if self.store.get(&format!("groups/{}", name)).await?.is_none() {
            return Err(ServiceError::NotFound(format!("group {}", name)));
        }
        Ok(())
    }

    async fn ensure_writable(&self, uid: &str) -> ServiceResult<()> {
        let restricted = self
            .store
            .get(&format!("accounts/{}/restricted", uid))
            .await?
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        if restricted {
            return Err(ServiceError::Restricted);
        }
        Ok(())
    }
}

fn to_view(name: &str, value: &Value) -> GroupView {
    GroupView {
        name: name.to_string(),
        created_by: value["created_by"].as_str().unwrap_or_default().to_string(),
        created_at: value["created_at"].as_i64().unwrap_or(0),
        member_count: value["members"].as_object().map(|m| m.len()).unwrap_or(0),
    }
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{JournalSyncMode, StoreConfig};
    use tempfile::tempdir;

    async fn create_test_chat() -> (ChatService, Arc<StoreEngine>, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let mut config = StoreConfig::new(dir.path());
        config.journal_sync = JournalSyncMode::EveryWrite;
        let store = Arc::new(StoreEngine::open(config).await.unwrap());
        (ChatService::new(Arc::clone(&store)), store, dir)
    }

    #[tokio::test]
    async fn test_create_group_and_system_message() {
        let (chat, _store, _dir) = create_test_chat().await;

        let group = chat.create_group("rustaceans", "u1").await.unwrap();
        assert_eq!(group.created_by, "u1");
        assert_eq!(group.member_count, 1);

        let messages = chat.messages("rustaceans").await.unwrap();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].system);
        assert!(messages[0].text.contains("joined"));
    }

    #[tokio::test]
    async fn test_duplicate_group_rejected() {
        let (chat, _store, _dir) = create_test_chat().await;
        chat.create_group("rustaceans", "u1").await.unwrap();

        assert!(matches!(
            chat.create_group("rustaceans", "u2").await,
            Err(ServiceError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_invalid_group_name() {
        let (chat, _store, _dir) = create_test_chat().await;

        assert!(matches!(
            chat.create_group("bad#name", "u1").await,
            Err(ServiceError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_join_is_idempotent() {
        let (chat, store, _dir) = create_test_chat().await;
        chat.create_group("rustaceans", "u1").await.unwrap();

        chat.join("rustaceans", "u2").await.unwrap();
        chat.join("rustaceans", "u2").await.unwrap();

        let group = chat.group("rustaceans").await.unwrap();
        assert_eq!(group.member_count, 2);

        // Exactly one join notice for u2
        let notices = chat
            .messages("rustaceans")
            .await
            .unwrap()
            .into_iter()
            .filter(|m| m.system && m.sender == "u2")
            .count();
        assert_eq!(notices, 1);

        // Membership is mirrored on the account
        assert_eq!(
            store.get("accounts/u2/groups/rustaceans").await.unwrap(),
            Some(json!(true))
        );
    }

    #[tokio::test]
    async fn test_leave_removes_membership() {
        let (chat, store, _dir) = create_test_chat().await;
        chat.create_group("rustaceans", "u1").await.unwrap();
        chat.join("rustaceans", "u2").await.unwrap();

        chat.leave("rustaceans", "u2").await.unwrap();
        let group = chat.group("rustaceans").await.unwrap();
        assert_eq!(group.member_count, 1);
        assert_eq!(store.get("accounts/u2/groups/rustaceans").await.unwrap(), None);

        // Leaving again is a quiet no-op
        chat.leave("rustaceans", "u2").await.unwrap();
    }

    #[tokio::test]
    async fn test_send_requires_membership() {
        let (chat, _store, _dir) = create_test_chat().await;
        chat.create_group("rustaceans", "u1").await.unwrap();

        assert!(matches!(
            chat.send("rustaceans", "u2", "hi", None).await,
            Err(ServiceError::Forbidden(_))
        ));

        let message = chat
            .send("rustaceans", "u1", "welcome", None)
            .await
            .unwrap();
        assert!(!message.system);

        let messages = chat.messages("rustaceans").await.unwrap();
        assert_eq!(messages.last().unwrap().text, "welcome");
    }

    #[tokio::test]
    async fn test_messages_ascending_by_sent_at() {
        let (chat, store, _dir) = create_test_chat().await;
        chat.create_group("g", "u1").await.unwrap();

        for (id, ts) in [("m-b", 200), ("m-a", 100), ("m-c", 300)] {
            store
                .set(
                    &format!("groups/g/messages/{}", id),
                    json!({"sender": "u1", "text": id, "system": false, "sent_at": ts}),
                )
                .await
                .unwrap();
        }

        let messages = chat.messages("g").await.unwrap();
        let in_order: Vec<i64> = messages.iter().map(|m| m.sent_at).collect();
        let mut sorted = in_order.clone();
        sorted.sort_unstable();
        assert_eq!(in_order, sorted);
    }

    #[tokio::test]
    async fn test_missing_group_not_found() {
        let (chat, _store, _dir) = create_test_chat().await;

        assert!(matches!(
            chat.messages("nope").await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(
            chat.join("nope", "u1").await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_restricted_sender_rejected() {
        let (chat, store, _dir) = create_test_chat().await;
        chat.create_group("g", "u1").await.unwrap();
        chat.join("g", "u2").await.unwrap();
        store
            .set("accounts/u2/restricted", json!(true))
            .await
            .unwrap();

        assert!(matches!(
            chat.send("g", "u2", "blocked", None).await,
            Err(ServiceError::Restricted)
        ));
    }
}
