//! Admin Service
//!
//! The back-office: admin accounts at `admin/account1/{id}`, user
//! restriction toggles, account deletion, and the usage report. Admin
//! credentials are argon2-hashed; the hash is never serialized out of this
//! module. Admin sessions are separate from user sessions.

use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use rand::RngCore;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::services::{ServiceError, ServiceResult};
use crate::store::StoreEngine;

/// Admin accounts live under this path, as the original did
const ADMIN_BASE: &str = "admin/account1";

/// An admin account, credentials omitted
#[derive(Debug, Clone, Serialize)]
pub struct AdminView {
    pub id: String,
    pub name: String,
    pub restricted: bool,
    pub created_at: i64,
}

/// Usage analytics assembled from the tree
#[derive(Debug, Clone, Serialize)]
pub struct UsageReport {
    pub accounts: usize,
    pub posts: usize,
    pub messages: usize,
    pub stories: usize,
    pub quiz_plays: u64,
    /// Invocations per writing tool
    pub tool_counts: BTreeMap<String, u64>,
    /// Most-invoked tool, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_tool: Option<String>,
}

/// Back-office operations
pub struct AdminService {
    store: Arc<StoreEngine>,
    /// token → admin id
    sessions: RwLock<HashMap<String, String>>,
}

impl AdminService {
    pub fn new(store: Arc<StoreEngine>) -> Self {
        Self {
            store,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Register an admin account
    pub async fn register_admin(&self, name: &str, password: &str) -> ServiceResult<AdminView> {
        let name = name.trim();
        if name.is_empty() || name.len() > 64 {
            return Err(ServiceError::Validation(
                "admin name must be 1-64 characters".to_string(),
            ));
        }
        if password.len() < 6 {
            return Err(ServiceError::Validation(
                "password must be at least 6 characters".to_string(),
            ));
        }
        for existing in self.list_admins().await? {
            if existing.name == name {
                return Err(ServiceError::Conflict(format!(
                    "admin '{}' already exists",
                    name
                )));
            }
        }

        let view = AdminView {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            restricted: false,
            created_at: now_millis(),
        };
        self.store
            .set(
                &format!("{}/{}", ADMIN_BASE, view.id),
                json!({
                    "name": view.name,
                    "password_hash": hash_password(password)?,
                    "restricted": false,
                    "created_at": view.created_at,
                }),
            )
            .await?;

        tracing::info!(admin_id = %view.id, name = %name, "Admin registered");
        Ok(view)
    }

    /// Verify admin credentials and issue a session token
    pub async fn login_admin(&self, name: &str, password: &str) -> ServiceResult<String> {
        let mut found = None;
        for id in self.store.children(ADMIN_BASE).await? {
            if let Some(value) = self.store.get(&format!("{}/{}", ADMIN_BASE, id)).await? {
                if value["name"].as_str() == Some(name) {
                    found = Some((id, value));
                    break;
                }
            }
        }
        let (id, value) = found.ok_or(ServiceError::Unauthorized)?;

        let stored = value["password_hash"].as_str().unwrap_or_default();
        verify_password(password, stored)?;
        if value["restricted"].as_bool().unwrap_or(false) {
            return Err(ServiceError::Restricted);
        }

        let token = new_token();
        self.sessions.write().await.insert(token.clone(), id);
        Ok(token)
    }

    /// Resolve an admin bearer token
    pub async fn resolve_admin(&self, token: &str) -> ServiceResult<String> {
        self.sessions
            .read()
            .await
            .get(token)
            .cloned()
            .ok_or(ServiceError::Unauthorized)
    }

    /// Every admin account (hash never leaves the store)
    pub async fn list_admins(&self) -> ServiceResult<Vec<AdminView>> {
        let mut admins = Vec::new();
        for id in self.store.children(ADMIN_BASE).await? {
            if let Some(value) = self.store.get(&format!("{}/{}", ADMIN_BASE, id)).await? {
                admins.push(AdminView {
                    id: id.clone(),
                    name: value["name"].as_str().unwrap_or_default().to_string(),
                    restricted: value["restricted"].as_bool().unwrap_or(false),
                    created_at: value["created_at"].as_i64().unwrap_or(0),
                });
            }
        }
        Ok(admins)
    }

    /// Delete an admin account
    ///
    /// After this, reads of the admin collection no longer contain the id.
    pub async fn delete_admin(&self, id: &str) -> ServiceResult<()> {
        let path = format!("{}/{}", ADMIN_BASE, id);
        if self.store.get(&path).await?.is_none() {
            return Err(ServiceError::NotFound(format!("admin {}", id)));
        }
        self.store.remove(&path).await?;

        // Invalidate any session held by the deleted admin
        self.sessions.write().await.retain(|_, admin| admin != id);

        tracing::info!(admin_id = %id, "Admin deleted");
        Ok(())
    }

    /// Set a user's restricted flag
    ///
    /// Idempotent in both directions: restricting twice leaves `true`,
    /// unrestricting twice leaves `false`.
    pub async fn set_restricted(&self, uid: &str, restricted: bool) -> ServiceResult<bool> {
        if self
            .store
            .get(&format!("accounts/{}", uid))
            .await?
            .is_none()
        {
            return Err(ServiceError::NotFound(format!("account {}", uid)));
        }

        let mut fields = Map::new();
        fields.insert("restricted".to_string(), json!(restricted));
        self.store
            .update(&format!("accounts/{}", uid), fields)
            .await?;
        Ok(restricted)
    }

    /// Remove an account and everything hanging off it
    pub async fn delete_account(&self, uid: &str) -> ServiceResult<()> {
        if self
            .store
            .get(&format!("accounts/{}", uid))
            .await?
            .is_none()
        {
            return Err(ServiceError::NotFound(format!("account {}", uid)));
        }
        self.store.remove(&format!("accounts/{}", uid)).await?;
        self.store.remove(&format!("scores/{}", uid)).await?;
        self.store.remove(&format!("stories/{}", uid)).await?;

        tracing::info!(uid = %uid, "Account deleted");
        Ok(())
    }

    /// Usage report assembled by walking the tree
    pub async fn analytics(&self) -> ServiceResult<UsageReport> {
        let account_ids = self.store.children("accounts").await?;
        let mut posts = 0;
        for uid in &account_ids {
            posts += self
                .store
                .children(&format!("accounts/{}/posts", uid))
                .await?
                .len();
        }

        let mut messages = 0;
        for group in self.store.children("groups").await? {
            messages += self
                .store
                .children(&format!("groups/{}/messages", group))
                .await?
                .len();
        }

        let mut stories = 0;
        for uid in self.store.children("stories").await? {
            stories += self
                .store
                .children(&format!("stories/{}", uid))
                .await?
                .len();
        }

        let quiz_plays = self
            .store
            .get("analytics/quiz/plays")
            .await?
            .and_then(|v| v.as_u64())
            .unwrap_or(0);

        let tool_counts: BTreeMap<String, u64> = match self.store.get("analytics/tools").await? {
            Some(Value::Object(map)) => map
                .iter()
                .map(|(k, v)| (k.clone(), v.as_u64().unwrap_or(0)))
                .collect(),
            _ => BTreeMap::new(),
        };
        let top_tool = tool_counts
            .iter()
            .max_by_key(|(_, count)| **count)
            .map(|(tool, _)| tool.clone());

        Ok(UsageReport {
            accounts: account_ids.len(),
            posts,
            messages,
            stories,
            quiz_plays,
            tool_counts,
            top_tool,
        })
    }
}

fn hash_password(password: &str) -> ServiceResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| ServiceError::Internal(format!("password hashing failed: {}", e)))
}

fn verify_password(password: &str, stored_hash: &str) -> ServiceResult<()> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|e| ServiceError::Internal(format!("stored hash unreadable: {}", e)))?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| ServiceError::Unauthorized)
}

fn new_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{JournalSyncMode, StoreConfig};
    use tempfile::tempdir;

    async fn create_test_admin() -> (AdminService, Arc<StoreEngine>, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let mut config = StoreConfig::new(dir.path());
        config.journal_sync = JournalSyncMode::EveryWrite;
        let store = Arc::new(StoreEngine::open(config).await.unwrap());
        (AdminService::new(Arc::clone(&store)), store, dir)
    }

    #[tokio::test]
    async fn test_register_and_login() {
        let (admin, store, _dir) = create_test_admin().await;

        let view = admin.register_admin("root", "sup3rsecret").await.unwrap();
        let token = admin.login_admin("root", "sup3rsecret").await.unwrap();
        let resolved = admin.resolve_admin(&token).await.unwrap();
        assert_eq!(resolved, view.id);

        // Hashed at rest, never plaintext
        let raw = store
            .get(&format!("admin/account1/{}", view.id))
            .await
            .unwrap()
            .unwrap();
        assert!(raw["password_hash"].as_str().unwrap().starts_with("$argon2"));
        assert!(raw.get("password").is_none());
    }

    #[tokio::test]
    async fn test_bad_admin_credentials() {
        let (admin, _store, _dir) = create_test_admin().await;
        admin.register_admin("root", "sup3rsecret").await.unwrap();

        assert!(matches!(
            admin.login_admin("root", "wrong").await,
            Err(ServiceError::Unauthorized)
        ));
        assert!(matches!(
            admin.login_admin("nobody", "sup3rsecret").await,
            Err(ServiceError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn test_delete_admin_scenario() {
        let (admin, store, _dir) = create_test_admin().await;
        let view = admin.register_admin("root", "sup3rsecret").await.unwrap();
        let other = admin.register_admin("aux", "sup3rsecret").await.unwrap();

        admin.delete_admin(&view.id).await.unwrap();

        // The collection no longer contains the deleted key
        let remaining = store.children("admin/account1").await.unwrap();
        assert!(!remaining.contains(&view.id));
        assert!(remaining.contains(&other.id));

        assert!(matches!(
            admin.delete_admin(&view.id).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_deleted_admin_session_invalidated() {
        let (admin, _store, _dir) = create_test_admin().await;
        let view = admin.register_admin("root", "sup3rsecret").await.unwrap();
        let token = admin.login_admin("root", "sup3rsecret").await.unwrap();

        admin.delete_admin(&view.id).await.unwrap();
        assert!(matches!(
            admin.resolve_admin(&token).await,
            Err(ServiceError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn test_restriction_toggle_idempotent() {
        let (admin, store, _dir) = create_test_admin().await;
        store
            .set("accounts/u1", json!({"username": "ada", "restricted": false}))
            .await
            .unwrap();

        admin.set_restricted("u1", true).await.unwrap();
        admin.set_restricted("u1", true).await.unwrap();
        assert_eq!(
            store.get("accounts/u1/restricted").await.unwrap(),
            Some(json!(true))
        );

        admin.set_restricted("u1", false).await.unwrap();
        admin.set_restricted("u1", false).await.unwrap();
        assert_eq!(
            store.get("accounts/u1/restricted").await.unwrap(),
            Some(json!(false))
        );
    }

    #[tokio::test]
    async fn test_delete_account_removes_subtrees() {
        let (admin, store, _dir) = create_test_admin().await;
        store
            .set("accounts/u1", json!({"username": "ada"}))
            .await
            .unwrap();
        store
            .set("scores/u1", json!({"total_score": 9}))
            .await
            .unwrap();
        store
            .set("stories/u1/s1", json!({"image_id": "img"}))
            .await
            .unwrap();

        admin.delete_account("u1").await.unwrap();
        assert_eq!(store.get("accounts/u1").await.unwrap(), None);
        assert_eq!(store.get("scores/u1").await.unwrap(), None);
        assert_eq!(store.get("stories/u1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_analytics_report() {
        let (admin, store, _dir) = create_test_admin().await;

        store
            .set("accounts/u1/posts/p1", json!({"text": "hi"}))
            .await
            .unwrap();
        store
            .set("accounts/u2/posts/p2", json!({"text": "yo"}))
            .await
            .unwrap();
        store
            .set("groups/g/messages/m1", json!({"text": "hey"}))
            .await
            .unwrap();
        store
            .set("stories/u1/s1", json!({"image_id": "img"}))
            .await
            .unwrap();
        store.set("analytics/quiz/plays", json!(4)).await.unwrap();
        store.set("analytics/tools/grammar", json!(7)).await.unwrap();
        store.set("analytics/tools/essay", json!(2)).await.unwrap();

        let report = admin.analytics().await.unwrap();
        assert_eq!(report.accounts, 2);
        assert_eq!(report.posts, 2);
        assert_eq!(report.messages, 1);
        assert_eq!(report.stories, 1);
        assert_eq!(report.quiz_plays, 4);
        assert_eq!(report.tool_counts["grammar"], 7);
        assert_eq!(report.top_tool.as_deref(), Some("grammar"));
    }
}
