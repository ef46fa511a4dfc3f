//! Account Service
//!
//! Registration, sign-in, presence, profiles and notes over the
//! `accounts/{uid}` subtree. Passwords are argon2id-hashed before they
//! touch the store; the hash never leaves this module. Session tokens are
//! opaque random ids held in memory, so a restart signs everyone out.

use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use rand::RngCore;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::OnceLock;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::services::{ServiceError, ServiceResult};
use crate::store::StoreEngine;

fn username_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new("^[A-Za-z0-9_]{3,30}$").expect("valid regex"))
}

/// A signed-in session
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    /// Opaque bearer token
    pub token: String,
    /// Account the token resolves to
    pub uid: String,
    pub username: String,
}

/// Public projection of an account (no credentials, ever)
#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    pub uid: String,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_id: Option<String>,
    pub online: bool,
    pub restricted: bool,
    pub created_at: i64,
    pub last_sign_in: i64,
}

/// Profile fields a user may change
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProfile {
    pub username: Option<String>,
    pub avatar_id: Option<String>,
}

/// A note in the account's nested `notes/` collection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    pub id: String,
    pub title: String,
    pub body: String,
    pub created_at: i64,
}

/// Stored account record, as read back from the tree
#[derive(Debug, Deserialize)]
struct AccountRecord {
    #[serde(default)]
    username: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    password_hash: String,
    #[serde(default)]
    avatar_id: Option<String>,
    #[serde(default)]
    online: bool,
    #[serde(default)]
    restricted: bool,
    #[serde(default)]
    created_at: i64,
    #[serde(default)]
    last_sign_in: i64,
}

/// Account registration, sessions, profiles and notes
pub struct AccountService {
    store: Arc<StoreEngine>,
    /// token → uid
    sessions: RwLock<HashMap<String, String>>,
}

impl AccountService {
    pub fn new(store: Arc<StoreEngine>) -> Self {
        Self {
            store,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Register a new account and sign it in
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> ServiceResult<Session> {
        if !username_re().is_match(username) {
            return Err(ServiceError::Validation(
                "username must be 3-30 characters of letters, digits or underscores".to_string(),
            ));
        }
        if !email.contains('@') {
            return Err(ServiceError::Validation(
                "email must contain '@'".to_string(),
            ));
        }
        if password.len() < 6 {
            return Err(ServiceError::Validation(
                "password must be at least 6 characters".to_string(),
            ));
        }

        for uid in self.store.children("accounts").await? {
            if let Some(record) = self.record(&uid).await? {
                if record.email == email {
                    return Err(ServiceError::Conflict(format!(
                        "email '{}' is already registered",
                        email
                    )));
                }
                if record.username == username {
                    return Err(ServiceError::Conflict(format!(
                        "username '{}' is taken",
                        username
                    )));
                }
            }
        }

        let uid = Uuid::new_v4().to_string();
        let now = now_millis();
        let account = json!({
            "username": username,
            "email": email,
            "password_hash": hash_password(password)?,
            "online": true,
            "restricted": false,
            "created_at": now,
            "last_sign_in": now,
        });
        self.store
            .set(&format!("accounts/{}", uid), account)
            .await?;

        tracing::info!(uid = %uid, username = %username, "Account registered");
        Ok(self.issue_session(&uid, username).await)
    }

    /// Sign in with email and password
    pub async fn sign_in(&self, email: &str, password: &str) -> ServiceResult<Session> {
        let mut found = None;
        for uid in self.store.children("accounts").await? {
            if let Some(record) = self.record(&uid).await? {
                if record.email == email {
                    found = Some((uid, record));
                    break;
                }
            }
        }
        // The same error for unknown email and bad password
        let (uid, record) = found.ok_or(ServiceError::Unauthorized)?;
        verify_password(password, &record.password_hash)?;

        let mut fields = Map::new();
        fields.insert("online".to_string(), json!(true));
        fields.insert("last_sign_in".to_string(), json!(now_millis()));
        self.store
            .update(&format!("accounts/{}", uid), fields)
            .await?;

        tracing::info!(uid = %uid, "Signed in");
        Ok(self.issue_session(&uid, &record.username).await)
    }

    /// Drop a session and mark the account offline
    pub async fn sign_out(&self, token: &str) -> ServiceResult<()> {
        let uid = self.sessions.write().await.remove(token);
        if let Some(uid) = uid {
            self.set_presence(&uid, false).await?;
        }
        Ok(())
    }

    /// Resolve a bearer token to a uid
    pub async fn resolve(&self, token: &str) -> ServiceResult<String> {
        self.sessions
            .read()
            .await
            .get(token)
            .cloned()
            .ok_or(ServiceError::Unauthorized)
    }

    /// Set the online flag
    pub async fn set_presence(&self, uid: &str, online: bool) -> ServiceResult<()> {
        if self.record(uid).await?.is_none() {
            return Err(ServiceError::NotFound(format!("account {}", uid)));
        }
        let mut fields = Map::new();
        fields.insert("online".to_string(), json!(online));
        self.store
            .update(&format!("accounts/{}", uid), fields)
            .await?;
        Ok(())
    }

    /// Public profile for one account
    pub async fn profile(&self, uid: &str) -> ServiceResult<Profile> {
        let record = self
            .record(uid)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("account {}", uid)))?;
        Ok(to_profile(uid, record))
    }

    /// Public profiles for every account
    pub async fn list_profiles(&self) -> ServiceResult<Vec<Profile>> {
        let mut profiles = Vec::new();
        for uid in self.store.children("accounts").await? {
            if let Some(record) = self.record(&uid).await? {
                profiles.push(to_profile(&uid, record));
            }
        }
        Ok(profiles)
    }

    /// Change username and/or avatar
    pub async fn update_profile(&self, uid: &str, changes: UpdateProfile) -> ServiceResult<Profile> {
        if self.record(uid).await?.is_none() {
            return Err(ServiceError::NotFound(format!("account {}", uid)));
        }

        let mut fields = Map::new();
        if let Some(username) = &changes.username {
            if !username_re().is_match(username) {
                return Err(ServiceError::Validation(
                    "username must be 3-30 characters of letters, digits or underscores"
                        .to_string(),
                ));
            }
            fields.insert("username".to_string(), json!(username));
        }
        if let Some(avatar_id) = &changes.avatar_id {
            fields.insert("avatar_id".to_string(), json!(avatar_id));
        }
        if !fields.is_empty() {
            self.store
                .update(&format!("accounts/{}", uid), fields)
                .await?;
        }
        self.profile(uid).await
    }

    /// Whether the account is flagged restricted
    pub async fn is_restricted(&self, uid: &str) -> ServiceResult<bool> {
        Ok(self
            .store
            .get(&format!("accounts/{}/restricted", uid))
            .await?
            .and_then(|v| v.as_bool())
            .unwrap_or(false))
    }

    /// Reject writes from restricted accounts
    pub async fn ensure_writable(&self, uid: &str) -> ServiceResult<()> {
        if self.is_restricted(uid).await? {
            return Err(ServiceError::Restricted);
        }
        Ok(())
    }

    // ---- notes ----

    pub async fn add_note(&self, uid: &str, title: &str, body: &str) -> ServiceResult<Note> {
        if self.record(uid).await?.is_none() {
            return Err(ServiceError::NotFound(format!("account {}", uid)));
        }
        if title.trim().is_empty() {
            return Err(ServiceError::Validation("note title is empty".to_string()));
        }

        let note = Note {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            body: body.to_string(),
            created_at: now_millis(),
        };
        self.store
            .set(
                &format!("accounts/{}/notes/{}", uid, note.id),
                json!({
                    "title": note.title,
                    "body": note.body,
                    "created_at": note.created_at,
                }),
            )
            .await?;
        Ok(note)
    }

    pub async fn list_notes(&self, uid: &str) -> ServiceResult<Vec<Note>> {
        let mut notes = Vec::new();
        for id in self
            .store
            .children(&format!("accounts/{}/notes", uid))
            .await?
        {
            if let Some(value) = self
                .store
                .get(&format!("accounts/{}/notes/{}", uid, id))
                .await?
            {
                notes.push(Note {
                    id: id.clone(),
                    title: str_field(&value, "title"),
                    body: str_field(&value, "body"),
                    created_at: value["created_at"].as_i64().unwrap_or(0),
                });
            }
        }
        notes.sort_by_key(|n| n.created_at);
        Ok(notes)
    }

    pub async fn delete_note(&self, uid: &str, note_id: &str) -> ServiceResult<()> {
        let path = format!("accounts/{}/notes/{}", uid, note_id);
        if self.store.get(&path).await?.is_none() {
            return Err(ServiceError::NotFound(format!("note {}", note_id)));
        }
        self.store.remove(&path).await?;
        Ok(())
    }

    // ---- internals ----

    async fn record(&self, uid: &str) -> ServiceResult<Option<AccountRecord>> {
        match self.store.get(&format!("accounts/{}", uid)).await? {
            Some(value) if value.is_object() => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| ServiceError::Internal(format!("malformed account record: {}", e))),
            _ => Ok(None),
        }
    }

    async fn issue_session(&self, uid: &str, username: &str) -> Session {
        let token = new_token();
        self.sessions
            .write()
            .await
            .insert(token.clone(), uid.to_string());
        Session {
            token,
            uid: uid.to_string(),
            username: username.to_string(),
        }
    }
}

fn to_profile(uid: &str, record: AccountRecord) -> Profile {
    Profile {
        uid: uid.to_string(),
        username: record.username,
        email: record.email,
        avatar_id: record.avatar_id,
        online: record.online,
        restricted: record.restricted,
        created_at: record.created_at,
        last_sign_in: record.last_sign_in,
    }
}

fn str_field(value: &Value, key: &str) -> String {
    value[key].as_str().unwrap_or_default().to_string()
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

/// 32 random bytes, hex-encoded
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

    async fn create_test_service() -> (AccountService, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let mut config = StoreConfig::new(dir.path());
        config.journal_sync = JournalSyncMode::EveryWrite;
        let store = Arc::new(StoreEngine::open(config).await.unwrap());
        (AccountService::new(store), dir)
    }

    #[tokio::test]
    async fn test_register_and_sign_in() {
        let (service, _dir) = create_test_service().await;

        let session = service
            .register("ada", "ada@example.com", "hunter22")
            .await
            .unwrap();
        assert_eq!(session.username, "ada");
        assert_eq!(session.token.len(), 64);

        let again = service.sign_in("ada@example.com", "hunter22").await.unwrap();
        assert_eq!(again.uid, session.uid);

        let resolved = service.resolve(&again.token).await.unwrap();
        assert_eq!(resolved, session.uid);
    }

    #[tokio::test]
    async fn test_password_never_stored_plaintext() {
        let (service, _dir) = create_test_service().await;
        let session = service
            .register("ada", "ada@example.com", "hunter22")
            .await
            .unwrap();

        let raw = service
            .store
            .get(&format!("accounts/{}", session.uid))
            .await
            .unwrap()
            .unwrap();
        let hash = raw["password_hash"].as_str().unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(raw.get("password").is_none());
    }

    #[tokio::test]
    async fn test_bad_credentials_rejected() {
        let (service, _dir) = create_test_service().await;
        service
            .register("ada", "ada@example.com", "hunter22")
            .await
            .unwrap();

        assert!(matches!(
            service.sign_in("ada@example.com", "wrong").await,
            Err(ServiceError::Unauthorized)
        ));
        assert!(matches!(
            service.sign_in("nobody@example.com", "hunter22").await,
            Err(ServiceError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn test_duplicate_email_and_username() {
        let (service, _dir) = create_test_service().await;
        service
            .register("ada", "ada@example.com", "hunter22")
            .await
            .unwrap();

        assert!(matches!(
            service.register("ada2", "ada@example.com", "hunter22").await,
            Err(ServiceError::Conflict(_))
        ));
        assert!(matches!(
            service.register("ada", "other@example.com", "hunter22").await,
            Err(ServiceError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_validation() {
        let (service, _dir) = create_test_service().await;

        assert!(matches!(
            service.register("ab", "a@b.c", "hunter22").await,
            Err(ServiceError::Validation(_))
        ));
        assert!(matches!(
            service.register("ada", "not-an-email", "hunter22").await,
            Err(ServiceError::Validation(_))
        ));
        assert!(matches!(
            service.register("ada", "a@b.c", "short").await,
            Err(ServiceError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_sign_out_clears_session_and_presence() {
        let (service, _dir) = create_test_service().await;
        let session = service
            .register("ada", "ada@example.com", "hunter22")
            .await
            .unwrap();

        service.sign_out(&session.token).await.unwrap();
        assert!(matches!(
            service.resolve(&session.token).await,
            Err(ServiceError::Unauthorized)
        ));
        assert!(!service.profile(&session.uid).await.unwrap().online);
    }

    #[tokio::test]
    async fn test_profile_projection_has_no_hash() {
        let (service, _dir) = create_test_service().await;
        let session = service
            .register("ada", "ada@example.com", "hunter22")
            .await
            .unwrap();

        let profile = service.profile(&session.uid).await.unwrap();
        let serialized = serde_json::to_string(&profile).unwrap();
        assert!(!serialized.contains("password"));
        assert!(!serialized.contains("argon2"));
    }

    #[tokio::test]
    async fn test_update_profile() {
        let (service, _dir) = create_test_service().await;
        let session = service
            .register("ada", "ada@example.com", "hunter22")
            .await
            .unwrap();

        let profile = service
            .update_profile(
                &session.uid,
                UpdateProfile {
                    username: Some("ada_l".to_string()),
                    avatar_id: Some("a".repeat(64)),
                },
            )
            .await
            .unwrap();
        assert_eq!(profile.username, "ada_l");
        assert!(profile.avatar_id.is_some());
    }

    #[tokio::test]
    async fn test_restricted_flag_blocks_writes() {
        let (service, _dir) = create_test_service().await;
        let session = service
            .register("ada", "ada@example.com", "hunter22")
            .await
            .unwrap();

        assert!(service.ensure_writable(&session.uid).await.is_ok());

        service
            .store
            .set(&format!("accounts/{}/restricted", session.uid), json!(true))
            .await
            .unwrap();

        assert!(matches!(
            service.ensure_writable(&session.uid).await,
            Err(ServiceError::Restricted)
        ));
    }

    #[tokio::test]
    async fn test_notes_lifecycle() {
        let (service, _dir) = create_test_service().await;
        let session = service
            .register("ada", "ada@example.com", "hunter22")
            .await
            .unwrap();

        let note = service
            .add_note(&session.uid, "Draft", "essay outline")
            .await
            .unwrap();
        let second = service
            .add_note(&session.uid, "Later", "quiz practice")
            .await
            .unwrap();

        let notes = service.list_notes(&session.uid).await.unwrap();
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].title, "Draft");

        service.delete_note(&session.uid, &note.id).await.unwrap();
        let notes = service.list_notes(&session.uid).await.unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].id, second.id);

        assert!(matches!(
            service.delete_note(&session.uid, &note.id).await,
            Err(ServiceError::NotFound(_))
        ));
    }
}
