//! Media Object Store
//!
//! The boundary for binary uploads (avatars, post images, story images,
//! chat attachments). The `MediaStore` trait keeps callers independent of
//! where bytes land; `LocalMediaStore` is the filesystem implementation:
//!
//! - Content-addressed: the SHA-256 of the bytes is the media ID, so
//!   identical uploads deduplicate to one file
//! - Two-level directory sharding (`ab/cd/abcdef...`)
//! - A `.meta` sidecar records the content type (first upload wins)
//! - Content-type allow-list and size limit enforced at `save`

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use thiserror::Error;
use tokio::fs;

/// Content types accepted for upload
pub const ALLOWED_CONTENT_TYPES: &[&str] =
    &["image/png", "image/jpeg", "image/gif", "image/webp"];

/// Errors that can occur in the media store
#[derive(Debug, Error)]
pub enum MediaError {
    /// I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// No object stored under the given ID
    #[error("Media not found: {0}")]
    NotFound(String),

    /// Content type outside the allow-list
    #[error("Unsupported content type: {0}")]
    UnsupportedType(String),

    /// Upload exceeds the size limit
    #[error("Media too large: {size} bytes (limit: {limit})")]
    TooLarge { size: usize, limit: usize },

    /// Malformed media ID (IDs are 64 lowercase hex chars)
    #[error("Invalid media id: {0}")]
    InvalidId(String),
}

/// Result type alias for media operations
pub type MediaResult<T> = Result<T, MediaError>;

/// A stored media object
#[derive(Debug, Clone)]
pub struct MediaObject {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Storage boundary for binary uploads
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Store bytes, returning the media ID
    async fn save(&self, data: Vec<u8>, content_type: &str) -> MediaResult<String>;

    /// Load a stored object
    async fn load(&self, id: &str) -> MediaResult<MediaObject>;

    /// Whether an object exists under the ID
    async fn exists(&self, id: &str) -> bool;

    /// Public URL for a media ID
    fn url(&self, id: &str) -> String;
}

/// Configuration for the local media store
#[derive(Debug, Clone)]
pub struct MediaConfig {
    /// Root directory for all media files
    pub root_dir: PathBuf,
    /// Public URL prefix (the API serves `GET {prefix}/{id}`)
    pub url_prefix: String,
    /// Maximum upload size in bytes (default: 5MB)
    pub max_bytes: usize,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("arregmatica_data").join("media"),
            url_prefix: "/media".to_string(),
            max_bytes: 5 * 1024 * 1024,
        }
    }
}

impl MediaConfig {
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
            ..Default::default()
        }
    }
}

/// Local filesystem implementation of `MediaStore`
pub struct LocalMediaStore {
    config: MediaConfig,
}

impl LocalMediaStore {
    /// Create the store, ensuring the root directory exists
    pub fn new(config: MediaConfig) -> MediaResult<Self> {
        std::fs::create_dir_all(&config.root_dir)?;
        Ok(Self { config })
    }

    /// Sharded directory for a hash: `root/ab/cd`
    fn shard_dir(&self, hash: &str) -> PathBuf {
        self.config.root_dir.join(&hash[0..2]).join(&hash[2..4])
    }

    fn blob_path(&self, hash: &str) -> PathBuf {
        self.shard_dir(hash).join(hash)
    }

    fn meta_path(&self, hash: &str) -> PathBuf {
        self.shard_dir(hash).join(format!("{}.meta", hash))
    }
}

/// Media IDs are SHA-256 digests; anything else is rejected before it can
/// reach the filesystem
fn validate_id(id: &str) -> MediaResult<()> {
    if id.len() != 64 || !id.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()) {
        return Err(MediaError::InvalidId(id.to_string()));
    }
    Ok(())
}

#[async_trait]
impl MediaStore for LocalMediaStore {
    async fn save(&self, data: Vec<u8>, content_type: &str) -> MediaResult<String> {
        if !ALLOWED_CONTENT_TYPES.contains(&content_type) {
            return Err(MediaError::UnsupportedType(content_type.to_string()));
        }
        if data.len() > self.config.max_bytes {
            return Err(MediaError::TooLarge {
                size: data.len(),
                limit: self.config.max_bytes,
            });
        }

        let mut hasher = Sha256::new();
        hasher.update(&data);
        let hash = hex::encode(hasher.finalize());

        let blob_path = self.blob_path(&hash);
        fs::create_dir_all(self.shard_dir(&hash)).await?;

        // Identical bytes are already stored; the first content type sticks
        if fs::metadata(&blob_path).await.is_err() {
            fs::write(&blob_path, &data).await?;
            fs::write(self.meta_path(&hash), content_type.as_bytes()).await?;
            tracing::debug!(media_id = %hash, bytes = data.len(), "Stored media object");
        } else {
            tracing::debug!(media_id = %hash, "Deduplicated media upload");
        }

        Ok(hash)
    }

    async fn load(&self, id: &str) -> MediaResult<MediaObject> {
        validate_id(id)?;

        let bytes = match fs::read(self.blob_path(id)).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(MediaError::NotFound(id.to_string()))
            }
            Err(e) => return Err(e.into()),
        };

        let content_type = fs::read_to_string(self.meta_path(id))
            .await
            .unwrap_or_else(|_| "application/octet-stream".to_string());

        Ok(MediaObject {
            bytes,
            content_type,
        })
    }

    async fn exists(&self, id: &str) -> bool {
        if validate_id(id).is_err() {
            return false;
        }
        fs::metadata(self.blob_path(id)).await.is_ok()
    }

    fn url(&self, id: &str) -> String {
        format!("{}/{}", self.config.url_prefix, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn create_test_store(dir: &std::path::Path) -> LocalMediaStore {
        LocalMediaStore::new(MediaConfig::new(dir)).unwrap()
    }

    #[tokio::test]
    async fn test_save_and_load_round_trip() {
        let dir = tempdir().unwrap();
        let store = create_test_store(dir.path());

        let data = vec![0x89, 0x50, 0x4e, 0x47, 1, 2, 3];
        let id = store.save(data.clone(), "image/png").await.unwrap();
        assert_eq!(id.len(), 64);

        let object = store.load(&id).await.unwrap();
        assert_eq!(object.bytes, data);
        assert_eq!(object.content_type, "image/png");
        assert!(store.exists(&id).await);
    }

    #[tokio::test]
    async fn test_identical_uploads_deduplicate() {
        let dir = tempdir().unwrap();
        let store = create_test_store(dir.path());

        let data = b"same bytes".to_vec();
        let id1 = store.save(data.clone(), "image/jpeg").await.unwrap();
        let id2 = store.save(data, "image/jpeg").await.unwrap();

        assert_eq!(id1, id2);
    }

    #[tokio::test]
    async fn test_content_type_allow_list() {
        let dir = tempdir().unwrap();
        let store = create_test_store(dir.path());

        let result = store.save(b"plain".to_vec(), "text/plain").await;
        assert!(matches!(result, Err(MediaError::UnsupportedType(_))));
    }

    #[tokio::test]
    async fn test_size_limit() {
        let dir = tempdir().unwrap();
        let mut config = MediaConfig::new(dir.path());
        config.max_bytes = 8;
        let store = LocalMediaStore::new(config).unwrap();

        let result = store.save(vec![0u8; 9], "image/png").await;
        assert!(matches!(result, Err(MediaError::TooLarge { size: 9, limit: 8 })));
    }

    #[tokio::test]
    async fn test_invalid_id_rejected() {
        let dir = tempdir().unwrap();
        let store = create_test_store(dir.path());

        assert!(matches!(
            store.load("../../etc/passwd").await,
            Err(MediaError::InvalidId(_))
        ));
        assert!(!store.exists("short").await);
    }

    #[tokio::test]
    async fn test_missing_id_not_found() {
        let dir = tempdir().unwrap();
        let store = create_test_store(dir.path());

        let missing = "a".repeat(64);
        assert!(matches!(
            store.load(&missing).await,
            Err(MediaError::NotFound(_))
        ));
    }

    #[test]
    fn test_url_shape() {
        let dir = tempdir().unwrap();
        let store = create_test_store(dir.path());

        let id = "ab".repeat(32);
        assert_eq!(store.url(&id), format!("/media/{}", id));
    }
}
