//! Feed Service
//!
//! Posts, comments, likes and reposts over `accounts/{uid}/posts/{postId}`.
//! Like and repost counts are derived from the per-user maps at read time,
//! so two clients toggling at once cannot drift a counter; the maps
//! themselves stay last-write-wins like everything else in the tree.
//!
//! The timeline is a flatten-and-sort over every account's posts, newest
//! first. No pagination; the original surface had none.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use uuid::Uuid;

use crate::services::{ServiceError, ServiceResult};
use crate::store::StoreEngine;

const MAX_POST_CHARS: usize = 4000;

/// Pointer from a repost to the post it mirrors
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RepostRef {
    pub uid: String,
    pub post_id: String,
}

/// A post as rendered to clients
#[derive(Debug, Clone, Serialize)]
pub struct PostView {
    /// Account the post lives under
    pub uid: String,
    pub post_id: String,
    pub author: String,
    pub text: String,
    pub image_ids: Vec<String>,
    pub created_at: i64,
    /// Size of the per-user likes map
    pub like_count: usize,
    /// Size of the per-user reposts map
    pub repost_count: usize,
    pub comment_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repost_of: Option<RepostRef>,
}

/// A comment under a post
#[derive(Debug, Clone, Serialize)]
pub struct Comment {
    pub id: String,
    pub author: String,
    pub text: String,
    pub created_at: i64,
}

/// Posts, comments, likes and reposts
pub struct FeedService {
    store: Arc<StoreEngine>,
}

impl FeedService {
    pub fn new(store: Arc<StoreEngine>) -> Self {
        Self { store }
    }

    /// Create a post under the author's account
    ///
    /// A post needs text (1-4000 chars) or at least one image.
    pub async fn create_post(
        &self,
        uid: &str,
        text: &str,
        image_ids: Vec<String>,
    ) -> ServiceResult<PostView> {
        self.ensure_account_writable(uid).await?;

        let text = text.trim();
        if text.is_empty() && image_ids.is_empty() {
            return Err(ServiceError::Validation(
                "a post needs text or at least one image".to_string(),
            ));
        }
        if text.len() > MAX_POST_CHARS {
            return Err(ServiceError::Validation(format!(
                "post text exceeds {} characters",
                MAX_POST_CHARS
            )));
        }

        let post_id = Uuid::new_v4().to_string();
        let record = json!({
            "author": uid,
            "text": text,
            "image_ids": image_ids,
            "created_at": now_millis(),
            "likes": {},
            "reposts": {},
        });
        self.store
            .set(&format!("accounts/{}/posts/{}", uid, post_id), record)
            .await?;

        tracing::info!(uid = %uid, post_id = %post_id, "Post created");
        self.get_post(uid, &post_id).await
    }

    /// Read one post
    pub async fn get_post(&self, uid: &str, post_id: &str) -> ServiceResult<PostView> {
        let value = self
            .store
            .get(&format!("accounts/{}/posts/{}", uid, post_id))
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("post {}", post_id)))?;
        Ok(to_view(uid, post_id, &value))
    }

    /// Delete a post (author only)
    pub async fn delete_post(
        &self,
        requester: &str,
        uid: &str,
        post_id: &str,
    ) -> ServiceResult<()> {
        if requester != uid {
            return Err(ServiceError::Forbidden(
                "only the author can delete a post".to_string(),
            ));
        }
        let path = format!("accounts/{}/posts/{}", uid, post_id);
        if self.store.get(&path).await?.is_none() {
            return Err(ServiceError::NotFound(format!("post {}", post_id)));
        }
        self.store.remove(&path).await?;
        Ok(())
    }

    /// Every post from every account, newest first
    pub async fn timeline(&self) -> ServiceResult<Vec<PostView>> {
        let mut posts = Vec::new();
        for uid in self.store.children("accounts").await? {
            for post_id in self
                .store
                .children(&format!("accounts/{}/posts", uid))
                .await?
            {
                if let Some(value) = self
                    .store
                    .get(&format!("accounts/{}/posts/{}", uid, post_id))
                    .await?
                {
                    posts.push(to_view(&uid, &post_id, &value));
                }
            }
        }
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(posts)
    }

    /// Append a comment to a post
    pub async fn add_comment(
        &self,
        viewer: &str,
        uid: &str,
        post_id: &str,
        text: &str,
    ) -> ServiceResult<Comment> {
        self.ensure_account_writable(viewer).await?;
        self.ensure_post_exists(uid, post_id).await?;

        let text = text.trim();
        if text.is_empty() {
            return Err(ServiceError::Validation("comment is empty".to_string()));
        }

        let comment = Comment {
            id: Uuid::new_v4().to_string(),
            author: viewer.to_string(),
            text: text.to_string(),
            created_at: now_millis(),
        };
        self.store
            .set(
                &format!(
                    "accounts/{}/posts/{}/comments/{}",
                    uid, post_id, comment.id
                ),
                json!({
                    "author": comment.author,
                    "text": comment.text,
                    "created_at": comment.created_at,
                }),
            )
            .await?;
        Ok(comment)
    }

    /// Comments under a post, oldest first
    pub async fn list_comments(&self, uid: &str, post_id: &str) -> ServiceResult<Vec<Comment>> {
        self.ensure_post_exists(uid, post_id).await?;

        let base = format!("accounts/{}/posts/{}/comments", uid, post_id);
        let mut comments = Vec::new();
        for id in self.store.children(&base).await? {
            if let Some(value) = self.store.get(&format!("{}/{}", base, id)).await? {
                comments.push(Comment {
                    id: id.clone(),
                    author: value["author"].as_str().unwrap_or_default().to_string(),
                    text: value["text"].as_str().unwrap_or_default().to_string(),
                    created_at: value["created_at"].as_i64().unwrap_or(0),
                });
            }
        }
        comments.sort_by_key(|c| c.created_at);
        Ok(comments)
    }

    /// Flip the viewer's like flag; returns the new state and count
    pub async fn toggle_like(
        &self,
        viewer: &str,
        uid: &str,
        post_id: &str,
    ) -> ServiceResult<(bool, usize)> {
        self.ensure_account_writable(viewer).await?;
        self.ensure_post_exists(uid, post_id).await?;

        let flag_path = format!("accounts/{}/posts/{}/likes/{}", uid, post_id, viewer);
        let liked = self
            .store
            .get(&flag_path)
            .await?
            .and_then(|v| v.as_bool())
            .unwrap_or(false);

        if liked {
            self.store.remove(&flag_path).await?;
        } else {
            self.store.set(&flag_path, json!(true)).await?;
        }

        let count = self
            .store
            .children(&format!("accounts/{}/posts/{}/likes", uid, post_id))
            .await?
            .len();
        Ok((!liked, count))
    }

    /// Mirror a post under the viewer's account
    ///
    /// Idempotent per viewer: the repost id is derived from the original, so
    /// calling twice returns the same materialized post.
    pub async fn repost(&self, viewer: &str, uid: &str, post_id: &str) -> ServiceResult<PostView> {
        self.ensure_account_writable(viewer).await?;
        let original = self.get_post(uid, post_id).await?;

        let repost_id = format!("repost-{}", post_id);
        let repost_path = format!("accounts/{}/posts/{}", viewer, repost_id);
        if self.store.get(&repost_path).await?.is_none() {
            self.store
                .set(
                    &repost_path,
                    json!({
                        "author": viewer,
                        "text": original.text,
                        "image_ids": original.image_ids,
                        "created_at": now_millis(),
                        "likes": {},
                        "reposts": {},
                        "repost_of": { "uid": uid, "post_id": post_id },
                    }),
                )
                .await?;
            self.store
                .set(
                    &format!("accounts/{}/posts/{}/reposts/{}", uid, post_id, viewer),
                    json!(true),
                )
                .await?;
        }

        self.get_post(viewer, &repost_id).await
    }

    async fn ensure_post_exists(&self, uid: &str, post_id: &str) -> ServiceResult<()> {
        if self
            .store
            .get(&format!("accounts/{}/posts/{}", uid, post_id))
            .await?
            .is_none()
        {
            return Err(ServiceError::NotFound(format!("post {}", post_id)));
        }
        Ok(())
    }

    async fn ensure_account_writable(&self, uid: &str) -> ServiceResult<()> {
        if self
            .store
            .get(&format!("accounts/{}", uid))
            .await?
            .is_none()
        {
            return Err(ServiceError::NotFound(format!("account {}", uid)));
        }
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

fn to_view(uid: &str, post_id: &str, value: &Value) -> PostView {
    PostView {
        uid: uid.to_string(),
        post_id: post_id.to_string(),
        author: value["author"].as_str().unwrap_or_default().to_string(),
        text: value["text"].as_str().unwrap_or_default().to_string(),
        image_ids: value["image_ids"]
            .as_array()
            .map(|a| {
                a.iter()
                    .filter_map(|v| v.as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default(),
        created_at: value["created_at"].as_i64().unwrap_or(0),
        like_count: map_len(value, "likes"),
        repost_count: map_len(value, "reposts"),
        comment_count: map_len(value, "comments"),
        repost_of: value
            .get("repost_of")
            .and_then(|v| serde_json::from_value(v.clone()).ok()),
    }
}

fn map_len(value: &Value, key: &str) -> usize {
    value
        .get(key)
        .and_then(Value::as_object)
        .map(Map::len)
        .unwrap_or(0)
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{JournalSyncMode, StoreConfig};
    use tempfile::tempdir;

    async fn create_test_feed() -> (FeedService, Arc<StoreEngine>, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let mut config = StoreConfig::new(dir.path());
        config.journal_sync = JournalSyncMode::EveryWrite;
        let store = Arc::new(StoreEngine::open(config).await.unwrap());
        (FeedService::new(Arc::clone(&store)), store, dir)
    }

    async fn seed_account(store: &StoreEngine, uid: &str) {
        store
            .set(
                &format!("accounts/{}", uid),
                json!({"username": uid, "restricted": false}),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_create_and_get_post() {
        let (feed, store, _dir) = create_test_feed().await;
        seed_account(&store, "u1").await;

        let post = feed
            .create_post("u1", "hello feed", Vec::new())
            .await
            .unwrap();
        assert_eq!(post.author, "u1");
        assert_eq!(post.like_count, 0);

        let read_back = feed.get_post("u1", &post.post_id).await.unwrap();
        assert_eq!(read_back.text, "hello feed");
    }

    #[tokio::test]
    async fn test_post_needs_text_or_image() {
        let (feed, store, _dir) = create_test_feed().await;
        seed_account(&store, "u1").await;

        assert!(matches!(
            feed.create_post("u1", "   ", Vec::new()).await,
            Err(ServiceError::Validation(_))
        ));
        // An image alone is enough
        assert!(feed
            .create_post("u1", "", vec!["a".repeat(64)])
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_timeline_newest_first() {
        let (feed, store, _dir) = create_test_feed().await;
        seed_account(&store, "u1").await;
        seed_account(&store, "u2").await;

        // Timestamps set directly so ordering is deterministic
        for (uid, id, ts) in [("u1", "p1", 100), ("u2", "p2", 300), ("u1", "p3", 200)] {
            store
                .set(
                    &format!("accounts/{}/posts/{}", uid, id),
                    json!({"author": uid, "text": id, "created_at": ts, "likes": {}, "reposts": {}}),
                )
                .await
                .unwrap();
        }

        let timeline = feed.timeline().await.unwrap();
        let order: Vec<&str> = timeline.iter().map(|p| p.post_id.as_str()).collect();
        assert_eq!(order, vec!["p2", "p3", "p1"]);
    }

    #[tokio::test]
    async fn test_toggle_like_flips_and_counts() {
        let (feed, store, _dir) = create_test_feed().await;
        seed_account(&store, "u1").await;
        seed_account(&store, "u2").await;
        let post = feed.create_post("u1", "likeable", Vec::new()).await.unwrap();

        let (liked, count) = feed.toggle_like("u2", "u1", &post.post_id).await.unwrap();
        assert!(liked);
        assert_eq!(count, 1);

        // Toggling again removes the flag; counts derive from the map
        let (liked, count) = feed.toggle_like("u2", "u1", &post.post_id).await.unwrap();
        assert!(!liked);
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_repost_is_idempotent() {
        let (feed, store, _dir) = create_test_feed().await;
        seed_account(&store, "u1").await;
        seed_account(&store, "u2").await;
        let post = feed.create_post("u1", "worth sharing", Vec::new()).await.unwrap();

        let first = feed.repost("u2", "u1", &post.post_id).await.unwrap();
        let second = feed.repost("u2", "u1", &post.post_id).await.unwrap();
        assert_eq!(first.post_id, second.post_id);
        assert_eq!(
            first.repost_of,
            Some(RepostRef {
                uid: "u1".to_string(),
                post_id: post.post_id.clone(),
            })
        );

        let original = feed.get_post("u1", &post.post_id).await.unwrap();
        assert_eq!(original.repost_count, 1);

        // The repost shows up on the timeline under the viewer
        let timeline = feed.timeline().await.unwrap();
        assert_eq!(timeline.len(), 2);
    }

    #[tokio::test]
    async fn test_comments_ascending() {
        let (feed, store, _dir) = create_test_feed().await;
        seed_account(&store, "u1").await;
        seed_account(&store, "u2").await;
        let post = feed.create_post("u1", "discuss", Vec::new()).await.unwrap();

        feed.add_comment("u2", "u1", &post.post_id, "first")
            .await
            .unwrap();
        feed.add_comment("u1", "u1", &post.post_id, "second")
            .await
            .unwrap();

        let comments = feed.list_comments("u1", &post.post_id).await.unwrap();
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].text, "first");
        assert!(comments[0].created_at <= comments[1].created_at);

        let view = feed.get_post("u1", &post.post_id).await.unwrap();
        assert_eq!(view.comment_count, 2);
    }

    #[tokio::test]
    async fn test_delete_post_author_only() {
        let (feed, store, _dir) = create_test_feed().await;
        seed_account(&store, "u1").await;
        seed_account(&store, "u2").await;
        let post = feed.create_post("u1", "mine", Vec::new()).await.unwrap();

        assert!(matches!(
            feed.delete_post("u2", "u1", &post.post_id).await,
            Err(ServiceError::Forbidden(_))
        ));

        feed.delete_post("u1", "u1", &post.post_id).await.unwrap();
        assert!(matches!(
            feed.get_post("u1", &post.post_id).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_restricted_account_cannot_write() {
        let (feed, store, _dir) = create_test_feed().await;
        seed_account(&store, "u1").await;
        store
            .set("accounts/u1/restricted", json!(true))
            .await
            .unwrap();

        assert!(matches!(
            feed.create_post("u1", "blocked", Vec::new()).await,
            Err(ServiceError::Restricted)
        ));
    }

    #[tokio::test]
    async fn test_missing_post_is_not_found() {
        let (feed, store, _dir) = create_test_feed().await;
        seed_account(&store, "u1").await;

        assert!(matches!(
            feed.get_post("u1", "nope").await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(
            feed.add_comment("u1", "u1", "nope", "hi").await,
            Err(ServiceError::NotFound(_))
        ));
    }
}
