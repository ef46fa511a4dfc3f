//! Stories Service
//!
//! Ephemeral images under `stories/{uid}/{storyId}`. A story is visible for
//! 24 hours from `posted_at`; expired entries are skipped on read and
//! lazily removed, so no background sweeper is needed.

use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::services::{ServiceError, ServiceResult};
use crate::store::StoreEngine;

/// Story lifetime in milliseconds
pub const STORY_TTL_MS: i64 = 24 * 60 * 60 * 1000;

/// A story as rendered to clients
#[derive(Debug, Clone, Serialize)]
pub struct StoryView {
    pub uid: String,
    pub story_id: String,
    pub image_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    pub posted_at: i64,
}

/// Ephemeral image stories
pub struct StoriesService {
    store: Arc<StoreEngine>,
}

impl StoriesService {
    pub fn new(store: Arc<StoreEngine>) -> Self {
        Self { store }
    }

    /// Post a story
    pub async fn post_story(
        &self,
        uid: &str,
        image_id: &str,
        caption: Option<String>,
    ) -> ServiceResult<StoryView> {
        self.ensure_writable(uid).await?;
        if image_id.is_empty() {
            return Err(ServiceError::Validation(
                "a story needs an image".to_string(),
            ));
        }

        let story = StoryView {
            uid: uid.to_string(),
            story_id: Uuid::new_v4().to_string(),
            image_id: image_id.to_string(),
            caption,
            posted_at: now_millis(),
        };
        self.store
            .set(
                &format!("stories/{}/{}", uid, story.story_id),
                json!({
                    "image_id": story.image_id,
                    "caption": story.caption,
                    "posted_at": story.posted_at,
                }),
            )
            .await?;

        tracing::info!(uid = %uid, story_id = %story.story_id, "Story posted");
        Ok(story)
    }

    /// Stories younger than 24 hours, newest first
    ///
    /// Expired stories found along the way are removed.
    pub async fn active_stories(&self) -> ServiceResult<Vec<StoryView>> {
        let cutoff = now_millis() - STORY_TTL_MS;
        let mut active = Vec::new();
        let mut expired = Vec::new();

        for uid in self.store.children("stories").await? {
            for story_id in self.store.children(&format!("stories/{}", uid)).await? {
                let path = format!("stories/{}/{}", uid, story_id);
                if let Some(value) = self.store.get(&path).await? {
                    let posted_at = value["posted_at"].as_i64().unwrap_or(0);
                    if posted_at < cutoff {
                        expired.push(path);
                        continue;
                    }
                    active.push(StoryView {
                        uid: uid.clone(),
                        story_id: story_id.clone(),
                        image_id: value["image_id"].as_str().unwrap_or_default().to_string(),
                        caption: value["caption"].as_str().map(String::from),
                        posted_at,
                    });
                }
            }
        }

        for path in expired {
            self.store.remove(&path).await?;
        }

        active.sort_by(|a, b| b.posted_at.cmp(&a.posted_at));
        Ok(active)
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

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{JournalSyncMode, StoreConfig};
    use tempfile::tempdir;

    async fn create_test_stories() -> (StoriesService, Arc<StoreEngine>, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let mut config = StoreConfig::new(dir.path());
        config.journal_sync = JournalSyncMode::EveryWrite;
        let store = Arc::new(StoreEngine::open(config).await.unwrap());
        (StoriesService::new(Arc::clone(&store)), store, dir)
    }

    #[tokio::test]
    async fn test_post_and_list() {
        let (stories, _store, _dir) = create_test_stories().await;

        let story = stories
            .post_story("u1", &"a".repeat(64), Some("sunset".to_string()))
            .await
            .unwrap();
        assert_eq!(story.caption.as_deref(), Some("sunset"));

        let active = stories.active_stories().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].story_id, story.story_id);
    }

    #[tokio::test]
    async fn test_newest_first() {
        let (stories, store, _dir) = create_test_stories().await;
        let now = now_millis();

        for (id, ts) in [("s1", now - 3000), ("s2", now - 1000), ("s3", now - 2000)] {
            store
                .set(
                    &format!("stories/u1/{}", id),
                    json!({"image_id": "img", "posted_at": ts}),
                )
                .await
                .unwrap();
        }

        let active = stories.active_stories().await.unwrap();
        let order: Vec<&str> = active.iter().map(|s| s.story_id.as_str()).collect();
        assert_eq!(order, vec!["s2", "s3", "s1"]);
    }

    #[tokio::test]
    async fn test_expired_stories_lazily_removed() {
        let (stories, store, _dir) = create_test_stories().await;
        let now = now_millis();

        store
            .set(
                "stories/u1/old",
                json!({"image_id": "img", "posted_at": now - STORY_TTL_MS - 1000}),
            )
            .await
            .unwrap();
        store
            .set(
                "stories/u1/fresh",
                json!({"image_id": "img", "posted_at": now}),
            )
            .await
            .unwrap();

        let active = stories.active_stories().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].story_id, "fresh");

        // The expired entry is gone from the tree
        assert_eq!(store.get("stories/u1/old").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_story_needs_image() {
        let (stories, _store, _dir) = create_test_stories().await;

        assert!(matches!(
            stories.post_story("u1", "", None).await,
            Err(ServiceError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_restricted_poster_rejected() {
        let (stories, store, _dir) = create_test_stories().await;
        store
            .set("accounts/u1/restricted", json!(true))
            .await
            .unwrap();

        assert!(matches!(
            stories.post_story("u1", "img", None).await,
            Err(ServiceError::Restricted)
        ));
    }
}
