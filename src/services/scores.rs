//! Score Service
//!
//! Per-user quiz totals at `scores/{uid}` and the leaderboard derived from
//! them. Records merge additively; the leaderboard sorts by total score
//! descending with username as the tie-break so renders are deterministic.

use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::services::ServiceResult;
use crate::store::StoreEngine;

/// One user's score record
#[derive(Debug, Clone, Serialize)]
pub struct ScoreRecord {
    pub uid: String,
    pub username: String,
    /// Per-category totals
    pub categories: BTreeMap<String, u64>,
    pub total_score: u64,
}

/// One leaderboard row
#[derive(Debug, Clone, Serialize)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub uid: String,
    pub username: String,
    pub total_score: u64,
}

/// Score records and the leaderboard
pub struct ScoreService {
    store: Arc<StoreEngine>,
}

impl ScoreService {
    pub fn new(store: Arc<StoreEngine>) -> Self {
        Self { store }
    }

    /// Add points to a user's category total
    pub async fn record(&self, uid: &str, category: &str, points: u64) -> ServiceResult<ScoreRecord> {
        let mut record = self.score_of(uid).await?;
        *record.categories.entry(category.to_string()).or_insert(0) += points;
        record.total_score += points;

        // Username travels with the record so the leaderboard needs one read
        let username = self
            .store
            .get(&format!("accounts/{}/username", uid))
            .await?
            .and_then(|v| v.as_str().map(String::from))
            .unwrap_or_else(|| uid.to_string());
        record.username = username;

        self.store
            .set(
                &format!("scores/{}", uid),
                json!({
                    "username": record.username,
                    "categories": record.categories,
                    "total_score": record.total_score,
                }),
            )
            .await?;
        Ok(record)
    }

    /// A user's record; missing reads as an empty record
    pub async fn score_of(&self, uid: &str) -> ServiceResult<ScoreRecord> {
        let value = self.store.get(&format!("scores/{}", uid)).await?;
        Ok(match value {
            Some(value) => to_record(uid, &value),
            None => ScoreRecord {
                uid: uid.to_string(),
                username: uid.to_string(),
                categories: BTreeMap::new(),
                total_score: 0,
            },
        })
    }

    /// All records, total score descending, usernames break ties
    pub async fn leaderboard(&self) -> ServiceResult<Vec<LeaderboardEntry>> {
        let mut records = Vec::new();
        for uid in self.store.children("scores").await? {
            if let Some(value) = self.store.get(&format!("scores/{}", uid)).await? {
                records.push(to_record(&uid, &value));
            }
        }

        records.sort_by(|a, b| {
            b.total_score
                .cmp(&a.total_score)
                .then_with(|| a.username.cmp(&b.username))
        });

        Ok(records
            .into_iter()
            .enumerate()
            .map(|(i, r)| LeaderboardEntry {
                rank: i + 1,
                uid: r.uid,
                username: r.username,
                total_score: r.total_score,
            })
            .collect())
    }
}

fn to_record(uid: &str, value: &Value) -> ScoreRecord {
    let categories = value["categories"]
        .as_object()
        .map(|m| {
            m.iter()
                .map(|(k, v)| (k.clone(), v.as_u64().unwrap_or(0)))
                .collect()
        })
        .unwrap_or_default();

    ScoreRecord {
        uid: uid.to_string(),
        username: value["username"]
            .as_str()
            .unwrap_or(uid)
            .to_string(),
        categories,
        total_score: value["total_score"].as_u64().unwrap_or(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{JournalSyncMode, StoreConfig};
    use tempfile::tempdir;

    async fn create_test_scores() -> (ScoreService, Arc<StoreEngine>, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let mut config = StoreConfig::new(dir.path());
        config.journal_sync = JournalSyncMode::EveryWrite;
        let store = Arc::new(StoreEngine::open(config).await.unwrap());
        (ScoreService::new(Arc::clone(&store)), store, dir)
    }

    #[tokio::test]
    async fn test_record_merges_additively() {
        let (scores, store, _dir) = create_test_scores().await;
        store
            .set("accounts/u1/username", json!("ada"))
            .await
            .unwrap();

        scores.record("u1", "easy", 3).await.unwrap();
        scores.record("u1", "easy", 2).await.unwrap();
        let record = scores.record("u1", "hard", 5).await.unwrap();

        assert_eq!(record.username, "ada");
        assert_eq!(record.categories["easy"], 5);
        assert_eq!(record.categories["hard"], 5);
        assert_eq!(record.total_score, 10);
    }

    #[tokio::test]
    async fn test_missing_record_is_empty_state() {
        let (scores, _store, _dir) = create_test_scores().await;

        let record = scores.score_of("ghost").await.unwrap();
        assert_eq!(record.total_score, 0);
        assert!(record.categories.is_empty());
    }

    #[tokio::test]
    async fn test_leaderboard_ordering_property() {
        let (scores, store, _dir) = create_test_scores().await;

        for (uid, name, total) in [
            ("u1", "ada", 12u64),
            ("u2", "grace", 30),
            ("u3", "alan", 12),
            ("u4", "edsger", 7),
        ] {
            store
                .set(
                    &format!("scores/{}", uid),
                    json!({"username": name, "categories": {"easy": total}, "total_score": total}),
                )
                .await
                .unwrap();
        }

        let board = scores.leaderboard().await.unwrap();
        assert_eq!(board.len(), 4);
        assert_eq!(board[0].username, "grace");

        // Every earlier entry's total >= every later entry's
        for pair in board.windows(2) {
            assert!(pair[0].total_score >= pair[1].total_score);
        }

        // Equal totals fall back to username order
        assert_eq!(board[1].username, "ada");
        assert_eq!(board[2].username, "alan");
        assert_eq!(board[3].rank, 4);
    }
}
