//! Quiz Service
//!
//! The word-scramble game. A session draws a fixed number of words from the
//! category bank, scrambles each one, and stamps every question with a
//! countdown deadline. Answers match by case-sensitive equality after
//! uppercasing the input; a submission past the deadline is wrong no matter
//! what it says. Finishing a session merges the score into `scores/{uid}`.
//!
//! Sessions live in memory only; abandoning one leaks nothing persistent.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::services::scores::ScoreService;
use crate::services::{ServiceError, ServiceResult};
use crate::store::StoreEngine;

/// Seconds allowed per question
pub const QUESTION_SECONDS: i64 = 15;

/// Questions drawn per session
pub const QUESTIONS_PER_SESSION: usize = 10;

const EASY_WORDS: &[&str] = &[
    "APPLE", "HOUSE", "WATER", "LIGHT", "MUSIC", "PAPER", "SMILE", "CLOUD", "BREAD", "STONE",
    "GRASS", "RIVER",
];

const MEDIUM_WORDS: &[&str] = &[
    "JOURNEY", "HARVEST", "MACHINE", "PICTURE", "STATION", "FREEDOM", "VILLAGE", "WEATHER",
    "CAPTAIN", "MYSTERY", "BALANCE", "COURAGE",
];

const HARD_WORDS: &[&str] = &[
    "KNOWLEDGE", "ADVENTURE", "DISCOVERY", "CHALLENGE", "BEAUTIFUL", "IMPORTANT", "EDUCATION",
    "WONDERFUL", "DANGEROUS", "EXCELLENT", "MAGNITUDE", "TELESCOPE",
];

/// Quiz difficulty categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuizCategory {
    Easy,
    Medium,
    Hard,
}

impl QuizCategory {
    pub fn parse(s: &str) -> ServiceResult<Self> {
        match s.to_lowercase().as_str() {
            "easy" => Ok(QuizCategory::Easy),
            "medium" => Ok(QuizCategory::Medium),
            "hard" => Ok(QuizCategory::Hard),
            other => Err(ServiceError::Validation(format!(
                "unknown category '{}': use easy, medium or hard",
                other
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QuizCategory::Easy => "easy",
            QuizCategory::Medium => "medium",
            QuizCategory::Hard => "hard",
        }
    }

    pub fn all() -> &'static [&'static str] {
        &["easy", "medium", "hard"]
    }

    fn bank(&self) -> &'static [&'static str] {
        match self {
            QuizCategory::Easy => EASY_WORDS,
            QuizCategory::Medium => MEDIUM_WORDS,
            QuizCategory::Hard => HARD_WORDS,
        }
    }
}

/// Uniformly permute a word's characters
///
/// Re-shuffles while the result equals the original, provided the word has
/// at least two distinct characters (otherwise every permutation is the
/// identity and the loop would never end).
pub fn scramble(word: &str, rng: &mut impl Rng) -> String {
    let mut chars: Vec<char> = word.chars().collect();
    let distinct = {
        let mut seen = chars.clone();
        seen.sort_unstable();
        seen.dedup();
        seen.len()
    };

    loop {
        chars.shuffle(rng);
        let shuffled: String = chars.iter().collect();
        if shuffled != word || distinct < 2 {
            return shuffled;
        }
    }
}

/// One in-flight quiz session
struct QuizSession {
    uid: String,
    category: QuizCategory,
    words: Vec<&'static str>,
    scrambles: Vec<String>,
    index: usize,
    score: u64,
    /// Deadline for the current question, ms since epoch
    deadline: i64,
}

/// The question currently in front of the player
#[derive(Debug, Clone, Serialize)]
pub struct CurrentQuestion {
    pub index: usize,
    pub total: usize,
    pub scrambled: String,
    /// ms since epoch; answers after this score as wrong
    pub deadline: i64,
    pub score: u64,
}

/// What an answer submission did
#[derive(Debug, Clone, Serialize)]
pub struct AnswerOutcome {
    pub correct: bool,
    /// Revealed when the answer was wrong
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    pub score: u64,
    pub finished: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<CurrentQuestion>,
}

/// Word-scramble quiz sessions
pub struct QuizService {
    store: Arc<StoreEngine>,
    scores: Arc<ScoreService>,
    sessions: RwLock<HashMap<String, QuizSession>>,
}

impl QuizService {
    pub fn new(store: Arc<StoreEngine>, scores: Arc<ScoreService>) -> Self {
        Self {
            store,
            scores,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Start a session: draw words, scramble them, stamp the first deadline
    pub async fn start(
        &self,
        uid: &str,
        category: QuizCategory,
    ) -> ServiceResult<(String, CurrentQuestion)> {
        let mut words: Vec<&'static str> = category.bank().to_vec();
        let scrambles = {
            let mut rng = rand::thread_rng();
            words.shuffle(&mut rng);
            words.truncate(QUESTIONS_PER_SESSION);
            words.iter().map(|w| scramble(w, &mut rng)).collect()
        };
        let session = QuizSession {
            uid: uid.to_string(),
            category,
            words,
            scrambles,
            index: 0,
            score: 0,
            deadline: now_millis() + QUESTION_SECONDS * 1000,
        };

        let id = Uuid::new_v4().to_string();
        let question = question_of(&session);
        self.sessions.write().await.insert(id.clone(), session);

        tracing::info!(uid = %uid, session_id = %id, category = %category.as_str(), "Quiz started");
        Ok((id, question))
    }

    /// The current question of a session
    pub async fn current(&self, session_id: &str) -> ServiceResult<CurrentQuestion> {
        let sessions = self.sessions.read().await;
        let session = sessions
            .get(session_id)
            .ok_or_else(|| ServiceError::NotFound(format!("quiz session {}", session_id)))?;
        Ok(question_of(session))
    }

    /// Submit an answer and advance
    pub async fn answer(&self, session_id: &str, text: &str) -> ServiceResult<AnswerOutcome> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(session_id)
            .ok_or_else(|| ServiceError::NotFound(format!("quiz session {}", session_id)))?;

        let expected = session.words[session.index];
        let on_time = now_millis() <= session.deadline;
        let correct = on_time && text.to_uppercase() == expected;
        if correct {
            session.score += 1;
        }

        session.index += 1;
        let finished = session.index >= session.words.len();

        let outcome = if finished {
            let session = sessions
                .remove(session_id)
                .expect("session present under write lock");
            drop(sessions);
            self.finalize(&session).await?;
            AnswerOutcome {
                correct,
                expected: (!correct).then(|| expected.to_string()),
                score: session.score,
                finished: true,
                next: None,
            }
        } else {
            session.deadline = now_millis() + QUESTION_SECONDS * 1000;
            AnswerOutcome {
                correct,
                expected: (!correct).then(|| expected.to_string()),
                score: session.score,
                finished: false,
                next: Some(question_of(session)),
            }
        };

        Ok(outcome)
    }

    /// Merge the final score into `scores/{uid}` and count the play
    async fn finalize(&self, session: &QuizSession) -> ServiceResult<()> {
        self.scores
            .record(&session.uid, session.category.as_str(), session.score)
            .await?;

        let plays = self
            .store
            .get("analytics/quiz/plays")
            .await?
            .and_then(|v| v.as_u64())
            .unwrap_or(0);
        self.store
            .set("analytics/quiz/plays", json!(plays + 1))
            .await?;

        tracing::info!(
            uid = %session.uid,
            category = %session.category.as_str(),
            score = session.score,
            "Quiz finished"
        );
        Ok(())
    }
}

fn question_of(session: &QuizSession) -> CurrentQuestion {
    CurrentQuestion {
        index: session.index,
        total: session.words.len(),
        scrambled: session.scrambles[session.index].clone(),
        deadline: session.deadline,
        score: session.score,
    }
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{JournalSyncMode, StoreConfig};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tempfile::tempdir;

    async fn create_test_quiz() -> (QuizService, Arc<StoreEngine>, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let mut config = StoreConfig::new(dir.path());
        config.journal_sync = JournalSyncMode::EveryWrite;
        let store = Arc::new(StoreEngine::open(config).await.unwrap());
        let scores = Arc::new(ScoreService::new(Arc::clone(&store)));
        (
            QuizService::new(Arc::clone(&store), scores),
            store,
            dir,
        )
    }

    fn sorted_chars(s: &str) -> Vec<char> {
        let mut chars: Vec<char> = s.chars().collect();
        chars.sort_unstable();
        chars
    }

    #[test]
    fn test_scramble_is_permutation() {
        let mut rng = StdRng::seed_from_u64(7);
        for word in EASY_WORDS.iter().chain(MEDIUM_WORDS).chain(HARD_WORDS) {
            let scrambled = scramble(word, &mut rng);
            assert_eq!(sorted_chars(&scrambled), sorted_chars(word), "{}", word);
        }
    }

    #[test]
    fn test_scramble_differs_when_possible() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..50 {
            assert_ne!(scramble("KNOWLEDGE", &mut rng), "KNOWLEDGE");
        }
    }

    #[test]
    fn test_scramble_single_letter_terminates() {
        let mut rng = StdRng::seed_from_u64(1);
        // Only one distinct character, so the identity is acceptable
        assert_eq!(scramble("AAA", &mut rng), "AAA");
        assert_eq!(scramble("X", &mut rng), "X");
    }

    #[test]
    fn test_category_parse() {
        assert_eq!(QuizCategory::parse("Easy").unwrap(), QuizCategory::Easy);
        assert_eq!(QuizCategory::parse("HARD").unwrap(), QuizCategory::Hard);
        assert!(QuizCategory::parse("extreme").is_err());
        assert_eq!(QuizCategory::all().len(), 3);
    }

    #[tokio::test]
    async fn test_session_flow_and_scoring() {
        let (quiz, _store, _dir) = create_test_quiz().await;
        let (id, first) = quiz.start("u1", QuizCategory::Easy).await.unwrap();
        assert_eq!(first.index, 0);
        assert_eq!(first.total, QUESTIONS_PER_SESSION);

        // Answer every question correctly by peeking at the session words
        let words: Vec<String> = {
            let sessions = quiz.sessions.read().await;
            sessions[&id].words.iter().map(|w| w.to_string()).collect()
        };

        let mut last_score = 0;
        for (i, word) in words.iter().enumerate() {
            // Lowercase input still matches: equality after uppercasing
            let outcome = quiz.answer(&id, &word.to_lowercase()).await.unwrap();
            assert!(outcome.correct, "question {}", i);
            assert!(outcome.score >= last_score);
            last_score = outcome.score;
            assert_eq!(outcome.finished, i == words.len() - 1);
        }
        assert_eq!(last_score, QUESTIONS_PER_SESSION as u64);

        // The session is gone once finished
        assert!(matches!(
            quiz.current(&id).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_score_counts_only_correct_answers() {
        let (quiz, store, _dir) = create_test_quiz().await;
        let (id, _) = quiz.start("u1", QuizCategory::Medium).await.unwrap();

        let words: Vec<String> = {
            let sessions = quiz.sessions.read().await;
            sessions[&id].words.iter().map(|w| w.to_string()).collect()
        };

        // Get even-indexed questions right, flub the rest
        let mut expected_score = 0u64;
        for (i, word) in words.iter().enumerate() {
            let answer = if i % 2 == 0 {
                expected_score += 1;
                word.clone()
            } else {
                "WRONG".to_string()
            };
            let outcome = quiz.answer(&id, &answer).await.unwrap();
            if i % 2 == 1 {
                assert_eq!(outcome.expected.as_deref(), Some(word.as_str()));
            }
        }

        let record = store.get("scores/u1").await.unwrap().unwrap();
        assert_eq!(record["total_score"].as_u64().unwrap(), expected_score);
        assert_eq!(record["categories"]["medium"].as_u64().unwrap(), expected_score);
        assert_eq!(
            store
                .get("analytics/quiz/plays")
                .await
                .unwrap()
                .unwrap()
                .as_u64(),
            Some(1)
        );
    }

    #[tokio::test]
    async fn test_late_answer_is_wrong() {
        let (quiz, _store, _dir) = create_test_quiz().await;
        let (id, _) = quiz.start("u1", QuizCategory::Easy).await.unwrap();

        let word = {
            let mut sessions = quiz.sessions.write().await;
            let session = sessions.get_mut(&id).unwrap();
            session.deadline = now_millis() - 1;
            session.words[0].to_string()
        };

        let outcome = quiz.answer(&id, &word).await.unwrap();
        assert!(!outcome.correct);
        assert_eq!(outcome.score, 0);
    }

    #[tokio::test]
    async fn test_unknown_session_not_found() {
        let (quiz, _store, _dir) = create_test_quiz().await;
        assert!(matches!(
            quiz.answer("missing", "APPLE").await,
            Err(ServiceError::NotFound(_))
        ));
    }
}
