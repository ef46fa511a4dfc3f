//! Domain Services
//!
//! The application logic between the API surface and the document store.
//! Each service holds an `Arc<StoreEngine>` and reads/writes the tree at
//! the conventional paths:
//!
//! - **accounts**: `accounts/{uid}` — registration, sign-in, profiles,
//!   presence, notes
//! - **feed**: `accounts/{uid}/posts/{postId}` — posts, comments, likes,
//!   reposts
//! - **chat**: `groups/{name}` — groups, membership, messages
//! - **stories**: `stories/{uid}/{storyId}` — ephemeral images
//! - **quiz**: in-memory word-scramble sessions, scores persisted on finish
//! - **scores**: `scores/{uid}` — score records + leaderboard
//! - **admin**: `admin/account1/{id}` — back-office accounts, restriction,
//!   usage analytics
//!
//! Services never serialize concurrent writers to one record; the store's
//! last-write-wins semantics decide. Missing data reads as the empty state,
//! not an error.

pub mod accounts;
pub mod admin;
pub mod chat;
pub mod feed;
pub mod quiz;
pub mod scores;
pub mod stories;

pub use accounts::{AccountService, Note, Profile, Session, UpdateProfile};
pub use admin::{AdminService, AdminView, UsageReport};
pub use chat::{ChatMessage, ChatService, GroupView};
pub use feed::{Comment, FeedService, PostView, RepostRef};
pub use quiz::{
    AnswerOutcome, CurrentQuestion, QuizCategory, QuizService, scramble, QUESTIONS_PER_SESSION,
    QUESTION_SECONDS,
};
pub use scores::{LeaderboardEntry, ScoreRecord, ScoreService};
pub use stories::{StoriesService, StoryView};

use thiserror::Error;

/// Errors surfaced by the domain services
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Document store failure
    #[error("Store error: {0}")]
    Store(#[from] crate::store::StoreError),

    /// Input failed validation
    #[error("Validation error: {0}")]
    Validation(String),

    /// Entity does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Entity already exists
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Bad credentials or unknown session token
    #[error("Invalid credentials or session")]
    Unauthorized,

    /// Restricted accounts can read but not write
    #[error("Account is restricted")]
    Restricted,

    /// Caller may not perform this operation
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Unexpected internal failure (hashing, malformed stored record)
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ServiceError::NotFound("post p1".to_string());
        assert_eq!(err.to_string(), "Not found: post p1");

        let err = ServiceError::Restricted;
        assert_eq!(err.to_string(), "Account is restricted");
    }
}
