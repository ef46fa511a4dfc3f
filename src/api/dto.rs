//! Data Transfer Objects
//!
//! Request and response types for the API endpoints.
//! These types are serialized/deserialized to/from JSON.
//!
//! Domain types that already serialize cleanly (PostView, Profile,
//! LeaderboardEntry and friends) go over the wire as-is; this module holds
//! what is specific to the HTTP surface.

use serde::{Deserialize, Serialize};

// ============================================
// AUTH DTOs
// ============================================

/// Account registration request
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Sign-in request
#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

// ============================================
// ACCOUNT DTOs
// ============================================

/// Partial profile update; absent fields are left untouched
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub avatar_id: Option<String>,
}

/// Presence update request
#[derive(Debug, Deserialize)]
pub struct PresenceRequest {
    pub online: bool,
}

/// New note request
#[derive(Debug, Deserialize)]
pub struct NoteRequest {
    pub title: String,
    #[serde(default)]
    pub body: String,
}

// ============================================
// FEED DTOs
// ============================================

/// New post request; needs text or at least one image
#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub image_ids: Vec<String>,
}

/// New comment request
#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub text: String,
}

/// Like toggle outcome
#[derive(Debug, Serialize)]
pub struct LikeResponse {
    /// Whether the viewer likes the post after the toggle
    pub liked: bool,
    pub like_count: usize,
}

// ============================================
// CHAT DTOs
// ============================================

/// New group request
#[derive(Debug, Deserialize)]
pub struct CreateGroupRequest {
    pub name: String,
}

/// Chat message request; needs text or an attachment
#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub attachment_id: Option<String>,
}

// ============================================
// STORY DTOs
// ============================================

/// New story request
#[derive(Debug, Deserialize)]
pub struct PostStoryRequest {
    pub image_id: String,
    #[serde(default)]
    pub caption: Option<String>,
}

// ============================================
// QUIZ DTOs
// ============================================

/// Start a quiz session
#[derive(Debug, Deserialize)]
pub struct StartQuizRequest {
    /// easy, medium or hard
    pub category: String,
}

/// Session handle plus the first question
#[derive(Debug, Serialize)]
pub struct StartQuizResponse {
    pub session_id: String,
    pub question: crate::services::CurrentQuestion,
}

/// Answer submission
#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub answer: String,
}

// ============================================
// WRITING TOOL DTOs
// ============================================

/// Plain text payload for grammar, essay and humanize
#[derive(Debug, Deserialize)]
pub struct TextRequest {
    pub text: String,
}

/// Paraphrase payload
#[derive(Debug, Deserialize)]
pub struct ParaphraseRequest {
    pub text: String,
    /// standard, formal, fluent or creative; defaults to standard
    #[serde(default)]
    pub mode: crate::ai::ParaphraseMode,
}

/// Dictionary lookup payload
#[derive(Debug, Deserialize)]
pub struct DefineRequest {
    pub word: String,
}

/// Plain text reply for paraphrase and humanize
#[derive(Debug, Serialize)]
pub struct TextResponse {
    pub text: String,
}

// ============================================
// MEDIA DTOs
// ============================================

/// Media upload; bytes arrive base64-encoded inside JSON, matching how
/// browser clients read files
#[derive(Debug, Deserialize)]
pub struct MediaUploadRequest {
    /// Base64-encoded bytes
    pub data: String,
    pub content_type: String,
}

/// Media upload outcome
#[derive(Debug, Serialize)]
pub struct MediaUploadResponse {
    /// Content-addressed media ID
    pub id: String,
    /// URL the object is served from
    pub url: String,
}

// ============================================
// ADMIN DTOs
// ============================================

/// Admin registration request
#[derive(Debug, Deserialize)]
pub struct AdminRegisterRequest {
    pub name: String,
    pub password: String,
}

/// Admin login request
#[derive(Debug, Deserialize)]
pub struct AdminLoginRequest {
    pub name: String,
    pub password: String,
}

/// Admin session token
#[derive(Debug, Serialize)]
pub struct AdminTokenResponse {
    pub token: String,
}

/// Restriction toggle request
#[derive(Debug, Deserialize)]
pub struct RestrictRequest {
    pub restricted: bool,
}

// ============================================
// HEALTH DTOs
// ============================================

/// Full health status response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// healthy, degraded or unhealthy
    pub status: String,
    /// Document store status
    pub store: String,
    /// Model gateway status: ok, error or unconfigured
    pub model: String,
    pub uptime_seconds: u64,
    pub websocket_connections: usize,
    pub version: String,
}

// ============================================
// MISC DTOs
// ============================================

/// Generic acknowledgement
#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

impl OkResponse {
    pub fn new() -> Self {
        Self { ok: true }
    }
}

impl Default for OkResponse {
    fn default() -> Self {
        Self::new()
    }
}
