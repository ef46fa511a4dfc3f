//! HTTP API Client
//!
//! Functions for communicating with the Arregmatica REST API. Reads are
//! public; writes carry the session's bearer token.

use gloo_net::http::Request;
use std::collections::BTreeMap;

use crate::state::global::SessionInfo;

/// Default API base URL
pub const DEFAULT_API_BASE: &str = "http://localhost:8088/api/v1";

/// Get the API base URL from local storage or use default
pub fn get_api_base() -> String {
    let url = if let Some(window) = web_sys::window() {
        if let Ok(Some(storage)) = window.local_storage() {
            if let Ok(Some(url)) = storage.get_item("arregmatica_api_url") {
                url
            } else {
                DEFAULT_API_BASE.to_string()
            }
        } else {
            DEFAULT_API_BASE.to_string()
        }
    } else {
        DEFAULT_API_BASE.to_string()
    };
    // Normalize: remove trailing slash
    url.trim_end_matches('/').to_string()
}

/// Set the API base URL in local storage
pub fn set_api_base(url: &str) {
    if let Some(window) = web_sys::window() {
        if let Ok(Some(storage)) = window.local_storage() {
            let _ = storage.set_item("arregmatica_api_url", url);
        }
    }
}

/// Public URL for a stored media object
pub fn media_url(id: &str) -> String {
    let base = get_api_base();
    format!("{}/media/{}", base.trim_end_matches("/api/v1"), id)
}

// ============ Response Types ============

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Profile {
    pub uid: String,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub avatar_id: Option<String>,
    #[serde(default)]
    pub online: bool,
    #[serde(default)]
    pub restricted: bool,
    pub created_at: i64,
    #[serde(default)]
    pub last_sign_in: Option<i64>,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Post {
    pub uid: String,
    pub post_id: String,
    pub author: String,
    pub text: String,
    #[serde(default)]
    pub image_ids: Vec<String>,
    pub created_at: i64,
    pub like_count: usize,
    pub repost_count: usize,
    pub comment_count: usize,
    #[serde(default)]
    pub repost_of: Option<RepostRef>,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct RepostRef {
    pub uid: String,
    pub post_id: String,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Comment {
    pub id: String,
    pub author: String,
    pub text: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct LikeState {
    pub liked: bool,
    pub like_count: usize,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Group {
    pub name: String,
    pub created_by: String,
    pub created_at: i64,
    pub member_count: usize,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Message {
    pub id: String,
    pub sender: String,
    pub text: String,
    #[serde(default)]
    pub attachment_id: Option<String>,
    #[serde(default)]
    pub system: bool,
    pub sent_at: i64,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Story {
    pub uid: String,
    pub story_id: String,
    pub image_id: String,
    #[serde(default)]
    pub caption: Option<String>,
    pub posted_at: i64,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub uid: String,
    pub username: String,
    pub total_score: u64,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct QuizQuestion {
    pub index: usize,
    pub total: usize,
    pub scrambled: String,
    /// ms since epoch; answers after this score as wrong
    pub deadline: i64,
    pub score: u64,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct QuizStart {
    pub session_id: String,
    pub question: QuizQuestion,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct AnswerOutcome {
    pub correct: bool,
    #[serde(default)]
    pub expected: Option<String>,
    pub score: u64,
    pub finished: bool,
    #[serde(default)]
    pub next: Option<QuizQuestion>,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct GrammarIssue {
    #[serde(default)]
    pub original: String,
    #[serde(default)]
    pub replacement: String,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct GrammarReport {
    pub corrected: String,
    #[serde(default)]
    pub issues: Vec<GrammarIssue>,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Meaning {
    #[serde(default)]
    pub part_of_speech: String,
    #[serde(default)]
    pub definitions: Vec<String>,
    #[serde(default)]
    pub synonyms: Vec<String>,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Definition {
    pub word: String,
    #[serde(default)]
    pub phonetic: Option<String>,
    #[serde(default)]
    pub meanings: Vec<Meaning>,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct SentenceVerdict {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub correct: bool,
    #[serde(default)]
    pub issue: Option<String>,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct EssayReport {
    pub total: usize,
    pub correct: usize,
    pub wrong: usize,
    pub correct_percent: u32,
    pub wrong_percent: u32,
    #[serde(default)]
    pub sentences: Vec<SentenceVerdict>,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct ToolText {
    pub text: String,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct MediaUpload {
    pub id: String,
    pub url: String,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct AdminView {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub restricted: bool,
    pub created_at: i64,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct AdminToken {
    pub token: String,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct UsageReport {
    pub accounts: usize,
    pub posts: usize,
    pub messages: usize,
    pub stories: usize,
    pub quiz_plays: u64,
    #[serde(default)]
    pub tool_counts: BTreeMap<String, u64>,
    #[serde(default)]
    pub top_tool: Option<String>,
}

/// Error body the server wraps every failure in
#[derive(Debug, serde::Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, serde::Deserialize)]
struct ApiErrorDetail {
    #[allow(dead_code)]
    code: String,
    message: String,
}

// ============ Request Plumbing ============

/// Pull the server's error message out of a failed response
async fn error_message(response: gloo_net::http::Response) -> String {
    let status = response.status();
    match response.json::<ApiErrorBody>().await {
        Ok(body) => body.error.message,
        Err(_) => format!("Request failed with status {}", status),
    }
}

async fn get_json<T: serde::de::DeserializeOwned>(path: &str) -> Result<T, String> {
    let response = Request::get(&format!("{}{}", get_api_base(), path))
        .send()
        .await
        .map_err(|e| format!("Network error: {}", e))?;

    if !response.ok() {
        return Err(error_message(response).await);
    }

    response.json().await.map_err(|e| format!("Parse error: {}", e))
}

async fn get_json_auth<T: serde::de::DeserializeOwned>(
    path: &str,
    token: &str,
) -> Result<T, String> {
    let response = Request::get(&format!("{}{}", get_api_base(), path))
        .header("Authorization", &format!("Bearer {}", token))
        .send()
        .await
        .map_err(|e| format!("Network error: {}", e))?;

    if !response.ok() {
        return Err(error_message(response).await);
    }

    response.json().await.map_err(|e| format!("Parse error: {}", e))
}

async fn post_json<B: serde::Serialize, T: serde::de::DeserializeOwned>(
    path: &str,
    body: &B,
    token: Option<&str>,
) -> Result<T, String> {
    let mut builder = Request::post(&format!("{}{}", get_api_base(), path));
    if let Some(token) = token {
        builder = builder.header("Authorization", &format!("Bearer {}", token));
    }

    let response = builder
        .json(body)
        .map_err(|e| format!("Request build error: {}", e))?
        .send()
        .await
        .map_err(|e| format!("Network error: {}", e))?;

    if !response.ok() {
        return Err(error_message(response).await);
    }

    response.json().await.map_err(|e| format!("Parse error: {}", e))
}

async fn delete_auth(path: &str, token: &str) -> Result<(), String> {
    let response = Request::delete(&format!("{}{}", get_api_base(), path))
        .header("Authorization", &format!("Bearer {}", token))
        .send()
        .await
        .map_err(|e| format!("Network error: {}", e))?;

    if !response.ok() {
        return Err(error_message(response).await);
    }

    Ok(())
}

/// Percent-encode a path segment (group names can hold spaces)
fn encode(segment: &str) -> String {
    js_sys::encode_uri_component(segment).into()
}

// ============ Auth ============

/// Create an account and sign in
pub async fn register(username: &str, email: &str, password: &str) -> Result<SessionInfo, String> {
    #[derive(serde::Serialize)]
    struct Body<'a> {
        username: &'a str,
        email: &'a str,
        password: &'a str,
    }
    post_json("/auth/register", &Body { username, email, password }, None).await
}

/// Sign in to an existing account
pub async fn sign_in(email: &str, password: &str) -> Result<SessionInfo, String> {
    #[derive(serde::Serialize)]
    struct Body<'a> {
        email: &'a str,
        password: &'a str,
    }
    post_json("/auth/login", &Body { email, password }, None).await
}

/// Invalidate the session token
pub async fn sign_out(token: &str) -> Result<(), String> {
    let _: serde_json::Value = post_json("/auth/logout", &serde_json::json!({}), Some(token)).await?;
    Ok(())
}

// ============ Accounts ============

/// Fetch all user profiles
pub async fn fetch_profiles() -> Result<Vec<Profile>, String> {
    get_json("/accounts").await
}

// ============ Feed ============

/// Fetch the timeline, newest first
pub async fn fetch_timeline() -> Result<Vec<Post>, String> {
    get_json("/feed").await
}

/// Publish a post
pub async fn create_post(token: &str, text: &str, image_ids: &[String]) -> Result<Post, String> {
    #[derive(serde::Serialize)]
    struct Body<'a> {
        text: &'a str,
        image_ids: &'a [String],
    }
    post_json("/posts", &Body { text, image_ids }, Some(token)).await
}

/// Toggle the viewer's like on a post
pub async fn toggle_like(token: &str, uid: &str, post_id: &str) -> Result<LikeState, String> {
    post_json(
        &format!("/posts/{}/{}/like", encode(uid), encode(post_id)),
        &serde_json::json!({}),
        Some(token),
    )
    .await
}

/// Fetch a post's comments, oldest first
pub async fn fetch_comments(uid: &str, post_id: &str) -> Result<Vec<Comment>, String> {
    get_json(&format!("/posts/{}/{}/comments", encode(uid), encode(post_id))).await
}

/// Comment on a post
pub async fn add_comment(
    token: &str,
    uid: &str,
    post_id: &str,
    text: &str,
) -> Result<Comment, String> {
    #[derive(serde::Serialize)]
    struct Body<'a> {
        text: &'a str,
    }
    post_json(
        &format!("/posts/{}/{}/comments", encode(uid), encode(post_id)),
        &Body { text },
        Some(token),
    )
    .await
}

/// Share a post onto the viewer's own timeline
pub async fn repost(token: &str, uid: &str, post_id: &str) -> Result<Post, String> {
    post_json(
        &format!("/posts/{}/{}/repost", encode(uid), encode(post_id)),
        &serde_json::json!({}),
        Some(token),
    )
    .await
}

/// Delete a post (author only)
pub async fn delete_post(token: &str, uid: &str, post_id: &str) -> Result<(), String> {
    delete_auth(&format!("/posts/{}/{}", encode(uid), encode(post_id)), token).await
}

// ============ Chat ============

/// Fetch all chat groups
pub async fn fetch_groups() -> Result<Vec<Group>, String> {
    get_json("/groups").await
}

/// Create a group (the creator joins it)
pub async fn create_group(token: &str, name: &str) -> Result<Group, String> {
    #[derive(serde::Serialize)]
    struct Body<'a> {
        name: &'a str,
    }
    post_json("/groups", &Body { name }, Some(token)).await
}

/// Join a group
pub async fn join_group(token: &str, name: &str) -> Result<(), String> {
    let _: serde_json::Value = post_json(
        &format!("/groups/{}/join", encode(name)),
        &serde_json::json!({}),
        Some(token),
    )
    .await?;
    Ok(())
}

/// Fetch a group's messages, oldest first
pub async fn fetch_messages(name: &str) -> Result<Vec<Message>, String> {
    get_json(&format!("/groups/{}/messages", encode(name))).await
}

/// Send a message to a group (members only)
pub async fn send_message(
    token: &str,
    name: &str,
    text: &str,
    attachment_id: Option<&str>,
) -> Result<Message, String> {
    #[derive(serde::Serialize)]
    struct Body<'a> {
        text: &'a str,
        #[serde(skip_serializing_if = "Option::is_none")]
        attachment_id: Option<&'a str>,
    }
    post_json(
        &format!("/groups/{}/messages", encode(name)),
        &Body { text, attachment_id },
        Some(token),
    )
    .await
}

// ============ Stories ============

/// Fetch stories still inside their 24-hour window
pub async fn fetch_stories() -> Result<Vec<Story>, String> {
    get_json("/stories").await
}

/// Post a story
pub async fn post_story(
    token: &str,
    image_id: &str,
    caption: Option<&str>,
) -> Result<Story, String> {
    #[derive(serde::Serialize)]
    struct Body<'a> {
        image_id: &'a str,
        #[serde(skip_serializing_if = "Option::is_none")]
        caption: Option<&'a str>,
    }
    post_json("/stories", &Body { image_id, caption }, Some(token)).await
}

// ============ Quiz ============

/// Start a quiz round in the given category
pub async fn quiz_start(token: &str, category: &str) -> Result<QuizStart, String> {
    #[derive(serde::Serialize)]
    struct Body<'a> {
        category: &'a str,
    }
    post_json("/quiz/start", &Body { category }, Some(token)).await
}

/// Submit an answer for the session's current question
pub async fn quiz_answer(
    token: &str,
    session_id: &str,
    answer: &str,
) -> Result<AnswerOutcome, String> {
    #[derive(serde::Serialize)]
    struct Body<'a> {
        answer: &'a str,
    }
    post_json(
        &format!("/quiz/{}/answer", encode(session_id)),
        &Body { answer },
        Some(token),
    )
    .await
}

// ============ Scores ============

/// Fetch the leaderboard, best first
pub async fn fetch_leaderboard() -> Result<Vec<LeaderboardEntry>, String> {
    get_json("/leaderboard").await
}

// ============ Writing Tools ============

/// Correct the grammar of a text
pub async fn tool_grammar(token: &str, text: &str) -> Result<GrammarReport, String> {
    #[derive(serde::Serialize)]
    struct Body<'a> {
        text: &'a str,
    }
    post_json("/tools/grammar", &Body { text }, Some(token)).await
}

/// Paraphrase a text in the given register
pub async fn tool_paraphrase(token: &str, text: &str, mode: &str) -> Result<ToolText, String> {
    #[derive(serde::Serialize)]
    struct Body<'a> {
        text: &'a str,
        mode: &'a str,
    }
    post_json("/tools/paraphrase", &Body { text, mode }, Some(token)).await
}

/// Look up a word
pub async fn tool_define(token: &str, word: &str) -> Result<Definition, String> {
    #[derive(serde::Serialize)]
    struct Body<'a> {
        word: &'a str,
    }
    post_json("/tools/dictionary", &Body { word }, Some(token)).await
}

/// Check an essay sentence by sentence
pub async fn tool_essay(token: &str, text: &str) -> Result<EssayReport, String> {
    #[derive(serde::Serialize)]
    struct Body<'a> {
        text: &'a str,
    }
    post_json("/tools/essay", &Body { text }, Some(token)).await
}

/// Rewrite a text to read less machine-generated
pub async fn tool_humanize(token: &str, text: &str) -> Result<ToolText, String> {
    #[derive(serde::Serialize)]
    struct Body<'a> {
        text: &'a str,
    }
    post_json("/tools/humanize", &Body { text }, Some(token)).await
}

// ============ Media ============

/// Upload an image (base64 payload) and get its id and public URL
pub async fn upload_media(
    token: &str,
    data: &str,
    content_type: &str,
) -> Result<MediaUpload, String> {
    #[derive(serde::Serialize)]
    struct Body<'a> {
        data: &'a str,
        content_type: &'a str,
    }
    post_json("/media", &Body { data, content_type }, Some(token)).await
}

// ============ Admin ============

/// Sign in to the back-office
pub async fn admin_login(name: &str, password: &str) -> Result<AdminToken, String> {
    #[derive(serde::Serialize)]
    struct Body<'a> {
        name: &'a str,
        password: &'a str,
    }
    post_json("/admin/login", &Body { name, password }, None).await
}

/// Register an admin (first one bootstraps, after that an admin token is required)
pub async fn admin_register(
    name: &str,
    password: &str,
    token: Option<&str>,
) -> Result<AdminView, String> {
    #[derive(serde::Serialize)]
    struct Body<'a> {
        name: &'a str,
        password: &'a str,
    }
    post_json("/admin/register", &Body { name, password }, token).await
}

/// Fetch all admin accounts
pub async fn admin_list(token: &str) -> Result<Vec<AdminView>, String> {
    get_json_auth("/admin/accounts", token).await
}

/// Restrict or unrestrict a user account
pub async fn admin_restrict(token: &str, uid: &str, restricted: bool) -> Result<(), String> {
    #[derive(serde::Serialize)]
    struct Body {
        restricted: bool,
    }
    let _: serde_json::Value = post_json(
        &format!("/admin/users/{}/restrict", encode(uid)),
        &Body { restricted },
        Some(token),
    )
    .await?;
    Ok(())
}

/// Delete a user account and its data
pub async fn admin_delete_user(token: &str, uid: &str) -> Result<(), String> {
    delete_auth(&format!("/admin/users/{}", encode(uid)), token).await
}

/// Fetch the usage report
pub async fn admin_analytics(token: &str) -> Result<UsageReport, String> {
    get_json_auth("/admin/analytics", token).await
}
