//! Arregmatica REST API
//!
//! HTTP API layer for Arregmatica, built with Axum.
//!
//! # Endpoints
//!
//! ## Auth
//! - `POST /api/v1/auth/register` - Create an account and sign it in
//! - `POST /api/v1/auth/login` - Sign in
//! - `POST /api/v1/auth/logout` - End the session
//!
//! ## Accounts
//! - `GET /api/v1/accounts` - List profiles
//! - `GET /api/v1/accounts/:uid` - One profile
//! - `PUT /api/v1/accounts/me` - Update own profile
//! - `PUT /api/v1/accounts/me/presence` - Set own online flag
//! - `GET/POST /api/v1/accounts/me/notes` - Own notes
//! - `DELETE /api/v1/accounts/me/notes/:id` - Delete a note
//!
//! ## Feed
//! - `GET /api/v1/feed` - Global timeline
//! - `POST /api/v1/posts` - Create a post
//! - `GET/DELETE /api/v1/posts/:uid/:post_id` - One post
//! - `GET/POST /api/v1/posts/:uid/:post_id/comments` - Comments
//! - `POST /api/v1/posts/:uid/:post_id/like` - Toggle a like
//! - `POST /api/v1/posts/:uid/:post_id/repost` - Repost
//!
//! ## Chat
//! - `GET/POST /api/v1/groups` - Groups
//! - `GET /api/v1/groups/:name` - One group
//! - `POST /api/v1/groups/:name/join|leave` - Membership
//! - `GET/POST /api/v1/groups/:name/messages` - Messages
//!
//! ## Stories
//! - `GET/POST /api/v1/stories` - Active stories / post one
//!
//! ## Quiz and Scores
//! - `GET /api/v1/quiz/categories` - Available categories
//! - `POST /api/v1/quiz/start` - Start a session
//! - `GET /api/v1/quiz/:session/question` - Current question
//! - `POST /api/v1/quiz/:session/answer` - Submit an answer
//! - `GET /api/v1/leaderboard` - Leaderboard
//! - `GET /api/v1/scores/me` - Own record
//! - `GET /api/v1/scores/:uid` - One user's record
//!
//! ## Writing Tools
//! - `POST /api/v1/tools/{grammar,paraphrase,dictionary,essay,humanize}`
//!
//! ## Media
//! - `POST /api/v1/media` - Upload (base64 inside JSON)
//! - `GET /media/:id` - Serve a stored object
//!
//! ## Admin
//! - `POST /api/v1/admin/register|login`
//! - `GET /api/v1/admin/accounts`, `DELETE /api/v1/admin/accounts/:id`
//! - `POST /api/v1/admin/users/:uid/restrict`, `DELETE /api/v1/admin/users/:uid`
//! - `GET /api/v1/admin/analytics`
//!
//! ## Health
//! - `GET /health/live` - Liveness probe
//! - `GET /health/ready` - Readiness probe
//! - `GET /health` - Full health status
//!
//! ## WebSocket
//! - `GET /ws` - Realtime event subscriptions
//!
//! # Example
//!
//! ```rust,ignore
//! use arregmatica::api::{build_router, serve, ApiConfig, AppState};
//! use arregmatica::media::{LocalMediaStore, MediaConfig};
//! use arregmatica::store::{StoreConfig, StoreEngine};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(StoreEngine::open(StoreConfig::default()).await?);
//!     let media = Arc::new(LocalMediaStore::new(MediaConfig::default())?);
//!     let config = ApiConfig::default();
//!
//!     let state = AppState::new(store, media, config.clone());
//!     serve(state, &config).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod dto;
pub mod error;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::{ApiConfig, AppState};

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::realtime::websocket_handler;

/// Build the API router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let max_body_size = state.config.max_body_size;

    let api_routes = Router::new()
        // Auth routes
        .route("/auth/register", post(routes::auth::register))
        .route("/auth/login", post(routes::auth::login))
        .route("/auth/logout", post(routes::auth::logout))
        // Account routes
        .route("/accounts", get(routes::accounts::list_profiles))
        .route("/accounts/me", put(routes::accounts::update_profile))
        .route("/accounts/me/presence", put(routes::accounts::set_presence))
        .route(
            "/accounts/me/notes",
            get(routes::accounts::list_notes).post(routes::accounts::add_note),
        )
        .route(
            "/accounts/me/notes/:id",
            delete(routes::accounts::delete_note),
        )
        .route("/accounts/:uid", get(routes::accounts::get_profile))
        // Feed routes
        .route("/feed", get(routes::feed::timeline))
        .route("/posts", post(routes::feed::create_post))
        .route(
            "/posts/:uid/:post_id",
            get(routes::feed::get_post).delete(routes::feed::delete_post),
        )
        .route(
            "/posts/:uid/:post_id/comments",
            get(routes::feed::list_comments).post(routes::feed::add_comment),
        )
        .route("/posts/:uid/:post_id/like", post(routes::feed::toggle_like))
        .route("/posts/:uid/:post_id/repost", post(routes::feed::repost))
        // Chat routes
        .route(
            "/groups",
            get(routes::chat::list_groups).post(routes::chat::create_group),
        )
        .route("/groups/:name", get(routes::chat::get_group))
        .route("/groups/:name/join", post(routes::chat::join_group))
        .route("/groups/:name/leave", post(routes::chat::leave_group))
        .route(
            "/groups/:name/messages",
            get(routes::chat::list_messages).post(routes::chat::send_message),
        )
        // Story routes
        .route(
            "/stories",
            get(routes::stories::active_stories).post(routes::stories::post_story),
        )
        // Quiz routes
        .route("/quiz/categories", get(routes::quiz::categories))
        .route("/quiz/start", post(routes::quiz::start_quiz))
        .route("/quiz/:session/question", get(routes::quiz::current_question))
        .route("/quiz/:session/answer", post(routes::quiz::submit_answer))
        // Score routes
        .route("/leaderboard", get(routes::scores::leaderboard))
        .route("/scores/me", get(routes::scores::my_score))
        .route("/scores/:uid", get(routes::scores::user_score))
        // Writing tool routes
        .route("/tools/grammar", post(routes::tools::grammar))
        .route("/tools/paraphrase", post(routes::tools::paraphrase))
        .route("/tools/dictionary", post(routes::tools::dictionary))
        .route("/tools/essay", post(routes::tools::essay))
        .route("/tools/humanize", post(routes::tools::humanize))
        // Media upload - body limit covers base64 overhead
        .route("/media", post(routes::media::upload_media))
        // Admin routes
        .route("/admin/register", post(routes::admin::register_admin))
        .route("/admin/login", post(routes::admin::login_admin))
        .route("/admin/accounts", get(routes::admin::list_admins))
        .route("/admin/accounts/:id", delete(routes::admin::delete_admin))
        .route(
            "/admin/users/:uid/restrict",
            post(routes::admin::set_restricted),
        )
        .route("/admin/users/:uid", delete(routes::admin::delete_account))
        .route("/admin/analytics", get(routes::admin::analytics))
        .layer(DefaultBodyLimit::max(max_body_size));

    let health_routes = Router::new()
        .route("/live", get(routes::health::liveness))
        .route("/ready", get(routes::health::readiness))
        .route("/", get(routes::health::full_health));

    // Create shared state
    let shared_state = Arc::new(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .nest("/health", health_routes)
        .route("/media/:id", get(routes::media::fetch_media))
        .route("/ws", get(websocket_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()) // Configure properly in production
        .with_state(shared_state)
}

/// Start the API server
pub async fn serve(state: AppState, config: &ApiConfig) -> Result<(), ApiError> {
    let router = build_router(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Arregmatica API listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

    tracing::info!("Arregmatica API shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::{LocalMediaStore, MediaConfig};
    use crate::store::{JournalSyncMode, StoreConfig, StoreEngine};
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use base64::Engine as _;
    use serde_json::{json, Value};
    use tempfile::tempdir;
    use tower::util::ServiceExt;

    async fn create_test_app() -> (Router, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let mut store_config = StoreConfig::new(dir.path().join("store"));
        store_config.journal_sync = JournalSyncMode::EveryWrite;
        let store = Arc::new(StoreEngine::open(store_config).await.unwrap());
        let media = Arc::new(
            LocalMediaStore::new(MediaConfig::new(dir.path().join("media"))).unwrap(),
        );

        let state = AppState::new(store, media, ApiConfig::default());
        let router = build_router(state);

        (router, dir)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("Content-Type", "application/json");
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {}", token));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn register(app: &Router, username: &str, email: &str) -> String {
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/v1/auth/register",
                None,
                json!({"username": username, "email": email, "password": "hunter22"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        body_json(response).await["token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health_endpoints() {
        let (app, _dir) = create_test_app().await;

        for uri in ["/health/live", "/health/ready", "/health"] {
            let response = app.clone().oneshot(get(uri)).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK, "GET {}", uri);
        }
    }

    #[tokio::test]
    async fn test_register_login_logout() {
        let (app, _dir) = create_test_app().await;

        let token = register(&app, "ada", "ada@example.com").await;

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/v1/auth/login",
                None,
                json!({"email": "ada@example.com", "password": "hunter22"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/v1/auth/logout",
                Some(&token),
                json!({}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_bad_login_is_401() {
        let (app, _dir) = create_test_app().await;
        register(&app, "ada", "ada@example.com").await;

        let response = app
            .oneshot(json_request(
                "POST",
                "/api/v1/auth/login",
                None,
                json!({"email": "ada@example.com", "password": "wrong"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_post_requires_auth() {
        let (app, _dir) = create_test_app().await;

        let response = app
            .oneshot(json_request(
                "POST",
                "/api/v1/posts",
                None,
                json!({"text": "hello"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_post_and_timeline_flow() {
        let (app, _dir) = create_test_app().await;
        let token = register(&app, "ada", "ada@example.com").await;

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/v1/posts",
                Some(&token),
                json!({"text": "first post"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let post = body_json(response).await;
        let uid = post["uid"].as_str().unwrap().to_string();
        let post_id = post["post_id"].as_str().unwrap().to_string();

        let response = app.clone().oneshot(get("/api/v1/feed")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let feed = body_json(response).await;
        assert_eq!(feed.as_array().unwrap().len(), 1);

        // Like it, then comment
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                &format!("/api/v1/posts/{}/{}/like", uid, post_id),
                Some(&token),
                json!({}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let like = body_json(response).await;
        assert_eq!(like["liked"], json!(true));
        assert_eq!(like["like_count"], json!(1));

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                &format!("/api/v1/posts/{}/{}/comments", uid, post_id),
                Some(&token),
                json!({"text": "nice"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_tools_unavailable_without_gateway() {
        let (app, _dir) = create_test_app().await;
        let token = register(&app, "ada", "ada@example.com").await;

        let response = app
            .oneshot(json_request(
                "POST",
                "/api/v1/tools/grammar",
                Some(&token),
                json!({"text": "teh cat sat"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_media_upload_and_fetch() {
        let (app, _dir) = create_test_app().await;
        let token = register(&app, "ada", "ada@example.com").await;

        let data = base64::engine::general_purpose::STANDARD.encode(b"not really a png");
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/v1/media",
                Some(&token),
                json!({"data": data, "content_type": "image/png"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let upload = body_json(response).await;
        let url = upload["url"].as_str().unwrap().to_string();

        let response = app.clone().oneshot(get(&url)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()["content-type"].to_str().unwrap(),
            "image/png"
        );
    }

    #[tokio::test]
    async fn test_quiz_flow() {
        let (app, _dir) = create_test_app().await;
        let token = register(&app, "ada", "ada@example.com").await;

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/v1/quiz/start",
                Some(&token),
                json!({"category": "easy"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let started = body_json(response).await;
        let session_id = started["session_id"].as_str().unwrap().to_string();

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri(format!("/api/v1/quiz/{}/question", session_id))
                    .header("Authorization", format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(json_request(
                "POST",
                &format!("/api/v1/quiz/{}/answer", session_id),
                Some(&token),
                json!({"answer": "definitely wrong"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let outcome = body_json(response).await;
        assert_eq!(outcome["correct"], json!(false));
    }

    #[tokio::test]
    async fn test_admin_bootstrap_then_locked() {
        let (app, _dir) = create_test_app().await;

        // First registration needs no token
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/v1/admin/register",
                None,
                json!({"name": "root", "password": "sup3rsecret"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        // Second one does
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/v1/admin/register",
                None,
                json!({"name": "aux", "password": "sup3rsecret"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/v1/admin/login",
                None,
                json!({"name": "root", "password": "sup3rsecret"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let token = body_json(response).await["token"]
            .as_str()
            .unwrap()
            .to_string();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/admin/analytics")
                    .header("Authorization", format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_leaderboard_empty() {
        let (app, _dir) = create_test_app().await;

        let response = app.oneshot(get("/api/v1/leaderboard")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let board = body_json(response).await;
        assert_eq!(board.as_array().unwrap().len(), 0);
    }
}
