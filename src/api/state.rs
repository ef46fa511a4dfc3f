//! Application State
//!
//! Shared state accessible by all API handlers.
//! Wrapped in Arc for thread-safe sharing across async tasks.

use crate::ai::WritingTools;
use crate::media::MediaStore;
use crate::realtime::{HubConfig, SubscriptionHub};
use crate::services::{
    AccountService, AdminService, ChatService, FeedService, QuizService, ScoreService,
    StoriesService,
};
use crate::store::StoreEngine;
use std::sync::Arc;
use std::time::Instant;

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    /// Document store backing everything
    pub store: Arc<StoreEngine>,
    /// WebSocket subscription hub for realtime events
    pub hub: Arc<SubscriptionHub>,
    /// Media object store for uploads
    pub media: Arc<dyn MediaStore>,
    /// Accounts, sessions, profiles, notes
    pub accounts: Arc<AccountService>,
    /// Posts, comments, likes, reposts
    pub feed: Arc<FeedService>,
    /// Groups and messages
    pub chat: Arc<ChatService>,
    /// Ephemeral stories
    pub stories: Arc<StoriesService>,
    /// Word-scramble quiz sessions
    pub quiz: Arc<QuizService>,
    /// Score records and leaderboard
    pub scores: Arc<ScoreService>,
    /// Back-office operations
    pub admin: Arc<AdminService>,
    /// Writing tools; absent when no model gateway is configured
    pub tools: Option<Arc<WritingTools>>,
    /// API configuration
    pub config: Arc<ApiConfig>,
    /// Server start time for uptime tracking
    pub start_time: Instant,
}

impl AppState {
    /// Create AppState without a model gateway (writing tools return 503)
    pub fn new(store: Arc<StoreEngine>, media: Arc<dyn MediaStore>, config: ApiConfig) -> Self {
        let scores = Arc::new(ScoreService::new(Arc::clone(&store)));
        Self {
            hub: Arc::new(SubscriptionHub::new(HubConfig::default())),
            media,
            accounts: Arc::new(AccountService::new(Arc::clone(&store))),
            feed: Arc::new(FeedService::new(Arc::clone(&store))),
            chat: Arc::new(ChatService::new(Arc::clone(&store))),
            stories: Arc::new(StoriesService::new(Arc::clone(&store))),
            quiz: Arc::new(QuizService::new(Arc::clone(&store), Arc::clone(&scores))),
            scores,
            admin: Arc::new(AdminService::new(Arc::clone(&store))),
            tools: None,
            config: Arc::new(config),
            start_time: Instant::now(),
            store,
        }
    }

    /// Create AppState with the writing tools wired to a model gateway
    pub fn with_tools(
        store: Arc<StoreEngine>,
        media: Arc<dyn MediaStore>,
        config: ApiConfig,
        tools: Arc<WritingTools>,
    ) -> Self {
        let mut state = Self::new(store, media, config);
        state.tools = Some(tools);
        state
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Check if the writing tools are available
    pub fn has_tools(&self) -> bool {
        self.tools.is_some()
    }

    /// Get WebSocket connection count
    pub async fn ws_connection_count(&self) -> usize {
        self.hub.connection_count().await
    }
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Request timeout in milliseconds
    pub request_timeout_ms: u64,
    /// Maximum request body size in bytes
    pub max_body_size: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8088,
            request_timeout_ms: 30_000,
            // Uploads arrive base64-encoded inside JSON, so the body limit
            // sits above the raw media limit
            max_body_size: 10 * 1024 * 1024,
        }
    }
}

impl ApiConfig {
    /// Create config with custom host and port
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// Get the socket address string
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
