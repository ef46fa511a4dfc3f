//! Arregmatica API Server
//!
//! Run with: cargo run --bin arregmatica-api
//!
//! # Configuration
//!
//! Loads `config.toml` from the usual locations, then applies environment
//! overrides:
//! - `ARREGMATICA_API_HOST`: Host to bind to (default: 0.0.0.0)
//! - `ARREGMATICA_API_PORT`: Port to listen on (default: 8088)
//! - `ARREGMATICA_DATA_DIR`: Data directory
//! - `ARREGMATICA_MEDIA_DIR`: Media directory
//! - `ARREGMATICA_MODEL_URL`: Text model gateway URL (setting it enables
//!   the writing tools)
//! - `ARREGMATICA_MODEL_KEY`: Model API key
//! - `RUST_LOG`: Log level (default: info)

use arregmatica::ai::{TextModelClient, TextModelConfig, WritingTools};
use arregmatica::api::{serve, ApiConfig, AppState};
use arregmatica::config::Config;
use arregmatica::media::{LocalMediaStore, MediaConfig, MediaStore};
use arregmatica::store::{StoreConfig, StoreEngine};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "arregmatica=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "Starting Arregmatica API server v{}",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::load_default();
    tracing::info!("Data directory: {}", config.store.data_dir);

    // Open the document store
    tracing::info!("Opening document store...");
    let mut store_config = StoreConfig::new(&config.store.data_dir);
    store_config.journal_enabled = config.store.journal_enabled;
    store_config.flush_interval_ms = config.store.flush_interval_ms;
    store_config.snapshot_threshold = config.store.snapshot_threshold;
    let store = Arc::new(StoreEngine::open(store_config).await?);
    let flush_handle = store.start_background_flush();
    tracing::info!("Document store ready");

    // Media store
    let mut media_config = MediaConfig::new(&config.media.root_dir);
    media_config.max_bytes = config.media.max_bytes;
    let media: Arc<dyn MediaStore> = Arc::new(LocalMediaStore::new(media_config)?);

    let api_config = ApiConfig {
        host: config.api.host.clone(),
        port: config.api.port,
        request_timeout_ms: config.api.request_timeout_secs * 1000,
        ..Default::default()
    };

    // Create app state (with or without the model gateway)
    let state = if config.model.enabled {
        tracing::info!("Model gateway enabled: {}", config.model.url);

        let client = Arc::new(TextModelClient::new(TextModelConfig {
            base_url: config.model.url.clone(),
            api_key: config.model.api_key.clone(),
            model: config.model.model.clone(),
            request_timeout_ms: config.model.request_timeout_ms,
            max_retries: config.model.max_retries,
        }));

        // Check gateway availability
        match client.health_check().await {
            Ok(_) => tracing::info!("Model gateway connection verified"),
            Err(e) => tracing::warn!(
                "Model gateway not available: {} (writing tools will answer 503)",
                e
            ),
        }

        let tools = Arc::new(WritingTools::new(client, Arc::clone(&store)));
        AppState::with_tools(Arc::clone(&store), media, api_config.clone(), tools)
    } else {
        tracing::info!("Model gateway disabled (set ARREGMATICA_MODEL_URL to enable)");
        AppState::new(Arc::clone(&store), media, api_config.clone())
    };

    // Bridge store events into the WebSocket hub
    let bridge_handle = state.hub.start_store_bridge(&store);

    // Run server
    tracing::info!("Starting server on {}:{}", api_config.host, api_config.port);
    serve(state, &api_config).await?;

    // Graceful shutdown
    tracing::info!("Shutting down document store...");
    store.shutdown().await?;
    flush_handle.abort();
    bridge_handle.abort();
    tracing::info!("Arregmatica API server stopped");

    Ok(())
}
