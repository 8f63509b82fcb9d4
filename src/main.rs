//! Focus Guard - background process of a focus-mode browser extension
//!
//! This is the main entry point for the focus-guard daemon.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use focus_guard::{
    api::create_router,
    config::Config,
    services::{ApiClient, RemoteApi},
    state::AppState,
    store::{JsonFileStore, SettingsStore},
    tasks::notification_poll_task,
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("focus_guard={},tower_http=info", config.log_level()))
        .init();

    info!("Starting focus-guard v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration: host={}, port={}, store={}, api={}",
        config.host,
        config.port,
        config.store.display(),
        config.api_base_url
    );

    let store: Arc<dyn SettingsStore> = Arc::new(JsonFileStore::open(config.store.clone()).await);
    let api: Arc<dyn RemoteApi> = Arc::new(ApiClient::new(&config.api_base_url, store.clone())?);

    // Create application state
    let state = AppState::new(&config, store, api.clone()).await;

    // Start the unread-notification poll
    let notifier = state.notifier.clone();
    let period = config.notification_interval();
    tokio::spawn(async move {
        notification_poll_task(api, notifier, period).await;
    });

    // Create HTTP router with all endpoints
    let app = create_router(state);

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST /message     - Messenger request (pomodoro, block check, close tab)");
    info!("  POST /navigation  - Navigation-start event");
    info!("  GET  /block-page  - Block page data");
    info!("  GET  /focus-mode  - Pull focus settings");
    info!("  PUT  /focus-mode  - Save focus settings");
    info!("  GET  /events      - WebSocket event stream");
    info!("  GET  /status      - Timer and focus mode status");
    info!("  GET  /health      - Health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    info!("Server shutdown complete");
    Ok(())
}
