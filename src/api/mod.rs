//! HTTP API module
//!
//! Local surface the browser-side shim, popups and block page talk to.

pub mod handlers;
pub mod responses;

use std::sync::Arc;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use handlers::*;

/// Create the HTTP router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/message", post(message_handler))
        .route("/navigation", post(navigation_handler))
        .route("/block-page", get(block_page_handler))
        .route("/focus-mode", get(get_focus_mode_handler).put(put_focus_mode_handler))
        .route("/events", get(events_handler))
        .route("/status", get(status_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
