//! Error types shared across the daemon

use std::time::Duration;
use thiserror::Error;

/// Failures of the persistent settings store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Settings store is unavailable")]
    Unavailable,
}

/// Failures talking to the remote REST backend
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Request failed with status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("Authentication failed")]
    Unauthorized,
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Failures of a request/response round trip to the background responder
#[derive(Debug, Error)]
pub enum MessengerError {
    #[error("No response from background within {0:?}")]
    Timeout(Duration),
    #[error("Background responder is not running")]
    Disconnected,
    #[error("Unexpected response to {0}")]
    UnexpectedResponse(&'static str),
}
