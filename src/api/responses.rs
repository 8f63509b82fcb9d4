//! API response structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{guard::BlockPageInfo, state::TimerState};

/// Status response with timer and focus mode summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub timer: TimerState,
    /// `MM:SS` rendering of the remaining time
    pub timer_display: String,
    /// Fraction of the current interval still remaining
    pub timer_progress: f64,
    pub timer_label: String,
    pub ticking: bool,
    pub focus_mode_enabled: bool,
    pub blocked_websites: usize,
    pub blocked_today: u32,
    pub uptime: String,
    pub port: u16,
    pub host: String,
}

/// Everything the block page renders
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockPageResponse {
    #[serde(flatten)]
    pub info: BlockPageInfo,
    pub blocked_today: u32,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    /// Create a new health response
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
