//! Focus Guard - background process of a focus-mode browser extension
//!
//! Owns the pomodoro timer engine, the navigation guard and the messenger
//! responder, and exposes them to browser contexts over a local HTTP and
//! WebSocket surface.

pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod guard;
pub mod messenger;
pub mod services;
pub mod state;
pub mod store;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use api::create_router;
pub use config::Config;
pub use engine::TimerEngine;
pub use state::AppState;
pub use utils::signals::shutdown_signal;
