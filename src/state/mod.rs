//! State management module
//!
//! Plain data types for the pomodoro timer and focus mode, plus the shared
//! application state handed to the HTTP layer.

pub mod app_state;
pub mod focus_mode;
pub mod timer_state;

// Re-export main types
pub use app_state::AppState;
pub use focus_mode::{FocusModeConfig, FocusModeSettings};
pub use timer_state::{format_time, PomodoroSettings, TimerState};
