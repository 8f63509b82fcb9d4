//! Background tasks module
//!
//! Recurring tasks that run alongside the HTTP server.

pub mod notification_poll;
pub mod pomodoro_tick;

pub use notification_poll::{check_notifications, notification_poll_task, NOTIFICATION_POLL_PERIOD};
pub use pomodoro_tick::spawn_tick_source;
