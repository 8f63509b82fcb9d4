//! User-facing notifications

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::messenger::OutboundMessage;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub message: String,
}

impl Notification {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
        }
    }
}

/// Sink for notifications raised by the timer and the notification poll
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Pushes notifications to the browser shim, which raises them as OS
/// notifications
#[derive(Debug, Clone)]
pub struct EventNotifier {
    events: broadcast::Sender<OutboundMessage>,
}

impl EventNotifier {
    pub fn new(events: broadcast::Sender<OutboundMessage>) -> Self {
        Self { events }
    }
}

impl Notifier for EventNotifier {
    fn notify(&self, notification: Notification) {
        info!("Notification: {} - {}", notification.title, notification.message);
        let message = OutboundMessage::Notification {
            title: notification.title,
            message: notification.message,
        };
        if self.events.send(message).is_err() {
            warn!("Notification not delivered, no browser shim connected");
        }
    }
}

/// Only logs; used when no browser shim is expected
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: Notification) {
        info!("Notification: {} - {}", notification.title, notification.message);
    }
}
