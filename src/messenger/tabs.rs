//! Tab control seam used by the guard and the tab-close request

use tokio::sync::broadcast;
use tracing::{info, warn};

use super::OutboundMessage;

/// Browser tab operations the background process may request
pub trait TabController: Send + Sync {
    /// Point `tab_id` at `url`; returns whether the command was delivered
    fn update_tab(&self, tab_id: i64, url: &str) -> bool;

    /// Close `tab_id`; returns whether the command was delivered
    fn close_tab(&self, tab_id: i64) -> bool;
}

/// Forwards tab commands to the browser shim over the event stream
#[derive(Debug, Clone)]
pub struct EventTabController {
    events: broadcast::Sender<OutboundMessage>,
}

impl EventTabController {
    pub fn new(events: broadcast::Sender<OutboundMessage>) -> Self {
        Self { events }
    }

    fn push(&self, message: OutboundMessage) -> bool {
        match self.events.send(message) {
            Ok(_) => true,
            Err(e) => {
                warn!("Tab command not delivered, no browser shim connected: {:?}", e.0);
                false
            }
        }
    }
}

impl TabController for EventTabController {
    fn update_tab(&self, tab_id: i64, url: &str) -> bool {
        info!("Redirecting tab {} to {}", tab_id, url);
        self.push(OutboundMessage::UpdateTab {
            tab_id,
            url: url.to_string(),
        })
    }

    fn close_tab(&self, tab_id: i64) -> bool {
        info!("Closing tab {}", tab_id);
        self.push(OutboundMessage::CloseTab { tab_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_are_pushed_to_listeners() {
        let (tx, mut rx) = broadcast::channel(8);
        let tabs = EventTabController::new(tx);

        assert!(tabs.close_tab(4));
        assert_eq!(rx.try_recv().unwrap(), OutboundMessage::CloseTab { tab_id: 4 });

        assert!(tabs.update_tab(4, "chrome-extension://x/block.html"));
        assert!(matches!(rx.try_recv().unwrap(), OutboundMessage::UpdateTab { tab_id: 4, .. }));
    }

    #[test]
    fn missing_listener_is_reported() {
        let (tx, rx) = broadcast::channel(8);
        drop(rx);
        let tabs = EventTabController::new(tx);
        assert!(!tabs.close_tab(1));
    }
}
