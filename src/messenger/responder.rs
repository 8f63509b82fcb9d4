//! Background side of the request/response channel

use std::sync::Arc;

use chrono::Local;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::{BlockCheck, Envelope, PendingCall, Request, Response, TabController};
use crate::{
    engine::TimerEngine,
    store::{self, SettingsStore},
};

/// Answers requests from popups, content scripts and the block page
pub struct Messenger {
    engine: Arc<TimerEngine>,
    store: Arc<dyn SettingsStore>,
    tabs: Arc<dyn TabController>,
}

impl Messenger {
    pub fn new(
        engine: Arc<TimerEngine>,
        store: Arc<dyn SettingsStore>,
        tabs: Arc<dyn TabController>,
    ) -> Arc<Self> {
        Arc::new(Self { engine, store, tabs })
    }

    pub async fn handle(&self, envelope: Envelope) -> Response {
        debug!("Handling {} from {:?}", envelope.message.kind(), envelope.sender);

        match envelope.message {
            Request::GetPomodoroState => Response::pomodoro(self.engine.get_state().await),
            Request::StartPomodoro { settings } => Response::pomodoro(self.engine.start(settings).await),
            Request::PausePomodoro => Response::pomodoro(self.engine.pause().await),
            Request::ResetPomodoro => Response::pomodoro(self.engine.reset().await),
            Request::CheckBlockedWebsite { url } => Response::BlockCheck(self.check_blocked(&url).await),
            Request::CloseCurrentTab => {
                let success = match envelope.sender.tab_id {
                    Some(tab_id) => self.tabs.close_tab(tab_id),
                    None => {
                        warn!("CLOSE_CURRENT_TAB sent from outside a tab, ignoring");
                        false
                    }
                };
                Response::Ack { success }
            }
        }
    }

    /// Same match rule as the navigation guard, failing open on store errors
    async fn check_blocked(&self, url: &str) -> BlockCheck {
        let config = store::load_focus_mode(self.store.as_ref()).await;
        if !config.blocks(url) {
            return BlockCheck::allowed();
        }

        info!("Page load blocked: {}", url);
        let blocked_today = match store::record_block(self.store.as_ref(), Local::now().date_naive()).await {
            Ok(count) => Some(count),
            Err(e) => {
                warn!("Failed to record blocked page: {}", e);
                None
            }
        };
        BlockCheck {
            is_blocked: true,
            blocked_today,
        }
    }

    /// Serve calls until every client is dropped.
    ///
    /// Each call is handled on its own task so a slow store read never
    /// holds up other requests.
    pub async fn serve(self: Arc<Self>, mut rx: mpsc::Receiver<PendingCall>) {
        info!("Messenger responder started");

        while let Some(PendingCall { envelope, reply }) = rx.recv().await {
            let messenger = Arc::clone(&self);
            tokio::spawn(async move {
                let kind = envelope.message.kind();
                let response = messenger.handle(envelope).await;
                if reply.send(response).is_err() {
                    debug!("Caller went away before {} completed", kind);
                }
            });
        }

        info!("Messenger responder stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use tokio::sync::broadcast;

    use crate::{
        messenger::{EventTabController, MessengerClient, OutboundMessage, BlockChecker},
        services::LogNotifier,
        state::{FocusModeConfig, PomodoroSettings, TimerState},
        store::MemoryStore,
    };

    struct Fixture {
        client: MessengerClient,
        store: Arc<MemoryStore>,
        events: broadcast::Receiver<OutboundMessage>,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let (tx, events) = broadcast::channel(64);
        let engine = TimerEngine::new(TimerState::default(), store.clone(), Arc::new(LogNotifier), tx.clone());
        let messenger = Messenger::new(engine, store.clone(), Arc::new(EventTabController::new(tx)));

        let (call_tx, call_rx) = mpsc::channel(16);
        tokio::spawn(messenger.serve(call_rx));
        Fixture {
            client: MessengerClient::new(call_tx, Duration::from_secs(1)),
            store,
            events,
        }
    }

    #[tokio::test]
    async fn pomodoro_commands_return_resulting_state() {
        let f = fixture();

        let started = f.client.start_pomodoro(Some(PomodoroSettings::new(50, 10, 20, 2))).await.unwrap();
        assert!(started.is_running);
        assert_eq!(started.settings.work_minutes, 50);
        assert_eq!(f.client.get_pomodoro_state().await.unwrap(), started);

        let paused = f.client.pause_pomodoro().await.unwrap();
        assert!(!paused.is_running);

        let reset = f.client.reset_pomodoro().await.unwrap();
        assert_eq!(reset.time_remaining, 50 * 60);
        assert_eq!(reset.session_count, 0);
    }

    #[tokio::test]
    async fn oversized_settings_leave_the_responder_usable() {
        let f = fixture();
        let envelope: Envelope = serde_json::from_value(serde_json::json!({
            "message": {
                "type": "START_POMODORO",
                "settings": {"workMinutes": 100_000_000, "breakMinutes": 5, "longBreakMinutes": 15, "sessionsBeforeLongBreak": 4}
            }
        }))
        .unwrap();
        let started = f.client.request(envelope).await.unwrap().timer_state().unwrap();
        assert_eq!(started.settings.work_minutes, 1440);

        f.client.pause_pomodoro().await.unwrap();
        let reset = f.client.reset_pomodoro().await.unwrap();
        assert_eq!(reset.time_remaining, 1440 * 60);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_block_checks_are_all_counted() {
        let f = fixture();
        let config = FocusModeConfig::new(true, vec!["yt".into()]);
        store::save_focus_mode(f.store.as_ref(), &config).await.unwrap();

        let checks: Vec<_> = (0..200)
            .map(|_| {
                let client = f.client.clone();
                tokio::spawn(async move { client.check_blocked("https://yt").await })
            })
            .collect();
        for check in checks {
            assert!(check.await.unwrap().unwrap().is_blocked);
        }

        let today = chrono::Local::now().date_naive();
        assert_eq!(store::blocked_today(f.store.as_ref(), today).await, 200);
    }

    #[tokio::test]
    async fn block_check_uses_the_stored_config() {
        let f = fixture();
        let config = FocusModeConfig::new(true, vec!["youtube.com".into()]);
        store::save_focus_mode(f.store.as_ref(), &config).await.unwrap();

        let blocked = f.client.check_blocked("https://www.youtube.com/watch?v=x").await.unwrap();
        assert!(blocked.is_blocked);
        assert_eq!(blocked.blocked_today, Some(1));

        let allowed = f.client.check_blocked("https://example.com").await.unwrap();
        assert_eq!(allowed, BlockCheck::allowed());
    }

    #[tokio::test]
    async fn block_check_fails_open() {
        let f = fixture();
        let config = FocusModeConfig::new(true, vec!["youtube.com".into()]);
        store::save_focus_mode(f.store.as_ref(), &config).await.unwrap();
        f.store.set_unavailable(true);

        let check = f.client.check_blocked("https://www.youtube.com/").await.unwrap();
        assert!(!check.is_blocked);
    }

    #[tokio::test]
    async fn close_current_tab_targets_the_sender() {
        let mut f = fixture();
        f.client.close_current_tab(12).await.unwrap();
        assert_eq!(f.events.recv().await.unwrap(), OutboundMessage::CloseTab { tab_id: 12 });

        let response = f.client.request(Envelope::new(Request::CloseCurrentTab)).await.unwrap();
        assert_eq!(response, Response::Ack { success: false });
    }
}
