//! Main application state management

use std::{sync::Arc, time::Instant};
use tokio::sync::broadcast;
use tracing::info;

use crate::{
    config::Config,
    engine::TimerEngine,
    guard::{BlockPage, NavigationGuard},
    messenger::{self, EventTabController, Messenger, MessengerClient, OutboundMessage},
    services::{EventNotifier, FocusSettingsSync, Notifier, RemoteApi},
    store::SettingsStore,
};

/// Capacity of the outbound event channel
const EVENT_CHANNEL_CAPACITY: usize = 100;

/// Everything the background process owns, shared by the HTTP handlers
pub struct AppState {
    pub store: Arc<dyn SettingsStore>,
    pub engine: Arc<TimerEngine>,
    pub guard: NavigationGuard,
    /// Client side of the request/response channel to the responder
    pub messenger: MessengerClient,
    pub focus_settings: FocusSettingsSync,
    pub notifier: Arc<dyn Notifier>,
    /// Outbound broadcast to every connected context
    pub events: broadcast::Sender<OutboundMessage>,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
}

impl AppState {
    /// Wire the components together and start the messenger responder
    pub async fn new(
        config: &Config,
        store: Arc<dyn SettingsStore>,
        api: Arc<dyn RemoteApi>,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let notifier: Arc<dyn Notifier> = Arc::new(EventNotifier::new(events.clone()));

        let engine = TimerEngine::restore(store.clone(), notifier.clone(), events.clone()).await;
        let tabs = Arc::new(EventTabController::new(events.clone()));

        let (client, calls) = messenger::channel(config.request_timeout());
        let responder = Messenger::new(engine.clone(), store.clone(), tabs.clone());
        tokio::spawn(responder.serve(calls));

        let guard = NavigationGuard::new(
            store.clone(),
            tabs,
            BlockPage::new(&config.extension_base_url),
        );
        let focus_settings = FocusSettingsSync::new(api, store.clone());

        info!("Application state initialised");

        Arc::new(Self {
            store,
            engine,
            guard,
            messenger: client,
            focus_settings,
            notifier,
            events,
            start_time: Instant::now(),
            port: config.port,
            host: config.host.clone(),
        })
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }
}
