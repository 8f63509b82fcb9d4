//! The single authoritative pomodoro state machine.
//!
//! One engine lives in the background process for its whole lifetime.
//! Popups never decrement the countdown themselves; they send commands and
//! render the snapshots the engine returns or broadcasts.
//!
//! ```text
//! Paused --start--> Running(work) --0s--> Running(break) --0s--> Running(work) ...
//!    ^                   |                     |
//!    +------pause--------+---------------------+
//! ```
//!
//! Every mutation is persisted to the settings store and at most one tick
//! source is active at any time.

use std::{sync::Arc, time::Duration};
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

use crate::{
    messenger::OutboundMessage,
    services::{Notification, Notifier},
    state::{PomodoroSettings, TimerState},
    store::{self, SettingsStore},
    tasks::spawn_tick_source,
};

/// Granularity of the countdown
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

struct EngineInner {
    state: TimerState,
    tick_source: Option<JoinHandle<()>>,
}

impl EngineInner {
    fn cancel_tick_source(&mut self) {
        if let Some(handle) = self.tick_source.take() {
            handle.abort();
            debug!("Tick source cancelled");
        }
    }
}

pub struct TimerEngine {
    inner: Mutex<EngineInner>,
    store: Arc<dyn SettingsStore>,
    notifier: Arc<dyn Notifier>,
    events: broadcast::Sender<OutboundMessage>,
}

impl TimerEngine {
    pub fn new(
        initial: TimerState,
        store: Arc<dyn SettingsStore>,
        notifier: Arc<dyn Notifier>,
        events: broadcast::Sender<OutboundMessage>,
    ) -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(EngineInner {
                state: initial.normalized(),
                tick_source: None,
            }),
            store,
            notifier,
            events,
        })
    }

    /// Build the engine from the last persisted snapshot, or fresh defaults.
    ///
    /// A snapshot that was running when the process stopped resumes ticking.
    pub async fn restore(
        store: Arc<dyn SettingsStore>,
        notifier: Arc<dyn Notifier>,
        events: broadcast::Sender<OutboundMessage>,
    ) -> Arc<Self> {
        let initial = match store::load_timer_state(store.as_ref()).await {
            Some(state) => {
                info!(
                    "Restored timer state: running={}, work={}, sessions={}, remaining={}s",
                    state.is_running, state.is_work_session, state.session_count, state.time_remaining
                );
                state
            }
            None => {
                info!("No timer state to restore, starting with defaults");
                TimerState::default()
            }
        };

        let engine = Self::new(initial, store, notifier, events);
        if initial.is_running {
            let mut inner = engine.inner.lock().await;
            inner.tick_source = Some(spawn_tick_source(Arc::downgrade(&engine), TICK_PERIOD));
        }
        engine
    }

    /// Start or resume the countdown, optionally with new interval lengths.
    ///
    /// The countdown position, phase and session count are kept; only the
    /// settings are replaced. Any previous tick source is cancelled before a
    /// new one is installed.
    pub async fn start(self: &Arc<Self>, settings: Option<PomodoroSettings>) -> TimerState {
        let mut inner = self.inner.lock().await;
        let mut next = inner.state;
        next.is_running = true;
        if let Some(settings) = settings {
            next.settings = settings;
        }
        inner.state = next.normalized();

        inner.cancel_tick_source();
        inner.tick_source = Some(spawn_tick_source(Arc::downgrade(self), TICK_PERIOD));

        info!(
            "Pomodoro started: {} with {}s remaining",
            inner.state.label(),
            inner.state.time_remaining
        );
        let state = inner.state;
        self.persist(&state).await;
        state
    }

    pub async fn pause(&self) -> TimerState {
        let mut inner = self.inner.lock().await;
        inner.state.is_running = false;
        inner.cancel_tick_source();

        info!("Pomodoro paused with {}s remaining", inner.state.time_remaining);
        let state = inner.state;
        self.persist(&state).await;
        state
    }

    pub async fn reset(&self) -> TimerState {
        let mut inner = self.inner.lock().await;
        inner.state = TimerState::new(inner.state.settings);
        inner.cancel_tick_source();

        info!("Pomodoro reset");
        let state = inner.state;
        self.persist(&state).await;
        state
    }

    pub async fn get_state(&self) -> TimerState {
        self.inner.lock().await.state
    }

    /// Whether a tick source is currently installed
    pub async fn has_tick_source(&self) -> bool {
        self.inner
            .lock()
            .await
            .tick_source
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Advance the countdown by one second. Driven by the tick source; a
    /// no-op while paused.
    pub async fn tick(&self) -> TimerState {
        let mut inner = self.inner.lock().await;
        if !inner.state.is_running {
            return inner.state;
        }

        inner.state.time_remaining = inner.state.time_remaining.saturating_sub(1);
        if inner.state.time_remaining == 0 {
            let notification = complete_interval(&mut inner.state);
            self.notifier.notify(notification);
        } else {
            debug!("Tick: {}s remaining", inner.state.time_remaining);
        }

        // Store writes must follow mutation order; persist before unlocking.
        let state = inner.state;
        self.persist(&state).await;
        drop(inner);

        self.broadcast(state);
        state
    }

    async fn persist(&self, state: &TimerState) {
        if let Err(e) = store::save_timer_state(self.store.as_ref(), state).await {
            warn!("Failed to persist timer state: {}", e);
        }
    }

    fn broadcast(&self, state: TimerState) {
        // Popups come and go; an update with nobody listening is expected.
        if self.events.send(OutboundMessage::PomodoroUpdate { state }).is_err() {
            debug!("Pomodoro update had no listeners");
        }
    }
}

/// Move from a finished interval to the next one
fn complete_interval(state: &mut TimerState) -> Notification {
    if state.is_work_session {
        state.session_count += 1;
        state.is_work_session = false;
        let long_break = state.is_long_break();
        state.time_remaining = state.interval_length_seconds();

        info!(
            "Work session {} complete, starting {} break",
            state.session_count,
            if long_break { "long" } else { "short" }
        );
        let message = if long_break {
            format!(
                "Great work! Time for a {} minute break.",
                state.settings.long_break_minutes
            )
        } else {
            format!("Time for a {} minute break.", state.settings.break_minutes)
        };
        Notification::new("Work Session Complete!", message)
    } else {
        state.is_work_session = true;
        state.time_remaining = state.interval_length_seconds();

        info!("Break over, starting work session");
        Notification::new(
            "Break Time Over!",
            format!(
                "Time to get back to work! Starting {} minute work session.",
                state.settings.work_minutes
            ),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    use crate::store::MemoryStore;

    #[derive(Default)]
    struct RecordingNotifier {
        seen: StdMutex<Vec<Notification>>,
    }

    impl RecordingNotifier {
        fn titles(&self) -> Vec<String> {
            self.seen.lock().unwrap().iter().map(|n| n.title.clone()).collect()
        }

        fn last_message(&self) -> Option<String> {
            self.seen.lock().unwrap().last().map(|n| n.message.clone())
        }
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, notification: Notification) {
            self.seen.lock().unwrap().push(notification);
        }
    }

    struct Harness {
        engine: Arc<TimerEngine>,
        store: Arc<MemoryStore>,
        notifier: Arc<RecordingNotifier>,
        events: broadcast::Receiver<OutboundMessage>,
    }

    fn harness(initial: TimerState) -> Harness {
        let store = Arc::new(MemoryStore::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let (tx, events) = broadcast::channel(4096);
        let engine = TimerEngine::new(initial, store.clone(), notifier.clone(), tx);
        Harness {
            engine,
            store,
            notifier,
            events,
        }
    }

    async fn tick_n(engine: &TimerEngine, n: u32) -> TimerState {
        let mut state = engine.get_state().await;
        for _ in 0..n {
            state = engine.tick().await;
        }
        state
    }

    fn running(mut state: TimerState) -> TimerState {
        state.is_running = true;
        state
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_start_keeps_a_single_tick_source() {
        let h = harness(TimerState::default());
        h.engine.start(None).await;
        h.engine.start(Some(PomodoroSettings::new(30, 5, 15, 4))).await;
        assert!(h.engine.has_tick_source().await);

        tokio::time::sleep(Duration::from_millis(10_500)).await;
        let state = h.engine.get_state().await;
        assert_eq!(state.time_remaining, 1500 - 10);
        assert_eq!(state.settings.work_minutes, 30);
    }

    #[tokio::test(start_paused = true)]
    async fn pause_then_resume_preserves_countdown() {
        let h = harness(TimerState::default());
        h.engine.start(None).await;
        tokio::time::sleep(Duration::from_millis(5_500)).await;

        let paused = h.engine.pause().await;
        assert_eq!(paused.time_remaining, 1495);
        assert!(!paused.is_running);
        assert!(!h.engine.has_tick_source().await);

        tokio::time::sleep(Duration::from_secs(30)).await;
        let resumed = h.engine.start(None).await;
        assert_eq!(resumed.time_remaining, 1495);
        assert!(resumed.is_running);
    }

    #[tokio::test]
    async fn tick_is_a_no_op_while_paused() {
        let h = harness(TimerState::default());
        let state = h.engine.tick().await;
        assert_eq!(state, TimerState::default());
    }

    #[tokio::test]
    async fn work_completion_starts_short_break() {
        let h = harness(running(TimerState::default()));
        let state = tick_n(&h.engine, 1500).await;

        assert!(!state.is_work_session);
        assert_eq!(state.session_count, 1);
        assert_eq!(state.time_remaining, 300);
        assert_eq!(h.notifier.titles(), vec!["Work Session Complete!"]);
        assert_eq!(h.notifier.last_message().as_deref(), Some("Time for a 5 minute break."));
    }

    #[tokio::test]
    async fn fourth_work_completion_starts_long_break() {
        let mut initial = running(TimerState::default());
        initial.session_count = 3;
        initial.time_remaining = 1;
        let h = harness(initial);

        let state = h.engine.tick().await;
        assert_eq!(state.session_count, 4);
        assert!(state.is_long_break());
        assert_eq!(state.time_remaining, 900);
        assert_eq!(
            h.notifier.last_message().as_deref(),
            Some("Great work! Time for a 15 minute break.")
        );
    }

    #[tokio::test]
    async fn break_completion_returns_to_work() {
        let mut initial = running(TimerState::default());
        initial.is_work_session = false;
        initial.session_count = 1;
        initial.time_remaining = 2;
        let h = harness(initial);

        let state = tick_n(&h.engine, 2).await;
        assert!(state.is_work_session);
        assert_eq!(state.time_remaining, 1500);
        assert_eq!(state.session_count, 1);
        assert_eq!(h.notifier.titles(), vec!["Break Time Over!"]);
    }

    #[tokio::test]
    async fn reset_is_idempotent() {
        let mut initial = running(TimerState::default());
        initial.session_count = 2;
        initial.is_work_session = false;
        initial.time_remaining = 12;
        let h = harness(initial);

        let once = h.engine.reset().await;
        let twice = h.engine.reset().await;
        assert_eq!(once, twice);
        assert_eq!(
            twice,
            TimerState {
                is_running: false,
                is_work_session: true,
                session_count: 0,
                time_remaining: 1500,
                settings: PomodoroSettings::default(),
            }
        );
    }

    #[tokio::test]
    async fn oversized_start_settings_are_capped() {
        let h = harness(TimerState::default());
        let started = h
            .engine
            .start(Some(PomodoroSettings::new(100_000_000, 5, 15, 4)))
            .await;
        assert_eq!(started.settings.work_minutes, 1440);
        assert_eq!(started.time_remaining, 1500);
        h.engine.pause().await;

        let reset = h.engine.reset().await;
        assert_eq!(reset.time_remaining, 1440 * 60);
    }

    #[tokio::test]
    async fn every_mutation_is_persisted() {
        let h = harness(TimerState::default());
        h.engine.start(None).await;
        h.engine.tick().await;
        let persisted = store::load_timer_state(h.store.as_ref()).await.unwrap();
        assert_eq!(persisted.time_remaining, 1499);
        assert!(persisted.is_running);

        h.engine.pause().await;
        let persisted = store::load_timer_state(h.store.as_ref()).await.unwrap();
        assert!(!persisted.is_running);
    }

    #[tokio::test]
    async fn ticks_are_broadcast() {
        let mut h = harness(running(TimerState::default()));
        h.engine.tick().await;
        match h.events.recv().await.unwrap() {
            OutboundMessage::PomodoroUpdate { state } => assert_eq!(state.time_remaining, 1499),
            other => panic!("unexpected message {:?}", other),
        }
    }

    #[tokio::test]
    async fn broadcast_without_listeners_is_swallowed() {
        let h = harness(running(TimerState::default()));
        drop(h.events);
        let state = h.engine.tick().await;
        assert_eq!(state.time_remaining, 1499);
    }

    #[tokio::test]
    async fn store_failure_does_not_stop_the_timer() {
        let h = harness(running(TimerState::default()));
        h.store.set_unavailable(true);
        let state = h.engine.tick().await;
        assert_eq!(state.time_remaining, 1499);
    }

    #[tokio::test(start_paused = true)]
    async fn restore_resumes_a_running_snapshot() {
        let store = Arc::new(MemoryStore::new());
        let mut snapshot = running(TimerState::default());
        snapshot.time_remaining = 100;
        store::save_timer_state(store.as_ref(), &snapshot).await.unwrap();

        let (tx, _rx) = broadcast::channel(64);
        let engine = TimerEngine::restore(store, Arc::new(RecordingNotifier::default()), tx).await;
        assert!(engine.has_tick_source().await);

        tokio::time::sleep(Duration::from_millis(3_500)).await;
        assert_eq!(engine.get_state().await.time_remaining, 97);
    }

    #[tokio::test]
    async fn restore_without_snapshot_uses_defaults() {
        let store = Arc::new(MemoryStore::new());
        let (tx, _rx) = broadcast::channel(4);
        let engine = TimerEngine::restore(store, Arc::new(RecordingNotifier::default()), tx).await;
        assert_eq!(engine.get_state().await, TimerState::default());
        assert!(!engine.has_tick_source().await);
    }
}
