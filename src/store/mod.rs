//! Persistent settings store
//!
//! String-keyed, JSON-valued storage shared by every context of the
//! extension. It is the only durable shared resource: the timer engine
//! mirrors its state here, the settings-save flow mirrors the focus mode
//! config, and both blockers read it.

pub mod access;
pub mod file;
pub mod memory;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::broadcast;

use crate::error::StoreError;

pub use access::*;
pub use file::JsonFileStore;
pub use memory::MemoryStore;

/// Storage keys used by the daemon
pub mod keys {
    pub const ACCESS_TOKEN: &str = "accessToken";
    pub const FOCUS_MODE_ENABLED: &str = "focusModeEnabled";
    pub const BLOCKED_WEBSITES: &str = "blockedWebsites";
    pub const POMODORO_STATE: &str = "pomodoroState";
    pub const BLOCK_STATS: &str = "blockStats";
}

/// Notification that a write touched the listed keys
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreChange {
    pub keys: Vec<String>,
}

impl StoreChange {
    pub fn touches(&self, key: &str) -> bool {
        self.keys.iter().any(|k| k == key)
    }

    /// Whether the change affects what the blockers decide
    pub fn touches_focus_mode(&self) -> bool {
        self.touches(keys::FOCUS_MODE_ENABLED) || self.touches(keys::BLOCKED_WEBSITES)
    }
}

/// Key-value store with per-key atomic writes and change notifications
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Fetch the requested keys; missing keys are absent from the result
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>, StoreError>;

    /// Write every entry of `items`
    async fn set(&self, items: Map<String, Value>) -> Result<(), StoreError>;

    async fn remove(&self, keys: &[&str]) -> Result<(), StoreError>;

    /// Atomically replace `key` with `apply(current)` and return the new value.
    ///
    /// No other write to the store interleaves between the read and the write.
    async fn update(
        &self,
        key: &str,
        apply: &(dyn for<'v> Fn(Option<&'v Value>) -> Result<Value, StoreError> + Send + Sync),
    ) -> Result<Value, StoreError>;

    /// Subscribe to changes made after this call
    fn subscribe(&self) -> broadcast::Receiver<StoreChange>;
}

/// Send a change notification, tolerating the absence of subscribers
pub(crate) fn notify_change(tx: &broadcast::Sender<StoreChange>, keys: Vec<String>) {
    if keys.is_empty() {
        return;
    }
    if tx.send(StoreChange { keys }).is_err() {
        tracing::trace!("Store change had no subscribers");
    }
}
