//! In-memory settings store

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::{broadcast, RwLock};

use super::{notify_change, SettingsStore, StoreChange};
use crate::error::StoreError;

/// Volatile store, lost on exit
#[derive(Debug)]
pub struct MemoryStore {
    values: RwLock<Map<String, Value>>,
    change_tx: broadcast::Sender<StoreChange>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        let (change_tx, _) = broadcast::channel(64);
        Self {
            values: RwLock::new(Map::new()),
            change_tx,
            unavailable: AtomicBool::new(false),
        }
    }

    /// Make every subsequent call fail with `StoreError::Unavailable`
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable)
        } else {
            Ok(())
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SettingsStore for MemoryStore {
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>, StoreError> {
        self.check_available()?;
        let values = self.values.read().await;
        Ok(keys
            .iter()
            .filter_map(|key| values.get(*key).map(|v| (key.to_string(), v.clone())))
            .collect())
    }

    async fn set(&self, items: Map<String, Value>) -> Result<(), StoreError> {
        self.check_available()?;
        let changed: Vec<String> = items.keys().cloned().collect();
        self.values.write().await.extend(items);
        notify_change(&self.change_tx, changed);
        Ok(())
    }

    async fn remove(&self, keys: &[&str]) -> Result<(), StoreError> {
        self.check_available()?;
        let mut values = self.values.write().await;
        let removed: Vec<String> = keys
            .iter()
            .filter(|key| values.remove(**key).is_some())
            .map(|key| key.to_string())
            .collect();
        drop(values);
        notify_change(&self.change_tx, removed);
        Ok(())
    }

    async fn update(
        &self,
        key: &str,
        apply: &(dyn for<'v> Fn(Option<&'v Value>) -> Result<Value, StoreError> + Send + Sync),
    ) -> Result<Value, StoreError> {
        self.check_available()?;
        let mut values = self.values.write().await;
        let next = apply(values.get(key))?;
        values.insert(key.to_string(), next.clone());
        drop(values);
        notify_change(&self.change_tx, vec![key.to_string()]);
        Ok(next)
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.change_tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn items(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn get_returns_only_present_keys() {
        let store = MemoryStore::new();
        store.set(items(json!({"a": 1, "b": true}))).await.unwrap();

        let result = store.get(&["a", "missing"]).await.unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result["a"], json!(1));
    }

    #[tokio::test]
    async fn writes_notify_subscribers() {
        let store = MemoryStore::new();
        let mut rx = store.subscribe();

        store.set(items(json!({"focusModeEnabled": true}))).await.unwrap();
        let change = rx.recv().await.unwrap();
        assert!(change.touches_focus_mode());

        store.remove(&["focusModeEnabled", "never-set"]).await.unwrap();
        let change = rx.recv().await.unwrap();
        assert_eq!(change.keys, vec!["focusModeEnabled"]);
    }

    #[tokio::test]
    async fn unavailable_store_fails_every_call() {
        let store = MemoryStore::new();
        store.set_unavailable(true);
        assert!(matches!(store.get(&["a"]).await, Err(StoreError::Unavailable)));
        assert!(store.set(Map::new()).await.is_err());

        store.set_unavailable(false);
        assert!(store.get(&["a"]).await.is_ok());
    }
}
