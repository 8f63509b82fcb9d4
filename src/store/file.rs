//! JSON file backed settings store

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use super::{notify_change, SettingsStore, StoreChange};
use crate::error::StoreError;

/// Store persisted as a single JSON object on disk.
///
/// The whole object is rewritten through a temporary file and a rename on
/// every write, so a reader never observes a half-written file.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    values: Mutex<Map<String, Value>>,
    change_tx: broadcast::Sender<StoreChange>,
}

impl JsonFileStore {
    /// Open the store at `path`.
    ///
    /// A missing file starts empty. An unreadable or corrupt file is logged
    /// and also starts empty rather than failing startup.
    pub async fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = match load(&path).await {
            Ok(values) => {
                info!("Loaded settings store from {} ({} keys)", path.display(), values.len());
                values
            }
            Err(StoreError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No settings store at {}, starting empty", path.display());
                Map::new()
            }
            Err(e) => {
                warn!("Ignoring unreadable settings store {}: {}", path.display(), e);
                Map::new()
            }
        };

        let (change_tx, _) = broadcast::channel(64);
        Self {
            path,
            values: Mutex::new(values),
            change_tx,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, values: &Map<String, Value>) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(values)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        debug!("Persisted settings store to {}", self.path.display());
        Ok(())
    }
}

async fn load(path: &Path) -> Result<Map<String, Value>, StoreError> {
    let bytes = tokio::fs::read(path).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[async_trait]
impl SettingsStore for JsonFileStore {
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>, StoreError> {
        let values = self.values.lock().await;
        Ok(keys
            .iter()
            .filter_map(|key| values.get(*key).map(|v| (key.to_string(), v.clone())))
            .collect())
    }

    async fn set(&self, items: Map<String, Value>) -> Result<(), StoreError> {
        let changed: Vec<String> = items.keys().cloned().collect();
        let mut values = self.values.lock().await;
        let mut next = values.clone();
        next.extend(items);
        self.persist(&next).await?;
        *values = next;
        drop(values);

        notify_change(&self.change_tx, changed);
        Ok(())
    }

    async fn remove(&self, keys: &[&str]) -> Result<(), StoreError> {
        let mut values = self.values.lock().await;
        let mut next = values.clone();
        let removed: Vec<String> = keys
            .iter()
            .filter(|key| next.remove(**key).is_some())
            .map(|key| key.to_string())
            .collect();
        if removed.is_empty() {
            return Ok(());
        }
        self.persist(&next).await?;
        *values = next;
        drop(values);

        notify_change(&self.change_tx, removed);
        Ok(())
    }

    async fn update(
        &self,
        key: &str,
        apply: &(dyn for<'v> Fn(Option<&'v Value>) -> Result<Value, StoreError> + Send + Sync),
    ) -> Result<Value, StoreError> {
        let mut values = self.values.lock().await;
        let updated = apply(values.get(key))?;
        let mut next = values.clone();
        next.insert(key.to_string(), updated.clone());
        self.persist(&next).await?;
        *values = next;
        drop(values);

        notify_change(&self.change_tx, vec![key.to_string()]);
        Ok(updated)
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.change_tx.subscribe()
    }
}
