//! Typed accessors over the raw key-value store
//!
//! Read failures are absorbed here: focus mode fails open (treated as
//! disabled) and timer state falls back to `None` so callers start fresh.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::warn;

use super::{keys, SettingsStore};
use crate::{
    error::StoreError,
    state::{FocusModeConfig, TimerState},
};

/// Read the focus mode config, propagating store failures
pub async fn read_focus_mode(store: &dyn SettingsStore) -> Result<FocusModeConfig, StoreError> {
    let values = store
        .get(&[keys::FOCUS_MODE_ENABLED, keys::BLOCKED_WEBSITES])
        .await?;

    let is_enabled = values
        .get(keys::FOCUS_MODE_ENABLED)
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let blocked_websites = values
        .get(keys::BLOCKED_WEBSITES)
        .and_then(Value::as_array)
        .map(|sites| {
            sites
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    Ok(FocusModeConfig::new(is_enabled, blocked_websites))
}

/// Read the focus mode config, failing open to a disabled config
pub async fn load_focus_mode(store: &dyn SettingsStore) -> FocusModeConfig {
    match read_focus_mode(store).await {
        Ok(config) => config,
        Err(e) => {
            warn!("Focus mode config unreadable, blocking disabled: {}", e);
            FocusModeConfig::disabled()
        }
    }
}

/// Mirror a focus mode config into the store
pub async fn save_focus_mode(
    store: &dyn SettingsStore,
    config: &FocusModeConfig,
) -> Result<(), StoreError> {
    let mut items = Map::new();
    items.insert(keys::FOCUS_MODE_ENABLED.to_string(), json!(config.is_enabled));
    items.insert(keys::BLOCKED_WEBSITES.to_string(), json!(config.blocked_websites));
    store.set(items).await
}

/// Last persisted timer snapshot; `None` when absent, corrupt or unreadable
pub async fn load_timer_state(store: &dyn SettingsStore) -> Option<TimerState> {
    let values = match store.get(&[keys::POMODORO_STATE]).await {
        Ok(values) => values,
        Err(e) => {
            warn!("Timer state unreadable, starting fresh: {}", e);
            return None;
        }
    };

    let raw = values.get(keys::POMODORO_STATE)?;
    match serde_json::from_value::<TimerState>(raw.clone()) {
        Ok(state) => Some(state.normalized()),
        Err(e) => {
            warn!("Discarding corrupt timer state: {}", e);
            None
        }
    }
}

pub async fn save_timer_state(store: &dyn SettingsStore, state: &TimerState) -> Result<(), StoreError> {
    let mut items = Map::new();
    items.insert(keys::POMODORO_STATE.to_string(), serde_json::to_value(state)?);
    store.set(items).await
}

pub async fn access_token(store: &dyn SettingsStore) -> Result<Option<String>, StoreError> {
    let values = store.get(&[keys::ACCESS_TOKEN]).await?;
    Ok(values
        .get(keys::ACCESS_TOKEN)
        .and_then(Value::as_str)
        .map(str::to_string))
}

pub async fn set_access_token(store: &dyn SettingsStore, token: &str) -> Result<(), StoreError> {
    let mut items = Map::new();
    items.insert(keys::ACCESS_TOKEN.to_string(), json!(token));
    store.set(items).await
}

/// Per-day tally of blocked pages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockStats {
    pub date: NaiveDate,
    pub count: u32,
}

async fn read_block_stats(store: &dyn SettingsStore) -> Result<Option<BlockStats>, StoreError> {
    let values = store.get(&[keys::BLOCK_STATS]).await?;
    Ok(values
        .get(keys::BLOCK_STATS)
        .and_then(|raw| serde_json::from_value(raw.clone()).ok()))
}

/// Pages blocked on `today`; zero when nothing was recorded or on error
pub async fn blocked_today(store: &dyn SettingsStore, today: NaiveDate) -> u32 {
    match read_block_stats(store).await {
        Ok(Some(stats)) if stats.date == today => stats.count,
        Ok(_) => 0,
        Err(e) => {
            warn!("Block stats unreadable: {}", e);
            0
        }
    }
}

/// Count one more blocked page for `today`, returning the new total.
///
/// The increment is a single store update, so concurrent blocks are all
/// counted.
pub async fn record_block(store: &dyn SettingsStore, today: NaiveDate) -> Result<u32, StoreError> {
    let updated = store
        .update(keys::BLOCK_STATS, &|current: Option<&Value>| -> Result<Value, StoreError> {
            let count = current
                .and_then(|raw| serde_json::from_value::<BlockStats>(raw.clone()).ok())
                .filter(|stats| stats.date == today)
                .map_or(1, |stats| stats.count + 1);
            Ok(serde_json::to_value(BlockStats { date: today, count })?)
        })
        .await?;
    let stats: BlockStats = serde_json::from_value(updated)?;
    Ok(stats.count)
}
