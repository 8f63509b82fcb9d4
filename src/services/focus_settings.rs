//! Settings-save flow
//!
//! The backend owns the focus mode settings. This module pulls them, pushes
//! edits, and mirrors `isEnabled` and `blockedWebsites` into the local store
//! where both blockers read them.

use std::sync::Arc;

use tracing::{info, warn};

use super::RemoteApi;
use crate::{
    error::ApiError,
    state::FocusModeSettings,
    store::{self, SettingsStore},
};

pub struct FocusSettingsSync {
    api: Arc<dyn RemoteApi>,
    store: Arc<dyn SettingsStore>,
}

impl FocusSettingsSync {
    pub fn new(api: Arc<dyn RemoteApi>, store: Arc<dyn SettingsStore>) -> Self {
        Self { api, store }
    }

    /// Fetch settings from the backend and mirror them locally.
    ///
    /// On failure the defaults are returned and the local mirror is left
    /// untouched.
    pub async fn pull(&self) -> FocusModeSettings {
        let settings = match self.api.focus_mode_settings().await {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Failed to load focus settings: {}", e);
                return FocusModeSettings::default();
            }
        };

        if let Err(e) = store::save_focus_mode(self.store.as_ref(), &settings.focus_mode()).await {
            warn!("Failed to mirror focus settings locally: {}", e);
        }
        info!(
            "Focus settings loaded: enabled={}, {} blocked sites",
            settings.is_enabled,
            settings.blocked_websites.len()
        );
        settings
    }

    /// Save settings to the backend, then mirror them locally
    pub async fn save(&self, settings: &FocusModeSettings) -> Result<FocusModeSettings, ApiError> {
        let saved = self.api.update_focus_mode_settings(settings).await?;
        store::save_focus_mode(self.store.as_ref(), &saved.focus_mode()).await?;
        info!(
            "Focus settings saved: enabled={}, {} blocked sites",
            saved.is_enabled,
            saved.blocked_websites.len()
        );
        Ok(saved)
    }
}
