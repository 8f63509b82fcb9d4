//! Navigation guard
//!
//! Runs on every navigation start reported by the browser and redirects
//! blocked main-frame navigations to the block page before the destination
//! loads.

use std::sync::Arc;

use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::BlockPage;
use crate::{
    messenger::TabController,
    store::{self, SettingsStore},
};

/// URL prefixes that are never blocked
pub const INTERNAL_SCHEMES: [&str; 2] = ["chrome://", "chrome-extension://"];

/// Navigation-start event as reported by the browser
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationEvent {
    pub tab_id: i64,
    /// `0` for the top-level document
    pub frame_id: i64,
    pub url: String,
}

impl NavigationEvent {
    pub fn is_main_frame(&self) -> bool {
        self.frame_id == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum NavigationOutcome {
    /// Subframe or internal page; not evaluated
    Ignored,
    Allowed,
    #[serde(rename_all = "camelCase")]
    Redirected { block_page_url: String },
}

pub struct NavigationGuard {
    store: Arc<dyn SettingsStore>,
    tabs: Arc<dyn TabController>,
    block_page: BlockPage,
}

impl NavigationGuard {
    pub fn new(store: Arc<dyn SettingsStore>, tabs: Arc<dyn TabController>, block_page: BlockPage) -> Self {
        Self {
            store,
            tabs,
            block_page,
        }
    }

    pub fn block_page(&self) -> &BlockPage {
        &self.block_page
    }

    fn is_internal(&self, url: &str) -> bool {
        INTERNAL_SCHEMES.iter().any(|scheme| url.starts_with(scheme))
            || url.starts_with(self.block_page.page_url())
    }

    pub async fn on_before_navigate(&self, event: &NavigationEvent) -> NavigationOutcome {
        if !event.is_main_frame() || self.is_internal(&event.url) {
            return NavigationOutcome::Ignored;
        }

        let config = store::load_focus_mode(self.store.as_ref()).await;
        if !config.is_enabled || config.blocked_websites.is_empty() {
            return NavigationOutcome::Allowed;
        }

        let Some(site) = config.matching_site(&event.url) else {
            debug!("Navigation allowed: {}", event.url);
            return NavigationOutcome::Allowed;
        };

        info!("Blocking navigation to {} (matched {:?}) in tab {}", event.url, site, event.tab_id);
        let block_page_url = self.block_page.url_for(&event.url);
        self.tabs.update_tab(event.tab_id, &block_page_url);

        if let Err(e) = store::record_block(self.store.as_ref(), Local::now().date_naive()).await {
            warn!("Failed to record blocked navigation: {}", e);
        }

        NavigationOutcome::Redirected { block_page_url }
    }
}
