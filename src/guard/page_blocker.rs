//! Page-load blocker
//!
//! Second line of defence behind the navigation guard, run once per loaded
//! page. It catches navigations the guard never sees, such as client-side
//! routing and same-document redirects.
//!
//! The protocol has two phases:
//!
//! 1. [`PageLoadBlocker::begin`] synchronously covers the page with an
//!    opaque placeholder so blocked content never flashes.
//! 2. [`PageLoadBlocker::confirm`] asks the background whether the URL is
//!    blocked and then either renders the interstitial or reveals the page.
//!
//! Afterwards the page reloads on any focus mode change in the store.

use std::{sync::Arc, time::Duration};

use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info, warn};

use super::display_host;
use crate::{messenger::BlockChecker, store::StoreChange};

/// Delay between counter increments on the interstitial
pub const COUNTER_STEP: Duration = Duration::from_millis(100);

/// DOM operations the blocker needs from its host page
pub trait PageSurface: Send + Sync {
    fn show_placeholder(&self);
    fn remove_placeholder(&self);
    fn show_interstitial(&self, interstitial: &BlockInterstitial);
    fn set_counter(&self, value: u32);
    fn history_back(&self);
    fn reload(&self);
}

/// Content of the full-screen "blocked" interstitial
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockInterstitial {
    pub url: String,
    pub host: String,
    /// Final value of the "sites blocked today" counter
    pub blocked_today: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageVerdict {
    Blocked,
    Revealed,
}

pub struct PageLoadBlocker<S: PageSurface> {
    url: String,
    surface: Arc<S>,
    checker: Arc<dyn BlockChecker>,
    changes: broadcast::Receiver<StoreChange>,
    interstitial: Option<BlockInterstitial>,
}

impl<S: PageSurface> PageLoadBlocker<S> {
    /// Phase one: hide the page immediately and subscribe to store changes
    pub fn begin(
        url: impl Into<String>,
        surface: Arc<S>,
        checker: Arc<dyn BlockChecker>,
        changes: broadcast::Receiver<StoreChange>,
    ) -> Self {
        surface.show_placeholder();
        Self {
            url: url.into(),
            surface,
            checker,
            changes,
            interstitial: None,
        }
    }

    pub fn interstitial(&self) -> Option<&BlockInterstitial> {
        self.interstitial.as_ref()
    }

    /// Phase two: ask the background and block or reveal.
    ///
    /// Safe to call more than once; the interstitial is rendered at most
    /// once. A failed or timed-out check reveals the page.
    pub async fn confirm(&mut self) -> PageVerdict {
        if self.interstitial.is_some() {
            return PageVerdict::Blocked;
        }

        let check = match self.checker.check_blocked(&self.url).await {
            Ok(check) => check,
            Err(e) => {
                warn!("Block check failed for {}, revealing page: {}", self.url, e);
                self.surface.remove_placeholder();
                return PageVerdict::Revealed;
            }
        };

        if !check.is_blocked {
            debug!("Page allowed: {}", self.url);
            self.surface.remove_placeholder();
            return PageVerdict::Revealed;
        }

        info!("Page blocked: {}", self.url);
        let interstitial = BlockInterstitial {
            url: self.url.clone(),
            host: display_host(&self.url),
            blocked_today: check.blocked_today.unwrap_or(1).max(1),
        };
        self.surface.show_interstitial(&interstitial);
        self.surface.remove_placeholder();
        self.interstitial = Some(interstitial);
        PageVerdict::Blocked
    }

    /// Count the interstitial counter up from 1 to its target
    pub async fn animate_counter(&self) {
        let Some(interstitial) = &self.interstitial else {
            return;
        };
        for value in 1..=interstitial.blocked_today {
            tokio::time::sleep(COUNTER_STEP).await;
            self.surface.set_counter(value);
        }
    }

    /// "Go back" action of the interstitial
    pub fn go_back(&self) {
        self.surface.history_back();
    }

    /// Wait for a focus mode change and reload the page.
    ///
    /// Returns without reloading once the store is gone.
    pub async fn reload_on_focus_change(&mut self) {
        loop {
            match self.changes.recv().await {
                Ok(change) if change.touches_focus_mode() => break,
                Ok(_) => continue,
                Err(RecvError::Lagged(missed)) => {
                    debug!("Missed {} store changes, reloading to re-evaluate", missed);
                    break;
                }
                Err(RecvError::Closed) => return,
            }
        }
        info!("Focus mode changed, reloading {}", self.url);
        self.surface.reload();
    }

    /// Whole page lifetime: confirm, animate if blocked, then reload on change
    pub async fn run(mut self) -> PageVerdict {
        let verdict = self.confirm().await;
        if verdict == PageVerdict::Blocked {
            self.animate_counter().await;
        }
        self.reload_on_focus_change().await;
        verdict
    }
}
