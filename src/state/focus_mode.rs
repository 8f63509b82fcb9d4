//! Focus mode configuration and the block match rule

use serde::{Deserialize, Serialize};

use super::PomodoroSettings;

/// Read-only snapshot of the focus mode settings mirrored in the local store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusModeConfig {
    pub is_enabled: bool,
    /// Substrings matched against URLs, in display order
    pub blocked_websites: Vec<String>,
}

impl FocusModeConfig {
    pub fn new(is_enabled: bool, blocked_websites: Vec<String>) -> Self {
        Self {
            is_enabled,
            blocked_websites,
        }
    }

    /// Disabled config used whenever the store cannot be read
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Whether `url` is blocked right now.
    ///
    /// Plain case-sensitive substring containment, no host parsing:
    /// `"youtube.com"` also blocks `https://notyoutube.comfake.org`.
    pub fn blocks(&self, url: &str) -> bool {
        self.matching_site(url).is_some()
    }

    /// First block-list entry contained in `url`, if blocking is active
    pub fn matching_site(&self, url: &str) -> Option<&str> {
        if !self.is_enabled {
            return None;
        }
        self.blocked_websites
            .iter()
            .find(|site| url.contains(site.as_str()))
            .map(String::as_str)
    }
}

/// Focus mode settings as stored by the remote backend
/// (`GET/PUT /focus-mode/settings`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusModeSettings {
    #[serde(default)]
    pub is_enabled: bool,
    #[serde(default)]
    pub blocked_websites: Vec<String>,
    #[serde(default = "default_work")]
    pub pomodoro_work_minutes: u32,
    #[serde(default = "default_break")]
    pub pomodoro_break_minutes: u32,
    #[serde(default = "default_long_break")]
    pub pomodoro_long_break_minutes: u32,
    #[serde(default = "default_sessions")]
    pub pomodoro_sessions_before_long_break: u32,
}

fn default_work() -> u32 {
    PomodoroSettings::default().work_minutes
}

fn default_break() -> u32 {
    PomodoroSettings::default().break_minutes
}

fn default_long_break() -> u32 {
    PomodoroSettings::default().long_break_minutes
}

fn default_sessions() -> u32 {
    PomodoroSettings::default().sessions_before_long_break
}

impl FocusModeSettings {
    /// The part of the settings the blockers consume
    pub fn focus_mode(&self) -> FocusModeConfig {
        FocusModeConfig::new(self.is_enabled, self.blocked_websites.clone())
    }

    pub fn pomodoro_settings(&self) -> PomodoroSettings {
        PomodoroSettings::new(
            self.pomodoro_work_minutes,
            self.pomodoro_break_minutes,
            self.pomodoro_long_break_minutes,
            self.pomodoro_sessions_before_long_break,
        )
        .normalized()
    }

    /// Append a website to the block list.
    ///
    /// Input is trimmed; empty input and duplicates are ignored. Returns
    /// whether the list changed.
    pub fn add_website(&mut self, website: &str) -> bool {
        let website = website.trim();
        if website.is_empty() || self.blocked_websites.iter().any(|s| s == website) {
            return false;
        }
        self.blocked_websites.push(website.to_string());
        true
    }

    /// Remove an exact entry from the block list
    pub fn remove_website(&mut self, website: &str) -> bool {
        let before = self.blocked_websites.len();
        self.blocked_websites.retain(|s| s != website);
        self.blocked_websites.len() != before
    }
}

impl Default for FocusModeSettings {
    fn default() -> Self {
        let pomodoro = PomodoroSettings::default();
        Self {
            is_enabled: false,
            blocked_websites: Vec::new(),
            pomodoro_work_minutes: pomodoro.work_minutes,
            pomodoro_break_minutes: pomodoro.break_minutes,
            pomodoro_long_break_minutes: pomodoro.long_break_minutes,
            pomodoro_sessions_before_long_break: pomodoro.sessions_before_long_break,
        }
    }
}
