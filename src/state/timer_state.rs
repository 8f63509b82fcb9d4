//! Pomodoro timer state and interval arithmetic

use serde::{Deserialize, Serialize};

pub const DEFAULT_WORK_MINUTES: u32 = 25;
pub const DEFAULT_BREAK_MINUTES: u32 = 5;
pub const DEFAULT_LONG_BREAK_MINUTES: u32 = 15;
pub const DEFAULT_SESSIONS_BEFORE_LONG_BREAK: u32 = 4;
/// Upper bound for any interval length
pub const MAX_INTERVAL_MINUTES: u32 = 24 * 60;

/// Interval lengths supplied by the popup when starting the timer.
///
/// Accepts both the camelCase names and the legacy upper-case names the
/// extension popup sends (`WORK_MINUTES`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PomodoroSettings {
    #[serde(alias = "WORK_MINUTES")]
    pub work_minutes: u32,
    #[serde(alias = "BREAK_MINUTES")]
    pub break_minutes: u32,
    #[serde(alias = "LONG_BREAK_MINUTES")]
    pub long_break_minutes: u32,
    #[serde(alias = "SESSIONS_BEFORE_LONG_BREAK")]
    pub sessions_before_long_break: u32,
}

impl PomodoroSettings {
    pub fn new(
        work_minutes: u32,
        break_minutes: u32,
        long_break_minutes: u32,
        sessions_before_long_break: u32,
    ) -> Self {
        Self {
            work_minutes,
            break_minutes,
            long_break_minutes,
            sessions_before_long_break,
        }
    }

    /// Replace zero values with the defaults and cap interval lengths at
    /// [`MAX_INTERVAL_MINUTES`]
    pub fn normalized(self) -> Self {
        fn or_default(value: u32, default: u32) -> u32 {
            if value == 0 { default } else { value }
        }

        fn minutes(value: u32, default: u32) -> u32 {
            or_default(value, default).min(MAX_INTERVAL_MINUTES)
        }

        Self {
            work_minutes: minutes(self.work_minutes, DEFAULT_WORK_MINUTES),
            break_minutes: minutes(self.break_minutes, DEFAULT_BREAK_MINUTES),
            long_break_minutes: minutes(self.long_break_minutes, DEFAULT_LONG_BREAK_MINUTES),
            sessions_before_long_break: or_default(
                self.sessions_before_long_break,
                DEFAULT_SESSIONS_BEFORE_LONG_BREAK,
            ),
        }
    }
}

impl Default for PomodoroSettings {
    fn default() -> Self {
        Self::new(
            DEFAULT_WORK_MINUTES,
            DEFAULT_BREAK_MINUTES,
            DEFAULT_LONG_BREAK_MINUTES,
            DEFAULT_SESSIONS_BEFORE_LONG_BREAK,
        )
    }
}

/// Snapshot of the pomodoro state machine.
///
/// Owned by the timer engine; the store and any popup only hold copies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerState {
    pub is_running: bool,
    pub is_work_session: bool,
    pub session_count: u32,
    /// Seconds left in the current interval
    pub time_remaining: u32,
    pub settings: PomodoroSettings,
}

impl TimerState {
    /// Fresh, paused work interval for the given settings
    pub fn new(settings: PomodoroSettings) -> Self {
        let settings = settings.normalized();
        Self {
            is_running: false,
            is_work_session: true,
            session_count: 0,
            time_remaining: settings.work_minutes * 60,
            settings,
        }
    }

    /// Whether the current completed-session count lands on a long break
    pub fn is_long_break(&self) -> bool {
        let every = self.settings.sessions_before_long_break.max(1);
        self.session_count % every == 0
    }

    /// Length in minutes of the interval the state is currently in
    pub fn interval_length_minutes(&self) -> u32 {
        if self.is_work_session {
            self.settings.work_minutes
        } else if self.is_long_break() {
            self.settings.long_break_minutes
        } else {
            self.settings.break_minutes
        }
    }

    pub fn interval_length_seconds(&self) -> u32 {
        self.interval_length_minutes().saturating_mul(60)
    }

    /// Fraction of the current interval still remaining, 0.0 ..= 1.0
    pub fn progress(&self) -> f64 {
        let total = self.interval_length_seconds();
        if total == 0 {
            return 0.0;
        }
        f64::from(self.time_remaining) / f64::from(total)
    }

    pub fn label(&self) -> &'static str {
        if self.is_work_session { "Work Session" } else { "Break Time" }
    }

    /// Bring a loaded or re-configured state back inside its invariants
    pub fn normalized(mut self) -> Self {
        self.settings = self.settings.normalized();
        self.time_remaining = self.time_remaining.min(self.interval_length_seconds());
        self
    }
}

impl Default for TimerState {
    fn default() -> Self {
        Self::new(PomodoroSettings::default())
    }
}

/// Format seconds as `MM:SS`
pub fn format_time(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
