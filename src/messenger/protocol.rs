//! Wire types exchanged between the background process and its callers

use serde::{Deserialize, Serialize};

use crate::state::{PomodoroSettings, TimerState};

/// Request sent by a popup, content script or block page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Request {
    GetPomodoroState,
    StartPomodoro {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        settings: Option<PomodoroSettings>,
    },
    PausePomodoro,
    ResetPomodoro,
    CheckBlockedWebsite { url: String },
    CloseCurrentTab,
}

impl Request {
    pub fn kind(&self) -> &'static str {
        match self {
            Request::GetPomodoroState => "GET_POMODORO_STATE",
            Request::StartPomodoro { .. } => "START_POMODORO",
            Request::PausePomodoro => "PAUSE_POMODORO",
            Request::ResetPomodoro => "RESET_POMODORO",
            Request::CheckBlockedWebsite { .. } => "CHECK_BLOCKED_WEBSITE",
            Request::CloseCurrentTab => "CLOSE_CURRENT_TAB",
        }
    }
}

/// Identity of the context that sent a request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageSender {
    #[serde(default)]
    pub tab_id: Option<i64>,
}

/// A request together with its sender
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub message: Request,
    #[serde(default)]
    pub sender: MessageSender,
}

impl Envelope {
    /// Request from a context that is not a tab (popup)
    pub fn new(message: Request) -> Self {
        Self {
            message,
            sender: MessageSender::default(),
        }
    }

    pub fn from_tab(message: Request, tab_id: i64) -> Self {
        Self {
            message,
            sender: MessageSender { tab_id: Some(tab_id) },
        }
    }
}

/// Result of a block check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockCheck {
    pub is_blocked: bool,
    /// Pages blocked today, present only when the page is blocked
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocked_today: Option<u32>,
}

impl BlockCheck {
    pub fn allowed() -> Self {
        Self {
            is_blocked: false,
            blocked_today: None,
        }
    }
}

/// Reply to a [`Request`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Response {
    Pomodoro { success: bool, state: TimerState },
    BlockCheck(BlockCheck),
    Ack { success: bool },
}

impl Response {
    pub fn pomodoro(state: TimerState) -> Self {
        Response::Pomodoro {
            success: true,
            state,
        }
    }

    pub fn timer_state(&self) -> Option<TimerState> {
        match self {
            Response::Pomodoro { state, .. } => Some(*state),
            _ => None,
        }
    }

    pub fn block_check(&self) -> Option<BlockCheck> {
        match self {
            Response::BlockCheck(check) => Some(*check),
            _ => None,
        }
    }
}

/// Fire-and-forget message pushed to every listening context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutboundMessage {
    PomodoroUpdate { state: TimerState },
    Notification { title: String, message: String },
    #[serde(rename_all = "camelCase")]
    UpdateTab { tab_id: i64, url: String },
    #[serde(rename_all = "camelCase")]
    CloseTab { tab_id: i64 },
    StorageChanged { keys: Vec<String> },
}
