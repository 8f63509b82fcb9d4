//! Caller side of the request/response channel

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tracing::warn;

use super::{BlockCheck, Envelope, Request, Response};
use crate::{error::MessengerError, state::{PomodoroSettings, TimerState}};

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// A request waiting for the responder, with the channel its reply goes to
#[derive(Debug)]
pub struct PendingCall {
    pub envelope: Envelope,
    pub reply: oneshot::Sender<Response>,
}

/// Handle for sending requests to the background responder.
///
/// Every call is bounded by a response timeout so an unresponsive background
/// never hangs the caller.
#[derive(Debug, Clone)]
pub struct MessengerClient {
    tx: mpsc::Sender<PendingCall>,
    timeout: Duration,
}

impl MessengerClient {
    pub fn new(tx: mpsc::Sender<PendingCall>, timeout: Duration) -> Self {
        Self { tx, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Queue `envelope` and wait for its response.
    ///
    /// The timeout covers the whole round trip, including waiting for room
    /// in a full queue.
    pub async fn request(&self, envelope: Envelope) -> Result<Response, MessengerError> {
        let kind = envelope.message.kind();
        let round_trip = async {
            let (reply, reply_rx) = oneshot::channel();
            self.tx
                .send(PendingCall { envelope, reply })
                .await
                .map_err(|_| MessengerError::Disconnected)?;
            reply_rx.await.map_err(|_| MessengerError::Disconnected)
        };

        match tokio::time::timeout(self.timeout, round_trip).await {
            Ok(result) => result,
            Err(_) => {
                warn!("{} got no response within {:?}", kind, self.timeout);
                Err(MessengerError::Timeout(self.timeout))
            }
        }
    }

    async fn pomodoro(&self, message: Request) -> Result<TimerState, MessengerError> {
        let kind = message.kind();
        let response = self.request(Envelope::new(message)).await?;
        response
            .timer_state()
            .ok_or(MessengerError::UnexpectedResponse(kind))
    }

    pub async fn get_pomodoro_state(&self) -> Result<TimerState, MessengerError> {
        self.pomodoro(Request::GetPomodoroState).await
    }

    pub async fn start_pomodoro(
        &self,
        settings: Option<PomodoroSettings>,
    ) -> Result<TimerState, MessengerError> {
        self.pomodoro(Request::StartPomodoro { settings }).await
    }

    pub async fn pause_pomodoro(&self) -> Result<TimerState, MessengerError> {
        self.pomodoro(Request::PausePomodoro).await
    }

    pub async fn reset_pomodoro(&self) -> Result<TimerState, MessengerError> {
        self.pomodoro(Request::ResetPomodoro).await
    }

    pub async fn close_current_tab(&self, tab_id: i64) -> Result<(), MessengerError> {
        self.request(Envelope::from_tab(Request::CloseCurrentTab, tab_id))
            .await
            .map(|_| ())
    }
}

/// Anything that can answer "is this exact URL blocked right now?"
#[async_trait]
pub trait BlockChecker: Send + Sync {
    async fn check_blocked(&self, url: &str) -> Result<BlockCheck, MessengerError>;
}

#[async_trait]
impl BlockChecker for MessengerClient {
    async fn check_blocked(&self, url: &str) -> Result<BlockCheck, MessengerError> {
        let response = self
            .request(Envelope::new(Request::CheckBlockedWebsite { url: url.to_string() }))
            .await?;
        Ok(response.block_check().unwrap_or_else(BlockCheck::allowed))
    }
}
