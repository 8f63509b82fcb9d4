//! HTTP endpoint handlers

use std::sync::Arc;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        RawQuery, State,
    },
    http::StatusCode,
    response::{IntoResponse, Json},
};
use chrono::Local;
use futures::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, error, info, warn};

use crate::{
    error::{ApiError, MessengerError},
    guard::{BlockPageInfo, NavigationEvent, NavigationOutcome},
    messenger::{Envelope, OutboundMessage, Response},
    state::{format_time, AppState, FocusModeSettings, TimerState},
    store::{self, StoreChange},
};
use super::responses::{BlockPageResponse, HealthResponse, StatusResponse};

fn messenger_status(e: &MessengerError) -> StatusCode {
    match e {
        MessengerError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        MessengerError::Disconnected | MessengerError::UnexpectedResponse(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn api_status(e: &ApiError) -> StatusCode {
    match e {
        ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::BAD_GATEWAY,
    }
}

/// Handle POST /message - Forward a request envelope to the responder
pub async fn message_handler(
    State(state): State<Arc<AppState>>,
    Json(envelope): Json<Envelope>,
) -> Result<Json<Response>, StatusCode> {
    let kind = envelope.message.kind();
    match state.messenger.request(envelope).await {
        Ok(response) => {
            debug!("{} answered", kind);
            Ok(Json(response))
        }
        Err(e) => {
            error!("{} failed: {}", kind, e);
            Err(messenger_status(&e))
        }
    }
}

/// Handle POST /navigation - Evaluate a navigation-start event
pub async fn navigation_handler(
    State(state): State<Arc<AppState>>,
    Json(event): Json<NavigationEvent>,
) -> Json<NavigationOutcome> {
    Json(state.guard.on_before_navigate(&event).await)
}

/// Handle GET /block-page - Data rendered by the block page
pub async fn block_page_handler(
    State(state): State<Arc<AppState>>,
    RawQuery(query): RawQuery,
) -> Json<BlockPageResponse> {
    let info = BlockPageInfo::from_query(query.as_deref().unwrap_or_default());
    let blocked_today = store::blocked_today(state.store.as_ref(), Local::now().date_naive()).await;
    Json(BlockPageResponse {
        info,
        blocked_today,
    })
}

/// Handle GET /focus-mode - Pull settings from the backend
pub async fn get_focus_mode_handler(State(state): State<Arc<AppState>>) -> Json<FocusModeSettings> {
    Json(state.focus_settings.pull().await)
}

/// Handle PUT /focus-mode - Save settings to the backend and mirror them
pub async fn put_focus_mode_handler(
    State(state): State<Arc<AppState>>,
    Json(settings): Json<FocusModeSettings>,
) -> Result<Json<FocusModeSettings>, StatusCode> {
    match state.focus_settings.save(&settings).await {
        Ok(saved) => {
            info!("Focus settings saved");
            Ok(Json(saved))
        }
        Err(e) => {
            error!("Failed to save focus settings: {}", e);
            Err(api_status(&e))
        }
    }
}

/// Handle GET /events - WebSocket stream of outbound messages
pub async fn events_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| forward_events(socket, state))
}

async fn forward_events(socket: WebSocket, state: Arc<AppState>) {
    let (sender, receiver) = socket.split();
    let events = state.events.subscribe();
    let changes = state.store.subscribe();
    let current = state.engine.get_state().await;

    info!("Event listener connected");
    pump_events(sender, receiver, current, events, changes).await;
    info!("Event listener disconnected");
}

/// Forward outbound messages and store changes to one listener.
///
/// Starts with a `POMODORO_UPDATE` for `current` and returns once the
/// listener closes, errors or goes away, or either channel closes.
pub(crate) async fn pump_events<W, R>(
    mut sender: W,
    mut receiver: R,
    current: TimerState,
    mut events: broadcast::Receiver<OutboundMessage>,
    mut changes: broadcast::Receiver<StoreChange>,
) where
    W: Sink<Message> + Unpin,
    R: Stream<Item = Result<Message, axum::Error>> + Unpin,
{
    let mut pending = Some(OutboundMessage::PomodoroUpdate { state: current });

    loop {
        let message = match pending.take() {
            Some(message) => message,
            None => tokio::select! {
                event = events.recv() => match event {
                    Ok(message) => message,
                    Err(RecvError::Lagged(missed)) => {
                        warn!("Event listener lagged by {} messages", missed);
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                },
                change = changes.recv() => match change {
                    Ok(change) => OutboundMessage::StorageChanged { keys: change.keys },
                    Err(RecvError::Lagged(missed)) => {
                        warn!("Event listener missed {} store changes", missed);
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                },
                incoming = receiver.next() => match incoming {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => continue,
                },
            },
        };

        let text = match serde_json::to_string(&message) {
            Ok(text) => text,
            Err(e) => {
                error!("Failed to encode event: {}", e);
                continue;
            }
        };
        if sender.send(Message::Text(text)).await.is_err() {
            break;
        }
    }
}

/// Handle GET /status - Return current timer and focus mode status
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let timer = state.engine.get_state().await;
    let focus_mode = store::load_focus_mode(state.store.as_ref()).await;
    let blocked_today = store::blocked_today(state.store.as_ref(), Local::now().date_naive()).await;

    Json(StatusResponse {
        timer,
        timer_display: format_time(timer.time_remaining),
        timer_progress: timer.progress(),
        timer_label: timer.label().to_string(),
        ticking: state.engine.has_tick_source().await,
        focus_mode_enabled: focus_mode.is_enabled,
        blocked_websites: focus_mode.blocked_websites.len(),
        blocked_today,
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
    })
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
