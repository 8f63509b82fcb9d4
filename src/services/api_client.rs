//! Remote API gateway
//!
//! Thin reqwest client for the backend endpoints the daemon depends on.
//! Attaches the stored bearer token and, on a 401, refreshes the token once
//! and retries the request.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};
use url::Url;

use super::Notification;
use crate::{
    error::ApiError,
    state::FocusModeSettings,
    store::{self, SettingsStore},
};

pub const LOGIN: &str = "/auth/login";
pub const REFRESH_TOKEN: &str = "/auth/refresh-token";
pub const FOCUS_MODE_SETTINGS: &str = "/focus-mode/settings";
pub const UNREAD_NOTIFICATIONS: &str = "/notifications/unread";

/// Endpoints that never carry a bearer token
const PUBLIC_ENDPOINTS: [&str; 2] = [LOGIN, REFRESH_TOKEN];

/// Unread notification as returned by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteNotification {
    pub title: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

impl RemoteNotification {
    pub fn into_notification(self) -> Notification {
        let message = self.message.or(self.content).unwrap_or_default();
        Notification::new(self.title, message)
    }
}

/// Backend calls consumed by the daemon
#[async_trait]
pub trait RemoteApi: Send + Sync {
    async fn focus_mode_settings(&self) -> Result<FocusModeSettings, ApiError>;

    async fn update_focus_mode_settings(
        &self,
        settings: &FocusModeSettings,
    ) -> Result<FocusModeSettings, ApiError>;

    async fn unread_notifications(&self) -> Result<Vec<RemoteNotification>, ApiError>;
}

/// Standard `{ data, message }` envelope of backend responses
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct TokenData {
    token: String,
}

pub struct ApiClient {
    http: Client,
    base_url: String,
    store: Arc<dyn SettingsStore>,
}

impl ApiClient {
    pub fn new(base_url: &str, store: Arc<dyn SettingsStore>) -> Result<Self, ApiError> {
        let parsed = Url::parse(base_url)?;
        Ok(Self {
            http: Client::new(),
            base_url: parsed.as_str().trim_end_matches('/').to_string(),
            store,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    async fn send(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&Value>,
    ) -> Result<reqwest::Response, ApiError> {
        let mut request = self.http.request(method.clone(), self.url(endpoint));

        if !PUBLIC_ENDPOINTS.iter().any(|ep| endpoint.contains(ep)) {
            match store::access_token(self.store.as_ref()).await {
                Ok(Some(token)) => request = request.bearer_auth(token),
                Ok(None) => {}
                Err(e) => warn!("Access token unreadable, sending unauthenticated: {}", e),
            }
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        debug!("{} {}", method, endpoint);
        Ok(request.send().await?)
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&Value>,
    ) -> Result<Option<T>, ApiError> {
        let response = self.send(method.clone(), endpoint, body).await?;

        if response.status() == StatusCode::UNAUTHORIZED && !endpoint.contains(REFRESH_TOKEN) {
            if !self.refresh_token().await {
                return Err(ApiError::Unauthorized);
            }
            let retried = self.send(method, endpoint, body).await?;
            if retried.status() == StatusCode::UNAUTHORIZED {
                return Err(ApiError::Unauthorized);
            }
            return Self::parse(retried).await;
        }

        Self::parse(response).await
    }

    async fn parse<T: DeserializeOwned>(response: reqwest::Response) -> Result<Option<T>, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let body: Value = response.json().await.unwrap_or(Value::Null);
            let message = body
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("Request failed")
                .to_string();
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let envelope: Envelope<T> = response.json().await?;
        Ok(envelope.data)
    }

    /// Exchange the refresh cookie for a new access token and store it
    async fn refresh_token(&self) -> bool {
        let result = async {
            let response = self.send(Method::POST, REFRESH_TOKEN, None).await?;
            let data: Option<TokenData> = Self::parse(response).await?;
            let token = data.ok_or(ApiError::Unauthorized)?.token;
            store::set_access_token(self.store.as_ref(), &token).await?;
            Ok::<_, ApiError>(())
        }
        .await;

        match result {
            Ok(()) => {
                info!("Access token refreshed");
                true
            }
            Err(e) => {
                warn!("Token refresh failed: {}", e);
                false
            }
        }
    }
}

#[async_trait]
impl RemoteApi for ApiClient {
    async fn focus_mode_settings(&self) -> Result<FocusModeSettings, ApiError> {
        let settings = self.request(Method::GET, FOCUS_MODE_SETTINGS, None).await?;
        Ok(settings.unwrap_or_default())
    }

    async fn update_focus_mode_settings(
        &self,
        settings: &FocusModeSettings,
    ) -> Result<FocusModeSettings, ApiError> {
        let body = serde_json::to_value(settings)?;
        let saved = self.request(Method::PUT, FOCUS_MODE_SETTINGS, Some(&body)).await?;
        Ok(saved.unwrap_or_else(|| settings.clone()))
    }

    async fn unread_notifications(&self) -> Result<Vec<RemoteNotification>, ApiError> {
        let notifications = self.request(Method::GET, UNREAD_NOTIFICATIONS, None).await?;
        Ok(notifications.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::{
        extract::State,
        http::{HeaderMap, StatusCode as AxumStatus},
        routing::{get, post},
        Json, Router,
    };
    use serde_json::json;
    use tokio::net::TcpListener;

    use crate::store::MemoryStore;

    #[derive(Default)]
    struct Backend {
        refreshes: AtomicUsize,
    }

    fn bearer(headers: &HeaderMap) -> Option<String> {
        headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }

    async fn settings(headers: HeaderMap) -> Result<Json<Value>, AxumStatus> {
        if bearer(&headers).as_deref() != Some("Bearer fresh") {
            return Err(AxumStatus::UNAUTHORIZED);
        }
        Ok(Json(json!({"data": {"isEnabled": true, "blockedWebsites": ["reddit.com"]}})))
    }

    async fn refresh(State(backend): State<Arc<Backend>>, headers: HeaderMap) -> Json<Value> {
        assert!(bearer(&headers).is_none(), "refresh must not carry a token");
        backend.refreshes.fetch_add(1, Ordering::SeqCst);
        Json(json!({"data": {"token": "fresh"}}))
    }

    async fn unread() -> (AxumStatus, Json<Value>) {
        (AxumStatus::INTERNAL_SERVER_ERROR, Json(json!({"message": "db down"})))
    }

    async fn spawn_backend() -> (String, Arc<Backend>) {
        let backend = Arc::new(Backend::default());
        let app = Router::new()
            .route(FOCUS_MODE_SETTINGS, get(settings))
            .route(REFRESH_TOKEN, post(refresh))
            .route(UNREAD_NOTIFICATIONS, get(unread))
            .with_state(backend.clone());
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{}", addr), backend)
    }

    #[tokio::test]
    async fn expired_token_is_refreshed_and_request_retried() {
        let (base, backend) = spawn_backend().await;
        let store = Arc::new(MemoryStore::new());
        store::set_access_token(store.as_ref(), "stale").await.unwrap();

        let client = ApiClient::new(&base, store.clone()).unwrap();
        let settings = client.focus_mode_settings().await.unwrap();

        assert!(settings.is_enabled);
        assert_eq!(settings.blocked_websites, vec!["reddit.com"]);
        assert_eq!(backend.refreshes.load(Ordering::SeqCst), 1);
        assert_eq!(
            store::access_token(store.as_ref()).await.unwrap().as_deref(),
            Some("fresh")
        );
    }

    #[tokio::test]
    async fn error_status_carries_backend_message() {
        let (base, _backend) = spawn_backend().await;
        let client = ApiClient::new(&base, Arc::new(MemoryStore::new())).unwrap();

        match client.unread_notifications().await {
            Err(ApiError::Status { status, message }) => {
                assert_eq!(status, 500);
                assert_eq!(message, "db down");
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        assert!(matches!(
            ApiClient::new("not a url", Arc::new(MemoryStore::new())),
            Err(ApiError::InvalidUrl(_))
        ));
    }

    #[test]
    fn notification_message_falls_back_to_content() {
        let remote = RemoteNotification {
            title: "t".into(),
            message: None,
            content: Some("c".into()),
        };
        assert_eq!(remote.into_notification(), Notification::new("t", "c"));
    }
}
