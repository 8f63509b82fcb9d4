//! Unread-notification poll background task

use std::{sync::Arc, time::Duration};
use tokio::time::{interval_at, Instant};
use tracing::{debug, info, warn};

use crate::{
    error::ApiError,
    services::{Notifier, RemoteApi},
};

pub const NOTIFICATION_POLL_PERIOD: Duration = Duration::from_secs(5 * 60);

/// Fetch unread notifications once and raise each of them.
///
/// Returns how many were raised.
pub async fn check_notifications(
    api: &dyn RemoteApi,
    notifier: &dyn Notifier,
) -> Result<usize, ApiError> {
    let notifications = api.unread_notifications().await?;
    let count = notifications.len();
    for notification in notifications {
        notifier.notify(notification.into_notification());
    }
    Ok(count)
}

/// Background task that polls the backend for unread notifications.
///
/// Failures are logged and retried on the next period.
pub async fn notification_poll_task(
    api: Arc<dyn RemoteApi>,
    notifier: Arc<dyn Notifier>,
    period: Duration,
) {
    info!("Starting notification poll task every {:?}", period);

    let mut interval = interval_at(Instant::now() + period, period);

    loop {
        interval.tick().await;

        match check_notifications(api.as_ref(), notifier.as_ref()).await {
            Ok(0) => debug!("No unread notifications"),
            Ok(count) => info!("Raised {} notifications", count),
            Err(e) => warn!("Failed to check notifications: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    };

    use async_trait::async_trait;

    use crate::{
        services::{Notification, RemoteNotification},
        state::FocusModeSettings,
    };

    struct FakeApi {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl RemoteApi for FakeApi {
        async fn focus_mode_settings(&self) -> Result<FocusModeSettings, ApiError> {
            Ok(FocusModeSettings::default())
        }

        async fn update_focus_mode_settings(
            &self,
            settings: &FocusModeSettings,
        ) -> Result<FocusModeSettings, ApiError> {
            Ok(settings.clone())
        }

        async fn unread_notifications(&self) -> Result<Vec<RemoteNotification>, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ApiError::Unauthorized);
            }
            Ok(vec![
                RemoteNotification {
                    title: "Task due".into(),
                    message: Some("Report is due".into()),
                    content: None,
                },
                RemoteNotification {
                    title: "Reminder".into(),
                    message: None,
                    content: Some("Stand-up in 5".into()),
                },
            ])
        }
    }

    #[derive(Default)]
    struct Collect(Mutex<Vec<Notification>>);

    impl Notifier for Collect {
        fn notify(&self, notification: Notification) {
            self.0.lock().unwrap().push(notification);
        }
    }

    #[tokio::test]
    async fn raises_each_unread_notification() {
        let api = FakeApi { calls: AtomicUsize::new(0), fail: false };
        let notifier = Collect::default();

        assert_eq!(check_notifications(&api, &notifier).await.unwrap(), 2);
        let seen = notifier.0.lock().unwrap();
        assert_eq!(seen[0], Notification::new("Task due", "Report is due"));
        assert_eq!(seen[1], Notification::new("Reminder", "Stand-up in 5"));
    }

    #[tokio::test(start_paused = true)]
    async fn poll_survives_failures() {
        let api = Arc::new(FakeApi { calls: AtomicUsize::new(0), fail: true });
        let notifier = Arc::new(Collect::default());
        let task = tokio::spawn(notification_poll_task(
            api.clone(),
            notifier.clone(),
            Duration::from_secs(300),
        ));

        tokio::time::sleep(Duration::from_secs(299)).await;
        assert_eq!(api.calls.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(302)).await;
        assert_eq!(api.calls.load(Ordering::SeqCst), 2);
        assert!(notifier.0.lock().unwrap().is_empty());
        task.abort();
    }
}
