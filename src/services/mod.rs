//! External collaborators: remote API, settings sync and notifications

pub mod api_client;
pub mod focus_settings;
pub mod notifier;

pub use api_client::{ApiClient, RemoteApi, RemoteNotification};
pub use focus_settings::FocusSettingsSync;
pub use notifier::{EventNotifier, LogNotifier, Notification, Notifier};
