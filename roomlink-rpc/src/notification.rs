//! Error notifications
//!
//! Failed calls are reported through a [`Notifier`] as a uniform
//! `{message, title, type}` object. Rendering is up to the notifier; the
//! default only logs.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Title used for failures that never reached the server
pub const NETWORK_ERROR_TITLE: &str = "Network Error";

/// Title prefix for non-success responses
pub const API_ERROR_TITLE: &str = "API Error";

/// Severity of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    /// A failed call
    Error,
}

/// A failure report delivered to the notifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// Error body, parsed as JSON when possible
    pub message: Value,
    /// Short headline, e.g. `"API Error - 500"`
    pub title: String,
    /// Always `error` for now
    #[serde(rename = "type")]
    pub kind: NotificationKind,
}

impl Notification {
    /// Create an error notification
    pub fn error(title: impl Into<String>, message: Value) -> Self {
        Self {
            message,
            title: title.into(),
            kind: NotificationKind::Error,
        }
    }

    /// Notification for a request that got no response
    pub fn network(message: impl Into<String>) -> Self {
        Self::error(NETWORK_ERROR_TITLE, Value::String(message.into()))
    }

    /// Notification for a non-success status
    pub fn api(status: u16, message: Value) -> Self {
        Self::error(format!("{} - {}", API_ERROR_TITLE, status), message)
    }

    /// Message as display text; string bodies are returned without quotes
    pub fn message_text(&self) -> String {
        match &self.message {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        }
    }
}

/// Receives failure notifications
pub trait Notifier: Send + Sync {
    /// Deliver one notification
    fn notify(&self, notification: &Notification);
}

impl<F> Notifier for F
where
    F: Fn(&Notification) + Send + Sync,
{
    fn notify(&self, notification: &Notification) {
        self(notification)
    }
}

/// Default notifier: logs at error level
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: &Notification) {
        tracing::error!(
            title = %notification.title,
            message = %notification.message_text(),
            "Request failed"
        );
    }
}
