//! User notification seam.

use std::fmt;
use std::sync::Arc;

/// Callback run when the user picks a notification's action.
pub type ActionCallback = Arc<dyn Fn() + Send + Sync>;

/// Recovery action offered with a notification.
#[derive(Clone)]
pub struct NotificationAction {
    pub label: String,
    pub callback: ActionCallback,
}

impl NotificationAction {
    pub fn new(label: impl Into<String>, callback: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            label: label.into(),
            callback: Arc::new(callback),
        }
    }

    pub fn invoke(&self) {
        (self.callback)();
    }
}

impl fmt::Debug for NotificationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationAction")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

/// A user-facing alert.
#[derive(Debug, Clone)]
pub struct Notification {
    /// Stays visible until retracted.
    pub persistent: bool,
    /// Human readable text; also the key used to retract it.
    pub message: String,
    pub action: Option<NotificationAction>,
}

/// Host-side notification delivery.
pub trait Notifier: Send + Sync {
    fn raise(&self, notification: Notification);

    /// Removes a previously raised notification by its message.
    fn retract(&self, message: &str);
}

/// Notifier that only writes to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn raise(&self, notification: Notification) {
        tracing::warn!(
            persistent = notification.persistent,
            action = notification.action.as_ref().map(|a| a.label.as_str()),
            "{}",
            notification.message
        );
    }

    fn retract(&self, message: &str) {
        tracing::debug!("notification retracted: {message}");
    }
}
