//! User-facing notifications.
//!
//! The pipeline reports outcomes through this single-method sink; hosts can
//! route it to toasts, a status item, or wherever status text belongs.

use tracing::info;

/// Sink for user-visible status and error text.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, message: &str);
}

/// Default sink that surfaces notices through the log output.
pub struct LogNotifier;

impl NotificationSink for LogNotifier {
    fn notify(&self, message: &str) {
        info!("Notice: {}", message);
    }
}
