use intake_core::{Notification, Severity};
use intake_logging::{intake_info, intake_warn};

/// Surface that shows toasts to the user.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: &Notification);
}

/// Writes notifications to the log; used when no UI is attached.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: &Notification) {
        match notification.severity {
            Severity::Info => intake_info!(
                "notify: {} - {}",
                notification.title,
                notification.description
            ),
            Severity::Destructive => intake_warn!(
                "notify: {} - {}",
                notification.title,
                notification.description
            ),
        }
    }
}
