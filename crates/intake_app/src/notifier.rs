use chrono::Local;
use intake_core::{Notification, Severity};
use intake_engine::{LogNotifier, Notifier};

/// Prints toasts to the terminal and mirrors them into the log.
#[derive(Default)]
pub struct TerminalNotifier {
    log: LogNotifier,
}

impl TerminalNotifier {
    pub fn new() -> Self {
        Self { log: LogNotifier }
    }
}

impl Notifier for TerminalNotifier {
    fn notify(&self, notification: &Notification) {
        self.log.notify(notification);
        let line = format_toast(notification, &Local::now().format("%H:%M:%S").to_string());
        match notification.severity {
            Severity::Info => println!("{line}"),
            Severity::Destructive => eprintln!("{line}"),
        }
    }
}

fn format_toast(notification: &Notification, clock: &str) -> String {
    let marker = match notification.severity {
        Severity::Info => "ok",
        Severity::Destructive => "!!",
    };
    format!(
        "[{clock}] {marker} {}: {}",
        notification.title, notification.description
    )
}
