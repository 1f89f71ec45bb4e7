//! Log-based notifier for headless hosts.

use proximity_monitor::Notifier;

/// Renders status changes and alerts as log lines.
///
/// Loud alerts are logged at `warn` so they stand out with the default
/// filter.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn show_status(&self, title: &str, message: &str) {
        tracing::info!(target: "proximity::status", title, message, "Status");
    }

    fn show_alert(&self, title: &str, message: &str, loud: bool) {
        if loud {
            tracing::warn!(target: "proximity::alert", title, message, loud, "ALERT");
        } else {
            tracing::info!(target: "proximity::alert", title, message, loud, "Alert");
        }
    }
}
