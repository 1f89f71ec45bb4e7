//! Presentation sink for monitor output.

/// Renders status and alerts for the user.
///
/// Both calls are fire-and-forget: implementations must return promptly
/// and swallow their own failures.
pub trait Notifier: Send + Sync + 'static {
    /// Replace the persistent status line.
    fn show_status(&self, title: &str, message: &str);

    /// Raise a dismissable alert. `loud` asks for sound / vibration.
    fn show_alert(&self, title: &str, message: &str, loud: bool);
}
