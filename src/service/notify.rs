//! Notifications are how the messaging core tells a user what happened to
//! the things they sent. The core doesn't know or care how they get shown.

use tracing::{info, warn};

/// Somewhere to send user-facing feedback.
pub trait Notifier: Send + Sync {
    fn notify_success(&self, text: &str);

    /// A failure. `blocking` failures are ones a UI should make the user
    /// acknowledge.
    fn notify_failure(&self, text: &str, blocking: bool);
}

/// Sends notifications to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify_success(&self, text: &str) {
        info!(target: "attest_core::notify", "{}", text);
    }

    fn notify_failure(&self, text: &str, blocking: bool) {
        warn!(target: "attest_core::notify", blocking, "{}", text);
    }
}
