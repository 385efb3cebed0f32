use std::sync::{Mutex, PoisonError};
use tracing::warn;

/// Sink for user-facing error messages
///
/// Delivery is fire-and-forget: implementations must not block and cannot fail.
pub trait Notifier: Send + Sync {
    fn notify_error(&self, message: &str);
}

/// Emits every notification as a `warn` event
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify_error(&self, message: &str) {
        warn!(notification = %message, "Cart notification");
    }
}

/// Keeps notifications in memory until a caller drains them
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything notified so far
    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Drain the recorded notifications
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.messages.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl Notifier for RecordingNotifier {
    fn notify_error(&self, message: &str) {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.to_string());
    }
}
