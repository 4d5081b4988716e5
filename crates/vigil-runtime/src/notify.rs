//! Runtime-side notification boundary.
//!
//! Modules send notifications through the [`Notifier`] seam injected
//! via their initialization payload; the runtime decides the concrete
//! delivery channel. [`LogNotifier`] emits notifications into the
//! structured log stream and counts deliveries, which is also what
//! tests observe.

use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, info};
use vigil_module::{ModuleError, Notification, Notifier};

/// Notifier that writes notifications to the log stream.
#[derive(Debug, Default)]
pub struct LogNotifier {
    delivered: AtomicUsize,
}

impl LogNotifier {
    /// Number of notifications delivered so far.
    #[must_use]
    pub fn delivered(&self) -> usize {
        self.delivered.load(Ordering::SeqCst)
    }
}

impl Notifier for LogNotifier {
    fn notify(&self, note: Notification) -> Result<(), ModuleError> {
        info!(
            subject = %note.subject,
            sender = %note.sender,
            receivers = ?note.receivers,
            "notification dispatched"
        );
        debug!(body = %note.body, "notification body");
        self.delivered.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_deliveries() {
        let notifier = LogNotifier::default();
        assert_eq!(notifier.delivered(), 0);
        notifier
            .notify(Notification {
                subject: "disk almost full".into(),
                body: "93% used".into(),
                sender: "vigil@example.com".into(),
                receivers: vec!["ops@example.com".into()],
            })
            .unwrap();
        assert_eq!(notifier.delivered(), 1);
    }
}
