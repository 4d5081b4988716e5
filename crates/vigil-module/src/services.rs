//! Shared services handed to modules at initialization.
//!
//! The original design exposed these as process-wide singletons; here
//! they are explicit handles owned by the composition root and passed
//! into every module through the initialization payload. Modules hold
//! the `Arc`s they need and never reach for global state.

use crate::ModuleError;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// A notification to deliver (subject line plus body).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Short subject line.
    pub subject: String,

    /// Free-form body.
    pub body: String,

    /// Sender address.
    pub sender: String,

    /// Receiver addresses.
    pub receivers: Vec<String>,
}

/// Outbound notification boundary.
///
/// The concrete transport (SMTP, webhook, ...) lives behind this trait;
/// the runtime ships a log-backed implementation.
pub trait Notifier: Send + Sync {
    /// Delivers one notification.
    fn notify(&self, note: Notification) -> Result<(), ModuleError>;
}

/// Boxed future accepted by the shared worker pool.
pub type WorkerFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Handle onto the shared bounded worker pool.
///
/// Modules submit short subtasks (I/O, probes, notification sends) here
/// so their dedicated lane stays free to continue the main loop. Tasks
/// must not depend on ordering relative to each other.
pub trait WorkerSpawner: Send + Sync {
    /// Submits a task to the shared pool. Fire-and-forget; use a
    /// channel to collect results.
    fn spawn_task(&self, label: &str, fut: WorkerFuture);
}

/// Bundle of shared service handles passed to `initialize`.
#[derive(Clone)]
pub struct SharedServices {
    /// Notification sender.
    pub notifier: Arc<dyn Notifier>,

    /// Shared worker pool.
    pub worker: Arc<dyn WorkerSpawner>,
}

impl std::fmt::Debug for SharedServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedServices").finish_non_exhaustive()
    }
}
