//! Cooperative stop / terminate signalling for module main loops.
//!
//! A [`LifecycleGate`] replaces polled boolean flags with watch
//! channels: the main loop selects between its next unit of work and
//! [`LifecycleGate::cancelled`], so a stop request is observed promptly
//! even while the loop is sleeping between work cycles.
//!
//! # Usage
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         kind = self.gate.cancelled() => {
//!             return Ok(match kind {
//!                 StopKind::Stop => RunExit::Stopped,
//!                 StopKind::Terminate => RunExit::Finished,
//!             });
//!         }
//!         _ = tokio::time::sleep(interval) => {
//!             // next work cycle
//!         }
//!     }
//! }
//! ```
//!
//! The stop/terminate distinction is preserved: a cooperative stop
//! leaves the module restartable without reconfiguration, while a
//! terminate request is a permanent exit for the current run.

use tokio::sync::watch;

/// Which cancellation signal fired first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopKind {
    /// Cooperative suspension; the module becomes `Stopped`.
    Stop,

    /// Permanent exit request; the module becomes `Terminated`.
    Terminate,
}

/// Stop/terminate signal pair owned by a module.
///
/// Cheap to clone; all clones observe the same signals. `stop()` and
/// `terminate()` on the module delegate to [`request_stop`] and
/// [`request_terminate`]; both are idempotent.
///
/// [`request_stop`]: LifecycleGate::request_stop
/// [`request_terminate`]: LifecycleGate::request_terminate
#[derive(Debug, Clone)]
pub struct LifecycleGate {
    stop_tx: watch::Sender<bool>,
    term_tx: watch::Sender<bool>,
}

impl LifecycleGate {
    /// Creates a gate with both signals clear.
    #[must_use]
    pub fn new() -> Self {
        let (stop_tx, _) = watch::channel(false);
        let (term_tx, _) = watch::channel(false);
        Self { stop_tx, term_tx }
    }

    /// Requests cooperative suspension. Does not block.
    pub fn request_stop(&self) {
        let _ = self.stop_tx.send(true);
    }

    /// Requests permanent exit of the current run. Idempotent.
    pub fn request_terminate(&self) {
        let _ = self.term_tx.send(true);
    }

    /// Returns `true` if a stop has been requested and not rearmed.
    #[must_use]
    pub fn stop_requested(&self) -> bool {
        *self.stop_tx.borrow()
    }

    /// Returns `true` if a terminate has been requested and not rearmed.
    #[must_use]
    pub fn terminate_requested(&self) -> bool {
        *self.term_tx.borrow()
    }

    /// Clears both signals so a stopped or terminated module can run
    /// again after reconfiguration.
    ///
    /// Called from `initialize`; a restart without reconfiguration
    /// keeps whatever signals are still latched.
    pub fn rearm(&self) {
        let _ = self.stop_tx.send(false);
        let _ = self.term_tx.send(false);
    }

    /// Resolves when either signal is (or already was) raised.
    ///
    /// Terminate wins over stop when both are pending. Intended for use
    /// inside `tokio::select!` in a module's main loop.
    pub async fn cancelled(&self) -> StopKind {
        let mut stop_rx = self.stop_tx.subscribe();
        let mut term_rx = self.term_tx.subscribe();

        loop {
            if *term_rx.borrow() {
                return StopKind::Terminate;
            }
            if *stop_rx.borrow() {
                return StopKind::Stop;
            }
            tokio::select! {
                res = term_rx.changed() => {
                    if res.is_err() {
                        return StopKind::Terminate;
                    }
                }
                res = stop_rx.changed() => {
                    if res.is_err() {
                        return StopKind::Terminate;
                    }
                }
            }
        }
    }
}

impl Default for LifecycleGate {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn stop_signal_resolves_cancelled() {
        let gate = LifecycleGate::new();
        gate.request_stop();
        assert_eq!(gate.cancelled().await, StopKind::Stop);
    }

    #[tokio::test]
    async fn terminate_wins_over_stop() {
        let gate = LifecycleGate::new();
        gate.request_stop();
        gate.request_terminate();
        assert_eq!(gate.cancelled().await, StopKind::Terminate);
    }

    #[tokio::test]
    async fn cancelled_waits_for_signal() {
        let gate = LifecycleGate::new();
        let pending = timeout(Duration::from_millis(20), gate.cancelled()).await;
        assert!(pending.is_err(), "no signal raised, must stay pending");

        let waiter = {
            let gate = gate.clone();
            tokio::spawn(async move { gate.cancelled().await })
        };
        gate.request_stop();
        assert_eq!(waiter.await.unwrap(), StopKind::Stop);
    }

    #[tokio::test]
    async fn rearm_clears_both_signals() {
        let gate = LifecycleGate::new();
        gate.request_stop();
        gate.request_terminate();
        gate.rearm();
        assert!(!gate.stop_requested());
        assert!(!gate.terminate_requested());
    }

    #[test]
    fn requests_are_idempotent() {
        let gate = LifecycleGate::new();
        gate.request_terminate();
        gate.request_terminate();
        assert!(gate.terminate_requested());
    }
}
