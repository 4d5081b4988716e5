//! The module contract.
//!
//! A module is a pluggable monitoring/automation unit that runs under
//! an isolated lifecycle: the supervisor drives
//! `initialize → run → terminate` as a single task on the module's
//! dedicated lane and tracks the authoritative state at every phase
//! boundary.
//!
//! # Contract
//!
//! | Method | Blocking | Purpose |
//! |--------|----------|---------|
//! | `initialize` | no | validate + store config, acquire services |
//! | `run` | yes | main loop until stop/terminate/fault |
//! | `stop` | no | cooperative suspension request |
//! | `terminate` | no | permanent exit + resource release, idempotent |
//! | `status` | no | self-reported state |
//!
//! `run` returns a tagged [`RunExit`] instead of signalling the exit
//! reason through panics or sentinel errors; the supervisor consumes it
//! to drive the state machine across the concurrency boundary.

use crate::{ModuleDescriptor, ModuleError, ModuleState, SharedServices};
use async_trait::async_trait;
use serde_json::Value;

/// How a module's main loop exited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunExit {
    /// The loop observed the cooperative stop signal and exited
    /// cleanly; the module may be restarted without reconfiguration.
    Stopped,

    /// The loop observed the terminate signal or reached its natural
    /// end; the supervisor invokes `terminate()` next.
    Finished,
}

/// Notify addresses injected when a module declares
/// [`Capability::Notify`](crate::Capability::Notify).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifyTarget {
    /// Sender address.
    pub sender: String,

    /// Receiver addresses.
    pub receivers: Vec<String>,
}

/// Initialization payload built by the supervisor.
///
/// Carries the module-specific configuration section, the notify
/// addresses when the descriptor requires them, and the shared service
/// handles.
#[derive(Debug, Clone)]
pub struct InitPayload {
    /// Module-specific configuration (the engine's config section).
    pub config: Value,

    /// Present only for modules requiring the notify capability.
    pub notify: Option<NotifyTarget>,

    /// Shared service handles.
    pub services: SharedServices,
}

/// Capability interface every pluggable unit implements.
///
/// Implementations use interior mutability: the supervisor shares the
/// module between the registry and the lifecycle task, so all methods
/// take `&self`.
#[async_trait]
pub trait Module: Send + Sync {
    /// Static identity: engine name, category tag, requirements.
    fn descriptor(&self) -> &ModuleDescriptor;

    /// Validates and stores configuration, acquires shared services,
    /// and rearms the lifecycle gate.
    ///
    /// Must be rejected (warn, no-op) while the module is `Running` or
    /// `Terminated`. No side effect beyond internal assignment.
    ///
    /// # Errors
    ///
    /// [`ModuleError::Config`] when required fields are absent or
    /// malformed; the module stays in its prior state.
    async fn initialize(&self, payload: InitPayload) -> Result<(), ModuleError>;

    /// Executes the main loop until a stop or terminate signal is
    /// observed or an unrecoverable fault occurs.
    ///
    /// # Errors
    ///
    /// Any error is treated as a module fault; the supervisor moves the
    /// module to `Failed` and attempts a best-effort `terminate()`.
    async fn run(&self) -> Result<RunExit, ModuleError>;

    /// Requests cooperative suspension. Does not block; the main loop
    /// decides when to exit.
    fn stop(&self);

    /// Requests permanent exit and releases module-held resources.
    /// Idempotent.
    ///
    /// # Errors
    ///
    /// Callers swallow and log terminate errors; they never escalate.
    fn terminate(&self) -> Result<(), ModuleError>;

    /// The module's last-known self-reported state.
    fn status(&self) -> ModuleState;
}
