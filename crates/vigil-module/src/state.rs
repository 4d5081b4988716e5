//! Module lifecycle states.
//!
//! The supervisor holds the authoritative state for every registered
//! module; modules additionally self-report their state through
//! [`StateCell`], which the supervisor uses as a cross-check.
//!
//! # State Machine
//!
//! ```text
//! register ──► Created ──start──► Initialized ──► Running
//!                ▲                                 │  │  │
//!                │ (restart after reconfigure)     │  │  └─fault──► Failed
//!                │                                 │  └─terminate─► Terminated
//!                └──── Stopped ◄───cooperative─────┘
//! ```
//!
//! `Stopped`, `Failed` and `Terminated` modules may be started again;
//! restart does not auto-reset configuration.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Lifecycle state of a registered module.
///
/// Exactly one state per module at any instant. Transitions are driven
/// by the supervisor's lifecycle runner; concurrent transitions on the
/// same module are serialized by the module's dedicated lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleState {
    /// Registered, no lane yet.
    #[default]
    Created,

    /// `initialize` returned successfully.
    Initialized,

    /// Main loop is executing (set before `run` blocks).
    Running,

    /// Main loop observed the cooperative stop flag and exited cleanly.
    Stopped,

    /// Terminate was requested or the loop finished permanently.
    Terminated,

    /// An uncaught fault occurred during initialize/run.
    Failed,
}

impl ModuleState {
    /// Returns `true` if no lifecycle task is live for this state.
    ///
    /// Presence of a live task handle implies `Initialized` or
    /// `Running`; every other state is idle.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        !matches!(self, Self::Initialized | Self::Running)
    }

    /// Returns `true` if configuration updates are accepted.
    ///
    /// While `Running` or `Terminated` a module keeps its current
    /// settings; `initialize` skips the update with a warning and
    /// still proceeds, so a terminated module can be started again.
    #[must_use]
    pub fn allows_reconfigure(&self) -> bool {
        !matches!(self, Self::Running | Self::Terminated)
    }

    /// Returns `true` if a restart requires prior reconfiguration.
    ///
    /// `start` on these states is permitted but logged, because the
    /// caller is responsible for reconfiguring first.
    #[must_use]
    pub fn needs_reconfigure_warning(&self) -> bool {
        matches!(self, Self::Failed | Self::Terminated)
    }
}

impl std::fmt::Display for ModuleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Initialized => write!(f, "initialized"),
            Self::Running => write!(f, "running"),
            Self::Stopped => write!(f, "stopped"),
            Self::Terminated => write!(f, "terminated"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Thread-safe cell holding a module's self-reported state.
///
/// Cheap to clone; all clones observe the same cell.
#[derive(Debug, Clone, Default)]
pub struct StateCell {
    inner: Arc<Mutex<ModuleState>>,
}

impl StateCell {
    /// Creates a cell starting at [`ModuleState::Created`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current state.
    #[must_use]
    pub fn get(&self) -> ModuleState {
        *self.inner.lock()
    }

    /// Replaces the current state.
    pub fn set(&self, state: ModuleState) {
        *self.inner.lock() = state;
    }
}
