//! Module contract layer for the Vigil host supervisor.
//!
//! This crate defines everything a pluggable unit needs to participate
//! in the supervision kernel, and nothing about the kernel itself:
//!
//! - [`Module`] — the lifecycle capability interface
//! - [`ModuleDescriptor`] — static engine identity + capability
//!   requirements (the registration-table replacement for runtime type
//!   inspection)
//! - [`ModuleState`] / [`StateCell`] — lifecycle states and the
//!   self-reported state cell
//! - [`LifecycleGate`] — cooperative stop / terminate signalling for
//!   `select!`-based main loops
//! - [`Notifier`] / [`WorkerSpawner`] — shared-service seams the
//!   runtime implements and injects through [`InitPayload`]
//! - [`ModuleError`] and the workspace-wide [`ErrorCode`] convention
//!
//! Everything else (executor pool, supervisor, dispatcher, transport)
//! depends on this crate; this crate depends on no other Vigil crate.

mod descriptor;
mod error;
mod gate;
mod module;
mod services;
mod state;

pub mod testing;

pub use descriptor::{Capability, ModuleDescriptor, ModuleKind};
pub use error::{assert_error_code, assert_error_codes, ErrorCode, ModuleError};
pub use gate::{LifecycleGate, StopKind};
pub use module::{InitPayload, Module, NotifyTarget, RunExit};
pub use services::{Notification, Notifier, SharedServices, WorkerFuture, WorkerSpawner};
pub use state::{ModuleState, StateCell};
