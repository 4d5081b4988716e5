//! Supervision kernel for the Vigil host.
//!
//! This crate is the orchestration core: it owns module registration,
//! the lifecycle state machine, the per-module execution lanes, the
//! shared worker pool, and the transport-agnostic command dispatcher.
//!
//! # Layout
//!
//! | Module | Responsibility |
//! |--------|----------------|
//! | [`executor`] | per-module lanes + shared worker pool |
//! | [`supervisor`] | registry, state machine, lifecycle runner |
//! | [`dispatcher`] | command envelope → supervisor operations |
//! | [`config`] | schema, layered loading, shared store |
//! | [`catalog`] | builtin engine registration table |
//! | [`modules`] | builtin engines (heartbeat, file watch) |
//! | [`notify`] | log-backed notification boundary |
//!
//! # Wiring
//!
//! ```ignore
//! let pool = Arc::new(ExecutorPool::new()?);
//! let config = Arc::new(ConfigStore::new(ConfigLoader::new().load()?));
//! let services = SharedServices {
//!     notifier: Arc::new(LogNotifier::default()),
//!     worker: Arc::new(pool.worker()),
//! };
//! let supervisor = Supervisor::new(pool, config, services);
//! supervisor.register_active(catalog::builtins());
//! supervisor.start_all();
//! ```

pub mod catalog;
pub mod config;
pub mod dispatcher;
mod error;
pub mod executor;
pub mod modules;
pub mod notify;
mod supervisor;
mod tasks;

pub use config::{ConfigError, ConfigLoader, ConfigStore, VigilConfig};
pub use dispatcher::{CommandRequest, CommandResponse, Dispatcher, ResponseStatus};
pub use error::SupervisorError;
pub use executor::ExecutorPool;
pub use notify::LogNotifier;
pub use supervisor::Supervisor;
