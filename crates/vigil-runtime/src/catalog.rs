//! Builtin engine catalog.
//!
//! The catalog is an explicit registration table mapping engine names
//! to factory functions; the supervisor filters it against the
//! configured active list at startup. Capability requirements live on
//! each module's descriptor and are checked at registration time.

use crate::modules::{FileWatchModule, HeartbeatModule};
use std::sync::Arc;
use vigil_module::Module;

/// Factory producing a fresh module instance.
pub type ModuleFactory = fn() -> Arc<dyn Module>;

/// One catalog row: engine name plus its factory.
#[derive(Clone, Copy)]
pub struct CatalogEntry {
    /// Engine name, matched case-insensitively against the active list.
    pub engine: &'static str,

    /// Instance factory.
    pub factory: ModuleFactory,
}

fn heartbeat() -> Arc<dyn Module> {
    Arc::new(HeartbeatModule::default())
}

fn file_watch() -> Arc<dyn Module> {
    Arc::new(FileWatchModule::default())
}

/// Engines shipped with the runtime.
#[must_use]
pub fn builtins() -> &'static [CatalogEntry] {
    &[
        CatalogEntry {
            engine: "heartbeat",
            factory: heartbeat,
        },
        CatalogEntry {
            engine: "file_watch",
            factory: file_watch,
        },
    ]
}
