//! Builtin engines shipped with the runtime.
//!
//! Each engine is a self-contained [`Module`](vigil_module::Module)
//! implementation registered through the catalog. Engine config lives
//! in the `[engines.<name>]` section of the host configuration and is
//! deserialized by the module itself during `initialize`.

mod file_watch;
mod heartbeat;

pub use file_watch::FileWatchModule;
pub use heartbeat::HeartbeatModule;
