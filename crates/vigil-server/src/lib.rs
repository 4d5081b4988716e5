//! Process host for the Vigil module supervisor.
//!
//! Wires the supervision kernel ([`vigil_runtime`]) to its external
//! surfaces: configuration loading, the HTTP command endpoint, and
//! process lifecycle (startup, signal-driven graceful shutdown).

pub mod app;
mod error;
pub mod http;

pub use app::App;
pub use error::ServerError;
