//! Composition root: builds every long-lived resource exactly once.
//!
//! The executor pool, config store, shared services, supervisor, and
//! dispatcher are constructed here and passed down by handle — no
//! component reaches for global state.

use crate::error::ServerError;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use vigil_module::SharedServices;
use vigil_runtime::config::HttpConfig;
use vigil_runtime::{catalog, ConfigLoader, ConfigStore, Dispatcher, ExecutorPool, LogNotifier, Supervisor};

/// Fully wired host.
pub struct App {
    /// Module registry and lifecycle orchestrator.
    pub supervisor: Arc<Supervisor>,

    /// Command dispatcher bound to the supervisor.
    pub dispatcher: Arc<Dispatcher>,

    /// Listener settings captured at startup.
    pub http: HttpConfig,
}

impl App {
    /// Loads configuration, wires the runtime, and registers the
    /// configured builtin engines.
    ///
    /// # Errors
    ///
    /// [`ServerError::Config`] when the config file is unreadable or
    /// malformed, [`ServerError::Pool`] when the executor pool cannot
    /// be built.
    pub fn build(config_file: Option<PathBuf>) -> Result<Self, ServerError> {
        let mut loader = ConfigLoader::new();
        if let Some(path) = config_file {
            loader = loader.with_file(path);
        }
        let config = loader.load()?;
        let http = config.core.http.clone();

        let pool = Arc::new(ExecutorPool::new().map_err(ServerError::Pool)?);
        let services = SharedServices {
            notifier: Arc::new(LogNotifier::default()),
            worker: Arc::new(pool.worker()),
        };
        let supervisor = Supervisor::new(pool, Arc::new(ConfigStore::new(config)), services);
        supervisor.register_active(catalog::builtins());
        info!(modules = ?supervisor.module_names(), "host assembled");

        let dispatcher = Arc::new(Dispatcher::new(Arc::clone(&supervisor)));
        Ok(Self {
            supervisor,
            dispatcher,
            http,
        })
    }
}
