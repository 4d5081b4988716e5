//! Module registry and supervision state machine.
//!
//! The [`Supervisor`] owns every registered module, its tracked
//! lifecycle state, and its live task handle. Each module's whole
//! lifecycle (`initialize → run → terminate`) executes as one task on
//! the module's dedicated lane; the supervisor consumes the tagged
//! outcome to drive the state machine across the concurrency boundary.
//!
//! # State Machine
//!
//! | From | Trigger | To |
//! |------|---------|----|
//! | Created/Stopped/Failed/Terminated | `start_module` (initialize ok) | Initialized → Running |
//! | Running | cooperative stop observed | Stopped |
//! | Running | terminate requested | Terminated |
//! | Initialized/Running | fault in initialize/run | Failed |
//! | any | `remove_module` | (erased) |
//!
//! Guards: `start` on a live module is a logged no-op. `start` on
//! `Failed`/`Terminated` is permitted; the caller is responsible for
//! prior reconfiguration. `stop` is only effective while `Running`.
//!
//! Operations on different modules are unordered and concurrent;
//! operations on the same module are serialized by the single-worker
//! lane plus the run-tagged task table.

use crate::catalog::CatalogEntry;
use crate::config::ConfigStore;
use crate::error::SupervisorError;
use crate::executor::ExecutorPool;
use crate::tasks::TaskTable;
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, error, info, warn};
use vigil_module::{
    ErrorCode, InitPayload, Module, ModuleError, ModuleState, NotifyTarget, RunExit, SharedServices,
};

/// Bounded wait for a stopping module to release its lifecycle task
/// during a restart-in-place.
const RESTART_GRACE: Duration = Duration::from_secs(10);

/// How a lifecycle run concluded, consumed to drive the state machine.
#[derive(Debug)]
enum LifecycleOutcome {
    /// `run` observed the cooperative stop signal and exited cleanly.
    Stopped,
    /// `run` reached its natural end or observed terminate.
    Finished,
    /// `initialize` rejected the configuration; prior state preserved.
    Rejected(ModuleError),
    /// Uncaught fault inside `initialize`/`run`.
    Fault(ModuleError),
}

/// Module registry and lifecycle orchestrator.
///
/// Constructed once by the composition root; shared via `Arc` with the
/// dispatcher and the transport layer.
pub struct Supervisor {
    modules: RwLock<HashMap<String, Arc<dyn Module>>>,
    states: Mutex<HashMap<String, ModuleState>>,
    tasks: TaskTable,
    pool: Arc<ExecutorPool>,
    config: Arc<ConfigStore>,
    services: SharedServices,
    /// Serializes configuration updates so concurrent reconfigure
    /// calls cannot interleave their restart sequences.
    reconfig: tokio::sync::Mutex<()>,
}

impl Supervisor {
    /// Creates a supervisor over an executor pool and a config store.
    #[must_use]
    pub fn new(
        pool: Arc<ExecutorPool>,
        config: Arc<ConfigStore>,
        services: SharedServices,
    ) -> Arc<Self> {
        Arc::new(Self {
            modules: RwLock::new(HashMap::new()),
            states: Mutex::new(HashMap::new()),
            tasks: TaskTable::new(),
            pool,
            config,
            services,
            reconfig: tokio::sync::Mutex::new(()),
        })
    }

    /// Registers a module instance with state `Created`.
    ///
    /// # Errors
    ///
    /// [`SupervisorError::Duplicate`] when a module with the same engine
    /// identity is already registered.
    pub fn add_module(&self, module: Arc<dyn Module>) -> Result<(), SupervisorError> {
        let key = module.descriptor().engine.to_ascii_lowercase();
        let mut modules = self.modules.write();
        if modules.contains_key(&key) {
            return Err(SupervisorError::Duplicate(key));
        }
        modules.insert(key.clone(), module);
        self.states.lock().insert(key.clone(), ModuleState::Created);
        info!(module = %key, "module registered");
        Ok(())
    }

    /// Registers catalog entries named in the configured active list
    /// (case-insensitive).
    ///
    /// Configured names with no matching catalog entry are warned
    /// about, not errors. Entries whose descriptor requires the notify
    /// capability are skipped with a warning when no notification
    /// sender is configured.
    pub fn register_active(&self, catalog: &[CatalogEntry]) {
        let snapshot = self.config.snapshot();
        let notify_ready = snapshot.core.notify.is_configured();

        for name in &snapshot.core.active_modules {
            let Some(entry) = catalog
                .iter()
                .find(|entry| entry.engine.eq_ignore_ascii_case(name))
            else {
                warn!(module = %name, "no builtin engine matches configured name");
                continue;
            };
            let module = (entry.factory)();
            if module.descriptor().requires_notify() && !notify_ready {
                warn!(
                    module = entry.engine,
                    "notify capability required but no sender configured, skipping"
                );
                continue;
            }
            if let Err(err) = self.add_module(module) {
                warn!(module = entry.engine, error = %err, "registration skipped");
            }
        }
    }

    /// Starts a module: claims the task slot, ensures the lane exists,
    /// and submits the lifecycle task.
    ///
    /// A start while a lifecycle task is already live is a logged
    /// no-op, not an error.
    ///
    /// # Errors
    ///
    /// [`SupervisorError::NotFound`] for unregistered names,
    /// [`SupervisorError::Lane`] when the lane cannot be created.
    pub fn start_module(self: &Arc<Self>, name: &str) -> Result<(), SupervisorError> {
        let (key, module) = self.find(name)?;

        let state = self.tracked_state(&key);
        if state.needs_reconfigure_warning() {
            warn!(module = %key, %state, "restarting without prior reconfiguration");
        }

        let Some(run_id) = self.tasks.try_begin(&key) else {
            info!(module = %key, "already running, start ignored");
            return Ok(());
        };

        let lane = match self.pool.lane(&key) {
            Ok(lane) => lane,
            Err(source) => {
                self.tasks.finish(&key, run_id);
                return Err(SupervisorError::Lane {
                    engine: key,
                    source,
                });
            }
        };

        let payload = self.build_payload(module.as_ref());
        info!(module = %key, run_id, "starting module");

        let supervisor = Arc::clone(self);
        let task_key = key.clone();
        let handle = lane.spawn(async move {
            let outcome = drive_lifecycle(&supervisor, &task_key, module, payload).await;
            supervisor.conclude(&task_key, run_id, outcome);
        });
        self.tasks.attach(&key, run_id, handle);
        Ok(())
    }

    /// Requests a cooperative stop. Only effective while `Running`.
    ///
    /// # Errors
    ///
    /// [`SupervisorError::NotFound`] for unregistered names,
    /// [`SupervisorError::LifecycleViolation`] (a logged no-op for
    /// callers) when the module is not `Running`.
    pub fn stop_module(&self, name: &str) -> Result<(), SupervisorError> {
        let (key, module) = self.find(name)?;
        let state = self.tracked_state(&key);
        if state != ModuleState::Running {
            warn!(module = %key, %state, "stop ignored, module not running");
            return Err(SupervisorError::LifecycleViolation {
                operation: "stop",
                state,
            });
        }
        module.stop();
        // Cooperative: the loop decides when to exit. Refresh the
        // tracked state from the module's self-report; the lifecycle
        // task records the final transition.
        self.set_state(&key, module.status());
        info!(module = %key, "stop requested");
        Ok(())
    }

    /// Terminates a module: always invokes `terminate()`, then cancels
    /// any tracked lifecycle task with forced interruption.
    ///
    /// The final state is `Terminated`, or `Failed` when the module had
    /// already failed.
    ///
    /// # Errors
    ///
    /// [`SupervisorError::NotFound`] for unregistered names. Terminate
    /// errors reported by the module itself are swallowed and logged.
    pub fn terminate_module(&self, name: &str) -> Result<(), SupervisorError> {
        let (key, module) = self.find(name)?;

        if let Err(err) = module.terminate() {
            warn!(module = %key, error = %err, code = err.code(), "terminate reported an error");
        }
        match self.tasks.take(&key) {
            Some(handle) if handle.is_finished() => {
                debug!(module = %key, "lifecycle task had already finished");
            }
            Some(handle) => {
                handle.abort();
                info!(module = %key, "lifecycle task interrupted");
            }
            None => debug!(module = %key, "no live lifecycle task"),
        }

        let state = if self.tracked_state(&key) == ModuleState::Failed {
            ModuleState::Failed
        } else {
            module.status()
        };
        self.set_state(&key, state);
        info!(module = %key, %state, "module terminated");
        Ok(())
    }

    /// Removes a module: terminates it, erases registry/state/task
    /// entries, and destroys its dedicated lane.
    ///
    /// # Errors
    ///
    /// [`SupervisorError::NotFound`] for unregistered names.
    pub fn remove_module(&self, name: &str) -> Result<(), SupervisorError> {
        let key = self.find(name)?.0;
        self.terminate_module(&key)?;

        if let Some(handle) = self.tasks.remove(&key) {
            handle.abort();
        }
        self.modules.write().remove(&key);
        self.states.lock().remove(&key);
        self.pool.remove_lane(&key);
        info!(module = %key, "module removed");
        Ok(())
    }

    /// Starts every registered module; individual failures are logged
    /// and do not abort the sweep.
    pub fn start_all(self: &Arc<Self>) {
        for name in self.module_names() {
            if let Err(err) = self.start_module(&name) {
                error!(module = %name, error = %err, code = err.code(), "start failed");
            }
        }
    }

    /// Requests a cooperative stop for every running module.
    pub fn stop_all(&self) {
        for name in self.module_names() {
            // Lifecycle violations here just mean the module was idle.
            if let Err(err) = self.stop_module(&name) {
                debug!(module = %name, error = %err, "stop skipped");
            }
        }
    }

    /// Terminates every registered module.
    pub fn terminate_all(&self) {
        for name in self.module_names() {
            if let Err(err) = self.terminate_module(&name) {
                warn!(module = %name, error = %err, "terminate failed");
            }
        }
    }

    /// Full teardown: terminates every module, then shuts the executor
    /// pool down.
    ///
    /// Blocks the calling thread for up to the pool's shutdown grace;
    /// call from a blocking context.
    pub fn shutdown(&self) {
        info!("supervisor shutdown started");
        self.terminate_all();
        self.pool.shutdown();
        info!("supervisor shutdown complete");
    }

    /// Applies a configuration delta, then restarts every currently
    /// `Running` module (optionally filtered to one engine) with a
    /// stop-then-start in place.
    ///
    /// At most one configuration update runs at a time; concurrent
    /// callers serialize.
    ///
    /// # Errors
    ///
    /// [`SupervisorError::Config`] when the delta is rejected; no
    /// module is restarted in that case.
    pub async fn update_config_from_json(
        self: &Arc<Self>,
        engine: Option<&str>,
        delta: &Value,
    ) -> Result<(), SupervisorError> {
        let _guard = self.reconfig.lock().await;
        self.config.update_from_json(delta)?;
        info!(engine = engine.unwrap_or("*"), "configuration updated");

        let affected: Vec<String> = {
            let states = self.states.lock();
            states
                .iter()
                .filter(|(name, state)| {
                    **state == ModuleState::Running
                        && engine.is_none_or(|filter| name.eq_ignore_ascii_case(filter))
                })
                .map(|(name, _)| name.clone())
                .collect()
        };

        for name in affected {
            info!(module = %name, "restarting for configuration update");
            if let Err(err) = self.stop_module(&name) {
                warn!(module = %name, error = %err, "restart stop skipped");
                continue;
            }
            if !self.await_idle(&name, RESTART_GRACE).await {
                warn!(module = %name, "did not stop within grace, restart skipped");
                continue;
            }
            if let Err(err) = self.start_module(&name) {
                error!(module = %name, error = %err, code = err.code(), "restart failed");
                continue;
            }
            // Hold the update until the module is running again, so the
            // next serialized update observes it as restartable.
            if !self
                .await_state(&name, ModuleState::Running, RESTART_GRACE)
                .await
            {
                warn!(module = %name, "restart did not reach running within grace");
            }
        }
        Ok(())
    }

    /// The tracked state of a module.
    ///
    /// # Errors
    ///
    /// [`SupervisorError::NotFound`] for unregistered names.
    pub fn state_of(&self, name: &str) -> Result<ModuleState, SupervisorError> {
        let key = self.find(name)?.0;
        Ok(self.tracked_state(&key))
    }

    /// Whether the module currently has a live lifecycle task.
    #[must_use]
    pub fn has_live_task(&self, name: &str) -> bool {
        self.tasks.is_live(&name.to_ascii_lowercase())
    }

    /// Registered engine names, sorted.
    #[must_use]
    pub fn module_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.modules.read().keys().cloned().collect();
        names.sort();
        names
    }

    fn find(&self, name: &str) -> Result<(String, Arc<dyn Module>), SupervisorError> {
        let key = name.to_ascii_lowercase();
        match self.modules.read().get(&key) {
            Some(module) => Ok((key, Arc::clone(module))),
            None => Err(SupervisorError::NotFound(name.to_string())),
        }
    }

    fn build_payload(&self, module: &dyn Module) -> InitPayload {
        let descriptor = module.descriptor();
        let notify = if descriptor.requires_notify() {
            let settings = self.config.notify();
            settings.is_configured().then(|| NotifyTarget {
                sender: settings.sender,
                receivers: settings.receivers,
            })
        } else {
            None
        };
        InitPayload {
            config: self.config.engine_config(descriptor.engine),
            notify,
            services: self.services.clone(),
        }
    }

    /// Records the outcome of a lifecycle run and releases its slot.
    fn conclude(&self, name: &str, run_id: u64, outcome: LifecycleOutcome) {
        match outcome {
            LifecycleOutcome::Stopped => {
                info!(module = %name, "stopped cooperatively");
            }
            LifecycleOutcome::Finished => {
                info!(module = %name, "finished");
            }
            LifecycleOutcome::Rejected(err) => {
                warn!(
                    module = %name,
                    error = %err,
                    code = err.code(),
                    "initialization rejected, prior state preserved"
                );
            }
            LifecycleOutcome::Fault(err) => {
                error!(module = %name, error = %err, code = err.code(), "module fault");
                self.set_state(name, ModuleState::Failed);
            }
        }
        self.tasks.finish(name, run_id);
    }

    fn set_state(&self, name: &str, state: ModuleState) {
        self.states.lock().insert(name.to_string(), state);
    }

    fn tracked_state(&self, name: &str) -> ModuleState {
        self.states.lock().get(name).copied().unwrap_or_default()
    }

    /// Waits until the module has no live lifecycle task, bounded.
    async fn await_idle(&self, name: &str, limit: Duration) -> bool {
        let deadline = Instant::now() + limit;
        while self.tasks.is_live(name) {
            if Instant::now() >= deadline {
                return false;
            }
            sleep(Duration::from_millis(10)).await;
        }
        true
    }

    /// Waits until the tracked state matches, bounded.
    async fn await_state(&self, name: &str, want: ModuleState, limit: Duration) -> bool {
        let deadline = Instant::now() + limit;
        while self.tracked_state(name) != want {
            if Instant::now() >= deadline {
                return false;
            }
            sleep(Duration::from_millis(10)).await;
        }
        true
    }
}

/// One full lifecycle run on the module's lane.
///
/// Faults never cross this boundary: every phase error is classified
/// into the returned outcome, and a fault still gets a best-effort
/// `terminate()` whose own failure is swallowed.
async fn drive_lifecycle(
    supervisor: &Supervisor,
    name: &str,
    module: Arc<dyn Module>,
    payload: InitPayload,
) -> LifecycleOutcome {
    match module.initialize(payload).await {
        Ok(()) => {}
        Err(err @ ModuleError::Config(_)) => return LifecycleOutcome::Rejected(err),
        Err(err) => {
            best_effort_terminate(name, module.as_ref());
            return LifecycleOutcome::Fault(err);
        }
    }
    supervisor.set_state(name, module.status());
    debug!(module = %name, "initialized");
    supervisor.set_state(name, ModuleState::Running);

    match module.run().await {
        Ok(RunExit::Stopped) => {
            supervisor.set_state(name, module.status());
            LifecycleOutcome::Stopped
        }
        Ok(RunExit::Finished) => {
            best_effort_terminate(name, module.as_ref());
            supervisor.set_state(name, module.status());
            LifecycleOutcome::Finished
        }
        Err(err) => {
            best_effort_terminate(name, module.as_ref());
            LifecycleOutcome::Fault(err)
        }
    }
}

fn best_effort_terminate(name: &str, module: &dyn Module) {
    if let Err(err) = module.terminate() {
        warn!(module = %name, error = %err, code = err.code(), "cleanup terminate failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigStore, VigilConfig};
    use crate::notify::LogNotifier;
    use serde_json::json;
    use vigil_module::testing::ScriptedModule;

    fn harness() -> Arc<Supervisor> {
        harness_with(VigilConfig::default())
    }

    fn harness_with(config: VigilConfig) -> Arc<Supervisor> {
        let pool = Arc::new(ExecutorPool::new().unwrap());
        let services = SharedServices {
            notifier: Arc::new(LogNotifier::default()),
            worker: Arc::new(pool.worker()),
        };
        Supervisor::new(pool, Arc::new(ConfigStore::new(config)), services)
    }

    async fn wait_for_state(supervisor: &Supervisor, name: &str, want: ModuleState) {
        for _ in 0..300 {
            if supervisor.state_of(name).unwrap() == want {
                return;
            }
            sleep(Duration::from_millis(10)).await;
        }
        panic!(
            "module {name} stuck in {}, wanted {want}",
            supervisor.state_of(name).unwrap()
        );
    }

    async fn wait_for_idle(supervisor: &Supervisor, name: &str) {
        for _ in 0..300 {
            if !supervisor.has_live_task(name) {
                return;
            }
            sleep(Duration::from_millis(10)).await;
        }
        panic!("module {name} still has a live task");
    }

    #[test]
    fn duplicate_registration_rejected() {
        let supervisor = harness();
        supervisor
            .add_module(ScriptedModule::builder("dup").build())
            .unwrap();
        let err = supervisor
            .add_module(ScriptedModule::builder("DUP").build())
            .unwrap_err();
        assert!(matches!(err, SupervisorError::Duplicate(_)));
    }

    #[test]
    fn unknown_module_not_found() {
        let supervisor = harness();
        let err = supervisor.state_of("ghost").unwrap_err();
        assert_eq!(err.to_string(), "Module not found: ghost");
    }

    #[tokio::test]
    async fn start_drives_created_to_running() {
        let supervisor = harness();
        let module = ScriptedModule::builder("m").build();
        let counters = module.counters();
        supervisor.add_module(module).unwrap();
        assert_eq!(supervisor.state_of("m").unwrap(), ModuleState::Created);

        supervisor.start_module("m").unwrap();
        wait_for_state(&supervisor, "m", ModuleState::Running).await;
        assert_eq!(counters.init_calls(), 1);
        assert_eq!(counters.run_calls(), 1);
        supervisor.shutdown();
    }

    #[tokio::test]
    async fn start_on_running_module_is_noop() {
        let supervisor = harness();
        let module = ScriptedModule::builder("m").build();
        let counters = module.counters();
        supervisor.add_module(module).unwrap();

        supervisor.start_module("m").unwrap();
        wait_for_state(&supervisor, "m", ModuleState::Running).await;
        supervisor.start_module("m").unwrap();
        sleep(Duration::from_millis(50)).await;

        assert_eq!(counters.run_calls(), 1);
        assert_eq!(supervisor.state_of("m").unwrap(), ModuleState::Running);
        assert!(supervisor.has_live_task("m"));
        supervisor.shutdown();
    }

    #[tokio::test]
    async fn concurrent_starts_yield_one_live_task() {
        let supervisor = harness();
        let module = ScriptedModule::builder("m").build();
        let counters = module.counters();
        supervisor.add_module(module).unwrap();

        let threads: Vec<_> = (0..8)
            .map(|_| {
                let supervisor = Arc::clone(&supervisor);
                std::thread::spawn(move || supervisor.start_module("m"))
            })
            .collect();
        for thread in threads {
            thread.join().unwrap().unwrap();
        }

        wait_for_state(&supervisor, "m", ModuleState::Running).await;
        sleep(Duration::from_millis(50)).await;
        assert_eq!(counters.run_calls(), 1);
        supervisor.shutdown();
    }

    #[tokio::test]
    async fn cooperative_stop_reaches_stopped() {
        let supervisor = harness();
        let module = ScriptedModule::builder("m").build();
        let counters = module.counters();
        supervisor.add_module(module).unwrap();

        supervisor.start_module("m").unwrap();
        wait_for_state(&supervisor, "m", ModuleState::Running).await;
        supervisor.stop_module("m").unwrap();

        wait_for_state(&supervisor, "m", ModuleState::Stopped).await;
        wait_for_idle(&supervisor, "m").await;
        assert_eq!(counters.stop_calls(), 1);
        supervisor.shutdown();
    }

    #[tokio::test]
    async fn stop_on_idle_module_is_violation() {
        let supervisor = harness();
        supervisor
            .add_module(ScriptedModule::builder("m").build())
            .unwrap();
        let err = supervisor.stop_module("m").unwrap_err();
        assert!(matches!(
            err,
            SupervisorError::LifecycleViolation { operation: "stop", .. }
        ));
    }

    #[tokio::test]
    async fn stop_ignoring_module_needs_terminate() {
        let supervisor = harness();
        let module = ScriptedModule::builder("m").ignore_stop().build();
        supervisor.add_module(module).unwrap();

        supervisor.start_module("m").unwrap();
        wait_for_state(&supervisor, "m", ModuleState::Running).await;
        supervisor.stop_module("m").unwrap();
        sleep(Duration::from_millis(100)).await;
        // The loop never observes the flag.
        assert_eq!(supervisor.state_of("m").unwrap(), ModuleState::Running);

        supervisor.terminate_module("m").unwrap();
        wait_for_state(&supervisor, "m", ModuleState::Terminated).await;
        assert!(!supervisor.has_live_task("m"));
        supervisor.shutdown();
    }

    #[tokio::test]
    async fn run_fault_ends_failed_with_cleanup() {
        let supervisor = harness();
        let module = ScriptedModule::builder("m").fail_on_run().build();
        let counters = module.counters();
        supervisor.add_module(module).unwrap();

        supervisor.start_module("m").unwrap();
        wait_for_state(&supervisor, "m", ModuleState::Failed).await;
        wait_for_idle(&supervisor, "m").await;
        assert!(counters.cleaned_up());
        assert!(counters.terminate_calls() >= 1);
        supervisor.shutdown();
    }

    #[tokio::test]
    async fn failed_module_stays_failed_after_terminate() {
        let supervisor = harness();
        supervisor
            .add_module(ScriptedModule::builder("m").fail_on_run().build())
            .unwrap();
        supervisor.start_module("m").unwrap();
        wait_for_state(&supervisor, "m", ModuleState::Failed).await;

        supervisor.terminate_module("m").unwrap();
        assert_eq!(supervisor.state_of("m").unwrap(), ModuleState::Failed);
        supervisor.shutdown();
    }

    #[tokio::test]
    async fn init_rejection_preserves_prior_state() {
        let supervisor = harness();
        let module = ScriptedModule::builder("m").fail_on_init().build();
        supervisor.add_module(module).unwrap();

        supervisor.start_module("m").unwrap();
        wait_for_idle(&supervisor, "m").await;
        assert_eq!(supervisor.state_of("m").unwrap(), ModuleState::Created);
        supervisor.shutdown();
    }

    #[tokio::test]
    async fn remove_erases_module_and_lane() {
        let supervisor = harness();
        supervisor
            .add_module(ScriptedModule::builder("m").build())
            .unwrap();
        supervisor.start_module("m").unwrap();
        wait_for_state(&supervisor, "m", ModuleState::Running).await;

        supervisor.remove_module("m").unwrap();
        assert!(supervisor.module_names().is_empty());
        assert!(matches!(
            supervisor.state_of("m"),
            Err(SupervisorError::NotFound(_))
        ));
        assert_eq!(supervisor.pool.lane_count(), 0);
        supervisor.shutdown();
    }

    #[tokio::test]
    async fn terminated_module_restarts() {
        let supervisor = harness();
        let module = ScriptedModule::builder("m").build();
        let counters = module.counters();
        supervisor.add_module(module).unwrap();

        supervisor.start_module("m").unwrap();
        wait_for_state(&supervisor, "m", ModuleState::Running).await;
        supervisor.terminate_module("m").unwrap();
        wait_for_state(&supervisor, "m", ModuleState::Terminated).await;
        wait_for_idle(&supervisor, "m").await;

        supervisor.start_module("m").unwrap();
        wait_for_state(&supervisor, "m", ModuleState::Running).await;
        assert_eq!(counters.run_calls(), 2);
        supervisor.shutdown();
    }

    #[tokio::test]
    async fn stopped_module_restarts() {
        let supervisor = harness();
        let module = ScriptedModule::builder("m").build();
        let counters = module.counters();
        supervisor.add_module(module).unwrap();

        supervisor.start_module("m").unwrap();
        wait_for_state(&supervisor, "m", ModuleState::Running).await;
        supervisor.stop_module("m").unwrap();
        wait_for_idle(&supervisor, "m").await;

        supervisor.start_module("m").unwrap();
        wait_for_state(&supervisor, "m", ModuleState::Running).await;
        assert_eq!(counters.run_calls(), 2);
        supervisor.shutdown();
    }

    #[tokio::test]
    async fn config_update_restarts_only_running_modules() {
        let supervisor = harness();
        let running = ScriptedModule::builder("hot").build();
        let idle = ScriptedModule::builder("cold").build();
        let running_counters = running.counters();
        let idle_counters = idle.counters();
        supervisor.add_module(running).unwrap();
        supervisor.add_module(idle).unwrap();

        supervisor.start_module("hot").unwrap();
        wait_for_state(&supervisor, "hot", ModuleState::Running).await;

        supervisor
            .update_config_from_json(None, &json!({ "engines": { "hot": { "tick": 1 } } }))
            .await
            .unwrap();
        wait_for_state(&supervisor, "hot", ModuleState::Running).await;

        assert_eq!(running_counters.stop_calls(), 1);
        assert_eq!(running_counters.run_calls(), 2);
        assert_eq!(idle_counters.run_calls(), 0);
        supervisor.shutdown();
    }

    #[tokio::test]
    async fn config_update_engine_filter() {
        let supervisor = harness();
        let first = ScriptedModule::builder("alpha").build();
        let second = ScriptedModule::builder("beta").build();
        let first_counters = first.counters();
        let second_counters = second.counters();
        supervisor.add_module(first).unwrap();
        supervisor.add_module(second).unwrap();
        supervisor.start_all();
        wait_for_state(&supervisor, "alpha", ModuleState::Running).await;
        wait_for_state(&supervisor, "beta", ModuleState::Running).await;

        supervisor
            .update_config_from_json(Some("alpha"), &json!({ "engines": {} }))
            .await
            .unwrap();
        wait_for_state(&supervisor, "alpha", ModuleState::Running).await;

        assert_eq!(first_counters.run_calls(), 2);
        assert_eq!(second_counters.run_calls(), 1);
        supervisor.shutdown();
    }

    #[tokio::test]
    async fn concurrent_config_updates_serialize() {
        let supervisor = harness();
        let module = ScriptedModule::builder("m").build();
        let counters = module.counters();
        supervisor.add_module(module).unwrap();
        supervisor.start_module("m").unwrap();
        wait_for_state(&supervisor, "m", ModuleState::Running).await;

        let first_delta = json!({ "engines": { "m": { "tick": 1 } } });
        let second_delta = json!({ "engines": { "m": { "tick": 2 } } });
        let first = supervisor.update_config_from_json(None, &first_delta);
        let second = supervisor.update_config_from_json(None, &second_delta);
        let (first, second) = tokio::join!(first, second);
        first.unwrap();
        second.unwrap();

        // Exactly one stop/start pair per update, never interleaved.
        assert_eq!(counters.stop_calls(), 2);
        assert_eq!(counters.run_calls(), 3);
        assert_eq!(supervisor.state_of("m").unwrap(), ModuleState::Running);
        supervisor.shutdown();
    }

    #[tokio::test]
    async fn rejected_delta_restarts_nothing() {
        let supervisor = harness();
        let module = ScriptedModule::builder("m").build();
        let counters = module.counters();
        supervisor.add_module(module).unwrap();
        supervisor.start_module("m").unwrap();
        wait_for_state(&supervisor, "m", ModuleState::Running).await;

        let err = supervisor
            .update_config_from_json(None, &json!("not an object"))
            .await;
        assert!(matches!(err, Err(SupervisorError::Config(_))));
        assert_eq!(counters.stop_calls(), 0);
        supervisor.shutdown();
    }
}
