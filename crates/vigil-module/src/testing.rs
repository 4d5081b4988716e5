//! Testing harness for supervisor and dispatcher tests.
//!
//! [`ScriptedModule`] is a fully-featured [`Module`] whose behaviour is
//! chosen at construction time: it can run forever, fail during
//! `initialize` or `run`, or ignore the cooperative stop signal. Every
//! lifecycle call is counted so tests can assert exactly what the
//! supervisor invoked.
//!
//! # Example
//!
//! ```
//! use vigil_module::testing::ScriptedModule;
//! use vigil_module::{Module, ModuleState};
//!
//! let module = ScriptedModule::builder("demo").build();
//! assert_eq!(module.counters().init_calls(), 0);
//! assert_eq!(module.status(), ModuleState::Created);
//! ```

use crate::{
    Capability, InitPayload, LifecycleGate, Module, ModuleDescriptor, ModuleError, ModuleKind,
    ModuleState, RunExit, StateCell, StopKind,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

// Leaked descriptors live for the process lifetime, matching the
// static descriptors of real modules. Test processes register a
// handful of modules, so the leak is bounded.
fn leak_descriptor(engine: &str, kind: ModuleKind, notify: bool) -> &'static ModuleDescriptor {
    let requires: &'static [Capability] = if notify {
        &[Capability::Notify]
    } else {
        &[]
    };
    Box::leak(Box::new(ModuleDescriptor {
        engine: Box::leak(engine.to_owned().into_boxed_str()),
        kind,
        requires,
    }))
}

/// Observable lifecycle counters, shared with all clones.
#[derive(Debug, Default)]
pub struct Counters {
    init: AtomicUsize,
    run: AtomicUsize,
    stop: AtomicUsize,
    terminate: AtomicUsize,
    cleaned_up: AtomicBool,
}

impl Counters {
    /// Number of `initialize` invocations.
    pub fn init_calls(&self) -> usize {
        self.init.load(Ordering::SeqCst)
    }

    /// Number of `run` invocations.
    pub fn run_calls(&self) -> usize {
        self.run.load(Ordering::SeqCst)
    }

    /// Number of `stop` invocations.
    pub fn stop_calls(&self) -> usize {
        self.stop.load(Ordering::SeqCst)
    }

    /// Number of `terminate` invocations.
    pub fn terminate_calls(&self) -> usize {
        self.terminate.load(Ordering::SeqCst)
    }

    /// `true` once `terminate` released the module's resources.
    pub fn cleaned_up(&self) -> bool {
        self.cleaned_up.load(Ordering::SeqCst)
    }
}

/// Builder for [`ScriptedModule`].
pub struct ScriptedModuleBuilder {
    engine: String,
    kind: ModuleKind,
    requires_notify: bool,
    fail_init: bool,
    fail_run: bool,
    ignore_stop: bool,
    tick: Duration,
}

impl ScriptedModuleBuilder {
    /// `initialize` fails with a config error.
    #[must_use]
    pub fn fail_on_init(mut self) -> Self {
        self.fail_init = true;
        self
    }

    /// `run` fails with an execution error after one tick.
    #[must_use]
    pub fn fail_on_run(mut self) -> Self {
        self.fail_run = true;
        self
    }

    /// The main loop never checks the cooperative stop signal; only a
    /// forced terminate ends it.
    #[must_use]
    pub fn ignore_stop(mut self) -> Self {
        self.ignore_stop = true;
        self
    }

    /// Declares the notify capability requirement.
    #[must_use]
    pub fn requires_notify(mut self) -> Self {
        self.requires_notify = true;
        self
    }

    /// Work-cycle interval (default 10ms, kept short for tests).
    #[must_use]
    pub fn tick(mut self, tick: Duration) -> Self {
        self.tick = tick;
        self
    }

    /// Category tag (default [`ModuleKind::Batch`]).
    #[must_use]
    pub fn kind(mut self, kind: ModuleKind) -> Self {
        self.kind = kind;
        self
    }

    /// Builds the module wrapped in an `Arc` for registration.
    #[must_use]
    pub fn build(self) -> Arc<ScriptedModule> {
        Arc::new(ScriptedModule {
            descriptor: leak_descriptor(&self.engine, self.kind, self.requires_notify),
            gate: LifecycleGate::new(),
            state: StateCell::new(),
            counters: Arc::new(Counters::default()),
            last_payload: Mutex::new(None),
            fail_init: self.fail_init,
            fail_run: self.fail_run,
            ignore_stop: self.ignore_stop,
            tick: self.tick,
        })
    }
}

/// Scriptable module for lifecycle tests.
pub struct ScriptedModule {
    descriptor: &'static ModuleDescriptor,
    gate: LifecycleGate,
    state: StateCell,
    counters: Arc<Counters>,
    last_payload: Mutex<Option<InitPayload>>,
    fail_init: bool,
    fail_run: bool,
    ignore_stop: bool,
    tick: Duration,
}

impl ScriptedModule {
    /// Starts a builder for a module with the given engine name.
    #[must_use]
    pub fn builder(engine: &str) -> ScriptedModuleBuilder {
        ScriptedModuleBuilder {
            engine: engine.to_ascii_lowercase(),
            kind: ModuleKind::Batch,
            requires_notify: false,
            fail_init: false,
            fail_run: false,
            ignore_stop: false,
            tick: Duration::from_millis(10),
        }
    }

    /// Shared lifecycle counters.
    #[must_use]
    pub fn counters(&self) -> Arc<Counters> {
        Arc::clone(&self.counters)
    }

    /// The payload received by the last `initialize` call, if any.
    #[must_use]
    pub fn last_payload(&self) -> Option<InitPayload> {
        self.last_payload.lock().clone()
    }
}

#[async_trait]
impl Module for ScriptedModule {
    fn descriptor(&self) -> &ModuleDescriptor {
        self.descriptor
    }

    async fn initialize(&self, payload: InitPayload) -> Result<(), ModuleError> {
        self.counters.init.fetch_add(1, Ordering::SeqCst);
        if self.fail_init {
            return Err(ModuleError::Config("scripted init failure".into()));
        }
        let state = self.state.get();
        if state.allows_reconfigure() {
            *self.last_payload.lock() = Some(payload);
        } else {
            warn!(engine = self.descriptor.engine, %state, "configuration update skipped");
        }
        self.gate.rearm();
        self.state.set(ModuleState::Initialized);
        Ok(())
    }

    async fn run(&self) -> Result<RunExit, ModuleError> {
        self.counters.run.fetch_add(1, Ordering::SeqCst);
        self.state.set(ModuleState::Running);

        if self.fail_run {
            sleep(self.tick).await;
            self.state.set(ModuleState::Failed);
            return Err(ModuleError::Execution("scripted run failure".into()));
        }

        if self.ignore_stop {
            // Never observes the gate; only an abort of the lifecycle
            // task (forced terminate) ends this loop.
            loop {
                sleep(self.tick).await;
            }
        }

        loop {
            tokio::select! {
                kind = self.gate.cancelled() => {
                    return Ok(match kind {
                        StopKind::Stop => {
                            self.state.set(ModuleState::Stopped);
                            RunExit::Stopped
                        }
                        StopKind::Terminate => RunExit::Finished,
                    });
                }
                _ = sleep(self.tick) => {
                    // one unit of scripted work
                }
            }
        }
    }

    fn stop(&self) {
        self.counters.stop.fetch_add(1, Ordering::SeqCst);
        self.gate.request_stop();
    }

    fn terminate(&self) -> Result<(), ModuleError> {
        self.counters.terminate.fetch_add(1, Ordering::SeqCst);
        self.gate.request_terminate();
        self.counters.cleaned_up.store(true, Ordering::SeqCst);
        self.state.set(ModuleState::Terminated);
        Ok(())
    }

    fn status(&self) -> ModuleState {
        self.state.get()
    }
}
