//! Heartbeat engine: periodic liveness beats in the log stream.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Deserialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};
use vigil_module::{
    InitPayload, LifecycleGate, Module, ModuleDescriptor, ModuleError, ModuleKind, ModuleState,
    RunExit, StateCell, StopKind,
};

static DESCRIPTOR: ModuleDescriptor = ModuleDescriptor {
    engine: "heartbeat",
    kind: ModuleKind::Batch,
    requires: &[],
};

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct HeartbeatConfig {
    /// Seconds between beats.
    interval_secs: u64,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self { interval_secs: 5 }
    }
}

/// Emits one liveness beat per configured interval.
#[derive(Debug, Default)]
pub struct HeartbeatModule {
    gate: LifecycleGate,
    state: StateCell,
    settings: Mutex<HeartbeatConfig>,
    beats: AtomicU64,
}

impl HeartbeatModule {
    /// Total beats emitted across all runs.
    #[must_use]
    pub fn beats(&self) -> u64 {
        self.beats.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Module for HeartbeatModule {
    fn descriptor(&self) -> &ModuleDescriptor {
        &DESCRIPTOR
    }

    async fn initialize(&self, payload: InitPayload) -> Result<(), ModuleError> {
        let state = self.state.get();
        if state.allows_reconfigure() {
            let config: HeartbeatConfig = if payload.config.is_null() {
                HeartbeatConfig::default()
            } else {
                serde_json::from_value(payload.config)
                    .map_err(|err| ModuleError::Config(err.to_string()))?
            };
            if config.interval_secs == 0 {
                return Err(ModuleError::Config("interval_secs must be positive".into()));
            }
            *self.settings.lock() = config;
        } else {
            // Keep the current settings; the restart still proceeds.
            warn!(%state, "configuration update skipped");
        }

        self.gate.rearm();
        self.state.set(ModuleState::Initialized);
        Ok(())
    }

    async fn run(&self) -> Result<RunExit, ModuleError> {
        self.state.set(ModuleState::Running);
        let interval = Duration::from_secs(self.settings.lock().interval_secs);

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
                _ = sleep(interval) => {
                    let beat = self.beats.fetch_add(1, Ordering::SeqCst) + 1;
                    info!(beat, "heartbeat");
                }
            }
        }
    }

    fn stop(&self) {
        self.gate.request_stop();
    }

    fn terminate(&self) -> Result<(), ModuleError> {
        self.gate.request_terminate();
        self.state.set(ModuleState::Terminated);
        Ok(())
    }

    fn status(&self) -> ModuleState {
        self.state.get()
    }
}
