//! File watch engine: polls configured paths and notifies on change.
//!
//! Change detection uses a cheap fingerprint (modification time plus
//! byte length) captured on the first scan; later scans compare against
//! the baseline and send one notification per changed or newly
//! appeared path. Notification sends go through the shared worker pool
//! so a slow delivery never stalls the scan loop.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::time::sleep;
use tracing::{debug, warn};
use vigil_module::{
    Capability, InitPayload, LifecycleGate, Module, ModuleDescriptor, ModuleError, ModuleKind,
    ModuleState, Notification, Notifier, NotifyTarget, RunExit, StateCell, StopKind, WorkerSpawner,
};

static DESCRIPTOR: ModuleDescriptor = ModuleDescriptor {
    engine: "file_watch",
    kind: ModuleKind::Event,
    requires: &[Capability::Notify],
};

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileWatchConfig {
    /// Seconds between scans.
    interval_secs: u64,

    /// Paths to watch.
    paths: Vec<PathBuf>,
}

impl Default for FileWatchConfig {
    fn default() -> Self {
        Self {
            interval_secs: 10,
            paths: Vec::new(),
        }
    }
}

/// Modification-time + length fingerprint of one watched path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Fingerprint {
    modified: SystemTime,
    len: u64,
}

fn fingerprint(path: &Path) -> Option<Fingerprint> {
    let meta = std::fs::metadata(path).ok()?;
    Some(Fingerprint {
        modified: meta.modified().ok()?,
        len: meta.len(),
    })
}

struct Settings {
    config: FileWatchConfig,
    notify: NotifyTarget,
    notifier: Arc<dyn Notifier>,
    worker: Arc<dyn WorkerSpawner>,
}

/// Watches configured paths and notifies when their content changes.
#[derive(Default)]
pub struct FileWatchModule {
    gate: LifecycleGate,
    state: StateCell,
    settings: Mutex<Option<Settings>>,
}

impl FileWatchModule {
    fn send_change(settings: &Settings, path: &Path) {
        Self::send(
            settings,
            Notification {
                subject: format!("file changed: {}", path.display()),
                body: format!("a watched path changed on disk: {}", path.display()),
                sender: settings.notify.sender.clone(),
                receivers: settings.notify.receivers.clone(),
            },
        );
    }

    fn send_missing(settings: &Settings, path: &Path) {
        Self::send(
            settings,
            Notification {
                subject: format!("file missing: {}", path.display()),
                body: format!("a watched path disappeared: {}", path.display()),
                sender: settings.notify.sender.clone(),
                receivers: settings.notify.receivers.clone(),
            },
        );
    }

    fn send(settings: &Settings, note: Notification) {
        let notifier = Arc::clone(&settings.notifier);
        settings.worker.spawn_task(
            "file-watch-notify",
            Box::pin(async move {
                if let Err(err) = notifier.notify(note) {
                    warn!(error = %err, "notification failed");
                }
            }),
        );
    }
}

#[async_trait]
impl Module for FileWatchModule {
    fn descriptor(&self) -> &ModuleDescriptor {
        &DESCRIPTOR
    }

    async fn initialize(&self, payload: InitPayload) -> Result<(), ModuleError> {
        let state = self.state.get();
        if state.allows_reconfigure() {
            let config: FileWatchConfig = serde_json::from_value(payload.config)
                .map_err(|err| ModuleError::Config(err.to_string()))?;
            if config.interval_secs == 0 {
                return Err(ModuleError::Config("interval_secs must be positive".into()));
            }
            if config.paths.is_empty() {
                return Err(ModuleError::Config("no paths configured".into()));
            }
            let notify = payload
                .notify
                .ok_or_else(|| ModuleError::Config("notify addresses missing".into()))?;

            *self.settings.lock() = Some(Settings {
                config,
                notify,
                notifier: payload.services.notifier,
                worker: payload.services.worker,
            });
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
        let (interval, paths) = {
            let guard = self.settings.lock();
            let settings = guard
                .as_ref()
                .ok_or_else(|| ModuleError::Execution("run before initialize".into()))?;
            (
                Duration::from_secs(settings.config.interval_secs),
                settings.config.paths.clone(),
            )
        };

        let mut baseline: HashMap<PathBuf, Option<Fingerprint>> = paths
            .iter()
            .map(|path| (path.clone(), fingerprint(path)))
            .collect();

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
                    for path in &paths {
                        let current = fingerprint(path);
                        let previous = baseline.insert(path.clone(), current);
                        match (previous, current) {
                            (Some(old), Some(new)) if old != Some(new) => {
                                debug!(path = %path.display(), "change detected");
                                let guard = self.settings.lock();
                                if let Some(settings) = guard.as_ref() {
                                    Self::send_change(settings, path);
                                }
                            }
                            (Some(Some(_)), None) => {
                                warn!(path = %path.display(), "watched path disappeared");
                                let guard = self.settings.lock();
                                if let Some(settings) = guard.as_ref() {
                                    Self::send_missing(settings, path);
                                }
                            }
                            _ => {}
                        }
                    }
                }
            }
        }
    }

    fn stop(&self) {
        self.gate.request_stop();
    }

    fn terminate(&self) -> Result<(), ModuleError> {
        self.gate.request_terminate();
        // Settings survive terminate so a later restart can reuse them;
        // initialize skips the update while terminated.
        self.state.set(ModuleState::Terminated);
        Ok(())
    }

    fn status(&self) -> ModuleState {
        self.state.get()
    }
}
