//! Executor pool: per-module lanes and the shared worker pool.
//!
//! Concurrency domains are isolated so one module's blocking or
//! runaway behaviour cannot stall another module's lifecycle:
//!
//! - **Lane**: a single-worker runtime with a named, dedicated thread,
//!   created on a module's first start and destroyed on removal. The
//!   module's whole lifecycle task runs there and may block freely.
//! - **Worker pool**: one shared runtime sized
//!   `max(available_parallelism / 2, 1)`, used by any module for short
//!   subtasks so its lane stays free to continue the main loop.
//!
//! The pool is constructed exactly once by the composition root and
//! passed by `Arc`; it outlives every individual module. Teardown uses
//! a bounded wait before escalating to forced shutdown and never
//! blocks indefinitely.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::runtime::{Builder, Handle, Runtime};
use tracing::{debug, error, info, warn};
use vigil_module::{WorkerFuture, WorkerSpawner};

/// Bounded wait before a lane or the worker pool is forcibly shut down.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

/// A module's dedicated single-worker execution lane.
struct Lane {
    runtime: Runtime,
}

impl Lane {
    fn build(name: &str) -> std::io::Result<Self> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name(format!("lane-{name}"))
            .enable_all()
            .build()?;
        Ok(Self { runtime })
    }

    fn handle(&self) -> Handle {
        self.runtime.handle().clone()
    }
}

/// Handle onto the shared worker pool, injected into modules.
#[derive(Clone)]
pub struct WorkerHandle {
    handle: Handle,
}

impl WorkerSpawner for WorkerHandle {
    fn spawn_task(&self, label: &str, fut: WorkerFuture) {
        debug!(task = label, "submitting worker task");
        self.handle.spawn(fut);
    }
}

/// Per-module lanes plus the shared worker pool.
///
/// Single instance per process; see the crate docs for the ownership
/// model.
pub struct ExecutorPool {
    lanes: Mutex<HashMap<String, Lane>>,
    worker: Mutex<Option<Runtime>>,
    worker_handle: Handle,
    worker_threads: usize,
}

impl ExecutorPool {
    /// Builds the pool: no lanes yet, worker pool sized from host
    /// parallelism.
    ///
    /// # Errors
    ///
    /// Propagates runtime construction failures.
    pub fn new() -> std::io::Result<Self> {
        let parallelism = std::thread::available_parallelism()
            .map(std::num::NonZeroUsize::get)
            .unwrap_or(2);
        let worker_threads = (parallelism / 2).max(1);

        let worker = Builder::new_multi_thread()
            .worker_threads(worker_threads)
            .thread_name("vigil-worker")
            .enable_all()
            .build()?;
        let worker_handle = worker.handle().clone();

        info!(worker_threads, "executor pool initialized");
        Ok(Self {
            lanes: Mutex::new(HashMap::new()),
            worker: Mutex::new(Some(worker)),
            worker_handle,
            worker_threads,
        })
    }

    /// Idempotently returns the handle of the named module's lane,
    /// creating the lane if absent.
    ///
    /// # Errors
    ///
    /// Propagates runtime construction failures for a new lane.
    pub fn lane(&self, name: &str) -> std::io::Result<Handle> {
        let mut lanes = self.lanes.lock();
        if let Some(lane) = lanes.get(name) {
            debug!(lane = name, "reusing existing lane");
            return Ok(lane.handle());
        }
        let lane = Lane::build(name)?;
        let handle = lane.handle();
        lanes.insert(name.to_string(), lane);
        info!(lane = name, "lane created");
        Ok(handle)
    }

    /// Destroys the named module's lane: graceful bounded wait, then
    /// forced shutdown.
    pub fn remove_lane(&self, name: &str) {
        let lane = self.lanes.lock().remove(name);
        match lane {
            Some(lane) => {
                shutdown_runtime(&format!("lane-{name}"), lane.runtime);
                info!(lane = name, "lane removed");
            }
            None => warn!(lane = name, "no lane to remove"),
        }
    }

    /// Returns the shared worker pool as a module-facing spawner.
    #[must_use]
    pub fn worker(&self) -> WorkerHandle {
        WorkerHandle {
            handle: self.worker_handle.clone(),
        }
    }

    /// Number of threads in the shared worker pool.
    #[must_use]
    pub fn worker_threads(&self) -> usize {
        self.worker_threads
    }

    /// Number of live lanes.
    #[must_use]
    pub fn lane_count(&self) -> usize {
        self.lanes.lock().len()
    }

    /// Shuts down every lane and the shared worker pool.
    ///
    /// Process-wide teardown, invoked once. Each executor gets the same
    /// bounded-wait-then-force policy; a failure to quiesce is logged
    /// and teardown of the remaining executors continues regardless.
    pub fn shutdown(&self) {
        info!("executor pool shutdown started");

        let lanes: Vec<(String, Lane)> = self.lanes.lock().drain().collect();
        for (name, lane) in lanes {
            shutdown_runtime(&format!("lane-{name}"), lane.runtime);
        }

        if let Some(worker) = self.worker.lock().take() {
            shutdown_runtime("vigil-worker", worker);
        }

        info!("executor pool shutdown complete");
    }
}

impl Drop for ExecutorPool {
    fn drop(&mut self) {
        // Fallback for pools dropped without an explicit shutdown():
        // background shutdown is non-blocking and safe from async
        // context, at the cost of the bounded-wait reporting.
        let lanes: Vec<Lane> = self.lanes.lock().drain().map(|(_, lane)| lane).collect();
        for lane in lanes {
            lane.runtime.shutdown_background();
        }
        if let Some(worker) = self.worker.lock().take() {
            worker.shutdown_background();
        }
    }
}

/// Bounded-wait-then-force shutdown of one runtime.
///
/// The runtime is moved to a dedicated thread so the caller may sit on
/// an async executor thread; the join is bounded by `SHUTDOWN_GRACE`.
fn shutdown_runtime(label: &str, runtime: Runtime) {
    let started = Instant::now();
    let joined = std::thread::spawn(move || runtime.shutdown_timeout(SHUTDOWN_GRACE)).join();

    if joined.is_err() {
        error!(executor = label, "shutdown thread panicked");
        return;
    }
    let elapsed = started.elapsed();
    if elapsed >= SHUTDOWN_GRACE {
        error!(
            executor = label,
            grace_secs = SHUTDOWN_GRACE.as_secs(),
            "executor failed to quiesce within grace period, forced shutdown"
        );
    } else {
        debug!(
            executor = label,
            elapsed_ms = elapsed.as_millis() as u64,
            "executor shut down cleanly"
        );
    }
}
