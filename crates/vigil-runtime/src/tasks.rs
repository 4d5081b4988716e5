//! Live lifecycle task tracking.
//!
//! One entry per module name, tagged with a monotonically increasing
//! run id. The tag closes the gap between deciding to start a run and
//! receiving its join handle: a run *begins* (claiming liveness) before
//! it is spawned, the handle is *attached* once spawning returns, and
//! the lifecycle task itself reports *finish*. Stale attach/finish
//! calls from an earlier run are ignored by tag mismatch.
//!
//! Invariant: at most one live run per module at any instant.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::task::JoinHandle;

#[derive(Debug)]
struct Entry {
    run_id: u64,
    live: bool,
    handle: Option<JoinHandle<()>>,
}

/// Table of live lifecycle tasks, keyed by module name.
#[derive(Debug, Default)]
pub(crate) struct TaskTable {
    entries: Mutex<HashMap<String, Entry>>,
    next_run: AtomicU64,
}

impl TaskTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Claims a new run for the module. Returns the run id, or `None`
    /// when a run is already live (the caller must not start another).
    pub(crate) fn try_begin(&self, name: &str) -> Option<u64> {
        let mut entries = self.entries.lock();
        if entries.get(name).is_some_and(|entry| entry.live) {
            return None;
        }
        let run_id = self.next_run.fetch_add(1, Ordering::Relaxed);
        entries.insert(
            name.to_string(),
            Entry {
                run_id,
                live: true,
                handle: None,
            },
        );
        Some(run_id)
    }

    /// Attaches the spawned handle to a claimed run. Ignored if the run
    /// already finished or was superseded.
    pub(crate) fn attach(&self, name: &str, run_id: u64, handle: JoinHandle<()>) {
        let mut entries = self.entries.lock();
        if let Some(entry) = entries.get_mut(name) {
            if entry.run_id == run_id && entry.live {
                entry.handle = Some(handle);
            }
        }
    }

    /// Marks a run finished. Ignored for stale run ids.
    pub(crate) fn finish(&self, name: &str, run_id: u64) {
        let mut entries = self.entries.lock();
        if let Some(entry) = entries.get_mut(name) {
            if entry.run_id == run_id {
                entry.live = false;
                entry.handle = None;
            }
        }
    }

    /// Takes the live handle for forced cancellation, clearing
    /// liveness. Returns `None` when the module is idle or the handle
    /// was never attached.
    pub(crate) fn take(&self, name: &str) -> Option<JoinHandle<()>> {
        let mut entries = self.entries.lock();
        let entry = entries.get_mut(name)?;
        entry.live = false;
        entry.handle.take()
    }

    /// Drops the module's entry entirely, returning any live handle.
    pub(crate) fn remove(&self, name: &str) -> Option<JoinHandle<()>> {
        self.entries
            .lock()
            .remove(name)
            .and_then(|entry| entry.handle)
    }

    /// Whether the module currently has a live run.
    pub(crate) fn is_live(&self, name: &str) -> bool {
        self.entries
            .lock()
            .get(name)
            .is_some_and(|entry| entry.live)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_begin_rejected_while_live() {
        let table = TaskTable::new();
        let first = table.try_begin("m");
        assert!(first.is_some());
        assert!(table.try_begin("m").is_none());
        assert!(table.is_live("m"));
    }

    #[test]
    fn finish_releases_the_slot() {
        let table = TaskTable::new();
        let run = table.try_begin("m").unwrap();
        table.finish("m", run);
        assert!(!table.is_live("m"));
        assert!(table.try_begin("m").is_some());
    }

    #[test]
    fn stale_finish_ignored() {
        let table = TaskTable::new();
        let old = table.try_begin("m").unwrap();
        table.finish("m", old);
        let new = table.try_begin("m").unwrap();
        assert_ne!(old, new);
        // A late report from the old run must not kill the new one.
        table.finish("m", old);
        assert!(table.is_live("m"));
    }

    #[tokio::test]
    async fn attach_and_take_round_trip() {
        let table = TaskTable::new();
        let run = table.try_begin("m").unwrap();
        let handle = tokio::spawn(async {
            tokio::time::sleep(std::time::Duration::from_secs(60)).await;
        });
        table.attach("m", run, handle);

        let taken = table.take("m").unwrap();
        assert!(!table.is_live("m"));
        taken.abort();
        assert!(table.take("m").is_none());
    }

    #[tokio::test]
    async fn attach_after_finish_is_dropped() {
        let table = TaskTable::new();
        let run = table.try_begin("m").unwrap();
        // Lifecycle ended before the spawner stored the handle.
        table.finish("m", run);
        let handle = tokio::spawn(async {});
        table.attach("m", run, handle);
        assert!(table.take("m").is_none());
    }

    #[test]
    fn remove_erases_entry() {
        let table = TaskTable::new();
        table.try_begin("m").unwrap();
        table.remove("m");
        assert!(!table.is_live("m"));
    }
}
