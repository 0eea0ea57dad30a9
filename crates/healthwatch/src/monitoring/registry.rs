use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::task::JoinHandle;
use tracing::debug;

use crate::models::ServiceStatus;

struct TimerEntry {
    generation: u64,
    handle: JoinHandle<()>,
    last_status: ServiceStatus,
}

/// State store: service id -> active timer and last known status.
///
/// Holding an entry is the only thing that means "this service is being
/// monitored"; the persisted status field is advisory. At most one entry
/// exists per id. Each entry carries a generation so a timer task can only
/// ever touch its own entry, never one armed after it was cancelled.
#[derive(Default)]
pub struct TimerRegistry {
    entries: Mutex<HashMap<String, TimerEntry>>,
    next_generation: AtomicU64,
}

impl TimerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, TimerEntry>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries().contains_key(id)
    }

    /// Arm a timer for `id` unless one already exists.
    ///
    /// `spawn` receives the entry's generation and runs under the registry
    /// lock, so two concurrent callers can never both arm a timer.
    pub fn arm_with<F>(&self, id: &str, status: ServiceStatus, spawn: F) -> bool
    where
        F: FnOnce(u64) -> JoinHandle<()>,
    {
        let mut entries = self.entries();
        if entries.contains_key(id) {
            return false;
        }

        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let handle = spawn(generation);
        entries.insert(id.to_string(), TimerEntry { generation, handle, last_status: status });
        true
    }

    /// Cancel and remove the timer for `id`; false when none was armed
    pub fn cancel(&self, id: &str) -> bool {
        match self.entries().remove(id) {
            Some(entry) => {
                entry.handle.abort();
                true
            }
            None => false,
        }
    }

    /// Cancel every timer, returning how many were armed
    pub fn cancel_all(&self) -> usize {
        let drained: Vec<_> = self.entries().drain().collect();
        for (id, entry) in &drained {
            debug!(service_id = %id, "cancelling timer");
            entry.handle.abort();
        }
        drained.len()
    }

    /// Drop the entry of a timer that is retiring on its own
    pub(crate) fn retire(&self, id: &str, generation: u64) {
        let mut entries = self.entries();
        if entries.get(id).is_some_and(|e| e.generation == generation) {
            entries.remove(id);
        }
    }

    pub(crate) fn record_status(&self, id: &str, generation: u64, status: ServiceStatus) {
        if let Some(entry) = self.entries().get_mut(id).filter(|e| e.generation == generation) {
            entry.last_status = status;
        }
    }

    pub fn last_status(&self, id: &str) -> Option<ServiceStatus> {
        self.entries().get(id).map(|e| e.last_status)
    }

    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<_> = self.entries().keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
