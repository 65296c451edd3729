//! Trailing-edge debouncing for asynchronous field validation.
//!
//! Each key (a field's full dotted path) has at most one pending task. A new
//! call for the same key aborts the previous task via `JoinHandle::abort` and
//! takes a fresh generation number. When a task finishes its check it only
//! applies the outcome if its generation is still the current one for that
//! key, so a check that was already running when it got superseded cannot
//! overwrite the newer result.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::errors::{FormError, Result};
use crate::field::ValidationFuture;

struct PendingCheck {
    generation: u64,
    handle: JoinHandle<()>,
}

#[derive(Default)]
struct SchedulerState {
    next_generation: u64,
    pending: HashMap<String, PendingCheck>,
}

/// Cloneable handle to a per-key debounce table.
#[derive(Clone, Default)]
pub struct ValidationScheduler {
    state: Arc<Mutex<SchedulerState>>,
}

impl ValidationScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, SchedulerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `check` after `delay` unless another call for `key` comes first,
    /// then hand its outcome to `apply`.
    ///
    /// `check` is only invoked once the quiet period is over, so superseded
    /// calls never reach the validator. Must be called from within a tokio
    /// runtime.
    pub fn schedule<C, A>(
        &self,
        key: impl Into<String>,
        delay: Duration,
        check: C,
        apply: A,
    ) -> Result<()>
    where
        C: FnOnce() -> ValidationFuture + Send + 'static,
        A: FnOnce(std::result::Result<(), String>) + Send + 'static,
    {
        let runtime = Handle::try_current().map_err(|_| FormError::NoRuntime)?;
        let key = key.into();

        let mut state = self.lock();
        state.next_generation += 1;
        let generation = state.next_generation;
        if let Some(previous) = state.pending.remove(&key) {
            previous.handle.abort();
            trace!(field = %key, generation = previous.generation, "pending validation superseded");
        }

        let scheduler = self.clone();
        let task_key = key.clone();
        let handle = runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            let outcome = check().await;
            if scheduler.finish(&task_key, generation) {
                debug!(field = %task_key, ok = outcome.is_ok(), "validation finished");
                apply(outcome);
            } else {
                debug!(field = %task_key, generation, "stale validation result discarded");
            }
        });
        state.pending.insert(key, PendingCheck { generation, handle });
        Ok(())
    }

    /// Drop the table entry for `key` if it still belongs to `generation`.
    fn finish(&self, key: &str, generation: u64) -> bool {
        let mut state = self.lock();
        match state.pending.get(key) {
            Some(pending) if pending.generation == generation => {
                state.pending.remove(key);
                true
            }
            _ => false,
        }
    }

    /// Abort the pending check for `key`, if any.
    pub fn cancel(&self, key: &str) -> bool {
        match self.lock().pending.remove(key) {
            Some(pending) => {
                pending.handle.abort();
                true
            }
            None => false,
        }
    }

    /// Abort every pending check inside entries `index..` of the group at
    /// `group_path`.
    ///
    /// Used when an entry is removed: the entries after it shift down and
    /// their keys no longer name the right field. Entries before it keep
    /// their checks.
    pub fn cancel_entries_from(&self, group_path: &str, index: usize) -> usize {
        let below = format!("{group_path}.");
        let mut state = self.lock();
        let keys: Vec<String> = state
            .pending
            .keys()
            .filter(|key| {
                key.strip_prefix(&below)
                    .and_then(|rest| rest.split('.').next())
                    .and_then(|entry| entry.parse::<usize>().ok())
                    .is_some_and(|entry| entry >= index)
            })
            .cloned()
            .collect();
        for key in &keys {
            if let Some(pending) = state.pending.remove(key) {
                pending.handle.abort();
            }
        }
        keys.len()
    }

    /// Abort every pending check.
    pub fn cancel_all(&self) {
        let mut state = self.lock();
        if !state.pending.is_empty() {
            debug!(count = state.pending.len(), "aborting pending validations");
        }
        for (_, pending) in state.pending.drain() {
            pending.handle.abort();
        }
    }

    pub fn is_pending(&self, key: &str) -> bool {
        self.lock().pending.contains_key(key)
    }

    pub fn pending_count(&self) -> usize {
        self.lock().pending.len()
    }
}
