//! In-process remote store.
//!
//! Backs tests and offline demos. Reachability and per-task failures can be
//! injected to exercise the engine's degraded paths.

use super::{RemoteError, RemoteResult, RemoteTaskStore};
use crate::model::task::{Task, TaskId};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct MemoryState {
    documents: BTreeMap<TaskId, Task>,
    unreachable: bool,
    failing_writes: HashSet<TaskId>,
    hanging_writes: HashSet<TaskId>,
}

/// Remote store kept in memory with failure injection hooks.
#[derive(Default)]
pub struct MemoryRemoteStore {
    state: Mutex<MemoryState>,
    put_calls: AtomicUsize,
    get_all_calls: AtomicUsize,
}

impl MemoryRemoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with the given documents.
    pub fn with_tasks(tasks: impl IntoIterator<Item = Task>) -> Self {
        let store = Self::new();
        {
            let mut state = store.state();
            for task in tasks {
                state.documents.insert(task.id, task);
            }
        }
        store
    }

    /// Makes every call fail with `RemoteError::Unavailable` while false.
    pub fn set_reachable(&self, reachable: bool) {
        self.state().unreachable = !reachable;
    }

    /// Rejects writes for one task id until cleared.
    pub fn fail_writes_for(&self, id: TaskId) {
        self.state().failing_writes.insert(id);
    }

    /// Never completes writes for one task id until cleared.
    pub fn hang_writes_for(&self, id: TaskId) {
        self.state().hanging_writes.insert(id);
    }

    pub fn clear_write_faults(&self) {
        let mut state = self.state();
        state.failing_writes.clear();
        state.hanging_writes.clear();
    }

    /// Returns stored documents ordered by id.
    pub fn documents(&self) -> Vec<Task> {
        self.state().documents.values().cloned().collect()
    }

    pub fn document(&self, id: TaskId) -> Option<Task> {
        self.state().documents.get(&id).cloned()
    }

    pub fn put_calls(&self) -> usize {
        self.put_calls.load(Ordering::SeqCst)
    }

    pub fn get_all_calls(&self) -> usize {
        self.get_all_calls.load(Ordering::SeqCst)
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        // state stays consistent even if a holder panicked: every mutation
        // is a single collection operation
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl RemoteTaskStore for MemoryRemoteStore {
    async fn put_task(&self, task: &Task) -> RemoteResult<()> {
        self.put_calls.fetch_add(1, Ordering::SeqCst);

        let hang = {
            let mut state = self.state();
            if state.unreachable {
                return Err(RemoteError::Unavailable("memory store offline".to_string()));
            }
            if state.failing_writes.contains(&task.id) {
                return Err(RemoteError::WriteFailed {
                    status: None,
                    message: format!("injected failure for {}", task.id),
                });
            }
            let hang = state.hanging_writes.contains(&task.id);
            if !hang {
                state.documents.insert(task.id, task.clone());
            }
            hang
        };

        if hang {
            std::future::pending::<()>().await;
        }
        Ok(())
    }

    async fn get_all(&self) -> RemoteResult<Vec<Task>> {
        self.get_all_calls.fetch_add(1, Ordering::SeqCst);

        let state = self.state();
        if state.unreachable {
            return Err(RemoteError::Unavailable("memory store offline".to_string()));
        }
        Ok(state.documents.values().cloned().collect())
    }
}
