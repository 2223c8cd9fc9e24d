//! Reconciliation engine for the local and remote task stores.
//!
//! # Responsibility
//! - Merge local and remote sets, replay unsynced tasks, write the merged
//!   view back to the local store.
//! - Create tasks with a duplicate-submission guard on the remote side.
//! - Publish every merged set to presentation subscribers.
//!
//! # Invariants
//! - Passes never overlap: `reconcile` and `add_task` share one guard.
//! - Only local store failures escape a pass. Remote failures degrade to
//!   the offline path or leave individual tasks unsynced.
//! - A task's `synced` flag never goes from true to false within a pass.
//! - Every remote call is bounded by `SyncOptions::remote_timeout`.

use super::connectivity::ConnectivityMonitor;
use super::merge::merge_task_sets;
use crate::model::task::{NewTask, Task, TaskId, TaskValidationError};
use crate::remote::{RemoteError, RemoteResult, RemoteTaskStore};
use crate::repo::task_repo::{LocalTaskStore, RepoError};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{watch, Mutex};

const DEFAULT_REMOTE_TIMEOUT: Duration = Duration::from_secs(10);

pub type SyncResult<T> = Result<T, SyncError>;

/// Failures that abort an engine operation.
#[derive(Debug)]
pub enum SyncError {
    InvalidTask(TaskValidationError),
    /// Local durability is mandatory, so local failures are fatal.
    Local(RepoError),
}

impl Display for SyncError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTask(err) => write!(f, "invalid task: {err}"),
            Self::Local(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SyncError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidTask(err) => Some(err),
            Self::Local(err) => Some(err),
        }
    }
}

impl From<RepoError> for SyncError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::InvalidTask(err),
            other => Self::Local(other),
        }
    }
}

impl From<TaskValidationError> for SyncError {
    fn from(value: TaskValidationError) -> Self {
        Self::InvalidTask(value)
    }
}

/// Engine tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOptions {
    /// Upper bound for each remote call; a timeout counts as a failure.
    pub remote_timeout: Duration,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            remote_timeout: DEFAULT_REMOTE_TIMEOUT,
        }
    }
}

/// How a pass reached (or did not reach) the remote store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassMode {
    /// Monitor reported offline or no remote is configured.
    Offline,
    /// Online, but listing remote tasks failed; local data was kept.
    RemoteUnreachable,
    Online,
}

/// Outcome of one reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Authoritative task set for presentation.
    pub tasks: Vec<Task>,
    pub mode: PassMode,
    pub uploaded: usize,
    pub upload_failures: usize,
    pub local_write_failures: usize,
    pub finished_at: DateTime<Utc>,
}

impl ReconcileReport {
    fn local_only(tasks: Vec<Task>, mode: PassMode) -> Self {
        Self {
            tasks,
            mode,
            uploaded: 0,
            upload_failures: 0,
            local_write_failures: 0,
            finished_at: Utc::now(),
        }
    }

    /// Number of tasks still waiting for a remote write.
    pub fn pending_count(&self) -> usize {
        self.tasks.iter().filter(|task| task.is_pending_upload()).count()
    }
}

/// What happened to the remote copy of a newly added task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteWrite {
    Inserted,
    /// A remote task with the same content already existed; its identity
    /// was adopted instead of inserting a second document.
    Duplicate(TaskId),
    /// Offline or the remote call failed; the next pass will retry.
    Deferred,
}

/// Result of [`TaskSyncEngine::add_task`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddTaskOutcome {
    /// The task as stored locally.
    pub task: Task,
    pub remote_write: RemoteWrite,
    /// The refresh pass run after the insert.
    pub report: ReconcileReport,
}

/// Coordinates the local store, the remote store and connectivity.
pub struct TaskSyncEngine {
    local: Arc<dyn LocalTaskStore>,
    remote: Option<Arc<dyn RemoteTaskStore>>,
    connectivity: Arc<ConnectivityMonitor>,
    options: SyncOptions,
    pass_guard: Mutex<()>,
    published: watch::Sender<Arc<Vec<Task>>>,
}

impl TaskSyncEngine {
    /// Creates an engine. `remote = None` runs in permanent offline mode.
    pub fn new(
        local: Arc<dyn LocalTaskStore>,
        remote: Option<Arc<dyn RemoteTaskStore>>,
        connectivity: Arc<ConnectivityMonitor>,
        options: SyncOptions,
    ) -> Self {
        let (published, _) = watch::channel(Arc::new(Vec::new()));
        Self {
            local,
            remote,
            connectivity,
            options,
            pass_guard: Mutex::new(()),
            published,
        }
    }

    pub fn connectivity(&self) -> &Arc<ConnectivityMonitor> {
        &self.connectivity
    }

    pub fn options(&self) -> SyncOptions {
        self.options
    }

    /// Subscribes to merged task sets published after each pass.
    pub fn subscribe_tasks(&self) -> watch::Receiver<Arc<Vec<Task>>> {
        self.published.subscribe()
    }

    /// Last published merged set.
    pub fn current_tasks(&self) -> Arc<Vec<Task>> {
        self.published.borrow().clone()
    }

    /// Time the last online pass with no upload or write-back failures
    /// finished, as recorded locally.
    pub fn last_synced_at(&self) -> SyncResult<Option<DateTime<Utc>>> {
        Ok(self.local.last_sync_checkpoint()?)
    }

    /// Runs one reconciliation pass.
    ///
    /// Waits for any in-flight pass to finish first.
    ///
    /// # Errors
    /// - `SyncError::Local` when the local full scan fails. Callers should
    ///   keep presenting the data they already have.
    pub async fn reconcile(&self) -> SyncResult<ReconcileReport> {
        let _pass = self.pass_guard.lock().await;
        self.reconcile_locked().await
    }

    /// Creates a task from user input and refreshes the merged set.
    ///
    /// # Contract
    /// - `synced` starts as the current online status.
    /// - Online: the remote set is checked for a task with identical
    ///   title, date and completion; a match is adopted instead of
    ///   inserting a duplicate document.
    /// - The task is always written locally.
    pub async fn add_task(&self, candidate: NewTask) -> SyncResult<AddTaskOutcome> {
        let _pass = self.pass_guard.lock().await;

        let remote = self.online_remote();
        let mut task = Task::create(candidate, remote.is_some());
        task.validate()?;

        let remote_write = match remote {
            Some(remote) => self.insert_remote_once(remote.as_ref(), &mut task).await,
            None => RemoteWrite::Deferred,
        };

        self.local.put_task(&task)?;
        info!(
            "event=task_add module=sync status=ok task_id={} synced={} remote_write={:?}",
            task.id, task.synced, remote_write
        );

        let report = self.reconcile_locked().await?;
        Ok(AddTaskOutcome {
            task,
            remote_write,
            report,
        })
    }

    async fn insert_remote_once(
        &self,
        remote: &dyn RemoteTaskStore,
        task: &mut Task,
    ) -> RemoteWrite {
        let existing = match self.bounded(remote.get_all()).await {
            Ok(existing) => existing,
            Err(err) => {
                warn!(
                    "event=task_add module=sync status=skip stage=remote_list task_id={} error_code={} error={}",
                    task.id,
                    err.code(),
                    err
                );
                task.synced = false;
                return RemoteWrite::Deferred;
            }
        };

        if let Some(duplicate) = existing.into_iter().find(|doc| doc.same_content(task)) {
            info!(
                "event=task_add module=sync status=skip stage=remote_insert reason=duplicate existing_id={}",
                duplicate.id
            );
            let duplicate_id = duplicate.id;
            *task = Task {
                synced: true,
                ..duplicate
            };
            return RemoteWrite::Duplicate(duplicate_id);
        }

        match self.bounded(remote.put_task(task)).await {
            Ok(()) => RemoteWrite::Inserted,
            Err(err) => {
                warn!(
                    "event=task_add module=sync status=skip stage=remote_insert task_id={} error_code={} error={}",
                    task.id,
                    err.code(),
                    err
                );
                task.synced = false;
                RemoteWrite::Deferred
            }
        }
    }

    async fn reconcile_locked(&self) -> SyncResult<ReconcileReport> {
        let started_at = Instant::now();
        let local_tasks = match self.local.get_all() {
            Ok(tasks) => tasks,
            Err(err) => {
                error!(
                    "event=reconcile module=sync status=error stage=local_read error={}",
                    err
                );
                return Err(err.into());
            }
        };

        let Some(remote) = self.online_remote() else {
            let report = ReconcileReport::local_only(local_tasks, PassMode::Offline);
            return Ok(self.finish(report, started_at));
        };

        let remote_tasks = match self.bounded(remote.get_all()).await {
            Ok(tasks) => tasks,
            Err(err) => {
                warn!(
                    "event=reconcile module=sync status=skip stage=remote_read error_code={} error={}",
                    err.code(),
                    err
                );
                let report =
                    ReconcileReport::local_only(local_tasks, PassMode::RemoteUnreachable);
                return Ok(self.finish(report, started_at));
            }
        };

        let mut merged = merge_task_sets(local_tasks, remote_tasks);
        let (uploaded, upload_failures) =
            self.upload_pending(remote.as_ref(), &mut merged).await;
        let local_write_failures = self.write_back(&merged);

        let report = ReconcileReport {
            tasks: merged,
            mode: PassMode::Online,
            uploaded,
            upload_failures,
            local_write_failures,
            finished_at: Utc::now(),
        };

        if report.upload_failures == 0 && report.local_write_failures == 0 {
            if let Err(err) = self.local.record_sync_checkpoint(report.finished_at) {
                warn!(
                    "event=reconcile module=sync status=skip stage=checkpoint error={}",
                    err
                );
            }
        }

        Ok(self.finish(report, started_at))
    }

    /// Uploads every unsynced task concurrently and flags the successes.
    ///
    /// Returns `(uploaded, failed)`.
    async fn upload_pending(
        &self,
        remote: &dyn RemoteTaskStore,
        merged: &mut [Task],
    ) -> (usize, usize) {
        let uploads: Vec<Task> = merged
            .iter()
            .filter(|task| task.is_pending_upload())
            .map(|task| Task {
                synced: true,
                ..task.clone()
            })
            .collect();
        if uploads.is_empty() {
            return (0, 0);
        }

        let results =
            join_all(uploads.iter().map(|task| self.bounded(remote.put_task(task)))).await;

        let mut uploaded = 0;
        let mut failed = 0;
        for (task, result) in uploads.iter().zip(results) {
            match result {
                Ok(()) => {
                    if let Some(entry) = merged.iter_mut().find(|entry| entry.id == task.id) {
                        entry.synced = true;
                    }
                    uploaded += 1;
                }
                Err(err) => {
                    warn!(
                        "event=task_upload module=sync status=skip task_id={} error_code={} error={}",
                        task.id,
                        err.code(),
                        err
                    );
                    failed += 1;
                }
            }
        }
        (uploaded, failed)
    }

    /// Persists the merged view locally, skipping tasks that fail.
    fn write_back(&self, merged: &[Task]) -> usize {
        let mut failures = 0;
        for task in merged {
            if let Err(err) = self.local.put_task(task) {
                error!(
                    "event=task_write_back module=sync status=error task_id={} error={}",
                    task.id, err
                );
                failures += 1;
            }
        }
        failures
    }

    fn finish(&self, report: ReconcileReport, started_at: Instant) -> ReconcileReport {
        info!(
            "event=reconcile module=sync status=ok mode={:?} tasks={} uploaded={} upload_failures={} local_write_failures={} pending={} duration_ms={}",
            report.mode,
            report.tasks.len(),
            report.uploaded,
            report.upload_failures,
            report.local_write_failures,
            report.pending_count(),
            started_at.elapsed().as_millis()
        );
        self.published.send_replace(Arc::new(report.tasks.clone()));
        report
    }

    fn online_remote(&self) -> Option<Arc<dyn RemoteTaskStore>> {
        if !self.connectivity.is_online() {
            return None;
        }
        self.remote.clone()
    }

    async fn bounded<T>(
        &self,
        call: impl Future<Output = RemoteResult<T>>,
    ) -> RemoteResult<T> {
        let limit = self.options.remote_timeout;
        tokio::time::timeout(limit, call)
            .await
            .unwrap_or(Err(RemoteError::Timeout(limit)))
    }
}
