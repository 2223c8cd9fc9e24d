//! Core domain logic for DayTask.
//! Offline-first task storage and the local/remote reconciliation engine.

pub mod app;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod remote;
pub mod repo;
pub mod sync;
pub mod view;

pub use app::state::{BoardAction, BoardState, DraftError, TaskDraft};
pub use config::{ConfigError, CoreConfig};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::session::{ProfileSummary, UserSession};
pub use model::task::{NewTask, Task, TaskId, TaskValidationError};
pub use remote::{
    HttpRemoteStore, HttpRemoteStoreConfig, MemoryRemoteStore, RemoteError, RemoteResult,
    RemoteTaskStore,
};
pub use repo::task_repo::{LocalTaskStore, RepoError, RepoResult, SqliteTaskStore};
pub use sync::connectivity::{ConnectivityEvent, ConnectivityMonitor, ConnectivitySubscription};
pub use sync::engine::{
    AddTaskOutcome, PassMode, ReconcileReport, RemoteWrite, SyncError, SyncOptions, SyncResult,
    TaskSyncEngine,
};
pub use sync::merge::merge_task_sets;
pub use sync::notify::{LogNotifier, Notice, Notifier};
pub use sync::runtime::SyncRuntime;
pub use view::format::{bucket_label, task_line, SyncStatus};
pub use view::grouping::{group_by_date, BucketKey, TaskGroups};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
