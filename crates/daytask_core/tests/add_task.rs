use chrono::{Duration, TimeZone, Utc};
use daytask_core::db::open_db_in_memory;
use daytask_core::{
    ConnectivityMonitor, LocalTaskStore, MemoryRemoteStore, NewTask, PassMode, RemoteWrite,
    SqliteTaskStore, SyncError, SyncOptions, TaskSyncEngine, TaskValidationError,
};
use std::sync::Arc;

#[tokio::test]
async fn offline_add_stays_local_and_unsynced() {
    let (local, remote, engine) = setup(false);

    let outcome = engine.add_task(candidate("B")).await.unwrap();

    assert_eq!(outcome.remote_write, RemoteWrite::Deferred);
    assert!(!outcome.task.synced);
    assert_eq!(outcome.report.mode, PassMode::Offline);
    assert_eq!(local.get_all().unwrap(), vec![outcome.task.clone()]);
    assert_eq!(remote.get_all_calls(), 0);
    assert_eq!(remote.put_calls(), 0);
}

#[tokio::test]
async fn online_add_writes_both_stores() {
    let (local, remote, engine) = setup(true);

    let outcome = engine.add_task(candidate("B")).await.unwrap();

    assert_eq!(outcome.remote_write, RemoteWrite::Inserted);
    assert!(outcome.task.synced);
    assert_eq!(outcome.task.title, "B");
    assert_eq!(remote.document(outcome.task.id), Some(outcome.task.clone()));
    assert_eq!(local.get_task(outcome.task.id).unwrap(), Some(outcome.task.clone()));
    assert_eq!(outcome.report.tasks, vec![outcome.task]);
}

#[tokio::test]
async fn repeated_identical_submissions_create_one_remote_document() {
    let (local, remote, engine) = setup(true);
    let engine = Arc::new(engine);

    let (first, second) = tokio::join!(
        engine.add_task(candidate("B")),
        engine.add_task(candidate("B"))
    );
    let first = first.unwrap();
    let second = second.unwrap();

    let documents = remote.documents();
    assert_eq!(documents.len(), 1);
    assert_eq!(first.task.id, second.task.id);

    let outcomes = [first.remote_write, second.remote_write];
    assert!(outcomes.contains(&RemoteWrite::Inserted));
    assert!(outcomes.contains(&RemoteWrite::Duplicate(documents[0].id)));
    assert_eq!(local.get_all().unwrap().len(), 1);
}

#[tokio::test]
async fn different_completion_is_not_a_duplicate() {
    let (_local, remote, engine) = setup(true);

    engine.add_task(candidate("B")).await.unwrap();
    let outcome = engine
        .add_task(candidate("B").completed(true))
        .await
        .unwrap();

    assert_eq!(outcome.remote_write, RemoteWrite::Inserted);
    assert_eq!(remote.documents().len(), 2);
}

#[tokio::test]
async fn unreachable_remote_defers_and_keeps_task() {
    let (local, remote, engine) = setup(true);
    remote.set_reachable(false);

    let outcome = engine.add_task(candidate("B")).await.unwrap();

    assert_eq!(outcome.remote_write, RemoteWrite::Deferred);
    assert!(!outcome.task.synced);
    assert_eq!(outcome.report.mode, PassMode::RemoteUnreachable);
    assert!(local.get_task(outcome.task.id).unwrap().is_some());

    remote.set_reachable(true);
    let report = engine.reconcile().await.unwrap();
    assert_eq!(report.uploaded, 1);
    assert!(remote.document(outcome.task.id).unwrap().synced);
}

#[tokio::test]
async fn resubmitting_after_offline_add_matches_uploaded_copy() {
    let (local, remote, engine) = setup(false);
    let date = Utc.with_ymd_and_hms(2024, 1, 2, 9, 0, 0).unwrap() + Duration::microseconds(1_234);

    let first = engine.add_task(NewTask::new("A", date)).await.unwrap();
    assert_eq!(first.remote_write, RemoteWrite::Deferred);

    engine.connectivity().set_online(true);
    let report = engine.reconcile().await.unwrap();
    assert_eq!(report.uploaded, 1);
    assert_eq!(remote.document(first.task.id).unwrap().date, date);

    let second = engine.add_task(NewTask::new("A", date)).await.unwrap();

    assert_eq!(second.remote_write, RemoteWrite::Duplicate(first.task.id));
    assert_eq!(remote.documents().len(), 1);
    assert_eq!(local.get_all().unwrap().len(), 1);
}

#[tokio::test]
async fn blank_title_is_rejected_before_any_write() {
    let (local, remote, engine) = setup(true);

    let err = engine.add_task(candidate("   ")).await.unwrap_err();

    assert!(matches!(
        err,
        SyncError::InvalidTask(TaskValidationError::EmptyTitle)
    ));
    assert!(local.get_all().unwrap().is_empty());
    assert_eq!(remote.put_calls(), 0);
}

#[tokio::test]
async fn new_tasks_get_distinct_ids() {
    let (_local, _remote, engine) = setup(false);

    let first = engine.add_task(candidate("A")).await.unwrap();
    let second = engine.add_task(candidate("A")).await.unwrap();

    assert_ne!(first.task.id, second.task.id);
    assert_eq!(second.report.tasks.len(), 2);
}

fn setup(online: bool) -> (Arc<SqliteTaskStore>, Arc<MemoryRemoteStore>, TaskSyncEngine) {
    let local = Arc::new(SqliteTaskStore::new(open_db_in_memory().unwrap()));
    let remote = Arc::new(MemoryRemoteStore::new());
    let engine = TaskSyncEngine::new(
        local.clone(),
        Some(remote.clone()),
        Arc::new(ConnectivityMonitor::new(online)),
        SyncOptions::default(),
    );
    (local, remote, engine)
}

fn candidate(title: &str) -> NewTask {
    NewTask::new(title, Utc.with_ymd_and_hms(2024, 1, 2, 9, 0, 0).unwrap())
}

