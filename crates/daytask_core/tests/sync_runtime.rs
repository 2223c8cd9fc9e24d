use chrono::{TimeZone, Utc};
use daytask_core::db::open_db_in_memory;
use daytask_core::{
    ConnectivityEvent, ConnectivityMonitor, LocalTaskStore, MemoryRemoteStore, NewTask, Notice,
    Notifier, PassMode, SqliteTaskStore, SyncOptions, SyncRuntime, Task, TaskSyncEngine,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[tokio::test]
async fn going_online_uploads_pending_tasks_and_notifies() {
    let fixture = Fixture::new(false);
    let pending = fixture.seed("A");

    let (runtime, initial) =
        SyncRuntime::start(fixture.engine.clone(), fixture.notices.clone()).await;
    let initial = initial.unwrap();
    assert_eq!(initial.mode, PassMode::Offline);
    assert_eq!(initial.pending_count(), 1);

    fixture.engine.connectivity().set_online(true);
    wait_until(|| fixture.remote.document(pending.id).is_some()).await;
    wait_until(|| {
        fixture
            .local
            .get_task(pending.id)
            .unwrap()
            .is_some_and(|task| task.synced)
    })
    .await;

    assert_eq!(
        fixture.notices.titles(),
        vec!["You are online".to_string()]
    );
    runtime.shutdown().await;
}

#[tokio::test]
async fn pass_leaving_pending_tasks_sends_summary() {
    let fixture = Fixture::new(false);
    let pending = fixture.seed("A");
    fixture.remote.fail_writes_for(pending.id);

    let (runtime, _) = SyncRuntime::start(fixture.engine.clone(), fixture.notices.clone()).await;
    fixture.engine.connectivity().set_online(true);
    wait_until(|| fixture.notices.titles().len() == 2).await;

    let notices = fixture.notices.all();
    assert_eq!(notices[0], Notice::for_transition(ConnectivityEvent::WentOnline));
    assert_eq!(notices[1].title, "Sync incomplete");
    assert!(notices[1].body.starts_with("1 task(s)"));
    runtime.shutdown().await;
}

#[tokio::test]
async fn going_offline_only_notifies() {
    let fixture = Fixture::new(true);
    let (runtime, initial) =
        SyncRuntime::start(fixture.engine.clone(), fixture.notices.clone()).await;
    assert_eq!(initial.unwrap().mode, PassMode::Online);
    let calls_after_start = fixture.remote.get_all_calls();

    fixture.engine.connectivity().set_online(false);
    wait_until(|| !fixture.notices.titles().is_empty()).await;

    assert_eq!(
        fixture.notices.titles(),
        vec!["You are offline".to_string()]
    );
    assert_eq!(fixture.remote.get_all_calls(), calls_after_start);
    runtime.shutdown().await;
}

#[tokio::test]
async fn shutdown_stops_listening() {
    let fixture = Fixture::new(false);
    let (runtime, _) = SyncRuntime::start(fixture.engine.clone(), fixture.notices.clone()).await;

    runtime.shutdown().await;
    fixture.engine.connectivity().set_online(true);
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(fixture.notices.titles().is_empty());
    assert_eq!(fixture.remote.get_all_calls(), 0);
}

struct Fixture {
    local: Arc<SqliteTaskStore>,
    remote: Arc<MemoryRemoteStore>,
    engine: Arc<TaskSyncEngine>,
    notices: Arc<RecordingNotifier>,
}

impl Fixture {
    fn new(online: bool) -> Self {
        let local = Arc::new(SqliteTaskStore::new(open_db_in_memory().unwrap()));
        let remote = Arc::new(MemoryRemoteStore::new());
        let engine = Arc::new(TaskSyncEngine::new(
            local.clone(),
            Some(remote.clone()),
            Arc::new(ConnectivityMonitor::new(online)),
            SyncOptions::default(),
        ));
        Self {
            local,
            remote,
            engine,
            notices: Arc::new(RecordingNotifier::default()),
        }
    }

    fn seed(&self, title: &str) -> Task {
        let date = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
        let task = Task::create(NewTask::new(title, date), false);
        self.local.put_task(&task).unwrap();
        task
    }
}

#[derive(Default)]
struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    fn all(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().clone()
    }

    fn titles(&self) -> Vec<String> {
        self.all().into_iter().map(|notice| notice.title).collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: &Notice) {
        self.notices.lock().unwrap().push(notice.clone());
    }
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached within 2s");
}
