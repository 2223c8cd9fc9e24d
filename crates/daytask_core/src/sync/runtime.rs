//! Background wiring between connectivity transitions and the engine.

use super::connectivity::ConnectivityEvent;
use super::engine::{ReconcileReport, SyncResult, TaskSyncEngine};
use super::notify::{Notice, Notifier};
use log::{error, info};
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Running connectivity listener.
///
/// Every transition is forwarded to the notifier. Transitions to online
/// also run a reconciliation pass.
pub struct SyncRuntime {
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl SyncRuntime {
    /// Runs the initial load pass, then starts listening for transitions.
    ///
    /// The listener is started even when the initial pass fails, so a
    /// later online transition can still recover.
    pub async fn start(
        engine: Arc<TaskSyncEngine>,
        notifier: Arc<dyn Notifier>,
    ) -> (Self, SyncResult<ReconcileReport>) {
        // subscribe before the first pass so no transition is missed
        let mut transitions = engine.connectivity().subscribe();
        let initial = engine.reconcile().await;
        if let Err(err) = &initial {
            error!(
                "event=sync_runtime module=sync status=error stage=initial_load error={}",
                err
            );
        }

        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            loop {
                let event = tokio::select! {
                    _ = &mut shutdown_rx => break,
                    event = transitions.next_transition() => match event {
                        Some(event) => event,
                        None => break,
                    },
                };
                handle_transition(&engine, notifier.as_ref(), event).await;
            }
            info!("event=sync_runtime module=sync status=ok stage=stopped");
        });

        let runtime = Self {
            shutdown: Some(shutdown_tx),
            handle,
        };
        (runtime, initial)
    }

    /// Stops the listener and waits for an in-flight pass to finish.
    pub async fn shutdown(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Err(err) = (&mut self.handle).await {
            error!(
                "event=sync_runtime module=sync status=error stage=join error={}",
                err
            );
        }
    }
}

async fn handle_transition(
    engine: &TaskSyncEngine,
    notifier: &dyn Notifier,
    event: ConnectivityEvent,
) {
    notifier.notify(&Notice::for_transition(event));
    if !event.is_online() {
        return;
    }

    match engine.reconcile().await {
        Ok(report) => {
            if let Some(notice) = Notice::for_pending(&report) {
                notifier.notify(&notice);
            }
        }
        Err(err) => error!(
            "event=sync_runtime module=sync status=error stage=online_pass error={}",
            err
        ),
    }
}
