//! User-facing notices about connectivity and sync state.
//!
//! Delivery is fire-and-forget: a notifier cannot fail a sync pass.

use super::connectivity::ConnectivityEvent;
use super::engine::ReconcileReport;
use log::info;

/// Short alert shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub body: String,
}

impl Notice {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }

    pub fn for_transition(event: ConnectivityEvent) -> Self {
        match event {
            ConnectivityEvent::WentOffline => Self::new(
                "You are offline",
                "Tasks you add will be synced when the connection is restored.",
            ),
            ConnectivityEvent::WentOnline => {
                Self::new("You are online", "The connection has been restored.")
            }
        }
    }

    /// Summarizes a pass that left tasks waiting for upload.
    ///
    /// Returns `None` when everything is synced.
    pub fn for_pending(report: &ReconcileReport) -> Option<Self> {
        let pending = report.pending_count();
        if pending == 0 {
            return None;
        }
        Some(Self::new(
            "Sync incomplete",
            format!("{pending} task(s) are waiting to be uploaded."),
        ))
    }
}

/// Sink for user-facing notices.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: &Notice);
}

/// Notifier that only records notices in the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: &Notice) {
        info!(
            "event=notice module=sync status=ok title=\"{}\"",
            notice.title
        );
    }
}
