//! Connectivity status and transition subscriptions.
//!
//! # Invariants
//! - Setting the status it already has is a no-op and emits nothing.
//! - A subscriber observes at most one event per distinct status it sees,
//!   even when several flips are coalesced between two polls.

use log::info;
use tokio::sync::watch;

/// A change of connectivity status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityEvent {
    WentOnline,
    WentOffline,
}

impl ConnectivityEvent {
    fn from_status(online: bool) -> Self {
        if online {
            Self::WentOnline
        } else {
            Self::WentOffline
        }
    }

    pub fn is_online(self) -> bool {
        matches!(self, Self::WentOnline)
    }
}

/// Tracks whether the remote store is reachable.
///
/// The runtime's reachability signal is fed in through [`set_online`].
///
/// [`set_online`]: ConnectivityMonitor::set_online
#[derive(Debug)]
pub struct ConnectivityMonitor {
    status: watch::Sender<bool>,
}

impl ConnectivityMonitor {
    pub fn new(initially_online: bool) -> Self {
        let (status, _) = watch::channel(initially_online);
        Self { status }
    }

    pub fn is_online(&self) -> bool {
        *self.status.borrow()
    }

    /// Records the current reachability.
    ///
    /// Returns the transition when the status actually changed.
    pub fn set_online(&self, online: bool) -> Option<ConnectivityEvent> {
        let changed = self.status.send_if_modified(|current| {
            if *current == online {
                return false;
            }
            *current = online;
            true
        });
        if !changed {
            return None;
        }

        let event = ConnectivityEvent::from_status(online);
        info!(
            "event=connectivity_change module=sync status=ok online={}",
            online
        );
        Some(event)
    }

    /// Subscribes to future transitions; the current status is not replayed.
    pub fn subscribe(&self) -> ConnectivitySubscription {
        let mut receiver = self.status.subscribe();
        let last_seen = *receiver.borrow_and_update();
        ConnectivitySubscription {
            receiver,
            last_seen,
        }
    }
}

/// Receiver side of [`ConnectivityMonitor::subscribe`].
#[derive(Debug)]
pub struct ConnectivitySubscription {
    receiver: watch::Receiver<bool>,
    last_seen: bool,
}

impl ConnectivitySubscription {
    /// Waits for the next status different from the last one delivered.
    ///
    /// Returns `None` once the monitor is dropped.
    pub async fn next_transition(&mut self) -> Option<ConnectivityEvent> {
        loop {
            self.receiver.changed().await.ok()?;
            let online = *self.receiver.borrow_and_update();
            if online != self.last_seen {
                self.last_seen = online;
                return Some(ConnectivityEvent::from_status(online));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ConnectivityEvent, ConnectivityMonitor};

    #[test]
    fn repeated_status_emits_no_event() {
        let monitor = ConnectivityMonitor::new(false);
        assert_eq!(monitor.set_online(false), None);
        assert_eq!(
            monitor.set_online(true),
            Some(ConnectivityEvent::WentOnline)
        );
        assert_eq!(monitor.set_online(true), None);
        assert_eq!(
            monitor.set_online(false),
            Some(ConnectivityEvent::WentOffline)
        );
        assert!(!monitor.is_online());
    }

    #[tokio::test]
    async fn subscriber_sees_each_change_once() {
        let monitor = ConnectivityMonitor::new(true);
        let mut subscription = monitor.subscribe();

        monitor.set_online(false);
        assert_eq!(
            subscription.next_transition().await,
            Some(ConnectivityEvent::WentOffline)
        );

        monitor.set_online(true);
        assert_eq!(
            subscription.next_transition().await,
            Some(ConnectivityEvent::WentOnline)
        );
    }

    #[tokio::test]
    async fn coalesced_round_trip_is_not_reported() {
        let monitor = ConnectivityMonitor::new(true);
        let mut subscription = monitor.subscribe();

        monitor.set_online(false);
        monitor.set_online(true);
        monitor.set_online(false);

        assert_eq!(
            subscription.next_transition().await,
            Some(ConnectivityEvent::WentOffline)
        );
    }

    #[tokio::test]
    async fn subscription_ends_when_monitor_dropped() {
        let monitor = ConnectivityMonitor::new(true);
        let mut subscription = monitor.subscribe();
        drop(monitor);
        assert_eq!(subscription.next_transition().await, None);
    }
}
