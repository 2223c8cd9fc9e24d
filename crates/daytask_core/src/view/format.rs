//! Display text for buckets, task rows and aggregate sync state.

use super::grouping::BucketKey;
use crate::model::task::Task;
use chrono::{FixedOffset, NaiveDate};

/// Heading for a bucket.
pub fn bucket_label(key: BucketKey, today: NaiveDate) -> String {
    match key {
        BucketKey::Day(day) if day == today => "Today".to_string(),
        BucketKey::Day(day) => day.format("%d/%m/%Y").to_string(),
        BucketKey::Past => "Past tasks".to_string(),
    }
}

/// One list row: `title - HH:MM[ on dd/mm/yyyy] - Done|Not done`.
///
/// Past rows carry the full date since their bucket has no day heading.
/// Unsynced tasks get a trailing marker.
pub fn task_line(task: &Task, key: BucketKey, offset: FixedOffset) -> String {
    let local = task.date.with_timezone(&offset);
    let mut line = format!("{} - {}", task.title, local.format("%H:%M"));
    if key == BucketKey::Past {
        line.push_str(&format!(" on {}", local.format("%d/%m/%Y")));
    }
    line.push_str(if task.completed {
        " - Done"
    } else {
        " - Not done"
    });
    if !task.synced {
        line.push_str(" [not synced]");
    }
    line
}

/// Aggregate sync state shown instead of per-task errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncStatus {
    pub total: usize,
    pub pending: usize,
}

impl SyncStatus {
    pub fn of(tasks: &[Task]) -> Self {
        Self {
            total: tasks.len(),
            pending: tasks.iter().filter(|task| task.is_pending_upload()).count(),
        }
    }

    pub fn is_fully_synced(&self) -> bool {
        self.pending == 0
    }

    pub fn summary(&self) -> String {
        if self.is_fully_synced() {
            format!("All {} task(s) synced", self.total)
        } else {
            format!(
                "{} of {} task(s) waiting to sync",
                self.pending, self.total
            )
        }
    }
}
