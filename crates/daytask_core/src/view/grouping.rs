//! Day buckets for the task list.
//!
//! # Invariants
//! - A task whose calendar day (in the display offset) is before `today`
//!   always lands in the past bucket.
//! - Every bucket is sorted ascending by timestamp, ties broken by id.
//! - Grouping is pure: same input, same output.

use crate::model::task::Task;
use chrono::{FixedOffset, NaiveDate};
use std::collections::BTreeMap;

/// Grouping key for the task list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BucketKey {
    /// Today or a later day.
    Day(NaiveDate),
    /// Any day before today.
    Past,
}

/// Tasks split into upcoming day buckets and one past bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskGroups {
    upcoming: BTreeMap<NaiveDate, Vec<Task>>,
    past: Vec<Task>,
}

impl TaskGroups {
    /// Upcoming buckets in ascending day order.
    pub fn upcoming(&self) -> impl Iterator<Item = (NaiveDate, &[Task])> {
        self.upcoming
            .iter()
            .map(|(day, tasks)| (*day, tasks.as_slice()))
    }

    pub fn past(&self) -> &[Task] {
        &self.past
    }

    pub fn get(&self, key: BucketKey) -> Option<&[Task]> {
        match key {
            BucketKey::Day(day) => self.upcoming.get(&day).map(Vec::as_slice),
            BucketKey::Past if self.past.is_empty() => None,
            BucketKey::Past => Some(&self.past),
        }
    }

    /// All non-empty buckets: upcoming days first, then past.
    pub fn buckets(&self) -> impl Iterator<Item = (BucketKey, &[Task])> {
        let past = (!self.past.is_empty()).then_some((BucketKey::Past, self.past.as_slice()));
        self.upcoming()
            .map(|(day, tasks)| (BucketKey::Day(day), tasks))
            .chain(past)
    }

    pub fn is_empty(&self) -> bool {
        self.upcoming.is_empty() && self.past.is_empty()
    }
}

/// Buckets tasks by calendar day relative to `today`.
///
/// Days are computed in `offset`, the user's display time zone.
pub fn group_by_date(tasks: &[Task], today: NaiveDate, offset: FixedOffset) -> TaskGroups {
    let mut groups = TaskGroups::default();

    for task in tasks {
        let day = task.date.with_timezone(&offset).date_naive();
        if day >= today {
            groups.upcoming.entry(day).or_default().push(task.clone());
        } else {
            groups.past.push(task.clone());
        }
    }

    for bucket in groups.upcoming.values_mut() {
        sort_bucket(bucket);
    }
    sort_bucket(&mut groups.past);
    groups
}

fn sort_bucket(tasks: &mut [Task]) {
    tasks.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));
}
