//! Pure merge of local and remote task sets.

use crate::model::task::{Task, TaskId};
use std::collections::HashMap;

/// Merges two task sets into one keyed by id.
///
/// # Contract
/// - Remote copies win for ids present on both sides.
/// - Every remote copy is marked `synced`: it exists remotely by definition.
/// - Local-only tasks are kept as-is, including their `synced` flag.
/// - Output holds each id once, ordered by `(date, id)`.
pub fn merge_task_sets(local: Vec<Task>, remote: Vec<Task>) -> Vec<Task> {
    let mut merged: HashMap<TaskId, Task> = HashMap::with_capacity(local.len() + remote.len());

    for mut task in remote {
        task.synced = true;
        merged.entry(task.id).or_insert(task);
    }
    for task in local {
        merged.entry(task.id).or_insert(task);
    }

    let mut tasks: Vec<Task> = merged.into_values().collect();
    tasks.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));
    tasks
}

#[cfg(test)]
mod tests {
    use super::merge_task_sets;
    use crate::model::task::{NewTask, Task};
    use chrono::{TimeZone, Utc};
    use std::collections::HashSet;
    use uuid::Uuid;

    fn task(title: &str, hour: u32, synced: bool) -> Task {
        let date = Utc.with_ymd_and_hms(2024, 1, 1, hour, 0, 0).unwrap();
        Task::create(NewTask::new(title, date), synced)
    }

    #[test]
    fn remote_copy_wins_on_shared_id() {
        let local = task("local title", 10, false);
        let mut remote = local.clone();
        remote.title = "remote title".to_string();

        let merged = merge_task_sets(vec![local], vec![remote]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].title, "remote title");
        assert!(merged[0].synced);
    }

    #[test]
    fn union_contains_every_id_once() {
        let shared = task("shared", 9, true);
        let local_only = task("local", 10, false);
        let remote_only = task("remote", 11, true);

        let merged = merge_task_sets(
            vec![shared.clone(), local_only.clone()],
            vec![shared.clone(), remote_only.clone()],
        );

        let ids: HashSet<Uuid> = merged.iter().map(|task| task.id).collect();
        assert_eq!(merged.len(), 3);
        assert_eq!(
            ids,
            HashSet::from([shared.id, local_only.id, remote_only.id])
        );
        assert!(!merged.iter().find(|t| t.id == local_only.id).unwrap().synced);
    }

    #[test]
    fn remote_document_with_stale_flag_counts_as_synced() {
        let local = task("A", 10, true);
        let mut remote = local.clone();
        remote.synced = false;

        let merged = merge_task_sets(vec![local], vec![remote]);
        assert!(merged[0].synced);
    }

    #[test]
    fn output_is_ordered_by_date() {
        let late = task("late", 18, false);
        let early = task("early", 7, false);
        let merged = merge_task_sets(vec![late, early], Vec::new());
        assert_eq!(merged[0].title, "early");
        assert_eq!(merged[1].title, "late");
    }
}
