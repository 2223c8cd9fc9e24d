//! Presentation state for the daily task board.
//!
//! # Responsibility
//! - Hold form draft fields, the offline banner flag and the presented
//!   task set in one explicit value.
//! - Change only through discrete [`BoardAction`]s.
//!
//! # Invariants
//! - A failed reconciliation never clears the presented tasks.
//! - A successful submit clears the draft; a rejected one keeps it.

use crate::model::task::{NewTask, Task};
use crate::sync::connectivity::ConnectivityEvent;
use crate::view::format::SyncStatus;
use crate::view::grouping::{group_by_date, TaskGroups};
use chrono::{FixedOffset, NaiveDate, NaiveDateTime, Utc};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Formats accepted for the draft date field (`datetime-local` style).
const DRAFT_DATETIME_FORMATS: &[&str] =
    &["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// Unsubmitted form input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskDraft {
    pub title: String,
    /// Wall-clock time in the display offset, e.g. `2024-01-02T09:00`.
    pub date_time: String,
    pub completed: bool,
}

/// Reasons a draft cannot become a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftError {
    EmptyTitle,
    MissingDateTime,
    InvalidDateTime(String),
}

impl Display for DraftError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "title is required"),
            Self::MissingDateTime => write!(f, "date and time are required"),
            Self::InvalidDateTime(value) => write!(f, "unrecognized date and time `{value}`"),
        }
    }
}

impl Error for DraftError {}

/// Discrete state transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardAction {
    EditTitle(String),
    EditDateTime(String),
    SetCompleted(bool),
    Connectivity(ConnectivityEvent),
    /// A pass finished; these tasks are now authoritative.
    TasksLoaded(Vec<Task>),
    /// A pass failed; keep what is shown and remember why.
    ReconcileFailed(String),
}

/// The whole board screen as data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardState {
    pub draft: TaskDraft,
    /// Drives the persistent offline banner.
    pub offline: bool,
    pub tasks: Vec<Task>,
    pub last_error: Option<String>,
}

impl BoardState {
    pub fn new(online: bool) -> Self {
        Self {
            draft: TaskDraft::default(),
            offline: !online,
            tasks: Vec::new(),
            last_error: None,
        }
    }

    pub fn apply(&mut self, action: BoardAction) {
        match action {
            BoardAction::EditTitle(title) => self.draft.title = title,
            BoardAction::EditDateTime(value) => self.draft.date_time = value,
            BoardAction::SetCompleted(completed) => self.draft.completed = completed,
            BoardAction::Connectivity(event) => self.offline = !event.is_online(),
            BoardAction::TasksLoaded(tasks) => {
                self.tasks = tasks;
                self.last_error = None;
            }
            BoardAction::ReconcileFailed(message) => self.last_error = Some(message),
        }
    }

    /// Turns the draft into a task candidate and clears the form.
    ///
    /// The draft time is read in `offset` and stored as UTC.
    pub fn submit(&mut self, offset: FixedOffset) -> Result<NewTask, DraftError> {
        let candidate = parse_draft(&self.draft, offset)?;
        self.draft = TaskDraft::default();
        Ok(candidate)
    }

    pub fn groups(&self, today: NaiveDate, offset: FixedOffset) -> TaskGroups {
        group_by_date(&self.tasks, today, offset)
    }

    pub fn sync_status(&self) -> SyncStatus {
        SyncStatus::of(&self.tasks)
    }
}

/// Parses draft fields into a candidate without mutating anything.
pub fn parse_draft(draft: &TaskDraft, offset: FixedOffset) -> Result<NewTask, DraftError> {
    let title = draft.title.trim();
    if title.is_empty() {
        return Err(DraftError::EmptyTitle);
    }

    let raw = draft.date_time.trim();
    if raw.is_empty() {
        return Err(DraftError::MissingDateTime);
    }
    let naive = DRAFT_DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .ok_or_else(|| DraftError::InvalidDateTime(raw.to_string()))?;
    let local = naive
        .and_local_timezone(offset)
        .single()
        .ok_or_else(|| DraftError::InvalidDateTime(raw.to_string()))?;

    Ok(NewTask::new(title, local.with_timezone(&Utc)).completed(draft.completed))
}

#[cfg(test)]
mod tests {
    use super::{parse_draft, BoardAction, BoardState, DraftError, TaskDraft};
    use crate::model::task::{NewTask, Task};
    use crate::sync::connectivity::ConnectivityEvent;
    use chrono::{FixedOffset, TimeZone, Utc};

    #[test]
    fn submit_converts_local_time_to_utc_and_clears_draft() {
        let mut state = BoardState::new(true);
        state.apply(BoardAction::EditTitle("  standup ".to_string()));
        state.apply(BoardAction::EditDateTime("2024-01-02T09:00".to_string()));
        state.apply(BoardAction::SetCompleted(true));

        let minus_three = FixedOffset::west_opt(3 * 3600).unwrap();
        let candidate = state.submit(minus_three).unwrap();

        assert_eq!(candidate.title, "standup");
        assert_eq!(
            candidate.date,
            Utc.with_ymd_and_hms(2024, 1, 2, 12, 0, 0).unwrap()
        );
        assert!(candidate.completed);
        assert_eq!(state.draft, TaskDraft::default());
    }

    #[test]
    fn rejected_submit_keeps_draft() {
        let mut state = BoardState::new(true);
        state.apply(BoardAction::EditTitle("A".to_string()));
        state.apply(BoardAction::EditDateTime("tomorrow".to_string()));

        let err = state.submit(FixedOffset::east_opt(0).unwrap()).unwrap_err();
        assert_eq!(err, DraftError::InvalidDateTime("tomorrow".to_string()));
        assert_eq!(state.draft.title, "A");
    }

    #[test]
    fn parse_draft_requires_fields() {
        let utc = FixedOffset::east_opt(0).unwrap();
        let mut draft = TaskDraft::default();
        assert_eq!(parse_draft(&draft, utc), Err(DraftError::EmptyTitle));
        draft.title = "A".to_string();
        assert_eq!(parse_draft(&draft, utc), Err(DraftError::MissingDateTime));
    }

    #[test]
    fn failed_pass_keeps_presented_tasks() {
        let date = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
        let task = Task::create(NewTask::new("A", date), false);

        let mut state = BoardState::new(false);
        assert!(state.offline);
        state.apply(BoardAction::TasksLoaded(vec![task.clone()]));
        state.apply(BoardAction::ReconcileFailed("disk full".to_string()));

        assert_eq!(state.tasks, vec![task]);
        assert_eq!(state.last_error.as_deref(), Some("disk full"));
        assert_eq!(state.sync_status().pending, 1);

        state.apply(BoardAction::Connectivity(ConnectivityEvent::WentOnline));
        assert!(!state.offline);
    }
}
