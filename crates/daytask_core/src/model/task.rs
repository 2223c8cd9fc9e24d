//! Task domain model.
//!
//! # Responsibility
//! - Define the single record shared by local storage, remote documents and
//!   presentation.
//! - Validate user-facing fields before anything is persisted.
//!
//! # Invariants
//! - `id` is generated once and never reused for another task.
//! - `title` is non-empty after trimming.
//! - `synced == true` means the task is known to exist in the remote store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier shared by the local and remote copies of a task.
pub type TaskId = Uuid;

/// Canonical task record.
///
/// The serialized shape doubles as the remote document shape:
/// `{id, title, date, completed, synced}` with `date` as an RFC 3339 string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    /// Scheduled moment, always stored in UTC.
    pub date: DateTime<Utc>,
    pub completed: bool,
    /// Remote durability flag.
    pub synced: bool,
}

/// User input for a task that has not been assigned an identity yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub date: DateTime<Utc>,
    pub completed: bool,
}

impl NewTask {
    pub fn new(title: impl Into<String>, date: DateTime<Utc>) -> Self {
        Self {
            title: title.into(),
            date,
            completed: false,
        }
    }

    /// Sets the initial completion flag.
    pub fn completed(mut self, completed: bool) -> Self {
        self.completed = completed;
        self
    }
}

/// Validation errors for task writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskValidationError {
    EmptyTitle,
}

impl Display for TaskValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "task title cannot be empty"),
        }
    }
}

impl Error for TaskValidationError {}

impl Task {
    /// Creates a task from user input with a freshly generated random ID.
    ///
    /// The title is trimmed. `synced` reflects connectivity at creation time.
    pub fn create(candidate: NewTask, synced: bool) -> Self {
        Self::with_id(Uuid::new_v4(), candidate, synced)
    }

    /// Creates a task with a caller-provided ID.
    ///
    /// Used by import paths and tests where identity already exists.
    pub fn with_id(id: TaskId, candidate: NewTask, synced: bool) -> Self {
        Self {
            id,
            title: candidate.title.trim().to_string(),
            date: candidate.date,
            completed: candidate.completed,
            synced,
        }
    }

    /// Checks write-time invariants.
    pub fn validate(&self) -> Result<(), TaskValidationError> {
        if self.title.trim().is_empty() {
            return Err(TaskValidationError::EmptyTitle);
        }
        Ok(())
    }

    /// Returns whether two tasks carry the same user-visible content.
    ///
    /// Identity and sync state are ignored; this is the duplicate-submission
    /// test used before a remote insert.
    pub fn same_content(&self, other: &Task) -> bool {
        self.title == other.title && self.date == other.date && self.completed == other.completed
    }

    /// Returns whether this task still needs a remote write.
    pub fn is_pending_upload(&self) -> bool {
        !self.synced
    }
}
