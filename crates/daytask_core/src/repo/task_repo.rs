//! Local task store contract and SQLite implementation.
//!
//! # Responsibility
//! - Upsert tasks by id and return full scans for reconciliation.
//! - Track when the last successful online pass finished.
//!
//! # Invariants
//! - `put_task` is idempotent and atomic per task.
//! - A stored `synced = true` flag is never downgraded by a later write.

use crate::db::DbError;
use crate::model::task::{Task, TaskId, TaskValidationError};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

const TASK_SELECT_SQL: &str = "SELECT id, title, date, completed, synced FROM tasks";
const LAST_SYNC_KEY: &str = "last_sync_at";

pub type RepoResult<T> = Result<T, RepoError>;

/// Local store error. Any of these aborts the current operation.
#[derive(Debug)]
pub enum RepoError {
    Validation(TaskValidationError),
    Db(DbError),
    InvalidData(String),
    /// A previous writer panicked while holding the connection.
    LockPoisoned,
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "local store unavailable: {err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted task data: {message}"),
            Self::LockPoisoned => write!(f, "local store connection lock poisoned"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::InvalidData(_) | Self::LockPoisoned => None,
        }
    }
}

impl From<TaskValidationError> for RepoError {
    fn from(value: TaskValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// On-device task persistence used by the sync engine.
pub trait LocalTaskStore: Send + Sync {
    /// Inserts or replaces a task by id, durably, before returning.
    fn put_task(&self, task: &Task) -> RepoResult<()>;
    /// Returns every stored task in unspecified order.
    fn get_all(&self) -> RepoResult<Vec<Task>>;
    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>>;
    fn record_sync_checkpoint(&self, at: DateTime<Utc>) -> RepoResult<()>;
    fn last_sync_checkpoint(&self) -> RepoResult<Option<DateTime<Utc>>>;
}

impl<S: LocalTaskStore + ?Sized> LocalTaskStore for Arc<S> {
    fn put_task(&self, task: &Task) -> RepoResult<()> {
        (**self).put_task(task)
    }

    fn get_all(&self) -> RepoResult<Vec<Task>> {
        (**self).get_all()
    }

    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>> {
        (**self).get_task(id)
    }

    fn record_sync_checkpoint(&self, at: DateTime<Utc>) -> RepoResult<()> {
        (**self).record_sync_checkpoint(at)
    }

    fn last_sync_checkpoint(&self) -> RepoResult<Option<DateTime<Utc>>> {
        (**self).last_sync_checkpoint()
    }
}

/// SQLite-backed local task store.
///
/// Owns its connection behind a mutex so one store can be shared between
/// the sync engine and the connectivity listener.
pub struct SqliteTaskStore {
    conn: Mutex<Connection>,
}

impl SqliteTaskStore {
    /// Wraps a connection returned by `db::open_db*` (migrations applied).
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn conn(&self) -> RepoResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| RepoError::LockPoisoned)
    }
}

impl LocalTaskStore for SqliteTaskStore {
    fn put_task(&self, task: &Task) -> RepoResult<()> {
        task.validate()?;

        self.conn()?.execute(
            "INSERT INTO tasks (id, title, date, completed, synced)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                date = excluded.date,
                completed = excluded.completed,
                synced = max(tasks.synced, excluded.synced),
                updated_at = (strftime('%s', 'now') * 1000);",
            params![
                task.id.to_string(),
                task.title.as_str(),
                date_to_db(&task.date),
                task.completed,
                task.synced,
            ],
        )?;

        Ok(())
    }

    fn get_all(&self) -> RepoResult<Vec<Task>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(TASK_SELECT_SQL)?;
        let mut rows = stmt.query([])?;
        let mut tasks = Vec::new();

        while let Some(row) = rows.next()? {
            tasks.push(parse_task_row(row)?);
        }

        tasks.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));
        Ok(tasks)
    }

    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!("{TASK_SELECT_SQL} WHERE id = ?1"))?;
        let mut rows = stmt.query([id.to_string()])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_task_row(row)?)),
            None => Ok(None),
        }
    }

    fn record_sync_checkpoint(&self, at: DateTime<Utc>) -> RepoResult<()> {
        self.conn()?.execute(
            "INSERT INTO sync_state (key, value_ms) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value_ms = excluded.value_ms;",
            params![LAST_SYNC_KEY, at.timestamp_millis()],
        )?;
        Ok(())
    }

    fn last_sync_checkpoint(&self) -> RepoResult<Option<DateTime<Utc>>> {
        let value_ms: Option<i64> = self
            .conn()?
            .query_row(
                "SELECT value_ms FROM sync_state WHERE key = ?1;",
                [LAST_SYNC_KEY],
                |row| row.get(0),
            )
            .optional()?;

        match value_ms {
            None => Ok(None),
            Some(ms) => DateTime::from_timestamp_millis(ms).map(Some).ok_or_else(|| {
                RepoError::InvalidData(format!("invalid sync_state.value_ms `{ms}`"))
            }),
        }
    }
}

fn parse_task_row(row: &Row<'_>) -> RepoResult<Task> {
    let id_text: String = row.get("id")?;
    let id = Uuid::parse_str(&id_text)
        .map_err(|_| RepoError::InvalidData(format!("invalid id `{id_text}` in tasks.id")))?;

    let date_text: String = row.get("date")?;
    let date = DateTime::parse_from_rfc3339(&date_text)
        .map(|value| value.with_timezone(&Utc))
        .map_err(|_| {
            RepoError::InvalidData(format!("invalid date `{date_text}` in tasks.date"))
        })?;

    let task = Task {
        id,
        title: row.get("title")?,
        date,
        completed: row.get("completed")?,
        synced: row.get("synced")?,
    };
    task.validate()?;
    Ok(task)
}

/// Full nanosecond precision; a stored task must read back unchanged.
fn date_to_db(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Nanos, true)
}
