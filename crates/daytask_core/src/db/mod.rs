//! On-device task database.
//!
//! `open_db` and `open_db_in_memory` are the only way to get a connection;
//! both hand it out with the task schema fully migrated. The schema version
//! lives in `PRAGMA user_version`.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Task database failures.
#[derive(Debug)]
pub enum DbError {
    /// The database file could not be opened or created.
    Open {
        path: PathBuf,
        source: rusqlite::Error,
    },
    /// The file was written by a newer build; it is left untouched.
    SchemaTooNew { found: u32, supported: u32 },
    Sqlite(rusqlite::Error),
}

impl DbError {
    /// Stable code for log lines.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Open { .. } => "db_open_failed",
            Self::SchemaTooNew { .. } => "db_schema_too_new",
            Self::Sqlite(_) => "db_sqlite",
        }
    }
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open { path, source } => {
                write!(f, "cannot open task database `{}`: {source}", path.display())
            }
            Self::SchemaTooNew { found, supported } => write!(
                f,
                "task database uses schema v{found}, this build reads up to v{supported}; upgrade daytask"
            ),
            Self::Sqlite(err) => write!(f, "task database: {err}"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Open { source, .. } => Some(source),
            Self::Sqlite(err) => Some(err),
            Self::SchemaTooNew { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
