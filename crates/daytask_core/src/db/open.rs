//! Connection bootstrap for the on-device task database.
//!
//! # Responsibility
//! - Open file or in-memory SQLite connections.
//! - Configure pragmas and run migrations before handing a connection out.
//!
//! # Invariants
//! - Returned connections have migrations fully applied.
//! - Returned connections use WAL journaling when file-backed.

use super::migrations::apply_migrations;
use super::{DbError, DbResult};
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OpenMode {
    File,
    Memory,
}

impl OpenMode {
    fn as_str(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Memory => "memory",
        }
    }
}

/// Opens (or creates) the task database at `path`.
///
/// # Side effects
/// - Creates the file when missing and applies pending migrations.
/// - Emits `db_open` events with duration and status.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    let path = path.as_ref();
    open_with(OpenMode::File, || {
        Connection::open(path).map_err(|source| DbError::Open {
            path: path.to_path_buf(),
            source,
        })
    })
}

/// Opens a private in-memory task database, mainly for tests.
pub fn open_db_in_memory() -> DbResult<Connection> {
    open_with(OpenMode::Memory, || {
        Connection::open_in_memory().map_err(DbError::from)
    })
}

fn open_with(
    mode: OpenMode,
    open: impl FnOnce() -> DbResult<Connection>,
) -> DbResult<Connection> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode={}", mode.as_str());

    let result = open().and_then(|mut conn| bootstrap(&mut conn, mode).map(|()| conn));

    match &result {
        Ok(_) => info!(
            "event=db_open module=db status=ok mode={} duration_ms={}",
            mode.as_str(),
            started_at.elapsed().as_millis()
        ),
        Err(err) => error!(
            "event=db_open module=db status=error mode={} duration_ms={} error_code={} error={}",
            mode.as_str(),
            started_at.elapsed().as_millis(),
            err.code(),
            err
        ),
    }
    result
}

fn bootstrap(conn: &mut Connection, mode: OpenMode) -> DbResult<()> {
    conn.busy_timeout(BUSY_TIMEOUT)?;
    if mode == OpenMode::File {
        // journal_mode returns the resulting mode as a row
        let _mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
    }
    apply_migrations(conn)
}
