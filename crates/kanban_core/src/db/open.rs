//! Connection bootstrap for the board database.
//!
//! # Responsibility
//! - Open file or in-memory SQLite connections.
//! - Configure busy timeout and run migrations before handing a connection out.
//!
//! # Invariants
//! - Returned connections have migrations fully applied.
//! - Every open emits one `db_open` start event and one ok/error event.

use super::migrations::apply_migrations;
use super::{DbError, DbLocation, DbResult};
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens (or creates) a SQLite database file and applies pending migrations.
///
/// Missing parent directories are created first.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| {
            let err = DbError::CreateDir {
                path: parent.to_path_buf(),
                source,
            };
            error!(
                "event=db_open module=db status=error mode=file error_code={} error={err}",
                err.error_code()
            );
            err
        })?;
    }
    open_logged(DbLocation::File(path.to_path_buf()), || Connection::open(path))
}

/// Opens an in-memory SQLite database and applies pending migrations.
pub fn open_db_in_memory() -> DbResult<Connection> {
    open_logged(DbLocation::Memory, Connection::open_in_memory)
}

fn open_logged(
    location: DbLocation,
    connect: impl FnOnce() -> rusqlite::Result<Connection>,
) -> DbResult<Connection> {
    let mode = match location {
        DbLocation::File(_) => "file",
        DbLocation::Memory => "memory",
    };
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode={mode}");

    let result = connect()
        .and_then(|conn| {
            conn.busy_timeout(BUSY_TIMEOUT)?;
            // Forces a header read so a non-database file fails here.
            conn.query_row("PRAGMA schema_version;", [], |_| Ok(()))?;
            Ok(conn)
        })
        .map_err(|source| DbError::Open { location, source })
        .and_then(|mut conn| {
            apply_migrations(&mut conn)?;
            Ok(conn)
        });

    let duration_ms = started_at.elapsed().as_millis();
    match &result {
        Ok(_) => info!("event=db_open module=db status=ok mode={mode} duration_ms={duration_ms}"),
        Err(err) => error!(
            "event=db_open module=db status=error mode={mode} duration_ms={duration_ms} error_code={} error={err}",
            err.error_code()
        ),
    }
    result
}
