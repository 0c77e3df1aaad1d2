//! Connection bootstrap for the relational sample store.
//!
//! # Invariants
//! - Returned connections have migrations fully applied.
//! - A path that cannot hold a SQLite database is reported as `Unavailable`.
//! - Every open attempt logs one `db_open` start event and one outcome event.

use super::migrations::apply_migrations;
use super::{DbError, DbResult};
use log::{error, info};
use rusqlite::{Connection, ErrorCode};
use std::path::Path;
use std::time::{Duration, Instant};

/// Opens (or creates) a SQLite database file and applies pending migrations.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    let path = path.as_ref();
    let unavailable = |source: rusqlite::Error| DbError::Unavailable {
        path: path.to_path_buf(),
        source,
    };
    open_with("file", || {
        let mut conn = Connection::open(path).map_err(unavailable)?;
        bootstrap_connection(&mut conn).map_err(|err| match err {
            DbError::Sqlite(source) if is_unusable_file(&source) => unavailable(source),
            other => other,
        })?;
        Ok(conn)
    })
}

/// Opens a private in-memory database; contents vanish when it is dropped.
pub fn open_db_in_memory() -> DbResult<Connection> {
    open_with("memory", || {
        let mut conn = Connection::open_in_memory()?;
        bootstrap_connection(&mut conn)?;
        Ok(conn)
    })
}

fn open_with(
    mode: &'static str,
    connect: impl FnOnce() -> DbResult<Connection>,
) -> DbResult<Connection> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode={mode}");

    let result = connect();

    match &result {
        Ok(_) => info!(
            "event=db_open module=db status=ok mode={mode} duration_ms={}",
            started_at.elapsed().as_millis()
        ),
        Err(err) => error!(
            "event=db_open module=db status=error mode={mode} duration_ms={} error={}",
            started_at.elapsed().as_millis(),
            err
        ),
    }
    result
}

// The path opened but does not hold a usable SQLite database.
fn is_unusable_file(err: &rusqlite::Error) -> bool {
    matches!(
        err.sqlite_error_code(),
        Some(ErrorCode::NotADatabase | ErrorCode::CannotOpen)
    )
}

fn bootstrap_connection(conn: &mut Connection) -> DbResult<()> {
    conn.busy_timeout(Duration::from_secs(5))?;
    apply_migrations(conn)?;
    Ok(())
}
