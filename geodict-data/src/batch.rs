//! Manual transaction batching over a long-lived SQLite connection.
//!
//! `rusqlite::Transaction` borrows the connection, which does not fit a
//! writer that outlives many calls, so batches are opened and closed with
//! plain `BEGIN`/`COMMIT` instead.

use rusqlite::{Connection, Result};

/// Open a transaction unless one is already open.
pub(crate) fn begin_if_idle(connection: &Connection) -> Result<()> {
    if connection.is_autocommit() {
        connection.execute_batch("BEGIN")?;
    }
    Ok(())
}

/// Commit the open transaction, if any.
pub(crate) fn commit_if_open(connection: &Connection) -> Result<()> {
    if !connection.is_autocommit() {
        connection.execute_batch("COMMIT")?;
    }
    Ok(())
}
