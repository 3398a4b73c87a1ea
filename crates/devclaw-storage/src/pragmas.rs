//! PRAGMA configuration applied to the store connection.

use rusqlite::Connection;

use devclaw_core::errors::DevclawResult;

use crate::db_err;

/// WAL journaling with a 5s busy timeout; a single writer is assumed.
pub fn apply_pragmas(conn: &Connection) -> DevclawResult<()> {
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA busy_timeout = 5000;
        PRAGMA foreign_keys = ON;
        ",
    )
    .map_err(|e| db_err("apply_pragmas", e))?;
    Ok(())
}
