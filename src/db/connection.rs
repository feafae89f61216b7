use rusqlite::Connection;
use std::path::Path;
use tracing::debug;

use crate::db::sink::SinkError;

/// Owns the single SQLite connection for a run. The pipeline writes from
/// one thread, so there is no pooling.
pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SinkError> {
        let path = path.as_ref();
        let conn = Connection::open(path)
            .map_err(|e| SinkError::Unavailable(format!("Open DB failed: {e}")))?;
        debug!(path = %path.display(), "opened sqlite database");
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self, SinkError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| SinkError::Unavailable(format!("Open DB failed: {e}")))?;
        Ok(Self { conn })
    }

    /// Runs `f` against the connection.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, SinkError>
    where
        F: FnOnce(&Connection) -> Result<T, SinkError>,
    {
        f(&self.conn)
    }
}
