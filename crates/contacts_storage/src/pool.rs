//! Connection pool.

use crate::config::StorageConfig;
use crate::error::StorageResult;
use parking_lot::Mutex;
use rusqlite::Connection;
use std::ops::{Deref, DerefMut};
use std::path::PathBuf;

/// Hands out one connection per in-flight operation on one partition file.
///
/// Idle connections are reused; when none is idle a new one is opened, so
/// concurrent requests never queue on the pool itself. Mutual exclusion
/// between writers is left to SQLite's locking.
pub(crate) struct ConnectionPool {
    path: PathBuf,
    config: StorageConfig,
    idle: Mutex<Vec<Connection>>,
}

impl ConnectionPool {
    pub(crate) fn new(path: PathBuf, config: StorageConfig) -> Self {
        Self {
            path,
            config,
            idle: Mutex::new(Vec::new()),
        }
    }

    /// Checks out a connection, opening a fresh one if none is idle.
    pub(crate) fn get(&self) -> StorageResult<PooledConnection<'_>> {
        let reused = self.idle.lock().pop();
        let conn = match reused {
            Some(conn) => conn,
            None => self.connect()?,
        };
        Ok(PooledConnection {
            conn: Some(conn),
            pool: self,
        })
    }

    /// Opens and configures a new connection.
    pub(crate) fn connect(&self) -> StorageResult<Connection> {
        let conn = Connection::open(&self.path)?;
        // Before the pragmas: switching to WAL may wait on another writer.
        conn.busy_timeout(self.config.write_timeout)?;
        conn.execute_batch(&format!(
            "PRAGMA journal_mode = WAL;\n\
             PRAGMA foreign_keys = ON;\n\
             PRAGMA synchronous = {};",
            self.config.synchronous.pragma_value()
        ))?;
        tracing::trace!(path = %self.path.display(), "opened connection");
        Ok(conn)
    }

    /// Number of connections currently idle.
    #[cfg(test)]
    pub(crate) fn idle_count(&self) -> usize {
        self.idle.lock().len()
    }

    fn release(&self, conn: Connection) {
        let mut idle = self.idle.lock();
        if idle.len() < self.config.max_idle_connections {
            idle.push(conn);
        }
    }
}

/// A connection checked out of the pool; returned on drop.
pub(crate) struct PooledConnection<'a> {
    conn: Option<Connection>,
    pool: &'a ConnectionPool,
}

impl Deref for PooledConnection<'_> {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        // Only `Drop` takes the connection out.
        match &self.conn {
            Some(conn) => conn,
            None => unreachable!("pooled connection used after release"),
        }
    }
}

impl DerefMut for PooledConnection<'_> {
    fn deref_mut(&mut self) -> &mut Connection {
        match &mut self.conn {
            Some(conn) => conn,
            None => unreachable!("pooled connection used after release"),
        }
    }
}

impl Drop for PooledConnection<'_> {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            // A connection left inside a transaction would leak its locks.
            if conn.is_autocommit() {
                self.pool.release(conn);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn pool(dir: &TempDir, max_idle: usize) -> ConnectionPool {
        ConnectionPool::new(
            dir.path().join("pool.db"),
            StorageConfig::default().max_idle_connections(max_idle),
        )
    }

    #[test]
    fn connections_are_reused() {
        let dir = TempDir::new().unwrap();
        let pool = pool(&dir, 4);

        {
            let _a = pool.get().unwrap();
            let _b = pool.get().unwrap();
            assert_eq!(pool.idle_count(), 0);
        }
        assert_eq!(pool.idle_count(), 2);

        let _c = pool.get().unwrap();
        assert_eq!(pool.idle_count(), 1);
    }

    #[test]
    fn idle_set_is_bounded() {
        let dir = TempDir::new().unwrap();
        let pool = pool(&dir, 1);

        {
            let _a = pool.get().unwrap();
            let _b = pool.get().unwrap();
            let _c = pool.get().unwrap();
        }
        assert_eq!(pool.idle_count(), 1);
    }

    #[test]
    fn connections_use_wal() {
        let dir = TempDir::new().unwrap();
        let pool = pool(&dir, 1);
        let conn = pool.get().unwrap();
        let mode: String = conn
            .query_row("PRAGMA journal_mode", [], |row| row.get(0))
            .unwrap();
        assert_eq!(mode.to_lowercase(), "wal");
    }
}
