//! Storage configuration.

use std::time::Duration;

/// SQLite `synchronous` setting applied to every connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Synchronous {
    /// Sync at WAL checkpoints only. Safe against application crashes.
    Normal,
    /// Sync on every commit. Safe against power loss.
    Full,
}

impl Synchronous {
    pub(crate) const fn pragma_value(self) -> &'static str {
        match self {
            Synchronous::Normal => "NORMAL",
            Synchronous::Full => "FULL",
        }
    }
}

/// Configuration for opening a database.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Whether to create the database directory if it doesn't exist.
    pub create_if_missing: bool,

    /// Time bound for mutating transactions.
    pub write_timeout: Duration,

    /// Time bound for read transactions.
    pub read_timeout: Duration,

    /// Maximum number of idle connections kept for reuse, per partition.
    pub max_idle_connections: usize,

    /// Partitions kept open before idle ones are closed.
    pub max_open_partitions: usize,

    /// Durability level for commits.
    pub synchronous: Synchronous,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            create_if_missing: true,
            write_timeout: Duration::from_secs(5),
            read_timeout: Duration::from_secs(3),
            max_idle_connections: 8,
            max_open_partitions: 256,
            synchronous: Synchronous::Normal,
        }
    }
}

impl StorageConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether to create the database if missing.
    #[must_use]
    pub const fn create_if_missing(mut self, value: bool) -> Self {
        self.create_if_missing = value;
        self
    }

    /// Sets the time bound for mutating transactions.
    #[must_use]
    pub const fn write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    /// Sets the time bound for read transactions.
    #[must_use]
    pub const fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Sets the number of idle connections kept in the pool.
    #[must_use]
    pub const fn max_idle_connections(mut self, count: usize) -> Self {
        self.max_idle_connections = count;
        self
    }

    /// Sets how many partitions stay open before idle ones are closed.
    #[must_use]
    pub const fn max_open_partitions(mut self, count: usize) -> Self {
        self.max_open_partitions = count;
        self
    }

    /// Sets the commit durability level.
    #[must_use]
    pub const fn synchronous(mut self, value: Synchronous) -> Self {
        self.synchronous = value;
        self
    }
}
