//! Per-key partition files.
//!
//! A database is a directory holding one SQLite file per partition key.
//! SQLite serializes writers per file, so writes to different partitions
//! never wait on each other while writes within one partition queue on
//! that file's write lock.

use crate::config::StorageConfig;
use crate::error::StorageResult;
use crate::pool::ConnectionPool;
use crate::schema;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const FILE_PREFIX: &str = "partition-";
const FILE_SUFFIX: &str = ".db";

/// The open connection pools of one database directory, keyed by partition.
pub(crate) struct Partitions {
    root: PathBuf,
    config: StorageConfig,
    pools: RwLock<HashMap<i64, Arc<ConnectionPool>>>,
}

impl Partitions {
    pub(crate) fn new(root: PathBuf, config: StorageConfig) -> Self {
        Self {
            root,
            config,
            pools: RwLock::new(HashMap::new()),
        }
    }

    pub(crate) fn root(&self) -> &Path {
        &self.root
    }

    /// File backing partition `key`.
    pub(crate) fn file(&self, key: i64) -> PathBuf {
        self.root.join(format!("{FILE_PREFIX}{key}{FILE_SUFFIX}"))
    }

    /// Returns the pool for `key`, creating and migrating its file on first use.
    pub(crate) fn pool(&self, key: i64) -> StorageResult<Arc<ConnectionPool>> {
        if let Some(pool) = self.pools.read().get(&key) {
            return Ok(Arc::clone(pool));
        }

        // Migrated outside the map lock. Two threads racing on a new key both
        // migrate; the second finds nothing to do.
        let pool = Arc::new(ConnectionPool::new(self.file(key), self.config.clone()));
        {
            let mut conn = pool.get()?;
            schema::migrate(&mut conn)?;
        }

        let mut pools = self.pools.write();
        if pools.len() >= self.config.max_open_partitions {
            // Pools checked out by a running transaction hold a second reference.
            let before = pools.len();
            pools.retain(|_, pool| Arc::strong_count(pool) > 1);
            tracing::debug!(evicted = before - pools.len(), "closed idle partitions");
        }
        let pool = pools.entry(key).or_insert(pool);
        tracing::trace!(partition = key, "partition opened");
        Ok(Arc::clone(pool))
    }

    /// Keys of every partition file present on disk, ascending.
    pub(crate) fn keys(&self) -> StorageResult<Vec<i64>> {
        let mut keys = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let name = entry?.file_name();
            let key = name
                .to_str()
                .and_then(|n| n.strip_prefix(FILE_PREFIX))
                .and_then(|n| n.strip_suffix(FILE_SUFFIX))
                .and_then(|n| n.parse::<i64>().ok());
            if let Some(key) = key {
                keys.push(key);
            }
        }
        keys.sort_unstable();
        Ok(keys)
    }

    /// Total size of the partition files, excluding their WALs.
    pub(crate) fn disk_size(&self) -> StorageResult<u64> {
        let mut total = 0;
        for key in self.keys()? {
            total += std::fs::metadata(self.file(key))?.len();
        }
        Ok(total)
    }

    /// Number of partitions with an open pool.
    pub(crate) fn open_count(&self) -> usize {
        self.pools.read().len()
    }
}
