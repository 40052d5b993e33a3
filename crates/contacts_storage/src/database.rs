//! Database handle and transaction runner.

use crate::cancel::CancellationToken;
use crate::config::StorageConfig;
use crate::error::{StorageError, StorageResult};
use crate::partition::Partitions;
use crate::schema;
use rusqlite::{Transaction, TransactionBehavior};
use std::path::Path;
use std::time::{Duration, Instant};

/// Statements between two deadline/cancellation checks.
const PROGRESS_INTERVAL: i32 = 1_000;

/// Per-call transaction options.
#[derive(Debug, Clone, Default)]
pub struct TxnOptions {
    /// Overrides the configured time bound for this call.
    pub timeout: Option<Duration>,
    /// Token the caller may trip to abort the transaction.
    pub cancellation: Option<CancellationToken>,
}

impl TxnOptions {
    /// Options using the configured time bounds and no cancellation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets an explicit time bound.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Attaches a cancellation token.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Read,
    Write,
}

/// Time and cancellation bounds of one transaction.
struct Bounds {
    operation: &'static str,
    limit: Duration,
    deadline: Instant,
    token: Option<CancellationToken>,
}

impl Bounds {
    /// The error to report if the transaction must not commit.
    fn tripped(&self) -> Option<StorageError> {
        if self.token.as_ref().is_some_and(CancellationToken::is_cancelled) {
            Some(StorageError::cancelled(self.operation))
        } else if Instant::now() >= self.deadline {
            Some(StorageError::timeout(self.operation, self.limit))
        } else {
            None
        }
    }

    /// Classifies an error raised by SQLite itself.
    fn classify(&self, err: rusqlite::Error) -> StorageError {
        if StorageError::is_interrupt(&err) {
            self.tripped()
                .unwrap_or_else(|| StorageError::timeout(self.operation, self.limit))
        } else {
            StorageError::from_sqlite(err, self.operation, self.limit)
        }
    }
}

/// The storage handle.
///
/// A database is a directory with one SQLite file per partition key.
/// `Database` owns a connection pool per open partition and runs every
/// unit of work inside a bounded transaction on exactly one partition. It
/// is `Send + Sync`; share it behind an `Arc` and inject it into the
/// components that need storage.
///
/// ```rust,ignore
/// use contacts_storage::{Database, TxnOptions};
///
/// let db = Database::open("contacts.db")?;
/// let count: i64 = db.read(1, "count", &TxnOptions::new(), |tx| {
///     Ok(tx.query_row("SELECT COUNT(*) FROM contact", [], |r| r.get(0))?)
/// })?;
/// ```
pub struct Database {
    config: StorageConfig,
    partitions: Partitions,
}

impl Database {
    /// Opens a database directory with the default configuration.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        Self::open_with_config(path, StorageConfig::default())
    }

    /// Opens a database directory.
    ///
    /// Partition files are created and migrated on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The directory does not exist and `create_if_missing` is false (`NotFound`)
    /// - The path names something other than a directory (`NotADirectory`)
    /// - I/O errors occur
    pub fn open_with_config(path: impl AsRef<Path>, config: StorageConfig) -> StorageResult<Self> {
        let path = path.as_ref();
        if path.exists() {
            if !path.is_dir() {
                return Err(StorageError::NotADirectory {
                    path: path.to_path_buf(),
                });
            }
        } else if config.create_if_missing {
            std::fs::create_dir_all(path)?;
        } else {
            return Err(StorageError::NotFound {
                path: path.to_path_buf(),
            });
        }

        let partitions = Partitions::new(path.to_path_buf(), config.clone());
        tracing::info!(path = %path.display(), "database opened");
        Ok(Self { config, partitions })
    }

    /// Returns the database directory.
    pub fn path(&self) -> &Path {
        self.partitions.root()
    }

    /// Returns the configuration the database was opened with.
    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Returns the schema version partitions are migrated to.
    pub fn schema_version(&self) -> i64 {
        schema::SCHEMA_VERSION
    }

    /// Keys of every partition that has been written to disk, ascending.
    pub fn partition_keys(&self) -> StorageResult<Vec<i64>> {
        self.partitions.keys()
    }

    /// Total size in bytes of the partition files, excluding their WALs.
    pub fn disk_size(&self) -> StorageResult<u64> {
        self.partitions.disk_size()
    }

    /// Runs `f` inside a write transaction on `partition` and commits it.
    ///
    /// The transaction takes the partition's write lock when it begins, so
    /// any read-then-write sequence inside `f` is atomic with respect to
    /// other writers of that partition. Writers of other partitions are
    /// never blocked. If `f` fails, the deadline passes, or the
    /// cancellation token is tripped before commit, the transaction is
    /// rolled back and nothing is committed.
    pub fn write<T, E, F>(
        &self,
        partition: i64,
        operation: &'static str,
        options: &TxnOptions,
        f: F,
    ) -> Result<T, E>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T, E>,
        E: From<StorageError>,
    {
        self.run(Mode::Write, partition, operation, options, f)
    }

    /// Runs `f` inside a read transaction on `partition`.
    ///
    /// Every statement in `f` observes the same committed snapshot: either
    /// all or none of any concurrent write transaction.
    pub fn read<T, E, F>(
        &self,
        partition: i64,
        operation: &'static str,
        options: &TxnOptions,
        f: F,
    ) -> Result<T, E>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T, E>,
        E: From<StorageError>,
    {
        self.run(Mode::Read, partition, operation, options, f)
    }

    fn run<T, E, F>(
        &self,
        mode: Mode,
        partition: i64,
        operation: &'static str,
        options: &TxnOptions,
        f: F,
    ) -> Result<T, E>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T, E>,
        E: From<StorageError>,
    {
        let limit = options.timeout.unwrap_or(match mode {
            Mode::Read => self.config.read_timeout,
            Mode::Write => self.config.write_timeout,
        });
        let started = Instant::now();
        let bounds = Bounds {
            operation,
            limit,
            deadline: started + limit,
            token: options.cancellation.clone(),
        };

        if let Some(err) = bounds.tripped() {
            return Err(err.into());
        }

        let pool = self.partitions.pool(partition)?;
        let mut conn = pool.get()?;
        conn.busy_timeout(limit).map_err(StorageError::from)?;
        let deadline = bounds.deadline;
        let watched = bounds.token.clone();
        conn.progress_handler(
            PROGRESS_INTERVAL,
            Some(move || {
                Instant::now() >= deadline
                    || watched.as_ref().is_some_and(CancellationToken::is_cancelled)
            }),
        );

        let outcome = Self::run_in_txn(&mut conn, mode, &bounds, f);
        conn.progress_handler(0, None::<fn() -> bool>);

        let elapsed = started.elapsed();
        match outcome {
            Ok(value) => {
                tracing::debug!(operation, partition, ?mode, ?elapsed, "transaction committed");
                Ok(value)
            }
            // An interrupted statement surfaces as whatever error the
            // closure wrapped it in; report the actual cause.
            Err(err) => match bounds.tripped() {
                Some(cause @ StorageError::Cancelled { .. }) => {
                    tracing::warn!(operation, partition, ?elapsed, "transaction cancelled, rolled back");
                    Err(cause.into())
                }
                Some(cause) => {
                    tracing::warn!(operation, partition, ?limit, "transaction timed out, rolled back");
                    Err(cause.into())
                }
                None => {
                    tracing::debug!(operation, partition, ?mode, ?elapsed, "transaction rolled back");
                    Err(err)
                }
            },
        }
    }

    fn run_in_txn<T, E, F>(
        conn: &mut rusqlite::Connection,
        mode: Mode,
        bounds: &Bounds,
        f: F,
    ) -> Result<T, E>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T, E>,
        E: From<StorageError>,
    {
        let behavior = match mode {
            Mode::Read => TransactionBehavior::Deferred,
            Mode::Write => TransactionBehavior::Immediate,
        };
        let tx = conn
            .transaction_with_behavior(behavior)
            .map_err(|e| bounds.classify(e))?;
        tracing::trace!(operation = bounds.operation, ?mode, "transaction begun");

        // Dropping `tx` on any error path rolls it back.
        let value = f(&tx)?;
        if let Some(err) = bounds.tripped() {
            return Err(err.into());
        }
        tx.commit().map_err(|e| bounds.classify(e))?;
        Ok(value)
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("path", &self.path())
            .field("open_partitions", &self.partitions.open_count())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::params;
    use std::sync::mpsc;
    use std::sync::Arc;
    use std::thread;
    use tempfile::TempDir;

    const LONG_QUERY: &str =
        "WITH RECURSIVE n(i) AS (SELECT 1 UNION ALL SELECT i + 1 FROM n WHERE i < 1000000) \
         SELECT COUNT(*) FROM n";

    fn open(dir: &TempDir) -> Database {
        Database::open(dir.path().join("contacts.db")).unwrap()
    }

    fn count(db: &Database, partition: i64) -> i64 {
        db.read(partition, "count", &TxnOptions::new(), |tx| {
            Ok::<_, StorageError>(tx.query_row("SELECT COUNT(*) FROM contact", [], |r| {
                r.get(0)
            })?)
        })
        .unwrap()
    }

    fn insert(tx: &Transaction<'_>, uuid: &str) -> Result<(), StorageError> {
        tx.execute(
            "INSERT INTO contact (user_id, uuid, created_at, history_id) VALUES (1, ?1, 0, 1)",
            params![uuid],
        )?;
        Ok(())
    }

    /// Holds a write transaction on `partition` open until the returned sender fires.
    fn hold_write(
        db: &Arc<Database>,
        partition: i64,
    ) -> (mpsc::Sender<()>, thread::JoinHandle<Result<(), StorageError>>) {
        let (locked_tx, locked_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let holder = {
            let db = Arc::clone(db);
            thread::spawn(move || {
                db.write(partition, "holder", &TxnOptions::new(), |tx| {
                    insert(tx, "held")?;
                    locked_tx.send(()).unwrap();
                    release_rx.recv().unwrap();
                    Ok::<_, StorageError>(())
                })
            })
        };
        locked_rx.recv().unwrap();
        (release_tx, holder)
    }

    #[test]
    fn missing_directory_without_create() {
        let dir = TempDir::new().unwrap();
        let err = Database::open_with_config(
            dir.path().join("absent.db"),
            StorageConfig::default().create_if_missing(false),
        )
        .unwrap_err();
        assert!(matches!(err, StorageError::NotFound { .. }));
        assert!(!dir.path().join("absent.db").exists());
    }

    #[test]
    fn plain_file_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("contacts.db");
        std::fs::write(&path, b"not a directory").unwrap();
        assert!(matches!(
            Database::open(&path),
            Err(StorageError::NotADirectory { .. })
        ));
    }

    #[test]
    fn reopen_keeps_data() {
        let dir = TempDir::new().unwrap();
        let db = open(&dir);
        db.write(1, "seed", &TxnOptions::new(), |tx| insert(tx, "a"))
            .unwrap();
        drop(db);

        let db = open(&dir);
        assert_eq!(db.schema_version(), schema::SCHEMA_VERSION);
        assert_eq!(db.partition_keys().unwrap(), vec![1]);
        assert_eq!(count(&db, 1), 1);
    }

    #[test]
    fn partitions_do_not_share_rows() {
        let dir = TempDir::new().unwrap();
        let db = open(&dir);
        db.write(1, "insert", &TxnOptions::new(), |tx| insert(tx, "a"))
            .unwrap();
        db.write(2, "insert", &TxnOptions::new(), |tx| insert(tx, "a"))
            .unwrap();
        assert_eq!(count(&db, 1), 1);
        assert_eq!(count(&db, 2), 1);
        assert_eq!(count(&db, 3), 0);
        assert!(db.disk_size().unwrap() > 0);
    }

    #[test]
    fn write_commits_on_ok() {
        let dir = TempDir::new().unwrap();
        let db = open(&dir);
        db.write(1, "insert", &TxnOptions::new(), |tx| insert(tx, "a"))
            .unwrap();
        assert_eq!(count(&db, 1), 1);
    }

    #[test]
    fn write_rolls_back_on_error() {
        let dir = TempDir::new().unwrap();
        let db = open(&dir);
        let result: Result<(), StorageError> = db.write(1, "insert", &TxnOptions::new(), |tx| {
            insert(tx, "a")?;
            insert(tx, "a")
        });
        assert!(matches!(result, Err(StorageError::Sqlite(_))));
        assert_eq!(count(&db, 1), 0);
    }

    #[test]
    fn pre_cancelled_token_never_begins() {
        let dir = TempDir::new().unwrap();
        let db = open(&dir);
        let token = CancellationToken::new();
        token.cancel();

        let options = TxnOptions::new().with_cancellation(token);
        let result: Result<(), StorageError> =
            db.write(1, "insert", &options, |tx| insert(tx, "a"));
        assert!(matches!(result, Err(StorageError::Cancelled { .. })));
        assert_eq!(count(&db, 1), 0);
    }

    #[test]
    fn cancellation_mid_transaction_rolls_back() {
        let dir = TempDir::new().unwrap();
        let db = open(&dir);
        let token = CancellationToken::new();
        let options = TxnOptions::new().with_cancellation(token.clone());

        let result: Result<(), StorageError> = db.write(1, "insert", &options, |tx| {
            insert(tx, "a")?;
            token.cancel();
            // Long enough to hit the progress handler.
            tx.query_row(LONG_QUERY, [], |r| r.get::<_, i64>(0))?;
            Ok(())
        });
        assert!(matches!(result, Err(StorageError::Cancelled { .. })));
        assert_eq!(count(&db, 1), 0);
    }

    #[test]
    fn cancellation_after_last_statement_rolls_back() {
        let dir = TempDir::new().unwrap();
        let db = open(&dir);
        let token = CancellationToken::new();
        let options = TxnOptions::new().with_cancellation(token.clone());

        let result: Result<(), StorageError> = db.write(1, "insert", &options, |tx| {
            insert(tx, "a")?;
            token.cancel();
            Ok(())
        });
        assert!(matches!(result, Err(StorageError::Cancelled { operation: "insert" })));
        assert_eq!(count(&db, 1), 0);
    }

    #[test]
    fn deadline_interrupts_long_statement() {
        let dir = TempDir::new().unwrap();
        let db = open(&dir);
        let options = TxnOptions::new().with_timeout(Duration::from_millis(20));

        let result: Result<i64, StorageError> = db.read(1, "spin", &options, |tx| {
            thread::sleep(Duration::from_millis(30));
            Ok(tx.query_row(LONG_QUERY, [], |r| r.get(0))?)
        });
        assert!(matches!(result, Err(StorageError::Timeout { .. })));
    }

    #[test]
    fn deadline_passed_before_commit_rolls_back() {
        let dir = TempDir::new().unwrap();
        let db = open(&dir);
        let options = TxnOptions::new().with_timeout(Duration::from_millis(50));

        let result: Result<(), StorageError> = db.write(1, "slow", &options, |tx| {
            insert(tx, "late")?;
            thread::sleep(Duration::from_millis(120));
            Ok(())
        });
        assert!(matches!(
            result,
            Err(StorageError::Timeout {
                operation: "slow",
                ..
            })
        ));
        assert_eq!(count(&db, 1), 0);
    }

    #[test]
    fn interrupt_is_reported_by_cause() {
        let token = CancellationToken::new();
        let bounds = Bounds {
            operation: "op",
            limit: Duration::from_secs(5),
            deadline: Instant::now() + Duration::from_secs(5),
            token: Some(token.clone()),
        };
        let interrupt = || {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_INTERRUPT),
                None,
            )
        };

        assert!(matches!(
            bounds.classify(interrupt()),
            StorageError::Timeout { operation: "op", .. }
        ));
        token.cancel();
        assert!(matches!(
            bounds.classify(interrupt()),
            StorageError::Cancelled { operation: "op" }
        ));
    }

    #[test]
    fn writer_waiting_on_same_partition_times_out() {
        let dir = TempDir::new().unwrap();
        let db = Arc::new(open(&dir));
        let (release, holder) = hold_write(&db, 1);

        let options = TxnOptions::new().with_timeout(Duration::from_millis(50));
        let result: Result<(), StorageError> =
            db.write(1, "waiter", &options, |tx| insert(tx, "waiting"));
        assert!(matches!(
            result,
            Err(StorageError::Timeout {
                operation: "waiter",
                ..
            })
        ));

        release.send(()).unwrap();
        holder.join().unwrap().unwrap();
        assert_eq!(count(&db, 1), 1);
    }

    #[test]
    fn writers_on_other_partitions_are_not_blocked() {
        let dir = TempDir::new().unwrap();
        let db = Arc::new(open(&dir));
        let (release, holder) = hold_write(&db, 1);

        let options = TxnOptions::new().with_timeout(Duration::from_millis(100));
        db.write(2, "other", &options, |tx| insert(tx, "free"))
            .unwrap();
        assert_eq!(count(&db, 2), 1);

        release.send(()).unwrap();
        holder.join().unwrap().unwrap();
        assert_eq!(count(&db, 1), 1);
    }

    #[test]
    fn reader_sees_single_snapshot() {
        let dir = TempDir::new().unwrap();
        let db = Arc::new(open(&dir));
        db.write(1, "seed", &TxnOptions::new(), |tx| insert(tx, "a"))
            .unwrap();

        let (first_read_tx, first_read_rx) = mpsc::channel();
        let (written_tx, written_rx) = mpsc::channel::<()>();

        let reader = {
            let db = Arc::clone(&db);
            thread::spawn(move || {
                db.read(1, "snapshot", &TxnOptions::new(), |tx| {
                    let before: i64 =
                        tx.query_row("SELECT COUNT(*) FROM contact", [], |r| r.get(0))?;
                    first_read_tx.send(()).unwrap();
                    written_rx.recv().unwrap();
                    let after: i64 =
                        tx.query_row("SELECT COUNT(*) FROM contact", [], |r| r.get(0))?;
                    Ok::<_, StorageError>((before, after))
                })
            })
        };

        first_read_rx.recv().unwrap();
        db.write(1, "concurrent", &TxnOptions::new(), |tx| insert(tx, "b"))
            .unwrap();
        written_tx.send(()).unwrap();

        let (before, after) = reader.join().unwrap().unwrap();
        assert_eq!(before, 1);
        assert_eq!(after, 1);
        assert_eq!(count(&db, 1), 2);
    }
}
