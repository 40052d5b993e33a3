//! Schema installation and migrations.
//!
//! The `contact` table holds one row per contact. `last_stmt` records the
//! kind of the most recent mutation (0 = inserted, 1 = updated,
//! 2 = trashed). `contact_history_seq` holds the per-user history counter
//! and lives in the same partition file as the user's contacts so both are
//! updated atomically.

use crate::error::{StorageError, StorageResult};
use rusqlite::{params, Connection, OptionalExtension};

/// Highest schema version this build knows how to install.
pub const SCHEMA_VERSION: i64 = 1;

const MIGRATIONS: &[(i64, &str)] = &[(
    1,
    r#"
    CREATE TABLE IF NOT EXISTS contact (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      user_id INTEGER NOT NULL,
      uuid TEXT NOT NULL UNIQUE,
      email_address TEXT,
      firstname TEXT,
      lastname TEXT,
      created_at INTEGER NOT NULL,
      modified_at INTEGER,
      history_id INTEGER NOT NULL,
      last_stmt INTEGER NOT NULL DEFAULT 0 CHECK (last_stmt IN (0, 1, 2))
    );

    CREATE TABLE IF NOT EXISTS contact_history_seq (
      user_id INTEGER PRIMARY KEY,
      last_history_id INTEGER NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_contact_user_stmt_history
      ON contact(user_id, last_stmt, history_id);
    CREATE INDEX IF NOT EXISTS idx_contact_user_created
      ON contact(user_id, created_at);
    "#,
)];

/// Brings the schema of `conn` up to [`SCHEMA_VERSION`].
///
/// Returns the version the database is at afterwards.
pub(crate) fn migrate(conn: &mut Connection) -> StorageResult<i64> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS meta (key TEXT PRIMARY KEY, value TEXT NOT NULL);",
    )?;

    let tx = conn.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
    let current = read_version(&tx)?;
    if current > SCHEMA_VERSION {
        return Err(StorageError::UnsupportedSchema {
            found: current,
            supported: SCHEMA_VERSION,
        });
    }

    for (version, sql) in MIGRATIONS.iter().filter(|(v, _)| *v > current) {
        tracing::debug!(version, "applying schema migration");
        tx.execute_batch(sql)?;
        tx.execute(
            "INSERT INTO meta(key, value) VALUES ('schema_version', ?1) \
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![version.to_string()],
        )?;
    }

    tx.commit()?;
    Ok(SCHEMA_VERSION.max(current))
}

/// Reads the recorded schema version, 0 for a fresh database.
pub(crate) fn read_version(conn: &Connection) -> StorageResult<i64> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT value FROM meta WHERE key = 'schema_version'",
            [],
            |row| row.get(0),
        )
        .optional()?;
    Ok(raw.and_then(|v| v.parse().ok()).unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_database_is_migrated() {
        let mut conn = Connection::open_in_memory().unwrap();
        assert_eq!(migrate(&mut conn).unwrap(), SCHEMA_VERSION);
        assert_eq!(read_version(&conn).unwrap(), SCHEMA_VERSION);

        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' \
                 AND name IN ('contact', 'contact_history_seq')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 2);
    }

    #[test]
    fn migrate_is_idempotent() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn).unwrap();
        assert_eq!(migrate(&mut conn).unwrap(), SCHEMA_VERSION);
    }

    #[test]
    fn newer_schema_is_rejected() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn).unwrap();
        conn.execute(
            "UPDATE meta SET value = '99' WHERE key = 'schema_version'",
            [],
        )
        .unwrap();

        let err = migrate(&mut conn).unwrap_err();
        assert!(matches!(
            err,
            StorageError::UnsupportedSchema { found: 99, .. }
        ));
    }

    #[test]
    fn last_stmt_is_constrained() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn).unwrap();
        let result = conn.execute(
            "INSERT INTO contact (user_id, uuid, created_at, history_id, last_stmt) \
             VALUES (1, 'x', 0, 1, 7)",
            [],
        );
        assert!(result.is_err());
    }
}
