//! Inspect command implementation.

use super::Context;
use crate::error::CliResult;
use contacts_core::{ContactState, CoreError, TxnOptions};
use serde::Serialize;

/// Database inspection result.
#[derive(Debug, Default, Serialize)]
pub struct InspectResult {
    /// Database directory.
    pub path: String,
    /// Total size of the partition files in bytes, excluding their WALs.
    pub file_size: u64,
    /// Schema version.
    pub schema_version: i64,
    /// Users with at least one issued history id.
    pub user_count: u64,
    /// Contacts whose latest mutation was a create.
    pub inserted: u64,
    /// Contacts whose latest mutation was an update.
    pub updated: u64,
    /// Trashed contacts.
    pub trashed: u64,
    /// Highest history id issued to any user.
    pub max_history_id: u64,
}

impl InspectResult {
    /// Total contacts in any state.
    pub fn total(&self) -> u64 {
        self.inserted + self.updated + self.trashed
    }
}

/// Collects counts, one read snapshot per user partition.
pub fn run(ctx: &Context) -> CliResult<InspectResult> {
    let contacts = ctx.open("inspect")?;
    let db = contacts.database();

    let mut result = InspectResult {
        path: db.path().display().to_string(),
        file_size: db.disk_size().map_err(CoreError::from)?,
        schema_version: db.schema_version(),
        ..InspectResult::default()
    };
    for partition in db.partition_keys().map_err(CoreError::from)? {
        db.read(partition, "cli.inspect", &TxnOptions::new(), |tx| {
            let mut stmt =
                tx.prepare("SELECT last_stmt, COUNT(*) FROM contact GROUP BY last_stmt")?;
            let rows = stmt.query_map([], |row| {
                Ok((row.get::<_, ContactState>(0)?, row.get::<_, u64>(1)?))
            })?;
            for row in rows {
                let (state, count) = row?;
                match state {
                    ContactState::Inserted => result.inserted += count,
                    ContactState::Updated => result.updated += count,
                    ContactState::Trashed => result.trashed += count,
                }
            }
            let (users, max): (u64, u64) = tx.query_row(
                "SELECT COUNT(*), COALESCE(MAX(last_history_id), 0) FROM contact_history_seq",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?;
            result.user_count += users;
            result.max_history_id = result.max_history_id.max(max);
            Ok::<_, CoreError>(())
        })?;
    }
    Ok(result)
}

/// Prints a human-readable summary.
pub fn print_text(result: &InspectResult) {
    println!("Database: {}", result.path);
    println!("  Size:           {} bytes", result.file_size);
    println!("  Schema version: {}", result.schema_version);
    println!("  Users:          {}", result.user_count);
    println!("  Contacts:       {}", result.total());
    println!("    inserted:     {}", result.inserted);
    println!("    updated:      {}", result.updated);
    println!("    trashed:      {}", result.trashed);
    println!("  Max history id: {}", result.max_history_id);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{create, testing::context, trash};
    use crate::error::CliError;

    #[test]
    fn counts_by_state() {
        let (_dir, ctx) = context();
        let req = create::request(None, Some("a@x.com".into()), None, None).unwrap();
        let a = create::run(&ctx, 1, &req).unwrap();
        create::run(&ctx, 1, &req).unwrap();
        create::run(&ctx, 2, &req).unwrap();
        trash::run(&ctx, 1, &trash::request(None, vec![a.uuid]).unwrap()).unwrap();

        let result = run(&ctx).unwrap();
        assert_eq!(result.inserted, 2);
        assert_eq!(result.trashed, 1);
        assert_eq!(result.total(), 3);
        assert_eq!(result.user_count, 2);
        assert_eq!(result.max_history_id, 3);
    }

    #[test]
    fn missing_database_is_not_created() {
        let dir = tempfile::TempDir::new().unwrap();
        let ctx = Context {
            path: Some(dir.path().join("absent.db")),
            config: contacts_core::StorageConfig::default(),
        };
        assert!(matches!(run(&ctx), Err(CliError::NoDatabase { .. })));
        assert!(!dir.path().join("absent.db").exists());
    }
}
