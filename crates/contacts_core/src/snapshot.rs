//! Snapshot reader: the live contacts of a user.

use crate::contact::{contact_from_row, Contact, ContactState, CONTACT_COLUMNS};
use crate::error::{CoreError, CoreResult};
use crate::types::UserId;
use contacts_storage::rusqlite::params;
use contacts_storage::{Database, TxnOptions};
use std::sync::Arc;

/// Reads every non-trashed contact of a user, newest first.
///
/// Used by clients without a cursor that only want live data. Unlike a
/// delta from cursor zero, trashed contacts are left out.
pub struct SnapshotReader {
    db: Arc<Database>,
}

impl SnapshotReader {
    /// Creates a reader over an open database.
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Returns all live contacts of `user` ordered by `created_at` descending.
    pub fn all(&self, user: UserId, options: &TxnOptions) -> CoreResult<Vec<Contact>> {
        let contacts = self.db.read(user.as_i64(), "contacts.all", options, |tx| {
            let mut stmt = tx.prepare_cached(&format!(
                "SELECT {CONTACT_COLUMNS} FROM contact \
                 WHERE user_id = ?1 AND last_stmt <> ?2 \
                 ORDER BY created_at DESC, id DESC"
            ))?;
            let rows = stmt
                .query_map(params![user, ContactState::Trashed], contact_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok::<_, CoreError>(rows)
        })?;
        tracing::debug!(%user, count = contacts.len(), "snapshot read");
        Ok(contacts)
    }
}
