//! Delta sync engine.
//!
//! A client holds a cursor (the highest history id it has seen) and asks
//! what changed since. The answer partitions every contact mutated after
//! the cursor by its *current* state, so a contact created and then trashed
//! after the cursor appears once, as trashed. The partition and the new
//! cursor are read in one transaction and therefore describe the same
//! committed snapshot: nothing is missed and nothing is counted twice.

use crate::contact::{contact_from_row, Contact, ContactState, CONTACT_COLUMNS};
use crate::error::{CoreError, CoreResult};
use crate::sequence::current_history_id;
use crate::types::{HistoryId, UserId};
use contacts_storage::rusqlite::{params, Transaction};
use contacts_storage::{Database, TxnOptions};
use std::sync::Arc;

/// Changes since a cursor, partitioned by current state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delta {
    /// Contacts created after the cursor and not modified since.
    pub inserted: Vec<Contact>,
    /// Contacts whose latest mutation after the cursor was an update.
    pub updated: Vec<Contact>,
    /// Contacts trashed after the cursor.
    pub trashed: Vec<Contact>,
    /// The user's latest history id; the client's next cursor.
    pub cursor: HistoryId,
}

impl Delta {
    /// A delta with no changes at `cursor`.
    pub fn empty(cursor: HistoryId) -> Self {
        Self {
            inserted: Vec::new(),
            updated: Vec::new(),
            trashed: Vec::new(),
            cursor,
        }
    }

    /// Returns true if nothing changed.
    pub fn is_empty(&self) -> bool {
        self.inserted.is_empty() && self.updated.is_empty() && self.trashed.is_empty()
    }

    /// Total number of contacts across the three lists.
    pub fn len(&self) -> usize {
        self.inserted.len() + self.updated.len() + self.trashed.len()
    }

    /// Returns the list for `state`.
    pub fn partition(&self, state: ContactState) -> &[Contact] {
        match state {
            ContactState::Inserted => &self.inserted,
            ContactState::Updated => &self.updated,
            ContactState::Trashed => &self.trashed,
        }
    }
}

/// Answers "what changed since cursor H" for a user.
pub struct DeltaSync {
    db: Arc<Database>,
}

impl DeltaSync {
    /// Creates an engine over an open database.
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Returns the contacts of `user` mutated after `cursor`, with the new cursor.
    ///
    /// Cursor zero (or a user with no history) yields everything ever
    /// mutated, trashed contacts included. When nothing changed the three
    /// lists are empty and the cursor is returned unchanged, without
    /// scanning contacts.
    ///
    /// # Errors
    ///
    /// - `Validation` if `cursor` is ahead of anything issued to the user
    /// - `Timeout`, `Cancelled` or `Persistence` if the read fails
    pub fn delta(&self, user: UserId, cursor: HistoryId, options: &TxnOptions) -> CoreResult<Delta> {
        let delta = self.db.read(user.as_i64(), "contacts.delta", options, |tx| {
            // First statement: fixes the snapshot everything below reads.
            let latest = current_history_id(tx, user)?;
            if latest < cursor {
                return Err(CoreError::validation(format!(
                    "cursor {} is ahead of the latest history id {}",
                    cursor.as_u64(),
                    latest.as_u64()
                )));
            }
            if latest == cursor {
                return Ok(Delta::empty(latest));
            }

            Ok(Delta {
                inserted: changed_since(tx, user, ContactState::Inserted, cursor)?,
                updated: changed_since(tx, user, ContactState::Updated, cursor)?,
                trashed: changed_since(tx, user, ContactState::Trashed, cursor)?,
                cursor: latest,
            })
        })?;

        tracing::debug!(
            %user,
            from = cursor.as_u64(),
            to = delta.cursor.as_u64(),
            inserted = delta.inserted.len(),
            updated = delta.updated.len(),
            trashed = delta.trashed.len(),
            "delta read"
        );
        Ok(delta)
    }
}

fn changed_since(
    tx: &Transaction<'_>,
    user: UserId,
    state: ContactState,
    cursor: HistoryId,
) -> CoreResult<Vec<Contact>> {
    let mut stmt = tx.prepare_cached(&format!(
        "SELECT {CONTACT_COLUMNS} FROM contact \
         WHERE user_id = ?1 AND last_stmt = ?2 AND history_id > ?3 \
         ORDER BY created_at DESC, id DESC"
    ))?;
    let contacts = stmt
        .query_map(params![user, state, cursor], contact_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(contacts)
}
