//! Per-user history sequence.
//!
//! One row per user in `contact_history_seq` holds the highest history id
//! ever issued to that user. Issuing the next id is a single upsert that
//! increments the row and returns the new value, so it is atomic on its own;
//! running it inside the same write transaction as the mutation it stamps
//! means the id is only "issued" if that mutation commits.

use crate::error::CoreResult;
use crate::types::{HistoryId, UserId};
use contacts_storage::rusqlite::{params, OptionalExtension, Transaction};

/// Issues the next history id for `user`.
///
/// Must be called inside a write transaction on the user's partition;
/// concurrent callers for the same user serialize on that partition's write
/// lock, so no two committed mutations observe the same value and values
/// increase in commit order.
pub fn next_history_id(tx: &Transaction<'_>, user: UserId) -> CoreResult<HistoryId> {
    let next = tx.query_row(
        "INSERT INTO contact_history_seq (user_id, last_history_id) VALUES (?1, 1) \
         ON CONFLICT(user_id) DO UPDATE SET last_history_id = last_history_id + 1 \
         RETURNING last_history_id",
        params![user],
        |row| row.get::<_, HistoryId>(0),
    )?;
    tracing::trace!(%user, history_id = next.as_u64(), "issued history id");
    Ok(next)
}

/// Returns the highest history id issued to `user`, or zero if none was.
pub fn current_history_id(tx: &Transaction<'_>, user: UserId) -> CoreResult<HistoryId> {
    let current = tx
        .query_row(
            "SELECT last_history_id FROM contact_history_seq WHERE user_id = ?1",
            params![user],
            |row| row.get::<_, HistoryId>(0),
        )
        .optional()?;
    Ok(current.unwrap_or(HistoryId::ZERO))
}
