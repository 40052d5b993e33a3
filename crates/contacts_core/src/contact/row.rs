//! Explicit row projection for the `contact` table.

use super::Contact;
use contacts_storage::rusqlite::{Result as SqlResult, Row};

/// Column list every contact query selects.
pub(crate) const CONTACT_COLUMNS: &str = "id, user_id, uuid, email_address, firstname, lastname, \
     created_at, modified_at, history_id, last_stmt";

/// Maps one row selected with [`CONTACT_COLUMNS`] to a [`Contact`].
///
/// Columns are read by name, so the projection order is free to change.
pub(crate) fn contact_from_row(row: &Row<'_>) -> SqlResult<Contact> {
    Ok(Contact {
        internal_id: row.get("id")?,
        user_id: row.get("user_id")?,
        external_id: row.get("uuid")?,
        email_address: row.get("email_address")?,
        first_name: row.get("firstname")?,
        last_name: row.get("lastname")?,
        created_at: row.get("created_at")?,
        modified_at: row.get("modified_at")?,
        history_id: row.get("history_id")?,
        state: row.get("last_stmt")?,
    })
}
