//! Contact store: the mutating operations.

use crate::contact::{
    contact_from_row, Contact, ContactAttributes, ContactState, ExternalId, Mutation,
    CONTACT_COLUMNS,
};
use crate::error::{CoreError, CoreResult};
use crate::sequence::next_history_id;
use crate::types::{Timestamp, UserId};
use contacts_storage::rusqlite::types::ToSql;
use contacts_storage::rusqlite::{params, params_from_iter, OptionalExtension, Transaction};
use contacts_storage::{Database, TxnOptions};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Identifiers per `IN (...)` list; keeps each statement well below
/// SQLite's bound-parameter limit.
const TRASH_CHUNK: usize = 500;

/// Owns contact rows and enforces the mutation state machine.
///
/// Every mutation runs in one write transaction that also draws a fresh
/// history id for the user, so a contact's `history_id` always names its
/// most recent committed mutation.
pub struct ContactStore {
    db: Arc<Database>,
}

impl ContactStore {
    /// Creates a store over an open database.
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Creates a contact for `user`.
    ///
    /// Assigns a fresh external id and history id; the stored record starts
    /// in [`ContactState::Inserted`] with no `modified_at`.
    ///
    /// # Errors
    ///
    /// `Validation` for malformed attributes; `Timeout`, `Cancelled` or
    /// `Persistence` if the transaction fails.
    pub fn create(
        &self,
        user: UserId,
        attributes: ContactAttributes,
        options: &TxnOptions,
    ) -> CoreResult<Contact> {
        let attributes = attributes.normalized()?;
        let external_id = ExternalId::new();
        let created_at = Timestamp::now();

        let contact = self.db.write(user.as_i64(), "contacts.create", options, |tx| {
            let history_id = next_history_id(tx, user)?;
            let contact = tx.query_row(
                &format!(
                    "INSERT INTO contact (user_id, uuid, email_address, firstname, lastname, \
                     created_at, history_id, last_stmt) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8) \
                     RETURNING {CONTACT_COLUMNS}"
                ),
                params![
                    user,
                    external_id,
                    attributes.email_address,
                    attributes.first_name,
                    attributes.last_name,
                    created_at,
                    history_id,
                    ContactState::Inserted,
                ],
                contact_from_row,
            )?;
            Ok::<_, CoreError>(contact)
        })?;

        tracing::info!(
            %user,
            external_id = %contact.external_id,
            history_id = contact.history_id.as_u64(),
            "contact created"
        );
        Ok(contact)
    }

    /// Overwrites the attributes of one of `user`'s contacts.
    ///
    /// # Errors
    ///
    /// - `Validation` for malformed attributes
    /// - `NotFound` if the contact does not exist or belongs to another user
    /// - `TerminalStateViolation` if the contact is trashed
    /// - `Timeout`, `Cancelled` or `Persistence` if the transaction fails
    pub fn update(
        &self,
        user: UserId,
        external_id: ExternalId,
        attributes: ContactAttributes,
        options: &TxnOptions,
    ) -> CoreResult<Contact> {
        let attributes = attributes.normalized()?;
        let modified_at = Timestamp::now();

        let contact = self.db.write(user.as_i64(), "contacts.update", options, |tx| {
            let existing = find(tx, user, external_id)?
                .ok_or_else(|| CoreError::not_found(external_id))?;
            let state = existing
                .state
                .apply(Mutation::Update)
                .ok_or_else(|| CoreError::terminal_state(external_id))?;

            let history_id = next_history_id(tx, user)?;
            let contact = tx.query_row(
                &format!(
                    "UPDATE contact \
                     SET email_address = ?1, firstname = ?2, lastname = ?3, \
                         modified_at = ?4, history_id = ?5, last_stmt = ?6 \
                     WHERE id = ?7 \
                     RETURNING {CONTACT_COLUMNS}"
                ),
                params![
                    attributes.email_address,
                    attributes.first_name,
                    attributes.last_name,
                    modified_at,
                    history_id,
                    state,
                    existing.internal_id,
                ],
                contact_from_row,
            )?;
            Ok::<_, CoreError>(contact)
        })?;

        tracing::info!(
            %user,
            external_id = %contact.external_id,
            history_id = contact.history_id.as_u64(),
            "contact updated"
        );
        Ok(contact)
    }

    /// Trashes every listed contact that belongs to `user` and is not
    /// already trashed.
    ///
    /// Unknown, foreign and already-trashed ids are skipped, so repeating a
    /// call is a no-op. Each newly trashed contact consumes exactly one
    /// history id. Returns how many contacts were trashed.
    pub fn trash_many(
        &self,
        user: UserId,
        external_ids: &[ExternalId],
        options: &TxnOptions,
    ) -> CoreResult<usize> {
        let requested: BTreeSet<ExternalId> = external_ids.iter().copied().collect();
        if requested.is_empty() {
            return Ok(0);
        }
        let requested: Vec<ExternalId> = requested.into_iter().collect();
        let modified_at = Timestamp::now();

        let trashed = self.db.write(user.as_i64(), "contacts.trash", options, |tx| {
            let mut targets = Vec::new();
            for chunk in requested.chunks(TRASH_CHUNK) {
                targets.extend(trashable_ids(tx, user, chunk)?);
            }
            targets.sort_unstable();

            let mut stmt = tx.prepare(
                "UPDATE contact SET last_stmt = ?1, history_id = ?2, modified_at = ?3 WHERE id = ?4",
            )?;
            for internal_id in &targets {
                let history_id = next_history_id(tx, user)?;
                stmt.execute(params![
                    ContactState::Trashed,
                    history_id,
                    modified_at,
                    internal_id
                ])?;
            }
            Ok::<_, CoreError>(targets.len())
        })?;

        tracing::info!(
            %user,
            requested = requested.len(),
            trashed,
            "contacts trashed"
        );
        Ok(trashed)
    }

    /// Returns one of `user`'s contacts in whatever state it is in.
    ///
    /// # Errors
    ///
    /// `NotFound` if the contact does not exist or belongs to another user.
    pub fn get(
        &self,
        user: UserId,
        external_id: ExternalId,
        options: &TxnOptions,
    ) -> CoreResult<Contact> {
        self.db.read(user.as_i64(), "contacts.get", options, |tx| {
            find(tx, user, external_id)?.ok_or_else(|| CoreError::not_found(external_id))
        })
    }
}

impl std::fmt::Debug for ContactStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContactStore")
            .field("db", &self.db)
            .finish()
    }
}

/// Looks a contact up by owner and external id.
fn find(tx: &Transaction<'_>, user: UserId, external_id: ExternalId) -> CoreResult<Option<Contact>> {
    let contact = tx
        .query_row(
            &format!("SELECT {CONTACT_COLUMNS} FROM contact WHERE user_id = ?1 AND uuid = ?2"),
            params![user, external_id],
            contact_from_row,
        )
        .optional()?;
    Ok(contact)
}

/// Internal ids of the non-trashed contacts of `user` among `chunk`.
fn trashable_ids(tx: &Transaction<'_>, user: UserId, chunk: &[ExternalId]) -> CoreResult<Vec<i64>> {
    let placeholders = (0..chunk.len())
        .map(|i| format!("?{}", i + 3))
        .collect::<Vec<_>>()
        .join(", ");
    let mut stmt = tx.prepare(&format!(
        "SELECT id FROM contact WHERE user_id = ?1 AND last_stmt <> ?2 AND uuid IN ({placeholders})"
    ))?;

    let trashed = ContactState::Trashed;
    let bound = [&user as &dyn ToSql, &trashed as &dyn ToSql]
        .into_iter()
        .chain(chunk.iter().map(|id| id as &dyn ToSql));
    let ids = stmt
        .query_map(params_from_iter(bound), |row| row.get::<_, i64>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ids)
}
