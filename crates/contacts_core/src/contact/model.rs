//! The stored contact record and its mutation state machine.

use super::{ContactAttributes, ExternalId};
use crate::types::{HistoryId, Timestamp, UserId};
use contacts_storage::rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};

/// Kind of the most recent mutation applied to a contact.
///
/// ```text
/// Inserted --update--> Updated --update--> Updated
///     |                   |
///     +------trash--------+-----trash----> Trashed (terminal)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ContactState {
    /// Created and not modified since.
    Inserted,
    /// Updated at least once.
    Updated,
    /// Soft-deleted. No further transition is possible.
    Trashed,
}

/// A mutation that moves a contact between states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    /// Overwrite the attributes.
    Update,
    /// Soft-delete.
    Trash,
}

impl ContactState {
    /// All states, in storage-code order.
    pub const ALL: [ContactState; 3] = [
        ContactState::Inserted,
        ContactState::Updated,
        ContactState::Trashed,
    ];

    /// Storage code recorded in the `last_stmt` column.
    #[must_use]
    pub const fn code(self) -> i64 {
        match self {
            ContactState::Inserted => 0,
            ContactState::Updated => 1,
            ContactState::Trashed => 2,
        }
    }

    /// Decodes a storage code.
    #[must_use]
    pub const fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(ContactState::Inserted),
            1 => Some(ContactState::Updated),
            2 => Some(ContactState::Trashed),
            _ => None,
        }
    }

    /// Returns true for the terminal state.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, ContactState::Trashed)
    }

    /// Returns the state after applying `mutation`, or `None` if the
    /// transition is not allowed.
    #[must_use]
    pub const fn apply(self, mutation: Mutation) -> Option<ContactState> {
        match (self, mutation) {
            (ContactState::Trashed, _) => None,
            (_, Mutation::Update) => Some(ContactState::Updated),
            (_, Mutation::Trash) => Some(ContactState::Trashed),
        }
    }
}

impl ToSql for ContactState {
    fn to_sql(&self) -> contacts_storage::rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.code()))
    }
}

impl FromSql for ContactState {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let code = i64::column_result(value)?;
        Self::from_code(code).ok_or(FromSqlError::OutOfRange(code))
    }
}

/// A contact as stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contact {
    /// Surrogate row id, unique per user. Stable, never sent to clients.
    pub internal_id: i64,
    /// Owning user.
    pub user_id: UserId,
    /// Client-facing identifier.
    pub external_id: ExternalId,
    /// Email address.
    pub email_address: Option<String>,
    /// Given name.
    pub first_name: Option<String>,
    /// Family name.
    pub last_name: Option<String>,
    /// Creation time.
    pub created_at: Timestamp,
    /// Time of the most recent update or trash; `None` until then.
    pub modified_at: Option<Timestamp>,
    /// History id issued for the most recent mutation.
    pub history_id: HistoryId,
    /// Kind of the most recent mutation.
    pub state: ContactState,
}

impl Contact {
    /// Returns the display attributes.
    pub fn attributes(&self) -> ContactAttributes {
        ContactAttributes {
            email_address: self.email_address.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
        }
    }

    /// Returns true unless the contact is trashed.
    pub fn is_live(&self) -> bool {
        !self.state.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_roundtrip() {
        for state in ContactState::ALL {
            assert_eq!(ContactState::from_code(state.code()), Some(state));
        }
        assert_eq!(ContactState::from_code(3), None);
    }

    #[test]
    fn trashed_is_terminal() {
        assert!(ContactState::Trashed.is_terminal());
        assert_eq!(ContactState::Trashed.apply(Mutation::Update), None);
        assert_eq!(ContactState::Trashed.apply(Mutation::Trash), None);
    }

    #[test]
    fn transitions() {
        assert_eq!(
            ContactState::Inserted.apply(Mutation::Update),
            Some(ContactState::Updated)
        );
        assert_eq!(
            ContactState::Updated.apply(Mutation::Update),
            Some(ContactState::Updated)
        );
        assert_eq!(
            ContactState::Inserted.apply(Mutation::Trash),
            Some(ContactState::Trashed)
        );
        assert_eq!(
            ContactState::Updated.apply(Mutation::Trash),
            Some(ContactState::Trashed)
        );
    }
}
