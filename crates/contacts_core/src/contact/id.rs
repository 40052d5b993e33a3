//! External contact identifier.

use contacts_storage::rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Client-facing identifier of a contact.
///
/// External IDs are random UUIDs that are:
/// - Assigned once, when the contact is created
/// - Globally unique across all users
/// - Immutable and never reused
///
/// They are stored in their lowercase hyphenated text form.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ExternalId(Uuid);

impl ExternalId {
    /// Creates a new random external ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an external ID from a UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Parses the textual form.
    ///
    /// Returns `None` if the text is not a UUID.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        Uuid::parse_str(text.trim()).ok().map(Self)
    }
}

impl Default for ExternalId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ExternalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ExternalId({})", self.0)
    }
}

impl fmt::Display for ExternalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for ExternalId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

impl From<Uuid> for ExternalId {
    fn from(uuid: Uuid) -> Self {
        Self::from_uuid(uuid)
    }
}

impl From<ExternalId> for Uuid {
    fn from(id: ExternalId) -> Self {
        id.0
    }
}

impl ToSql for ExternalId {
    fn to_sql(&self) -> contacts_storage::rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.to_string()))
    }
}

impl FromSql for ExternalId {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let text = value.as_str()?;
        Uuid::parse_str(text)
            .map(Self)
            .map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_is_unique() {
        assert_ne!(ExternalId::new(), ExternalId::new());
    }

    #[test]
    fn parse_roundtrip() {
        let id = ExternalId::new();
        assert_eq!(ExternalId::parse(&id.to_string()), Some(id));
        assert_eq!(id.to_string().parse::<ExternalId>().unwrap(), id);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert_eq!(ExternalId::parse("not-a-uuid"), None);
        assert_eq!(ExternalId::parse("\"); DROP TABLE contact; --"), None);
    }

    #[test]
    fn display_is_lowercase_hyphenated() {
        let id = ExternalId::from_uuid(Uuid::from_bytes([0xAB; 16]));
        assert_eq!(id.to_string(), "abababab-abab-abab-abab-abababababab");
    }

    #[test]
    fn sql_text_roundtrip() {
        let id = ExternalId::new();
        let text = id.to_string();
        let back = ExternalId::column_result(ValueRef::Text(text.as_bytes())).unwrap();
        assert_eq!(back, id);
    }
}
