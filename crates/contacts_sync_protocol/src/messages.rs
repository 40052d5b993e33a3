//! Request and response messages.

use crate::error::{ProtocolError, ProtocolResult};
use contacts_core::{Contact, ContactAttributes, CoreError, Delta, ExternalId, HistoryId};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// JSON encoding shared by every message.
pub trait WireMessage: Serialize + DeserializeOwned {
    /// Encodes to a JSON string.
    fn encode(&self) -> ProtocolResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decodes from JSON bytes.
    fn decode(bytes: &[u8]) -> ProtocolResult<Self> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Err(ProtocolError::Empty);
        }
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// A contact as clients see it.
///
/// Internal id, owner, history id and state stay on the server; timestamps
/// travel as epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactRecord {
    /// External identifier.
    pub uuid: String,
    /// Email address.
    pub email_address: Option<String>,
    /// Given name.
    pub firstname: Option<String>,
    /// Family name.
    pub lastname: Option<String>,
    /// Creation time in epoch milliseconds.
    pub created_at: i64,
    /// Last modification time in epoch milliseconds.
    pub modified_at: Option<i64>,
}

impl From<&Contact> for ContactRecord {
    fn from(contact: &Contact) -> Self {
        Self {
            uuid: contact.external_id.to_string(),
            email_address: contact.email_address.clone(),
            firstname: contact.first_name.clone(),
            lastname: contact.last_name.clone(),
            created_at: contact.created_at.as_millis(),
            modified_at: contact.modified_at.map(|t| t.as_millis()),
        }
    }
}

impl WireMessage for ContactRecord {}

/// Converts stored contacts to records, keeping their order.
pub fn records(contacts: &[Contact]) -> Vec<ContactRecord> {
    contacts.iter().map(ContactRecord::from).collect()
}

/// Body of a create call.
///
/// Clients post a whole record; anything but the attributes is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateContactRequest {
    /// Email address.
    pub email_address: Option<String>,
    /// Given name.
    pub firstname: Option<String>,
    /// Family name.
    pub lastname: Option<String>,
}

impl CreateContactRequest {
    /// Returns the attributes to store.
    pub fn attributes(&self) -> ContactAttributes {
        ContactAttributes {
            email_address: self.email_address.clone(),
            first_name: self.firstname.clone(),
            last_name: self.lastname.clone(),
        }
    }
}

impl WireMessage for CreateContactRequest {}

/// Body of an update call: the target and its full replacement attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateContactRequest {
    /// External identifier of the contact to update.
    pub uuid: String,
    /// Email address.
    pub email_address: Option<String>,
    /// Given name.
    pub firstname: Option<String>,
    /// Family name.
    pub lastname: Option<String>,
}

impl UpdateContactRequest {
    /// Returns the target id.
    ///
    /// A uuid that does not parse cannot name any contact, so it is
    /// reported as `NotFound` like any other unknown id.
    pub fn external_id(&self) -> Result<ExternalId, CoreError> {
        ExternalId::parse(&self.uuid).ok_or_else(|| CoreError::not_found(&self.uuid))
    }

    /// Returns the replacement attributes.
    pub fn attributes(&self) -> ContactAttributes {
        ContactAttributes {
            email_address: self.email_address.clone(),
            first_name: self.firstname.clone(),
            last_name: self.lastname.clone(),
        }
    }
}

impl WireMessage for UpdateContactRequest {}

/// Body of a delta call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeltaRequest {
    /// Highest history id the client has seen; zero for a full resync.
    #[serde(default)]
    pub last_history_id: u64,
}

impl DeltaRequest {
    /// Creates a request from a cursor.
    pub fn new(cursor: HistoryId) -> Self {
        Self {
            last_history_id: cursor.as_u64(),
        }
    }

    /// Returns the cursor.
    pub fn cursor(&self) -> HistoryId {
        HistoryId::new(self.last_history_id)
    }
}

impl WireMessage for DeltaRequest {}

/// Answer to a delta call.
///
/// The list keys keep the capitalised names deployed clients read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeltaResponse {
    /// The client's next cursor.
    pub last_history_id: u64,
    /// Contacts created since the cursor and not modified since.
    #[serde(rename = "ContactsInserted", default)]
    pub contacts_inserted: Vec<ContactRecord>,
    /// Contacts last updated since the cursor.
    #[serde(rename = "ContactsUpdated", default)]
    pub contacts_updated: Vec<ContactRecord>,
    /// Contacts trashed since the cursor.
    #[serde(rename = "ContactsTrashed", default)]
    pub contacts_trashed: Vec<ContactRecord>,
}

impl From<&Delta> for DeltaResponse {
    fn from(delta: &Delta) -> Self {
        Self {
            last_history_id: delta.cursor.as_u64(),
            contacts_inserted: records(&delta.inserted),
            contacts_updated: records(&delta.updated),
            contacts_trashed: records(&delta.trashed),
        }
    }
}

impl WireMessage for DeltaResponse {}

/// Body of a trash call: a bare JSON array of uuids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrashRequest(pub Vec<String>);

impl TrashRequest {
    /// Returns the ids that parse. The rest cannot name a contact and are skipped.
    pub fn external_ids(&self) -> Vec<ExternalId> {
        self.0.iter().filter_map(|s| ExternalId::parse(s)).collect()
    }
}

impl WireMessage for TrashRequest {}

/// Acknowledgement body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Always `"OK"` on success.
    pub status: String,
}

impl StatusResponse {
    /// The success acknowledgement.
    pub fn ok() -> Self {
        Self {
            status: "OK".to_string(),
        }
    }
}

impl WireMessage for StatusResponse {}

/// Error body with an HTTP-like status code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable message.
    pub error: String,
    /// Status code.
    pub status: u16,
}

impl ErrorResponse {
    /// Status code for a core error.
    pub fn status_code(err: &CoreError) -> u16 {
        match err {
            CoreError::Validation { .. } => 400,
            CoreError::NotFound { .. } => 404,
            CoreError::TerminalStateViolation { .. } => 409,
            CoreError::Cancelled { .. } => 499,
            CoreError::Timeout { .. } => 503,
            CoreError::Persistence(_) => 500,
        }
    }
}

impl From<&CoreError> for ErrorResponse {
    fn from(err: &CoreError) -> Self {
        // Storage details stay in the logs.
        let error = match err {
            CoreError::Persistence(_) => "internal storage error".to_string(),
            other => other.to_string(),
        };
        Self {
            error,
            status: Self::status_code(err),
        }
    }
}

impl From<&ProtocolError> for ErrorResponse {
    fn from(err: &ProtocolError) -> Self {
        Self {
            error: err.to_string(),
            status: err.status_code(),
        }
    }
}

impl WireMessage for ErrorResponse {}
