//! # Contacts Sync Protocol
//!
//! Wire messages for the contacts sync service.
//!
//! This crate provides:
//! - `ContactRecord`, the client-facing shape of a contact
//! - Request bodies for create, update, delta and trash calls
//! - `DeltaResponse`, `StatusResponse` and `ErrorResponse`
//! - JSON encoding/decoding through [`WireMessage`]
//!
//! This is a pure protocol crate with no I/O operations.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod messages;

pub use error::{ProtocolError, ProtocolResult};
pub use messages::{
    records, ContactRecord, CreateContactRequest, DeltaRequest, DeltaResponse, ErrorResponse,
    StatusResponse, TrashRequest, UpdateContactRequest, WireMessage,
};
