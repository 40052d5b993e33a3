//! # Contacts Core
//!
//! Contact store and delta synchronization engine.
//!
//! This crate provides:
//! - The contact record and its mutation state machine
//! - A per-user history sequence stamping every committed mutation
//! - Create, update and bulk trash with all-or-nothing transactions
//! - Delta reads partitioning changes since a cursor by current state
//! - Snapshot reads of every live contact
//!
//! Every operation runs in exactly one storage transaction, so a delta and
//! its returned cursor always describe the same committed state.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod contact;
mod contacts;
mod delta;
mod error;
mod sequence;
mod snapshot;
mod store;
mod types;

pub use contact::{
    Contact, ContactAttributes, ContactState, ExternalId, Mutation, MAX_EMAIL_LEN, MAX_NAME_LEN,
};
pub use contacts::Contacts;
pub use delta::{Delta, DeltaSync};
pub use error::{CoreError, CoreResult};
pub use sequence::{current_history_id, next_history_id};
pub use snapshot::SnapshotReader;
pub use store::ContactStore;
pub use types::{HistoryId, Timestamp, UserId};

pub use contacts_storage::{
    CancellationToken, Database, StorageConfig, StorageError, Synchronous, TxnOptions,
};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
