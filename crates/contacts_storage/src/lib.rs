//! # Contacts Storage
//!
//! Transactional storage handle for the contacts service.
//!
//! This crate provides the lowest layer of the service: a directory of
//! SQLite files, one per partition key, each with the contact schema
//! installed, a connection pool per partition, and a runner that executes
//! each unit of work inside one bounded transaction on one partition.
//!
//! ## Design Principles
//!
//! - The database's transactional isolation is the only mutual exclusion;
//!   there are no in-process locks around data
//! - Writers take their partition's write lock up front (`BEGIN IMMEDIATE`);
//!   writers of different partitions never wait on each other
//! - Readers see one committed snapshot for the life of their transaction
//! - Every transaction has a deadline and may be cancelled; either way it
//!   rolls back completely
//! - No knowledge of contact semantics beyond the table layout
//!
//! ## Example
//!
//! ```rust,no_run
//! use contacts_storage::{Database, StorageError, TxnOptions};
//!
//! let db = Database::open("contacts.db").unwrap();
//! let contacts: i64 = db
//!     .read(1, "count_contacts", &TxnOptions::new(), |tx| {
//!         Ok::<_, StorageError>(tx.query_row(
//!             "SELECT COUNT(*) FROM contact",
//!             [],
//!             |row| row.get(0),
//!         )?)
//!     })
//!     .unwrap();
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod cancel;
mod config;
mod database;
mod error;
mod partition;
mod pool;
mod schema;

pub use cancel::CancellationToken;
pub use config::{StorageConfig, Synchronous};
pub use database::{Database, TxnOptions};
pub use error::{StorageError, StorageResult};
pub use schema::SCHEMA_VERSION;

/// Re-exported so higher layers can write queries without naming `rusqlite` directly.
pub use rusqlite;
