//! # Contacts Testkit
//!
//! Test utilities for the contacts service.
//!
//! This crate provides:
//! - Test fixtures over temporary databases
//! - Property-based test generators using proptest
//! - An in-memory reference model to check the store against
//! - Concurrency stress helpers
//!
//! ## Usage
//!
//! ```rust
//! use contacts_testkit::prelude::*;
//! use contacts_core::{HistoryId, UserId};
//!
//! with_temp_contacts(|contacts| {
//!     let user = UserId::new(1);
//!     contacts.create(user, email("a@x.com")).unwrap();
//!     let delta = contacts.get_delta(user, HistoryId::ZERO).unwrap();
//!     assert_eq!(delta.inserted.len(), 1);
//! });
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod model;
pub mod stress;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::model::*;
    pub use crate::stress::*;
}

pub use fixtures::*;
pub use generators::*;
pub use model::*;
pub use stress::*;
