//! Contact types.

mod attributes;
mod id;
mod model;
mod row;

pub use attributes::{ContactAttributes, MAX_EMAIL_LEN, MAX_NAME_LEN};
pub use id::ExternalId;
pub use model::{Contact, ContactState, Mutation};
pub(crate) use row::{contact_from_row, CONTACT_COLUMNS};
