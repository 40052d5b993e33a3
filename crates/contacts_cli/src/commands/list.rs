//! List command implementation.

use super::Context;
use crate::error::CliResult;
use contacts_core::UserId;
use contacts_sync_protocol::{records, ContactRecord};

/// Returns every live contact of `user`, newest first.
pub fn run(ctx: &Context, user: i64) -> CliResult<Vec<ContactRecord>> {
    let contacts = ctx.open("list")?;
    Ok(records(&contacts.get_all(UserId::new(user))?))
}
