//! Delta command implementation.

use super::Context;
use crate::error::CliResult;
use contacts_core::UserId;
use contacts_sync_protocol::{DeltaRequest, DeltaResponse};

/// Returns what changed for `user` since the request's cursor.
pub fn run(ctx: &Context, user: i64, request: DeltaRequest) -> CliResult<DeltaResponse> {
    let contacts = ctx.open("delta")?;
    let delta = contacts.get_delta(UserId::new(user), request.cursor())?;
    Ok(DeltaResponse::from(&delta))
}
