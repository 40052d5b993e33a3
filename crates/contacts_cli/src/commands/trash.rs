//! Trash command implementation.

use super::Context;
use crate::error::CliResult;
use contacts_core::UserId;
use contacts_sync_protocol::{StatusResponse, TrashRequest, WireMessage};

/// Builds the request from `--body` JSON, or from positional uuids.
pub fn request(body: Option<&str>, uuids: Vec<String>) -> CliResult<TrashRequest> {
    match body {
        Some(json) => Ok(TrashRequest::decode(json.as_bytes())?),
        None => Ok(TrashRequest(uuids)),
    }
}

/// Trashes the listed contacts. Unknown ids are skipped, not reported.
pub fn run(ctx: &Context, user: i64, request: &TrashRequest) -> CliResult<StatusResponse> {
    let contacts = ctx.open("trash")?;
    let ids = request.external_ids();
    let trashed = contacts.trash_by_id_list(UserId::new(user), &ids)?;
    tracing::debug!(requested = request.0.len(), parsed = ids.len(), trashed, "trash done");
    Ok(StatusResponse::ok())
}
