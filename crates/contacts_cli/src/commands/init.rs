//! Init command implementation.

use super::Context;
use crate::error::CliResult;
use contacts_core::Contacts;
use serde::Serialize;

/// Result of initializing a database.
#[derive(Debug, Serialize)]
pub struct InitResult {
    /// Database path.
    pub path: String,
    /// Schema version after migration.
    pub schema_version: i64,
}

/// Creates the database directory if needed.
pub fn run(ctx: &Context) -> CliResult<InitResult> {
    let path = ctx.path("init")?;
    let config = ctx.config.clone().create_if_missing(true);
    let contacts = Contacts::open_with_config(path, config)?;
    Ok(InitResult {
        path: path.display().to_string(),
        schema_version: contacts.database().schema_version(),
    })
}
