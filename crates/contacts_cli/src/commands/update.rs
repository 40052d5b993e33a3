//! Update command implementation.

use super::Context;
use crate::error::CliResult;
use contacts_core::UserId;
use contacts_sync_protocol::{ContactRecord, UpdateContactRequest, WireMessage};

/// Builds the request from `--body` JSON, or from the flags.
pub fn request(
    body: Option<&str>,
    uuid: Option<String>,
    email_address: Option<String>,
    firstname: Option<String>,
    lastname: Option<String>,
) -> CliResult<UpdateContactRequest> {
    match body {
        Some(json) => Ok(UpdateContactRequest::decode(json.as_bytes())?),
        None => Ok(UpdateContactRequest {
            uuid: uuid.unwrap_or_default(),
            email_address,
            firstname,
            lastname,
        }),
    }
}

/// Overwrites a contact's attributes and returns the new record.
pub fn run(ctx: &Context, user: i64, request: &UpdateContactRequest) -> CliResult<ContactRecord> {
    let contacts = ctx.open("update")?;
    let external_id = request.external_id()?;
    let contact = contacts.update(UserId::new(user), external_id, request.attributes())?;
    Ok(ContactRecord::from(&contact))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{create, testing::context, trash};

    #[test]
    fn update_then_trash_then_update() {
        let (_dir, ctx) = context();
        let created = create::run(
            &ctx,
            1,
            &create::request(None, None, Some("Ada".into()), None).unwrap(),
        )
        .unwrap();

        let req = request(
            None,
            Some(created.uuid.clone()),
            None,
            Some("Ada".into()),
            Some("Lovelace".into()),
        )
        .unwrap();
        let updated = run(&ctx, 1, &req).unwrap();
        assert_eq!(updated.lastname.as_deref(), Some("Lovelace"));
        assert!(updated.modified_at.is_some());

        trash::run(&ctx, 1, &trash::request(None, vec![created.uuid.clone()]).unwrap()).unwrap();
        assert_eq!(run(&ctx, 1, &req).unwrap_err().response().status, 409);
    }

    #[test]
    fn unknown_uuid_is_not_found() {
        let (_dir, ctx) = context();
        let req = request(None, Some("not-a-uuid".into()), Some("a@x.com".into()), None, None)
            .unwrap();
        assert_eq!(run(&ctx, 1, &req).unwrap_err().response().status, 404);
    }
}
