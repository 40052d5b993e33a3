//! Create command implementation.

use super::Context;
use crate::error::CliResult;
use contacts_core::UserId;
use contacts_sync_protocol::{ContactRecord, CreateContactRequest, WireMessage};

/// Builds the request from `--body` JSON, or from the attribute flags.
pub fn request(
    body: Option<&str>,
    email_address: Option<String>,
    firstname: Option<String>,
    lastname: Option<String>,
) -> CliResult<CreateContactRequest> {
    match body {
        Some(json) => Ok(CreateContactRequest::decode(json.as_bytes())?),
        None => Ok(CreateContactRequest {
            email_address,
            firstname,
            lastname,
        }),
    }
}

/// Creates a contact and returns its record.
pub fn run(ctx: &Context, user: i64, request: &CreateContactRequest) -> CliResult<ContactRecord> {
    let contacts = ctx.open("create")?;
    let contact = contacts.create(UserId::new(user), request.attributes())?;
    Ok(ContactRecord::from(&contact))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::context;
    use crate::error::CliError;
    use contacts_core::CoreError;

    #[test]
    fn creates_from_flags() {
        let (_dir, ctx) = context();
        let req = request(None, Some("a@x.com".into()), None, None).unwrap();
        let record = run(&ctx, 1, &req).unwrap();
        assert_eq!(record.email_address.as_deref(), Some("a@x.com"));
        assert!(record.modified_at.is_none());
    }

    #[test]
    fn body_wins_over_flags() {
        let req = request(
            Some(r#"{"firstname":"Ada"}"#),
            Some("ignored@x.com".into()),
            None,
            None,
        )
        .unwrap();
        assert_eq!(req.firstname.as_deref(), Some("Ada"));
        assert!(req.email_address.is_none());
    }

    #[test]
    fn empty_contact_is_rejected() {
        let (_dir, ctx) = context();
        let err = run(&ctx, 1, &CreateContactRequest::default()).unwrap_err();
        assert!(matches!(err, CliError::Core(CoreError::Validation { .. })));
        assert_eq!(err.response().status, 400);
    }
}
