//! Mutable contact attributes and their validation.

use crate::error::{CoreError, CoreResult};

/// Longest accepted email address, per RFC 5321 path limits.
pub const MAX_EMAIL_LEN: usize = 254;
/// Longest accepted first or last name.
pub const MAX_NAME_LEN: usize = 128;

/// The optional display attributes of a contact.
///
/// Create stores them as given; update overwrites all three at once, so an
/// absent attribute in an update clears the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactAttributes {
    /// Email address.
    pub email_address: Option<String>,
    /// Given name.
    pub first_name: Option<String>,
    /// Family name.
    pub last_name: Option<String>,
}

impl ContactAttributes {
    /// Creates an empty attribute set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the email address.
    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email_address = Some(email.into());
        self
    }

    /// Sets the first name.
    #[must_use]
    pub fn with_first_name(mut self, name: impl Into<String>) -> Self {
        self.first_name = Some(name.into());
        self
    }

    /// Sets the last name.
    #[must_use]
    pub fn with_last_name(mut self, name: impl Into<String>) -> Self {
        self.last_name = Some(name.into());
        self
    }

    /// Returns true if no attribute is present.
    pub fn is_empty(&self) -> bool {
        self.email_address.is_none() && self.first_name.is_none() && self.last_name.is_none()
    }

    /// Trims every attribute and drops the blank ones, then validates.
    ///
    /// # Errors
    ///
    /// Returns `Validation` if:
    /// - No attribute remains after normalization
    /// - An attribute exceeds its length limit or contains control characters
    /// - The email address is not of the form `local@domain`
    pub fn normalized(self) -> CoreResult<Self> {
        let attributes = Self {
            email_address: normalize(self.email_address),
            first_name: normalize(self.first_name),
            last_name: normalize(self.last_name),
        };

        if attributes.is_empty() {
            return Err(CoreError::validation(
                "at least one of email_address, firstname, lastname is required",
            ));
        }
        if let Some(email) = &attributes.email_address {
            check_text("email_address", email, MAX_EMAIL_LEN)?;
            check_email(email)?;
        }
        if let Some(name) = &attributes.first_name {
            check_text("firstname", name, MAX_NAME_LEN)?;
        }
        if let Some(name) = &attributes.last_name {
            check_text("lastname", name, MAX_NAME_LEN)?;
        }
        Ok(attributes)
    }
}

fn normalize(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn check_text(field: &str, value: &str, max_len: usize) -> CoreResult<()> {
    if value.chars().count() > max_len {
        return Err(CoreError::validation(format!(
            "{field} exceeds {max_len} characters"
        )));
    }
    if value.chars().any(char::is_control) {
        return Err(CoreError::validation(format!(
            "{field} contains control characters"
        )));
    }
    Ok(())
}

fn check_email(email: &str) -> CoreResult<()> {
    let mut parts = email.split('@');
    let well_formed = match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => {
            !local.is_empty() && !domain.is_empty() && !email.contains(char::is_whitespace)
        }
        _ => false,
    };
    if well_formed {
        Ok(())
    } else {
        Err(CoreError::validation(format!(
            "email_address {email:?} is not of the form local@domain"
        )))
    }
}
