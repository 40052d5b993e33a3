//! Property-based test generators using proptest.
//!
//! Provides strategies for generating contact attributes and sequences of
//! service operations. Operations refer to earlier contacts by index so a
//! generated sequence stays meaningful whatever ids the store assigns.

use contacts_core::{ContactAttributes, UserId};
use proptest::prelude::*;

/// Number of distinct users operations are spread over.
pub const USERS: i64 = 3;

/// Strategy for user ids in `1..=USERS`.
pub fn user_strategy() -> impl Strategy<Value = UserId> {
    (1..=USERS).prop_map(UserId::new)
}

/// Strategy for email addresses that pass validation unchanged.
pub fn email_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9.]{0,11}@[a-z]{1,10}\\.(com|org|net)")
        .expect("Invalid regex")
}

/// Strategy for names that pass validation unchanged.
pub fn name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Z][a-z]{0,15}( [A-Z][a-z]{0,10})?").expect("Invalid regex")
}

/// Strategy for valid attribute sets (at least one attribute present).
pub fn attributes_strategy() -> impl Strategy<Value = ContactAttributes> {
    (
        prop::option::of(email_strategy()),
        prop::option::of(name_strategy()),
        prop::option::of(name_strategy()),
    )
        .prop_filter("at least one attribute", |(e, f, l)| {
            e.is_some() || f.is_some() || l.is_some()
        })
        .prop_map(|(email_address, first_name, last_name)| ContactAttributes {
            email_address,
            first_name,
            last_name,
        })
}

/// One call against the service.
///
/// `target` indexes are taken modulo the number of contacts created so
/// far (across all users); with none created yet they name nothing.
#[derive(Debug, Clone)]
pub enum ContactOp {
    /// Create a contact.
    Create {
        /// Owner.
        user: UserId,
        /// Attributes.
        attributes: ContactAttributes,
    },
    /// Overwrite a contact's attributes.
    Update {
        /// Caller.
        user: UserId,
        /// Index into created contacts.
        target: usize,
        /// Replacement attributes.
        attributes: ContactAttributes,
    },
    /// Trash a list of contacts.
    Trash {
        /// Caller.
        user: UserId,
        /// Indexes into created contacts; may repeat.
        targets: Vec<usize>,
        /// Whether to add an id that was never issued.
        include_unknown: bool,
    },
}

impl ContactOp {
    /// Returns the calling user.
    pub fn user(&self) -> UserId {
        match self {
            ContactOp::Create { user, .. }
            | ContactOp::Update { user, .. }
            | ContactOp::Trash { user, .. } => *user,
        }
    }
}

/// Strategy for a single operation, weighted towards creates.
pub fn op_strategy() -> impl Strategy<Value = ContactOp> {
    prop_oneof![
        4 => (user_strategy(), attributes_strategy())
            .prop_map(|(user, attributes)| ContactOp::Create { user, attributes }),
        3 => (user_strategy(), any::<usize>(), attributes_strategy()).prop_map(
            |(user, target, attributes)| ContactOp::Update {
                user,
                target,
                attributes
            }
        ),
        2 => (
            user_strategy(),
            prop::collection::vec(any::<usize>(), 0..4),
            any::<bool>()
        )
            .prop_map(|(user, targets, include_unknown)| ContactOp::Trash {
                user,
                targets,
                include_unknown
            }),
    ]
}

/// Strategy for operation sequences of up to `max_len` steps.
pub fn ops_strategy(max_len: usize) -> impl Strategy<Value = Vec<ContactOp>> {
    prop::collection::vec(op_strategy(), 1..=max_len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::test_runner::TestRunner;

    #[test]
    fn generated_attributes_survive_normalization() {
        let mut runner = TestRunner::default();
        runner
            .run(&attributes_strategy(), |attrs| {
                let normalized = attrs.clone().normalized().unwrap();
                prop_assert_eq!(normalized, attrs);
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn generated_users_are_in_range() {
        let mut runner = TestRunner::default();
        runner
            .run(&user_strategy(), |user| {
                prop_assert!((1..=USERS).contains(&user.as_i64()));
                Ok(())
            })
            .unwrap();
    }
}
