//! Test fixtures and database helpers.
//!
//! Provides convenience functions for setting up test databases
//! and common test scenarios.

use contacts_core::{Contact, ContactAttributes, Contacts, StorageConfig, UserId};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// A contacts service over a temporary database, removed on drop.
pub struct TestContacts {
    contacts: Arc<Contacts>,
    path: PathBuf,
    _temp_dir: TempDir,
}

impl TestContacts {
    /// Opens a fresh database with default settings.
    pub fn new() -> Self {
        Self::with_config(StorageConfig::default())
    }

    /// Opens a fresh database with the given settings.
    pub fn with_config(config: StorageConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("contacts.db");
        let contacts =
            Contacts::open_with_config(&path, config).expect("Failed to open test database");
        Self {
            contacts: Arc::new(contacts),
            path,
            _temp_dir: temp_dir,
        }
    }

    /// Returns the database directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns a handle that can be moved to other threads.
    pub fn shared(&self) -> Arc<Contacts> {
        Arc::clone(&self.contacts)
    }

    /// Opens a second, independent handle on the same database.
    pub fn reopen(&self) -> Contacts {
        Contacts::open(&self.path).expect("Failed to reopen test database")
    }
}

impl Default for TestContacts {
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Deref for TestContacts {
    type Target = Contacts;

    fn deref(&self) -> &Self::Target {
        &self.contacts
    }
}

/// Runs a test with a temporary contacts database.
///
/// # Example
///
/// ```rust
/// use contacts_core::{ContactAttributes, UserId};
/// use contacts_testkit::with_temp_contacts;
///
/// with_temp_contacts(|contacts| {
///     let user = UserId::new(1);
///     contacts
///         .create(user, ContactAttributes::new().with_first_name("Ada"))
///         .unwrap();
///     assert_eq!(contacts.get_all(user).unwrap().len(), 1);
/// });
/// ```
pub fn with_temp_contacts<F, R>(f: F) -> R
where
    F: FnOnce(&Contacts) -> R,
{
    let test = TestContacts::new();
    f(&test)
}

/// Attributes with just an email address.
pub fn email(address: &str) -> ContactAttributes {
    ContactAttributes::new().with_email(address)
}

/// Attributes with first and last name.
pub fn named(first: &str, last: &str) -> ContactAttributes {
    ContactAttributes::new()
        .with_first_name(first)
        .with_last_name(last)
}

/// Test scenario helpers.
pub mod scenarios {
    use super::*;

    /// Creates a database where `user` owns `count` freshly created contacts.
    ///
    /// Returns the contacts in creation order.
    pub fn populated(user: UserId, count: usize) -> (TestContacts, Vec<Contact>) {
        let test = TestContacts::new();
        let created = (0..count)
            .map(|i| {
                test.create(user, email(&format!("contact{i}@example.com")))
                    .expect("Failed to create contact")
            })
            .collect();
        (test, created)
    }

    /// Creates `per_user` contacts for each of `users` users (ids 1..=users).
    pub fn multi_user(users: i64, per_user: usize) -> TestContacts {
        let test = TestContacts::new();
        for user in 1..=users {
            for i in 0..per_user {
                test.create(UserId::new(user), named(&format!("u{user}"), &format!("c{i}")))
                    .expect("Failed to create contact");
            }
        }
        test
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contacts_core::HistoryId;

    #[test]
    fn fresh_database_is_empty() {
        with_temp_contacts(|contacts| {
            assert!(contacts.get_all(UserId::new(1)).unwrap().is_empty());
        });
    }

    #[test]
    fn populated_scenario() {
        let (test, created) = scenarios::populated(UserId::new(1), 5);
        assert_eq!(created.len(), 5);
        assert_eq!(created[4].history_id, HistoryId::new(5));
        assert_eq!(test.get_all(UserId::new(1)).unwrap().len(), 5);
    }

    #[test]
    fn reopen_sees_the_same_data() {
        let test = scenarios::multi_user(2, 3);
        let other = test.reopen();
        assert_eq!(other.get_all(UserId::new(2)).unwrap().len(), 3);
    }
}
