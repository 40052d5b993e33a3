//! Service facade.

use crate::contact::{Contact, ContactAttributes, ExternalId};
use crate::delta::{Delta, DeltaSync};
use crate::error::CoreResult;
use crate::snapshot::SnapshotReader;
use crate::store::ContactStore;
use crate::types::{HistoryId, UserId};
use contacts_storage::{Database, StorageConfig, TxnOptions};
use std::path::Path;
use std::sync::Arc;

/// The contacts service handle.
///
/// `Contacts` is the entry point the outer surfaces (CLI, HTTP adapters)
/// talk to. It wires the store, the delta engine and the snapshot reader to
/// one shared database and is cheap to share across threads behind an
/// `Arc`; every call runs in its own transaction.
///
/// # Example
///
/// ```rust,no_run
/// use contacts_core::{ContactAttributes, Contacts, HistoryId, UserId};
///
/// let contacts = Contacts::open("contacts.db")?;
/// let user = UserId::new(1);
///
/// let created = contacts.create(user, ContactAttributes::new().with_first_name("Ada"))?;
/// let delta = contacts.get_delta(user, HistoryId::ZERO)?;
/// assert_eq!(delta.inserted[0].external_id, created.external_id);
/// # Ok::<(), contacts_core::CoreError>(())
/// ```
pub struct Contacts {
    db: Arc<Database>,
    store: ContactStore,
    delta: DeltaSync,
    snapshots: SnapshotReader,
}

impl Contacts {
    /// Wraps an already open database.
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            store: ContactStore::new(Arc::clone(&db)),
            delta: DeltaSync::new(Arc::clone(&db)),
            snapshots: SnapshotReader::new(Arc::clone(&db)),
            db,
        }
    }

    /// Opens (or creates) a database directory with default settings.
    pub fn open(path: impl AsRef<Path>) -> CoreResult<Self> {
        Self::open_with_config(path, StorageConfig::default())
    }

    /// Opens a database directory with explicit storage settings.
    pub fn open_with_config(path: impl AsRef<Path>, config: StorageConfig) -> CoreResult<Self> {
        let db = Database::open_with_config(path, config)?;
        Ok(Self::new(Arc::new(db)))
    }

    /// Returns the underlying database.
    pub fn database(&self) -> &Arc<Database> {
        &self.db
    }

    /// Returns the contact store.
    pub fn store(&self) -> &ContactStore {
        &self.store
    }

    /// Returns the delta engine.
    pub fn delta_sync(&self) -> &DeltaSync {
        &self.delta
    }

    /// Returns the snapshot reader.
    pub fn snapshots(&self) -> &SnapshotReader {
        &self.snapshots
    }

    /// Creates a contact. See [`ContactStore::create`].
    pub fn create(&self, user: UserId, attributes: ContactAttributes) -> CoreResult<Contact> {
        self.store.create(user, attributes, &TxnOptions::new())
    }

    /// Returns all live contacts, newest first. See [`SnapshotReader::all`].
    pub fn get_all(&self, user: UserId) -> CoreResult<Vec<Contact>> {
        self.snapshots.all(user, &TxnOptions::new())
    }

    /// Returns what changed after `cursor`. See [`DeltaSync::delta`].
    pub fn get_delta(&self, user: UserId, cursor: HistoryId) -> CoreResult<Delta> {
        self.delta.delta(user, cursor, &TxnOptions::new())
    }

    /// Replaces a contact's attributes. See [`ContactStore::update`].
    pub fn update(
        &self,
        user: UserId,
        external_id: ExternalId,
        attributes: ContactAttributes,
    ) -> CoreResult<Contact> {
        self.store
            .update(user, external_id, attributes, &TxnOptions::new())
    }

    /// Trashes contacts by external id, skipping ones that cannot be
    /// trashed. See [`ContactStore::trash_many`].
    pub fn trash_by_id_list(&self, user: UserId, external_ids: &[ExternalId]) -> CoreResult<usize> {
        self.store
            .trash_many(user, external_ids, &TxnOptions::new())
    }

    /// Returns a single contact in any state. See [`ContactStore::get`].
    pub fn get(&self, user: UserId, external_id: ExternalId) -> CoreResult<Contact> {
        self.store.get(user, external_id, &TxnOptions::new())
    }
}

impl std::fmt::Debug for Contacts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Contacts").field("db", &self.db).finish()
    }
}
