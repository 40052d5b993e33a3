//! In-memory reference model of the contacts service.
//!
//! The model predicts what the real store must do for a sequence of calls:
//! which history ids get issued, which calls fail and how, and what a
//! delta or snapshot read returns. Property tests drive both and compare.

use contacts_core::{ContactAttributes, ContactState, ExternalId, HistoryId, Mutation, UserId};
use std::collections::{BTreeSet, HashMap};

/// A contact as the model tracks it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelContact {
    /// External identifier, as assigned by the real store.
    pub external_id: ExternalId,
    /// Owner.
    pub user: UserId,
    /// Current state.
    pub state: ContactState,
    /// History id of the latest mutation.
    pub history_id: HistoryId,
    /// Current attributes.
    pub attributes: ContactAttributes,
}

/// Failure the model predicts for an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelError {
    /// Unknown or foreign contact.
    NotFound,
    /// Contact is trashed.
    Terminal,
}

/// Expected delta, external ids newest first within each list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelDelta {
    /// Contacts currently inserted.
    pub inserted: Vec<ExternalId>,
    /// Contacts currently updated.
    pub updated: Vec<ExternalId>,
    /// Contacts currently trashed.
    pub trashed: Vec<ExternalId>,
    /// Expected new cursor.
    pub cursor: HistoryId,
}

/// Reference model.
#[derive(Debug, Default)]
pub struct ReferenceModel {
    /// All contacts in creation order.
    contacts: Vec<ModelContact>,
    last_issued: HashMap<UserId, HistoryId>,
}

impl ReferenceModel {
    /// Creates an empty model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Highest history id issued to `user`.
    pub fn last_history_id(&self, user: UserId) -> HistoryId {
        self.last_issued.get(&user).copied().unwrap_or(HistoryId::ZERO)
    }

    /// Every contact ever created, in creation order.
    pub fn contacts(&self) -> &[ModelContact] {
        &self.contacts
    }

    /// Looks up a contact owned by `user`.
    pub fn get(&self, user: UserId, external_id: ExternalId) -> Option<&ModelContact> {
        self.contacts
            .iter()
            .find(|c| c.user == user && c.external_id == external_id)
    }

    fn issue(&mut self, user: UserId) -> HistoryId {
        let next = HistoryId::new(self.last_history_id(user).as_u64() + 1);
        self.last_issued.insert(user, next);
        next
    }

    /// Records a create. The external id comes from the real store; the
    /// returned history id is the one the store must have assigned.
    pub fn create(
        &mut self,
        user: UserId,
        external_id: ExternalId,
        attributes: ContactAttributes,
    ) -> HistoryId {
        let history_id = self.issue(user);
        self.contacts.push(ModelContact {
            external_id,
            user,
            state: ContactState::Inserted,
            history_id,
            attributes,
        });
        history_id
    }

    /// Applies an update and returns the expected history id.
    pub fn update(
        &mut self,
        user: UserId,
        external_id: ExternalId,
        attributes: ContactAttributes,
    ) -> Result<HistoryId, ModelError> {
        let index = self
            .contacts
            .iter()
            .position(|c| c.user == user && c.external_id == external_id)
            .ok_or(ModelError::NotFound)?;
        let state = self.contacts[index]
            .state
            .apply(Mutation::Update)
            .ok_or(ModelError::Terminal)?;
        let history_id = self.issue(user);
        let contact = &mut self.contacts[index];
        contact.state = state;
        contact.history_id = history_id;
        contact.attributes = attributes;
        Ok(history_id)
    }

    /// Applies a bulk trash and returns how many contacts it trashes.
    ///
    /// Targets are processed in creation order, each drawing one id.
    pub fn trash(&mut self, user: UserId, external_ids: &[ExternalId]) -> usize {
        let requested: BTreeSet<ExternalId> = external_ids.iter().copied().collect();
        let targets: Vec<usize> = self
            .contacts
            .iter()
            .enumerate()
            .filter(|(_, c)| {
                c.user == user && !c.state.is_terminal() && requested.contains(&c.external_id)
            })
            .map(|(i, _)| i)
            .collect();
        for &index in &targets {
            let history_id = self.issue(user);
            let contact = &mut self.contacts[index];
            contact.state = ContactState::Trashed;
            contact.history_id = history_id;
        }
        targets.len()
    }

    /// Expected delta for `user` after `cursor`.
    pub fn delta(&self, user: UserId, cursor: HistoryId) -> ModelDelta {
        let mut delta = ModelDelta {
            cursor: self.last_history_id(user),
            ..ModelDelta::default()
        };
        for contact in self.newest_first(user) {
            if contact.history_id <= cursor {
                continue;
            }
            let list = match contact.state {
                ContactState::Inserted => &mut delta.inserted,
                ContactState::Updated => &mut delta.updated,
                ContactState::Trashed => &mut delta.trashed,
            };
            list.push(contact.external_id);
        }
        delta
    }

    /// Expected snapshot: live contacts of `user`, newest first.
    pub fn all(&self, user: UserId) -> Vec<ExternalId> {
        self.newest_first(user)
            .filter(|c| !c.state.is_terminal())
            .map(|c| c.external_id)
            .collect()
    }

    fn newest_first(&self, user: UserId) -> impl Iterator<Item = &ModelContact> {
        self.contacts.iter().rev().filter(move |c| c.user == user)
    }
}
