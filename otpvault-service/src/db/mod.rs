//! Credential store: the persistence contract the auth flows depend on,
//! plus the in-process implementation used by the service and its tests.
//!
//! Identity records embed their authenticator entries, so every compound
//! update ("append authenticator", "remove and maybe clear the flag") must
//! be atomic per record. Backends implement `CredentialStore`; anything that
//! can honor per-record atomicity (a document store, a row with optimistic
//! locking) is a drop-in replacement.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::{mapref::entry::Entry, DashMap};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Authenticator, User};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record already exists")]
    Duplicate,

    #[error("record not found")]
    NotFound,

    #[error("storage backend error: {0}")]
    Backend(#[from] anyhow::Error),
}

/// Persistence contract for identities and their authenticators.
///
/// Emails are matched exactly (case-sensitive). Authenticator ids are unique
/// only within their parent identity. The `two_factor_enabled` flag is owned
/// by the store: compound updates keep it true iff the set is non-empty.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Insert a freshly registered user. Fails with `Duplicate` if the email
    /// is already taken.
    async fn insert_user(&self, user: User) -> Result<(), StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    /// Append an authenticator and set the enabled flag in one update.
    /// Fails with `Duplicate` if the name is already used within the
    /// identity; the check is part of the same atomic update, so two
    /// concurrent imports of one name cannot both land.
    async fn add_authenticator(
        &self,
        user_id: Uuid,
        authenticator: Authenticator,
    ) -> Result<(), StoreError>;

    /// Remove one authenticator. Clearing the enabled flag when the set
    /// empties is part of the same update, not a second call.
    async fn remove_authenticator(
        &self,
        user_id: Uuid,
        authenticator_id: Uuid,
    ) -> Result<(), StoreError>;

    /// Stamp an authenticator's last-used time with the current wall clock.
    async fn touch_last_used(
        &self,
        user_id: Uuid,
        authenticator_id: Uuid,
    ) -> Result<(), StoreError>;

    /// Clear the enabled flag and drop every authenticator, all-or-nothing.
    async fn disable_two_factor(&self, user_id: Uuid) -> Result<(), StoreError>;
}

/// In-memory credential store backed by sharded maps.
///
/// `DashMap::get_mut` holds the shard write lock for the duration of the
/// mutation, which gives exactly the per-record atomicity the contract asks
/// for. The email index entry is reserved before the user record is written
/// so concurrent registrations of the same address cannot both succeed.
#[derive(Default)]
pub struct MemoryStore {
    users: DashMap<Uuid, User>,
    email_index: DashMap<String, Uuid>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn insert_user(&self, user: User) -> Result<(), StoreError> {
        match self.email_index.entry(user.email.clone()) {
            Entry::Occupied(_) => Err(StoreError::Duplicate),
            Entry::Vacant(slot) => {
                let id = user.id;
                self.users.insert(id, user);
                slot.insert(id);
                Ok(())
            }
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let Some(id) = self.email_index.get(email).map(|r| *r.value()) else {
            return Ok(None);
        };
        Ok(self.users.get(&id).map(|r| r.value().clone()))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.users.get(&id).map(|r| r.value().clone()))
    }

    async fn add_authenticator(
        &self,
        user_id: Uuid,
        authenticator: Authenticator,
    ) -> Result<(), StoreError> {
        let mut user = self.users.get_mut(&user_id).ok_or(StoreError::NotFound)?;
        if user
            .authenticators
            .iter()
            .any(|a| a.name == authenticator.name)
        {
            return Err(StoreError::Duplicate);
        }
        user.authenticators.push(authenticator);
        user.two_factor_enabled = true;
        Ok(())
    }

    async fn remove_authenticator(
        &self,
        user_id: Uuid,
        authenticator_id: Uuid,
    ) -> Result<(), StoreError> {
        let mut user = self.users.get_mut(&user_id).ok_or(StoreError::NotFound)?;
        let before = user.authenticators.len();
        user.authenticators.retain(|a| a.id != authenticator_id);
        if user.authenticators.len() == before {
            return Err(StoreError::NotFound);
        }
        if user.authenticators.is_empty() {
            user.two_factor_enabled = false;
        }
        Ok(())
    }

    async fn touch_last_used(
        &self,
        user_id: Uuid,
        authenticator_id: Uuid,
    ) -> Result<(), StoreError> {
        let mut user = self.users.get_mut(&user_id).ok_or(StoreError::NotFound)?;
        let authenticator = user
            .authenticators
            .iter_mut()
            .find(|a| a.id == authenticator_id)
            .ok_or(StoreError::NotFound)?;
        authenticator.last_used_at = Some(Utc::now());
        Ok(())
    }

    async fn disable_two_factor(&self, user_id: Uuid) -> Result<(), StoreError> {
        let mut user = self.users.get_mut(&user_id).ok_or(StoreError::NotFound)?;
        user.two_factor_enabled = false;
        user.authenticators.clear();
        Ok(())
    }
}
