//! Directory store traits
//!
//! The I/O boundary of account administration. Implementations are thin
//! CRUD surfaces: they validate nothing and never retry.

use async_trait::async_trait;

use crate::account::{Account, AccountAttribute, AccountChanges};
use crate::error::{RoleAssignmentError, StoreResult};

/// Storage backend for account entries.
#[async_trait]
pub trait DirectoryStore: Send + Sync {
    /// List every account, ordered by `uid`.
    async fn find_all(&self) -> StoreResult<Vec<Account>>;

    /// Fetch the account stored under `uid`.
    ///
    /// Identifiers match exactly, case included. Fails with
    /// `StoreError::NotFound` when no entry matches.
    async fn find_by_uid(&self, uid: &str) -> StoreResult<Account>;

    /// Find accounts whose `attribute` equals `value`.
    ///
    /// When `exclude_uid` is given, that account is left out of the result
    /// so an entry never collides with itself.
    async fn search_by_attribute(
        &self,
        attribute: AccountAttribute,
        value: &str,
        exclude_uid: Option<&str>,
    ) -> StoreResult<Vec<Account>>;

    /// Store a new account. The caller has already checked the `uid` is free.
    async fn insert(&self, account: &Account) -> StoreResult<()>;

    /// Write only the listed attributes of an existing entry.
    ///
    /// An empty value removes the attribute from the entry.
    async fn apply_partial_update(&self, uid: &str, changes: &AccountChanges) -> StoreResult<()>;

    /// Remove the entry stored under `uid`.
    async fn delete(&self, uid: &str) -> StoreResult<()>;

    /// Check whether an entry exists under `uid`.
    async fn exists(&self, uid: &str) -> StoreResult<bool> {
        match self.find_by_uid(uid).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }
}

/// Grants newly created accounts their default role.
#[async_trait]
pub trait RoleAssignment: Send + Sync {
    /// Name of the role granted by [`RoleAssignment::assign_default_role`].
    fn default_role(&self) -> &str;

    /// Make `uid` a member of the default role.
    ///
    /// Granting a role the account already holds succeeds.
    async fn assign_default_role(&self, uid: &str) -> Result<(), RoleAssignmentError>;
}
