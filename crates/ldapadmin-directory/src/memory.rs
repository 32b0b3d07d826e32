//! In-memory directory store and role assignment (for testing).

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::account::{Account, AccountAttribute, AccountChanges};
use crate::error::{RoleAssignmentError, StoreError, StoreResult};
use crate::store::{DirectoryStore, RoleAssignment};

/// In-memory account store.
///
/// Equality matches ignore ASCII case, like the directory's `caseIgnore`
/// matching rules for the attributes accounts carry.
#[derive(Debug, Default, Clone)]
pub struct InMemoryDirectoryStore {
    entries: Arc<RwLock<BTreeMap<String, Account>>>,
    unavailable: Arc<AtomicBool>,
}

impl InMemoryDirectoryStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Put an account straight into the store, bypassing every check.
    pub async fn seed(&self, account: Account) {
        self.entries
            .write()
            .await
            .insert(account.uid.clone(), account);
    }

    /// Make every subsequent operation fail with `StoreError::Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of stored entries.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Clear all data.
    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    fn check_available(&self) -> StoreResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::unavailable("in-memory directory is offline"));
        }
        Ok(())
    }
}

#[async_trait]
impl DirectoryStore for InMemoryDirectoryStore {
    async fn find_all(&self) -> StoreResult<Vec<Account>> {
        self.check_available()?;
        Ok(self.entries.read().await.values().cloned().collect())
    }

    async fn find_by_uid(&self, uid: &str) -> StoreResult<Account> {
        self.check_available()?;
        self.entries
            .read()
            .await
            .get(uid)
            .cloned()
            .ok_or_else(|| StoreError::not_found(uid))
    }

    async fn search_by_attribute(
        &self,
        attribute: AccountAttribute,
        value: &str,
        exclude_uid: Option<&str>,
    ) -> StoreResult<Vec<Account>> {
        self.check_available()?;
        let entries = self.entries.read().await;
        Ok(entries
            .values()
            .filter(|a| exclude_uid.is_none_or(|uid| a.uid != uid))
            .filter(|a| a.get(attribute).eq_ignore_ascii_case(value))
            .cloned()
            .collect())
    }

    async fn insert(&self, account: &Account) -> StoreResult<()> {
        self.check_available()?;
        let mut entries = self.entries.write().await;
        if entries.contains_key(&account.uid) {
            return Err(StoreError::unavailable(format!(
                "entry already exists: {}",
                account.uid
            )));
        }
        entries.insert(account.uid.clone(), account.clone());
        Ok(())
    }

    async fn apply_partial_update(&self, uid: &str, changes: &AccountChanges) -> StoreResult<()> {
        self.check_available()?;
        let mut entries = self.entries.write().await;
        let account = entries
            .get_mut(uid)
            .ok_or_else(|| StoreError::not_found(uid))?;
        changes.apply_to(account);
        Ok(())
    }

    async fn delete(&self, uid: &str) -> StoreResult<()> {
        self.check_available()?;
        self.entries
            .write()
            .await
            .remove(uid)
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found(uid))
    }
}

/// In-memory role membership (for testing).
#[derive(Debug, Clone)]
pub struct InMemoryRoleAssignment {
    role: String,
    members: Arc<RwLock<BTreeSet<String>>>,
    failing: Arc<AtomicBool>,
}

impl InMemoryRoleAssignment {
    /// Create an assignment granting `role`.
    #[must_use]
    pub fn new(role: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            members: Arc::new(RwLock::new(BTreeSet::new())),
            failing: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Make subsequent assignments fail.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Check if `uid` holds the role.
    pub async fn is_member(&self, uid: &str) -> bool {
        self.members.read().await.contains(uid)
    }

    /// Current members, sorted.
    pub async fn members(&self) -> Vec<String> {
        self.members.read().await.iter().cloned().collect()
    }
}

#[async_trait]
impl RoleAssignment for InMemoryRoleAssignment {
    fn default_role(&self) -> &str {
        &self.role
    }

    async fn assign_default_role(&self, uid: &str) -> Result<(), RoleAssignmentError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(RoleAssignmentError::new(
                &self.role,
                uid,
                "role store is offline",
            ));
        }
        self.members.write().await.insert(uid.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pmauduit() -> Account {
        Account::new("pmauduit", "Pierre", "Mauduit")
            .with(AccountAttribute::Mail, "pmauduit@localhost")
            .with(AccountAttribute::TelephoneNumber, "+33123456789")
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let store = InMemoryDirectoryStore::new();
        store.insert(&pmauduit()).await.unwrap();

        let found = store.find_by_uid("pmauduit").await.unwrap();
        assert_eq!(found, pmauduit());
        assert!(store.exists("pmauduit").await.unwrap());
        assert!(!store.exists("nobody").await.unwrap());
    }

    #[tokio::test]
    async fn test_find_missing_is_not_found() {
        let store = InMemoryDirectoryStore::new();
        let err = store.find_by_uid("nonexistentuser").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { ref uid } if uid == "nonexistentuser"));
    }

    #[tokio::test]
    async fn test_insert_existing_uid_fails() {
        let store = InMemoryDirectoryStore::new();
        store.insert(&pmauduit()).await.unwrap();
        let err = store.insert(&pmauduit()).await.unwrap_err();
        assert!(!err.is_not_found());
    }

    #[tokio::test]
    async fn test_find_all_sorted_by_uid() {
        let store = InMemoryDirectoryStore::new();
        store.seed(Account::new("zed", "Z", "Ed")).await;
        store.seed(Account::new("abe", "A", "Be")).await;

        let uids: Vec<_> = store
            .find_all()
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.uid)
            .collect();
        assert_eq!(uids, vec!["abe", "zed"]);
    }

    #[tokio::test]
    async fn test_search_excludes_own_uid() {
        let store = InMemoryDirectoryStore::new();
        store.seed(pmauduit()).await;

        let hits = store
            .search_by_attribute(AccountAttribute::Mail, "PMAUDUIT@localhost", None)
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);

        let hits = store
            .search_by_attribute(AccountAttribute::Mail, "pmauduit@localhost", Some("pmauduit"))
            .await
            .unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_partial_update_leaves_other_attributes() {
        let store = InMemoryDirectoryStore::new();
        store.seed(pmauduit()).await;

        let changes = AccountChanges::new()
            .with(AccountAttribute::TelephoneNumber, "")
            .with(AccountAttribute::Title, "CEO");
        store.apply_partial_update("pmauduit", &changes).await.unwrap();

        let stored = store.find_by_uid("pmauduit").await.unwrap();
        assert_eq!(stored.telephone_number, "");
        assert_eq!(stored.title, "CEO");
        assert_eq!(stored.mail, "pmauduit@localhost");
    }

    #[tokio::test]
    async fn test_partial_update_missing_entry() {
        let store = InMemoryDirectoryStore::new();
        let err = store
            .apply_partial_update("ghost", &AccountChanges::new())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_delete() {
        let store = InMemoryDirectoryStore::new();
        store.seed(pmauduit()).await;

        store.delete("pmauduit").await.unwrap();
        assert!(store.is_empty().await);
        assert!(store.delete("pmauduit").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_unavailable_store_fails_every_operation() {
        let store = InMemoryDirectoryStore::new();
        store.seed(pmauduit()).await;
        store.set_unavailable(true);

        assert!(matches!(
            store.find_all().await,
            Err(StoreError::Unavailable { .. })
        ));
        assert!(matches!(
            store.find_by_uid("pmauduit").await,
            Err(StoreError::Unavailable { .. })
        ));
        assert!(matches!(
            store.exists("pmauduit").await,
            Err(StoreError::Unavailable { .. })
        ));
        assert!(matches!(
            store.delete("pmauduit").await,
            Err(StoreError::Unavailable { .. })
        ));

        store.set_unavailable(false);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_role_assignment() {
        let roles = InMemoryRoleAssignment::new("USER");
        assert_eq!(roles.default_role(), "USER");

        roles.assign_default_role("pmauduit").await.unwrap();
        roles.assign_default_role("pmauduit").await.unwrap();
        assert_eq!(roles.members().await, vec!["pmauduit"]);

        roles.set_failing(true);
        let err = roles.assign_default_role("jdoe").await.unwrap_err();
        assert_eq!(err.uid, "jdoe");
        assert!(!roles.is_member("jdoe").await);
    }
}
