//! Account service for directory account administration.
//!
//! This module provides the `AccountService`, which decides whether a
//! create, update, or delete may proceed and carries it out against a
//! [`DirectoryStore`].

use std::sync::Arc;

use ldapadmin_directory::account::{Account, AccountAttribute, AccountChanges};
use ldapadmin_directory::error::ConfigError;
use ldapadmin_directory::store::{DirectoryStore, RoleAssignment};

use crate::config::AccountsConfig;
use crate::deriver::IdentifierDeriver;
use crate::error::{AccountError, AccountResult, ProtectedAction};
use crate::policy::ProtectedIdentities;

// ============================================================================
// Input Types
// ============================================================================

/// Input for creating an account.
///
/// The identifier and common name are derived, so neither can be supplied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateAccountInput {
    /// Given name (`givenName`).
    pub given_name: String,
    /// Surname (`sn`).
    pub surname: String,
    /// Every other attribute of the new account.
    pub attributes: AccountChanges,
}

impl CreateAccountInput {
    pub fn new(given_name: impl Into<String>, surname: impl Into<String>) -> Self {
        Self {
            given_name: given_name.into(),
            surname: surname.into(),
            attributes: AccountChanges::new(),
        }
    }

    /// Set an attribute using builder pattern.
    #[must_use]
    pub fn with(mut self, attribute: AccountAttribute, value: impl Into<String>) -> Self {
        match attribute {
            AccountAttribute::GivenName => self.given_name = value.into(),
            AccountAttribute::Surname => self.surname = value.into(),
            _ => self.attributes.set(attribute, value),
        }
        self
    }

    /// Build the input from a JSON object keyed by attribute name.
    pub fn from_json(value: &serde_json::Value) -> AccountResult<Self> {
        let mut attributes = AccountChanges::from_json(value)?;
        let given_name = attributes
            .remove(AccountAttribute::GivenName)
            .unwrap_or_default();
        let surname = attributes
            .remove(AccountAttribute::Surname)
            .unwrap_or_default();
        Ok(Self {
            given_name,
            surname,
            attributes,
        })
    }

    /// Requested mail address (empty when absent).
    pub fn mail(&self) -> &str {
        self.attributes.get(AccountAttribute::Mail).unwrap_or("")
    }

    /// Move name attributes left in `attributes` into the name fields.
    fn fold_name_attributes(mut self) -> Self {
        if let Some(given_name) = self.attributes.remove(AccountAttribute::GivenName) {
            self.given_name = given_name;
        }
        if let Some(surname) = self.attributes.remove(AccountAttribute::Surname) {
            self.surname = surname;
        }
        self
    }

    fn validate(&self) -> AccountResult<()> {
        if self.given_name.trim().is_empty() {
            return Err(AccountError::invalid_argument("First Name is required"));
        }
        if self.surname.trim().is_empty() {
            return Err(AccountError::invalid_argument("Last Name is required"));
        }
        if let Some(attr) = self.attributes.unsettable().next() {
            return Err(AccountError::invalid_argument(format!(
                "{attr} cannot be modified"
            )));
        }
        Ok(())
    }

    fn into_account(self, uid: String) -> Account {
        let mut account = Account::new(uid, self.given_name, self.surname);
        self.attributes.apply_to(&mut account);
        account.refresh_common_name();
        account
    }
}

// ============================================================================
// Service
// ============================================================================

/// Service for account administration.
#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn DirectoryStore>,
    roles: Arc<dyn RoleAssignment>,
    policy: ProtectedIdentities,
    deriver: IdentifierDeriver,
}

impl AccountService {
    /// Create a new account service.
    ///
    /// `roles` grants `config.default_role`; build it from the same config.
    pub fn new(
        store: Arc<dyn DirectoryStore>,
        roles: Arc<dyn RoleAssignment>,
        config: &AccountsConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        if roles.default_role() != config.default_role {
            tracing::warn!(
                configured = %config.default_role,
                granted = %roles.default_role(),
                "Role assignment grants a different role than configured"
            );
        }

        let policy = config.protected_identities();
        Ok(Self {
            store,
            roles,
            deriver: IdentifierDeriver::new(policy.clone(), config.max_uid_attempts),
            policy,
        })
    }

    /// Check whether `uid` is in the protected set.
    pub fn is_protected(&self, uid: &str) -> bool {
        self.policy.is_protected(uid)
    }

    /// The protected identities.
    pub fn protected_identities(&self) -> &ProtectedIdentities {
        &self.policy
    }

    /// List every account, protected ones included.
    pub async fn find_all(&self) -> AccountResult<Vec<Account>> {
        let accounts = self.store.find_all().await?;
        tracing::debug!(count = accounts.len(), "Listed accounts");
        Ok(accounts)
    }

    /// Get an account by identifier.
    pub async fn find_by_uid(&self, uid: &str) -> AccountResult<Account> {
        tracing::debug!(uid = %uid, "Looking up account");
        Ok(self.store.find_by_uid(uid).await?)
    }

    /// Create an account with a freshly derived identifier.
    ///
    /// If the account is stored but the default role cannot be granted, the
    /// account is kept and `AccountError::PartialFailure` carries it.
    pub async fn create(&self, input: CreateAccountInput) -> AccountResult<Account> {
        let input = input.fold_name_attributes();
        input.validate()?;

        let uid = match self
            .deriver
            .derive_unique(self.store.as_ref(), &input.given_name, &input.surname)
            .await
        {
            Ok(uid) => uid,
            Err(e) => {
                if e.is_conflict() {
                    tracing::warn!(error = %e, "Account creation rejected");
                }
                return Err(e);
            }
        };

        let mail = input.mail();
        if !mail.is_empty() {
            let holders = self
                .store
                .search_by_attribute(AccountAttribute::Mail, mail, None)
                .await?;
            if let Some(holder) = holders.first() {
                tracing::debug!(mail = %mail, holder = %holder.uid, "Mail already in use");
                tracing::warn!(uid = %uid, "Account creation rejected: duplicated email");
                return Err(AccountError::duplicated_email(mail));
            }
        }

        let account = input.into_account(uid);
        self.store.insert(&account).await?;
        tracing::info!(uid = %account.uid, "Account created");

        if let Err(e) = self.roles.assign_default_role(&account.uid).await {
            tracing::warn!(
                uid = %account.uid,
                role = %self.roles.default_role(),
                error = %e,
                "Account created without its default role"
            );
            return Err(AccountError::partial_failure(account, e.to_string()));
        }

        tracing::info!(
            uid = %account.uid,
            role = %self.roles.default_role(),
            "Default role granted"
        );
        Ok(account)
    }

    /// Apply a partial update and return the merged account.
    ///
    /// Attributes absent from `changes` are left untouched; an empty value
    /// clears the attribute.
    pub async fn update(&self, uid: &str, changes: AccountChanges) -> AccountResult<Account> {
        if self.policy.is_protected(uid) {
            tracing::warn!(uid = %uid, "Update of protected account rejected");
            return Err(AccountError::protected(uid, ProtectedAction::Update));
        }

        if let Some(attr) = changes.unsettable().next() {
            return Err(AccountError::invalid_argument(format!(
                "{attr} cannot be modified"
            )));
        }

        let mut account = self.store.find_by_uid(uid).await?;

        if let Some(mail) = changes.get(AccountAttribute::Mail) {
            if !mail.is_empty() && mail != account.mail {
                let holders = self
                    .store
                    .search_by_attribute(AccountAttribute::Mail, mail, Some(uid))
                    .await?;
                if !holders.is_empty() {
                    tracing::debug!(mail = %mail, "Mail already in use");
                    tracing::warn!(uid = %uid, "Update rejected: duplicated email");
                    return Err(AccountError::duplicated_email(mail));
                }
            }
        }

        let mut written = changes;
        written.apply_to(&mut account);
        if written.touches_name() {
            account.refresh_common_name();
            written.set(AccountAttribute::CommonName, account.common_name.clone());
        }

        self.store.apply_partial_update(uid, &written).await?;
        tracing::info!(uid = %uid, attributes = written.len(), "Account updated");

        Ok(account)
    }

    /// Delete an account.
    pub async fn delete(&self, uid: &str) -> AccountResult<()> {
        if self.policy.is_protected(uid) {
            tracing::warn!(uid = %uid, "Deletion of protected account rejected");
            return Err(AccountError::protected(uid, ProtectedAction::Delete));
        }

        self.store.delete(uid).await?;
        tracing::info!(uid = %uid, "Account deleted");
        Ok(())
    }
}

impl std::fmt::Debug for AccountService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountService")
            .field("policy", &self.policy)
            .field("default_role", &self.roles.default_role())
            .field("max_uid_attempts", &self.deriver.max_attempts())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use ldapadmin_directory::memory::{InMemoryDirectoryStore, InMemoryRoleAssignment};
    use serde_json::json;

    fn service() -> (AccountService, InMemoryDirectoryStore, InMemoryRoleAssignment) {
        let store = InMemoryDirectoryStore::new();
        let roles = InMemoryRoleAssignment::new("USER");
        let config = AccountsConfig::new(["geoserver_privileged_user"]);
        let service =
            AccountService::new(Arc::new(store.clone()), Arc::new(roles.clone()), &config)
                .unwrap();
        (service, store, roles)
    }

    #[test]
    fn test_create_input_from_json() {
        let input = CreateAccountInput::from_json(&json!({
            "givenName": "Pierre",
            "sn": "Mauduit",
            "mail": "pmauduit@localhost",
            "o": "geOrchestra"
        }))
        .unwrap();

        assert_eq!(input.given_name, "Pierre");
        assert_eq!(input.surname, "Mauduit");
        assert_eq!(input.mail(), "pmauduit@localhost");
        assert_eq!(input.attributes.get(AccountAttribute::Org), Some("geOrchestra"));
        assert!(!input.attributes.contains(AccountAttribute::GivenName));
    }

    #[test]
    fn test_create_input_from_json_rejects_unknown() {
        let err = CreateAccountInput::from_json(&json!({ "password": "x" })).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = AccountsConfig::default().with_max_uid_attempts(0);
        let result = AccountService::new(
            Arc::new(InMemoryDirectoryStore::new()),
            Arc::new(InMemoryRoleAssignment::new("USER")),
            &config,
        );
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_create_sets_cn_and_role() {
        let (service, store, roles) = service();

        let account = service
            .create(
                CreateAccountInput::new("Pierre", "Mauduit")
                    .with(AccountAttribute::Mail, "pmauduit@localhost"),
            )
            .await
            .unwrap();

        assert_eq!(account.uid, "pmauduit");
        assert_eq!(account.common_name, "Pierre Mauduit");
        assert_eq!(store.find_by_uid("pmauduit").await.unwrap(), account);
        assert!(roles.is_member("pmauduit").await);
    }

    #[tokio::test]
    async fn test_create_requires_names() {
        let (service, store, _) = service();

        let err = service
            .create(CreateAccountInput::new("", "Mauduit"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "First Name is required");

        let err = service
            .create(CreateAccountInput::new("Pierre", "  "))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Last Name is required");
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_create_rejects_uid() {
        let (service, _, _) = service();
        let err = service
            .create(CreateAccountInput::new("Pierre", "Mauduit").with(AccountAttribute::Uid, "pm"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "uid cannot be modified");
    }

    #[tokio::test]
    async fn test_create_name_attributes_override_name_fields() {
        let (service, store, _) = service();

        let mut input = CreateAccountInput::new("Pierre", "Mauduit");
        input.attributes.set(AccountAttribute::GivenName, "Jean");
        let account = service.create(input).await.unwrap();

        assert_eq!(account.uid, "jmauduit");
        assert_eq!(account.given_name, "Jean");
        assert_eq!(account.common_name, "Jean Mauduit");
        assert_eq!(store.find_by_uid("jmauduit").await.unwrap(), account);
    }

    #[tokio::test]
    async fn test_create_blank_surname_attribute_is_rejected() {
        let (service, store, _) = service();

        let mut input = CreateAccountInput::new("Pierre", "Mauduit");
        input.attributes.set(AccountAttribute::GivenName, "Jean");
        input.attributes.set(AccountAttribute::Surname, "");
        let err = service.create(input).await.unwrap_err();

        assert_eq!(err.to_string(), "Last Name is required");
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_update_rejects_cn() {
        let (service, store, _) = service();
        store.seed(Account::new("pmauduit", "Pierre", "Mauduit")).await;

        let err = service
            .update(
                "pmauduit",
                AccountChanges::new().with(AccountAttribute::CommonName, "Someone Else"),
            )
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "cn cannot be modified");
    }

    #[tokio::test]
    async fn test_update_recomputes_cn() {
        let (service, store, _) = service();
        store.seed(Account::new("pmauduit", "Pierre", "Mauduit")).await;

        let merged = service
            .update(
                "pmauduit",
                AccountChanges::new().with(AccountAttribute::GivenName, "Pierrot"),
            )
            .await
            .unwrap();

        assert_eq!(merged.common_name, "Pierrot Mauduit");
        assert_eq!(store.find_by_uid("pmauduit").await.unwrap(), merged);
    }

    #[tokio::test]
    async fn test_update_same_mail_skips_duplicate_check() {
        let (service, store, _) = service();
        store
            .seed(
                Account::new("pmauduit", "Pierre", "Mauduit")
                    .with(AccountAttribute::Mail, "pmauduit@localhost"),
            )
            .await;

        let merged = service
            .update(
                "pmauduit",
                AccountChanges::new()
                    .with(AccountAttribute::Mail, "pmauduit@localhost")
                    .with(AccountAttribute::Title, "CEO"),
            )
            .await
            .unwrap();
        assert_eq!(merged.title, "CEO");
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let (service, _, _) = service();
        let err = service.delete("nonexistentuser").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_find_by_uid_does_not_hide_protected() {
        let (service, store, _) = service();
        store
            .seed(Account::new("geoserver_privileged_user", "GS Priv User", "geoserver privileged user"))
            .await;

        assert!(service.is_protected("geoserver_privileged_user"));
        let account = service.find_by_uid("geoserver_privileged_user").await.unwrap();
        assert_eq!(account.uid, "geoserver_privileged_user");
        assert_eq!(service.find_all().await.unwrap().len(), 1);
    }
}
