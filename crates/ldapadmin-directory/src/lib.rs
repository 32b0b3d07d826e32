//! # Directory
//!
//! Account model and storage boundary for LDAP account administration.
//!
//! This crate holds the data an account carries and the CRUD surface the
//! administration layer talks to. It enforces no policy: protected
//! identities, identifier derivation and duplicate checks live in
//! `ldapadmin-accounts`.
//!
//! ## Example
//!
//! ```ignore
//! use ldapadmin_directory::prelude::*;
//!
//! let config = LdapConfig::new(
//!     "ldap.example.com",
//!     "dc=georchestra,dc=org",
//!     "cn=admin,dc=georchestra,dc=org",
//! )
//! .with_password("secret");
//!
//! let store = LdapDirectoryStore::new(config)?;
//! let roles = LdapRoleAssignment::new(store.clone(), "USER");
//! let account = store.find_by_uid("pmauduit").await?;
//! ```
//!
//! ## Crate Organization
//!
//! - [`account`] - `Account`, `AccountAttribute` and partial `AccountChanges`
//! - [`store`] - `DirectoryStore` and `RoleAssignment` traits
//! - [`error`] - Store, role and configuration errors
//! - [`memory`] - In-memory implementations for tests
//! - [`ldap`] - LDAP implementations over `ldap3`

pub mod account;
pub mod error;
pub mod ldap;
pub mod memory;
pub mod store;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::account::{Account, AccountAttribute, AccountChanges};
    pub use crate::error::{
        ChangesParseError, ConfigError, RoleAssignmentError, StoreError, StoreResult,
    };
    pub use crate::ldap::{LdapConfig, LdapDirectoryStore, LdapRoleAssignment};
    pub use crate::memory::{InMemoryDirectoryStore, InMemoryRoleAssignment};
    pub use crate::store::{DirectoryStore, RoleAssignment};
}

// Re-export async_trait for store implementors
pub use async_trait::async_trait;

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn test_prelude_imports() {
        let _account = Account::new("pmauduit", "Pierre", "Mauduit");
        let _changes = AccountChanges::new().with(AccountAttribute::Title, "CEO");
        let _store = InMemoryDirectoryStore::new();
        let _roles = InMemoryRoleAssignment::new("USER");
        let _config = LdapConfig::new("ldap", "dc=georchestra,dc=org", "cn=admin");
    }
}
