//! # Account Administration
//!
//! Rules for creating, updating, and deleting directory accounts on behalf
//! of an administrative console.
//!
//! ## Features
//!
//! - Protected identities that no workflow may touch
//! - Identifier derivation from the name pair with numeric-suffix collision
//!   resolution
//! - Partial updates that leave unlisted attributes alone and keep `cn`
//!   in step with `givenName` and `sn`
//! - Mail uniqueness across accounts
//! - A closed error taxonomy ([`AccountError`], [`ErrorKind`])
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use ldapadmin_accounts::{AccountService, AccountsConfig, CreateAccountInput};
//! use ldapadmin_directory::prelude::*;
//!
//! let config = AccountsConfig::new(["geoserver_privileged_user"]);
//! let store = LdapDirectoryStore::new(ldap_config)?;
//! let roles = LdapRoleAssignment::new(store.clone(), &config.default_role);
//! let service = AccountService::new(Arc::new(store), Arc::new(roles), &config)?;
//!
//! let account = service
//!     .create(CreateAccountInput::new("Pierre", "Mauduit"))
//!     .await?;
//! assert_eq!(account.uid, "pmauduit");
//! ```

pub mod config;
pub mod deriver;
pub mod error;
pub mod policy;
pub mod service;

pub use config::AccountsConfig;
pub use deriver::IdentifierDeriver;
pub use error::{AccountError, AccountResult, ErrorKind, ProtectedAction};
pub use policy::ProtectedIdentities;
pub use service::{AccountService, CreateAccountInput};
