//! LDAP adapter.
//!
//! Accounts live under `uid=<uid>,<user_container>,<base_dn>`; the default
//! role is granted through the `member` attribute of
//! `cn=<role>,<role_container>,<base_dn>`.

pub mod config;
pub mod store;

pub use config::LdapConfig;
pub use store::{LdapDirectoryStore, LdapRoleAssignment};
