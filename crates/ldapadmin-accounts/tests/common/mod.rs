//! Common test utilities for account administration tests.
//!
//! These tests run against the in-memory directory store, so no LDAP
//! server is needed.

#![allow(dead_code)]

use std::sync::{Arc, Once};

use ldapadmin_accounts::{AccountService, AccountsConfig};
use ldapadmin_directory::account::{Account, AccountAttribute};
use ldapadmin_directory::memory::{InMemoryDirectoryStore, InMemoryRoleAssignment};

static INIT: Once = Once::new();

/// Initialize logging for tests (once).
pub fn init_test_logging() {
    INIT.call_once(|| {
        if std::env::var("RUST_LOG").is_ok() {
            tracing_subscriber::fmt()
                .with_test_writer()
                .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
                .try_init()
                .ok();
        }
    });
}

pub const PROTECTED_UID: &str = "geoserver_privileged_user";

/// Service wired to in-memory collaborators the test can inspect.
pub struct TestContext {
    pub service: AccountService,
    pub store: InMemoryDirectoryStore,
    pub roles: InMemoryRoleAssignment,
}

impl TestContext {
    /// Create a context protecting [`PROTECTED_UID`].
    pub fn new() -> Self {
        Self::with_config(AccountsConfig::new([PROTECTED_UID]))
    }

    pub fn with_config(config: AccountsConfig) -> Self {
        init_test_logging();

        let store = InMemoryDirectoryStore::new();
        let roles = InMemoryRoleAssignment::new(config.default_role.clone());
        let service = AccountService::new(
            Arc::new(store.clone()),
            Arc::new(roles.clone()),
            &config,
        )
        .expect("test config should be valid");

        Self {
            service,
            store,
            roles,
        }
    }

    /// Seed the directory with the accounts the console ships with.
    pub async fn seed_defaults(&self) {
        self.store
            .seed(
                Account::new(PROTECTED_UID, "GS Priv User", "geoserver privileged user")
                    .with(AccountAttribute::Mail, "geoserver@localhost"),
            )
            .await;
        self.store
            .seed(
                pmauduit()
                    .with(AccountAttribute::TelephoneNumber, "+331234567890")
                    .with(AccountAttribute::Locality, "Chambéry"),
            )
            .await;
        self.store
            .seed(
                Account::new("tomcat2", "Tom", "Cat")
                    .with(AccountAttribute::Mail, "tomcat2@localhost"),
            )
            .await;
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

pub fn pmauduit() -> Account {
    Account::new("pmauduit", "Pierre", "Mauduit")
        .with(AccountAttribute::Mail, "pmauduit@localhost")
        .with(AccountAttribute::Org, "geOrchestra")
}
