//! LDAP-backed directory store and role assignment.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ldap3::{Ldap, LdapConnAsync, LdapConnSettings, LdapResult, Mod, Scope, SearchEntry};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use crate::account::{Account, AccountAttribute, AccountChanges};
use crate::error::{ConfigError, RoleAssignmentError, StoreError, StoreResult};
use crate::ldap::config::LdapConfig;
use crate::store::{DirectoryStore, RoleAssignment};

/// `noSuchObject`
const RC_NO_SUCH_OBJECT: u32 = 32;
/// `attributeOrValueExists`
const RC_VALUE_EXISTS: u32 = 20;
/// `invalidCredentials`
const RC_INVALID_CREDENTIALS: u32 = 49;

/// Account store over an LDAP directory.
#[derive(Clone)]
pub struct LdapDirectoryStore {
    config: LdapConfig,

    /// Cached LDAP connection (lazily initialized).
    connection: Arc<RwLock<Option<Ldap>>>,
}

impl LdapDirectoryStore {
    /// Create a store with the given configuration. No connection is made yet.
    pub fn new(config: LdapConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            connection: Arc::new(RwLock::new(None)),
        })
    }

    pub fn config(&self) -> &LdapConfig {
        &self.config
    }

    /// Get an LDAP connection, creating one if necessary.
    async fn connection(&self) -> StoreResult<Ldap> {
        {
            let guard = self.connection.read().await;
            if let Some(ref conn) = *guard {
                return Ok(conn.clone());
            }
        }

        let conn = self.connect().await?;
        *self.connection.write().await = Some(conn.clone());
        Ok(conn)
    }

    /// Forget the cached connection so the next call reconnects.
    async fn reset_connection(&self) {
        *self.connection.write().await = None;
    }

    async fn connect(&self) -> StoreResult<Ldap> {
        let url = self.config.url();
        debug!(url = %url, "Connecting to LDAP server");

        let settings = LdapConnSettings::new()
            .set_conn_timeout(Duration::from_secs(self.config.connection_timeout_secs))
            .set_starttls(self.config.use_starttls);

        let (conn, mut ldap) = LdapConnAsync::with_settings(settings, &url)
            .await
            .map_err(|e| {
                StoreError::unavailable_with_source(format!("cannot reach LDAP server at {url}"), e)
            })?;

        tokio::spawn(async move {
            if let Err(e) = conn.drive().await {
                warn!(error = %e, "LDAP connection driver error");
            }
        });

        let bind_dn = &self.config.bind_dn;
        let password = self.config.bind_password.as_deref().unwrap_or("");
        let result = ldap.simple_bind(bind_dn, password).await.map_err(|e| {
            StoreError::unavailable_with_source(format!("LDAP bind failed for {bind_dn}"), e)
        })?;

        match result.rc {
            0 => {}
            RC_INVALID_CREDENTIALS => {
                return Err(StoreError::unavailable(format!(
                    "LDAP bind rejected credentials for {bind_dn}"
                )))
            }
            rc => {
                return Err(StoreError::unavailable(format!(
                    "LDAP bind failed with code {rc}: {}",
                    result.text
                )))
            }
        }

        info!(host = %self.config.host, "LDAP connection established");
        Ok(ldap)
    }

    /// Transport failures drop the cached connection before being reported.
    async fn transport_error(&self, context: String, e: ldap3::LdapError) -> StoreError {
        self.reset_connection().await;
        StoreError::unavailable_with_source(context, e)
    }

    /// DN of the entry stored under `uid`.
    pub fn entry_dn(&self, uid: &str) -> String {
        format!("uid={},{}", escape_dn_value(uid), self.config.user_dn())
    }

    /// DN of a role entry.
    pub fn role_dn(&self, role: &str) -> String {
        format!("cn={},{}", escape_dn_value(role), self.config.role_dn())
    }

    /// Filter matching account entries, optionally narrowed to an equality.
    fn account_filter(
        &self,
        attribute: Option<(AccountAttribute, &str)>,
        exclude_uid: Option<&str>,
    ) -> String {
        let mut filter = String::from("(&");
        for oc in self.config.search_object_classes() {
            filter.push_str(&format!("(objectClass={})", escape_filter_value(oc)));
        }
        if let Some((attr, value)) = attribute {
            filter.push_str(&format!(
                "({}={})",
                attr.ldap_name(),
                escape_filter_value(value)
            ));
        }
        if let Some(uid) = exclude_uid {
            filter.push_str(&format!("(!(uid={}))", escape_filter_value(uid)));
        }
        filter.push(')');
        filter
    }

    #[instrument(level = "debug", skip(self, scope, filter))]
    async fn search_accounts(
        &self,
        base: &str,
        scope: Scope,
        filter: &str,
    ) -> StoreResult<Vec<Account>> {
        let mut ldap = self.connection().await?;
        let attrs: Vec<&str> = AccountAttribute::ALL
            .iter()
            .map(|attr| attr.ldap_name())
            .collect();

        let ldap3::SearchResult(entries, result) = match ldap.search(base, scope, filter, attrs).await {
            Ok(search) => search,
            Err(e) => return Err(self.transport_error("LDAP search failed".to_string(), e).await),
        };
        check_search_result(&result, base, matches!(scope, Scope::Base))?;

        let mut accounts: Vec<Account> = entries
            .into_iter()
            .map(SearchEntry::construct)
            .map(entry_to_account)
            .collect();
        accounts.sort_by(|a, b| a.uid.cmp(&b.uid));

        debug!(returned = accounts.len(), "LDAP search completed");
        Ok(accounts)
    }
}

impl std::fmt::Debug for LdapDirectoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LdapDirectoryStore")
            .field("config", &self.config.redacted())
            .finish()
    }
}

#[async_trait]
impl DirectoryStore for LdapDirectoryStore {
    async fn find_all(&self) -> StoreResult<Vec<Account>> {
        let filter = self.account_filter(None, None);
        self.search_accounts(&self.config.user_dn(), Scope::Subtree, &filter)
            .await
    }

    async fn find_by_uid(&self, uid: &str) -> StoreResult<Account> {
        let dn = self.entry_dn(uid);
        match self
            .search_accounts(&dn, Scope::Base, "(objectClass=*)")
            .await
        {
            Ok(accounts) => exact_entry(uid, accounts),
            Err(StoreError::NotFound { .. }) => Err(StoreError::not_found(uid)),
            Err(e) => Err(e),
        }
    }

    async fn search_by_attribute(
        &self,
        attribute: AccountAttribute,
        value: &str,
        exclude_uid: Option<&str>,
    ) -> StoreResult<Vec<Account>> {
        let filter = self.account_filter(Some((attribute, value)), exclude_uid);
        self.search_accounts(&self.config.user_dn(), Scope::Subtree, &filter)
            .await
    }

    #[instrument(skip(self, account), fields(uid = %account.uid))]
    async fn insert(&self, account: &Account) -> StoreResult<()> {
        let mut ldap = self.connection().await?;
        let dn = self.entry_dn(&account.uid);

        let mut attrs: Vec<(&str, HashSet<&str>)> = vec![(
            "objectClass",
            self.config
                .user_object_classes
                .iter()
                .map(String::as_str)
                .collect(),
        )];
        attrs.extend(
            account
                .present_attributes()
                .map(|(attr, value)| (attr.ldap_name(), HashSet::from([value]))),
        );

        let result = match ldap.add(&dn, attrs).await {
            Ok(result) => result,
            Err(e) => return Err(self.transport_error(format!("failed to create entry: {dn}"), e).await),
        };
        check_result(&result, &account.uid, "add")?;

        info!(dn = %dn, "LDAP entry created");
        Ok(())
    }

    #[instrument(skip(self, changes))]
    async fn apply_partial_update(&self, uid: &str, changes: &AccountChanges) -> StoreResult<()> {
        if changes.is_empty() {
            return Ok(());
        }

        self.find_by_uid(uid).await?;

        let mut ldap = self.connection().await?;
        let dn = self.entry_dn(uid);
        let mods = changes_to_mods(changes);

        let result = match ldap.modify(&dn, mods).await {
            Ok(result) => result,
            Err(e) => return Err(self.transport_error(format!("failed to update entry: {dn}"), e).await),
        };
        check_result(&result, uid, "modify")?;

        info!(dn = %dn, attributes = changes.len(), "LDAP entry updated");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete(&self, uid: &str) -> StoreResult<()> {
        self.find_by_uid(uid).await?;

        let mut ldap = self.connection().await?;
        let dn = self.entry_dn(uid);

        let result = match ldap.delete(&dn).await {
            Ok(result) => result,
            Err(e) => return Err(self.transport_error(format!("failed to delete entry: {dn}"), e).await),
        };
        check_result(&result, uid, "delete")?;

        info!(dn = %dn, "LDAP entry deleted");
        Ok(())
    }
}

/// Grants the default role by adding the account as a `member` of the role entry.
#[derive(Debug, Clone)]
pub struct LdapRoleAssignment {
    store: LdapDirectoryStore,
    role: String,
}

impl LdapRoleAssignment {
    /// Share the store's connection to grant `role`.
    pub fn new(store: LdapDirectoryStore, role: impl Into<String>) -> Self {
        Self {
            store,
            role: role.into(),
        }
    }
}

#[async_trait]
impl RoleAssignment for LdapRoleAssignment {
    fn default_role(&self) -> &str {
        &self.role
    }

    #[instrument(skip(self), fields(role = %self.role))]
    async fn assign_default_role(&self, uid: &str) -> Result<(), RoleAssignmentError> {
        let mut ldap = self
            .store
            .connection()
            .await
            .map_err(|e| RoleAssignmentError::new(&self.role, uid, e.to_string()))?;

        let role_dn = self.store.role_dn(&self.role);
        let member_dn = self.store.entry_dn(uid);
        let mods = vec![Mod::Add("member", HashSet::from([member_dn.as_str()]))];

        let result = match ldap.modify(&role_dn, mods).await {
            Ok(result) => result,
            Err(e) => {
                let err = self
                    .store
                    .transport_error(format!("failed to update role {role_dn}"), e)
                    .await;
                return Err(RoleAssignmentError::new(&self.role, uid, err.to_string()));
            }
        };

        match result.rc {
            0 | RC_VALUE_EXISTS => {
                info!(role_dn = %role_dn, member = %member_dn, "Role granted");
                Ok(())
            }
            rc => Err(RoleAssignmentError::new(
                &self.role,
                uid,
                format!("LDAP modify failed with code {rc}: {}", result.text),
            )),
        }
    }
}

/// Classify an LDAP result code.
fn check_result(result: &LdapResult, uid: &str, operation: &str) -> StoreResult<()> {
    match result.rc {
        0 => Ok(()),
        RC_NO_SUCH_OBJECT => Err(StoreError::not_found(uid)),
        rc => Err(StoreError::unavailable(format!(
            "LDAP {operation} failed with code {rc}: {}",
            result.text
        ))),
    }
}

/// Classify a search result.
///
/// A missing base only means "no such account" for a base-scope lookup of
/// one entry; under a subtree search it is the user container that is gone.
fn check_search_result(result: &LdapResult, base: &str, entry_lookup: bool) -> StoreResult<()> {
    if result.rc == RC_NO_SUCH_OBJECT && !entry_lookup {
        return Err(StoreError::unavailable(format!(
            "LDAP search base does not exist: {base}"
        )));
    }
    check_result(result, base, "search")
}

/// Pick the entry stored under exactly `uid`.
///
/// DN matching on `uid` ignores case, so a lookup for `JDOE` reaches the
/// entry of `jdoe`. Only an identical identifier counts as a match.
fn exact_entry(uid: &str, accounts: Vec<Account>) -> StoreResult<Account> {
    accounts
        .into_iter()
        .find(|account| account.uid == uid)
        .ok_or_else(|| StoreError::not_found(uid))
}

/// Build the modify request for a partial update. Empty values clear.
fn changes_to_mods(changes: &AccountChanges) -> Vec<Mod<&str>> {
    changes
        .iter()
        .map(|(attr, value)| {
            let values = if value.is_empty() {
                HashSet::new()
            } else {
                HashSet::from([value])
            };
            Mod::Replace(attr.ldap_name(), values)
        })
        .collect()
}

/// Map a search entry onto an account. Unknown attributes are ignored;
/// multi-valued ones keep their first value.
fn entry_to_account(entry: SearchEntry) -> Account {
    let mut account = Account::default();
    let attrs: HashMap<String, Vec<String>> = entry.attrs;

    for (name, values) in attrs {
        let Some(attr) = AccountAttribute::parse(&name) else {
            continue;
        };
        if let Some(first) = values.into_iter().next() {
            account.set(attr, first);
        }
    }

    if account.uid.is_empty() {
        account.uid = uid_from_dn(&entry.dn).unwrap_or_default();
    }
    account
}

/// Extract the `uid` RDN value from a DN such as `uid=jdoe,ou=users,...`.
fn uid_from_dn(dn: &str) -> Option<String> {
    let rdn = dn.split(',').next()?;
    let (name, value) = rdn.split_once('=')?;
    name.trim()
        .eq_ignore_ascii_case("uid")
        .then(|| value.trim().to_string())
}

/// Escape special characters in LDAP filter values (RFC 4515).
fn escape_filter_value(value: &str) -> String {
    value
        .replace('\\', "\\5c")
        .replace('*', "\\2a")
        .replace('(', "\\28")
        .replace(')', "\\29")
        .replace('\0', "\\00")
}

/// Escape special characters in DN attribute values (RFC 4514).
fn escape_dn_value(value: &str) -> String {
    let count = value.chars().count();
    let mut result = String::with_capacity(value.len() * 2);

    for (i, ch) in value.chars().enumerate() {
        let is_first = i == 0;
        let is_last = i + 1 == count;

        match ch {
            ',' | '+' | '"' | '\\' | '<' | '>' | ';' | '=' => {
                result.push('\\');
                result.push(ch);
            }
            '\0' => result.push_str("\\00"),
            ' ' if is_first || is_last => result.push_str("\\20"),
            '#' if is_first => result.push_str("\\23"),
            _ => result.push(ch),
        }
    }

    result
}
