//! LDAP store configuration

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Configuration for the LDAP-backed directory store.
#[derive(Clone, Serialize, Deserialize)]
pub struct LdapConfig {
    /// LDAP server hostname or IP address.
    pub host: String,

    /// LDAP server port (389 for LDAP, 636 for LDAPS).
    #[serde(default = "default_ldap_port")]
    pub port: u16,

    /// Use SSL/TLS (LDAPS).
    #[serde(default)]
    pub use_ssl: bool,

    /// Use STARTTLS upgrade on plain LDAP connection.
    #[serde(default)]
    pub use_starttls: bool,

    /// Base DN of the tree (e.g., "dc=georchestra,dc=org").
    pub base_dn: String,

    /// Bind DN for the console's service account.
    pub bind_dn: String,

    /// Bind password.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bind_password: Option<String>,

    /// User container, relative to `base_dn`.
    #[serde(default = "default_user_container")]
    pub user_container: String,

    /// Role container, relative to `base_dn`.
    #[serde(default = "default_role_container")]
    pub role_container: String,

    /// Object classes set on new accounts and required when searching.
    #[serde(default = "default_user_object_classes")]
    pub user_object_classes: Vec<String>,

    /// Connection timeout in seconds.
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout_secs: u64,
}

impl std::fmt::Debug for LdapConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LdapConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("use_ssl", &self.use_ssl)
            .field("use_starttls", &self.use_starttls)
            .field("base_dn", &self.base_dn)
            .field("bind_dn", &self.bind_dn)
            .field(
                "bind_password",
                &self.bind_password.as_ref().map(|_| "***REDACTED***"),
            )
            .field("user_container", &self.user_container)
            .field("role_container", &self.role_container)
            .field("user_object_classes", &self.user_object_classes)
            .field("connection_timeout_secs", &self.connection_timeout_secs)
            .finish()
    }
}

fn default_ldap_port() -> u16 {
    389
}

fn default_user_container() -> String {
    "ou=users".to_string()
}

fn default_role_container() -> String {
    "ou=roles".to_string()
}

fn default_user_object_classes() -> Vec<String> {
    vec![
        "top".to_string(),
        "person".to_string(),
        "organizationalPerson".to_string(),
        "inetOrgPerson".to_string(),
    ]
}

fn default_connection_timeout() -> u64 {
    30
}

impl LdapConfig {
    /// Create a new LDAP config with required fields.
    pub fn new(
        host: impl Into<String>,
        base_dn: impl Into<String>,
        bind_dn: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port: default_ldap_port(),
            use_ssl: false,
            use_starttls: false,
            base_dn: base_dn.into(),
            bind_dn: bind_dn.into(),
            bind_password: None,
            user_container: default_user_container(),
            role_container: default_role_container(),
            user_object_classes: default_user_object_classes(),
            connection_timeout_secs: default_connection_timeout(),
        }
    }

    /// Set bind password.
    #[must_use]
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.bind_password = Some(password.into());
        self
    }

    /// Enable SSL (LDAPS).
    #[must_use]
    pub fn with_ssl(mut self) -> Self {
        self.use_ssl = true;
        self.port = 636;
        self
    }

    /// Enable STARTTLS.
    #[must_use]
    pub fn with_starttls(mut self) -> Self {
        self.use_starttls = true;
        self
    }

    /// Set user container.
    #[must_use]
    pub fn with_user_container(mut self, container: impl Into<String>) -> Self {
        self.user_container = container.into();
        self
    }

    /// Get the full user container DN.
    #[must_use]
    pub fn user_dn(&self) -> String {
        join_dn(&self.user_container, &self.base_dn)
    }

    /// Get the full role container DN.
    #[must_use]
    pub fn role_dn(&self) -> String {
        join_dn(&self.role_container, &self.base_dn)
    }

    /// Get the LDAP URL.
    #[must_use]
    pub fn url(&self) -> String {
        let scheme = if self.use_ssl { "ldaps" } else { "ldap" };
        format!("{}://{}:{}", scheme, self.host, self.port)
    }

    /// Object classes that identify account entries in searches.
    ///
    /// `top` is implied by every entry and left out.
    pub fn search_object_classes(&self) -> impl Iterator<Item = &str> {
        self.user_object_classes
            .iter()
            .map(String::as_str)
            .filter(|oc| !oc.eq_ignore_ascii_case("top"))
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.is_empty() {
            return Err(ConfigError::new("host is required"));
        }

        if self.base_dn.is_empty() {
            return Err(ConfigError::new("base_dn is required"));
        }

        if self.bind_dn.is_empty() {
            return Err(ConfigError::new("bind_dn is required"));
        }

        if self.use_ssl && self.use_starttls {
            return Err(ConfigError::new("cannot use both SSL and STARTTLS"));
        }

        if self.search_object_classes().next().is_none() {
            return Err(ConfigError::new(
                "user_object_classes must name at least one structural class",
            ));
        }

        Ok(())
    }

    /// Create a redacted version of this config (for logging/display).
    #[must_use]
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        if config.bind_password.is_some() {
            config.bind_password = Some("***REDACTED***".to_string());
        }
        config
    }
}

fn join_dn(container: &str, base_dn: &str) -> String {
    if container.is_empty() {
        base_dn.to_string()
    } else {
        format!("{container},{base_dn}")
    }
}
