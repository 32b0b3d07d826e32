//! Account administration configuration

use ldapadmin_directory::error::ConfigError;
use serde::{Deserialize, Serialize};

use crate::deriver::DEFAULT_MAX_ATTEMPTS;
use crate::policy::ProtectedIdentities;

/// Configuration for [`crate::AccountService`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountsConfig {
    /// Identifiers that may never be created, updated, or deleted.
    #[serde(default)]
    pub protected_users: Vec<String>,

    /// Role granted to every new account.
    #[serde(default = "default_role")]
    pub default_role: String,

    /// Identifier candidates tried before giving up, the bare one included.
    #[serde(default = "default_max_uid_attempts")]
    pub max_uid_attempts: u32,
}

fn default_role() -> String {
    "USER".to_string()
}

fn default_max_uid_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

impl Default for AccountsConfig {
    fn default() -> Self {
        Self {
            protected_users: Vec::new(),
            default_role: default_role(),
            max_uid_attempts: default_max_uid_attempts(),
        }
    }
}

impl AccountsConfig {
    /// Create a config protecting the given identifiers.
    pub fn new<I, S>(protected_users: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            protected_users: protected_users.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Set the default role.
    #[must_use]
    pub fn with_default_role(mut self, role: impl Into<String>) -> Self {
        self.default_role = role.into();
        self
    }

    /// Set the attempt bound for identifier derivation.
    #[must_use]
    pub fn with_max_uid_attempts(mut self, attempts: u32) -> Self {
        self.max_uid_attempts = attempts;
        self
    }

    /// Parse and validate a config from JSON.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_value(value.clone())
            .map_err(|e| ConfigError::new(format!("malformed accounts config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_role.trim().is_empty() {
            return Err(ConfigError::new("default_role is required"));
        }

        if self.max_uid_attempts == 0 {
            return Err(ConfigError::new("max_uid_attempts must be at least 1"));
        }

        if self.protected_users.iter().any(|uid| uid.trim().is_empty()) {
            return Err(ConfigError::new("protected_users cannot contain blank entries"));
        }

        Ok(())
    }

    pub fn protected_identities(&self) -> ProtectedIdentities {
        ProtectedIdentities::new(self.protected_users.iter().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let config = AccountsConfig::default();
        assert_eq!(config.default_role, "USER");
        assert_eq!(config.max_uid_attempts, 100);
        assert!(config.protected_users.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_json() {
        let config = AccountsConfig::from_json(&json!({
            "protected_users": ["geoserver_privileged_user"]
        }))
        .unwrap();

        assert_eq!(config.default_role, "USER");
        assert!(config
            .protected_identities()
            .is_protected("geoserver_privileged_user"));
    }

    #[test]
    fn test_from_json_rejects_malformed() {
        let err = AccountsConfig::from_json(&json!({ "max_uid_attempts": "many" })).unwrap_err();
        assert!(err.message.starts_with("malformed accounts config"));
    }

    #[test]
    fn test_validate() {
        let config = AccountsConfig::default().with_default_role(" ");
        assert_eq!(
            config.validate().unwrap_err().message,
            "default_role is required"
        );

        let config = AccountsConfig::default().with_max_uid_attempts(0);
        assert!(config.validate().is_err());

        let config = AccountsConfig::new(["admin", ""]);
        assert_eq!(
            config.validate().unwrap_err().message,
            "protected_users cannot contain blank entries"
        );
    }
}
