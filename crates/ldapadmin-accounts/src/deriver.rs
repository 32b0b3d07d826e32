//! Identifier derivation for new accounts.

use ldapadmin_directory::store::DirectoryStore;
use tracing::debug;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::error::{AccountError, AccountResult, ProtectedAction};
use crate::policy::ProtectedIdentities;

/// Default number of candidates tried, the bare candidate included.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 100;

/// Derives unique account identifiers from a name pair.
///
/// The candidate is the first letter of the given name followed by the
/// surname, both folded to ASCII lower-case alphanumerics. When it is
/// taken, a numeric suffix is appended starting at `2` (`pmauduit`,
/// `pmauduit2`, `pmauduit3`, ...).
#[derive(Debug, Clone)]
pub struct IdentifierDeriver {
    policy: ProtectedIdentities,
    max_attempts: u32,
}

impl IdentifierDeriver {
    pub fn new(policy: ProtectedIdentities, max_attempts: u32) -> Self {
        Self {
            policy,
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Fold a name to ASCII lower-case alphanumerics.
    ///
    /// Accented letters lose their accent (`é` becomes `e`); anything that
    /// has no ASCII base letter is dropped.
    pub fn normalize(name: &str) -> String {
        name.nfkd()
            .filter(|c| !is_combining_mark(*c))
            .flat_map(char::to_lowercase)
            .filter(char::is_ascii_alphanumeric)
            .collect()
    }

    /// The bare identifier candidate for a name pair.
    ///
    /// Empty when neither name has anything left after normalization.
    pub fn candidate(given_name: &str, surname: &str) -> String {
        let mut candidate: String = Self::normalize(given_name).chars().take(1).collect();
        candidate.push_str(&Self::normalize(surname));
        candidate
    }

    /// Derive an identifier that is neither protected nor stored.
    ///
    /// A protected bare candidate is rejected outright rather than
    /// suffixed around.
    pub async fn derive_unique(
        &self,
        store: &dyn DirectoryStore,
        given_name: &str,
        surname: &str,
    ) -> AccountResult<String> {
        let base = Self::candidate(given_name, surname);
        if base.is_empty() {
            return Err(AccountError::invalid_argument("First Name is required"));
        }

        if self.policy.is_protected(&base) {
            return Err(AccountError::protected(base, ProtectedAction::Create));
        }

        if !store.exists(&base).await? {
            debug!(uid = %base, "Derived identifier");
            return Ok(base);
        }

        for suffix in 2..=self.max_attempts {
            let candidate = format!("{base}{suffix}");
            if self.policy.is_protected(&candidate) {
                debug!(uid = %candidate, "Skipping protected candidate");
                continue;
            }
            if !store.exists(&candidate).await? {
                debug!(uid = %candidate, base = %base, "Derived identifier with suffix");
                return Ok(candidate);
            }
        }

        Err(AccountError::invalid_argument(format!(
            "Unable to derive a unique identifier for '{base}' after {} attempts",
            self.max_attempts
        )))
    }
}

impl Default for IdentifierDeriver {
    fn default() -> Self {
        Self::new(ProtectedIdentities::default(), DEFAULT_MAX_ATTEMPTS)
    }
}
