//! Protected identities.

use std::sync::Arc;

/// Identifiers that can never be created, updated, or deleted through
/// account administration.
///
/// Matching is exact and case-sensitive. The set is fixed at construction.
/// Stores must resolve identifiers exactly as well: a case variant of a
/// protected uid has to miss the protected entry rather than reach it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProtectedIdentities {
    uids: Arc<[String]>,
}

impl ProtectedIdentities {
    /// Build the set, keeping the first occurrence of any repeated entry.
    pub fn new<I, S>(uids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut ordered: Vec<String> = Vec::new();
        for uid in uids {
            let uid = uid.into();
            if !ordered.contains(&uid) {
                ordered.push(uid);
            }
        }
        Self {
            uids: ordered.into(),
        }
    }

    pub fn is_protected(&self, uid: &str) -> bool {
        self.uids.iter().any(|protected| protected == uid)
    }

    /// Protected identifiers, in configured order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.uids.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.uids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.uids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match() {
        let policy = ProtectedIdentities::new(["geoserver_privileged_user"]);
        assert!(policy.is_protected("geoserver_privileged_user"));
        assert!(!policy.is_protected("GEOSERVER_PRIVILEGED_USER"));
        assert!(!policy.is_protected("geoserver_privileged_user2"));
        assert!(!policy.is_protected(""));
    }

    #[test]
    fn test_dedup_keeps_order() {
        let policy = ProtectedIdentities::new(["b", "a", "b", "c", "a"]);
        assert_eq!(policy.iter().collect::<Vec<_>>(), vec!["b", "a", "c"]);
        assert_eq!(policy.len(), 3);
    }

    #[test]
    fn test_empty() {
        let policy = ProtectedIdentities::default();
        assert!(policy.is_empty());
        assert!(!policy.is_protected("anyone"));
    }

    #[test]
    fn test_clones_share_the_set() {
        let policy = ProtectedIdentities::new(vec!["admin".to_string()]);
        let clone = policy.clone();
        assert_eq!(policy, clone);
        assert!(clone.is_protected("admin"));
    }
}
