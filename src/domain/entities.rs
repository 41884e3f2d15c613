//! Domain entities: core data structures

use std::fmt;

/// One employee as read from the input document, before the hierarchy exists.
///
/// The parent reference is the identity of the direct manager. It is absent
/// exactly for the root of the organisation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatRecord {
    identity: String,
    parent_identity: Option<String>,
}

impl FlatRecord {
    /// Create a record.
    ///
    /// A blank parent reference is treated the same as a missing one: both mark
    /// the record as a root candidate.
    pub fn new(identity: impl Into<String>, parent_identity: Option<impl Into<String>>) -> Self {
        let parent_identity = parent_identity
            .map(Into::into)
            .map(|p: String| p.trim().to_string())
            .filter(|p| !p.is_empty());
        Self {
            identity: identity.into().trim().to_string(),
            parent_identity,
        }
    }

    /// Record without a manager.
    pub fn root(identity: impl Into<String>) -> Self {
        Self::new(identity, None::<String>)
    }

    /// Record reporting to `parent`.
    pub fn child(identity: impl Into<String>, parent: impl Into<String>) -> Self {
        Self::new(identity, Some(parent))
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn parent_identity(&self) -> Option<&str> {
        self.parent_identity.as_deref()
    }

    pub fn is_root_candidate(&self) -> bool {
        self.parent_identity.is_none()
    }
}

impl fmt::Display for FlatRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.parent_identity {
            Some(parent) => write!(f, "{} -> {}", self.identity, parent),
            None => write!(f, "{} (root)", self.identity),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_blank_parent_when_creating_then_record_is_root_candidate() {
        let record = FlatRecord::new("ceo@corp.com", Some("   "));
        assert!(record.is_root_candidate());
        assert_eq!(record.parent_identity(), None);
    }

    #[test]
    fn given_padded_values_when_creating_then_values_are_trimmed() {
        let record = FlatRecord::child(" dev@corp.com\n", "\tcto@corp.com ");
        assert_eq!(record.identity(), "dev@corp.com");
        assert_eq!(record.parent_identity(), Some("cto@corp.com"));
    }

    #[test]
    fn given_records_when_displayed_then_shows_link() {
        assert_eq!(FlatRecord::root("a").to_string(), "a (root)");
        assert_eq!(FlatRecord::child("b", "a").to_string(), "b -> a");
    }
}
