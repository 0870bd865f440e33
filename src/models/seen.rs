//! Set of announcement ids that were already relayed.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Ids of announcements already delivered.
///
/// Grow-only: there is no way to remove an id once inserted. Serialized as a
/// plain JSON array of strings, kept sorted so the file stays stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeenSet {
    ids: BTreeSet<String>,
}

impl SeenSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an id. Returns `true` if it was not present before.
    pub fn insert(&mut self, id: impl Into<String>) -> bool {
        self.ids.insert(id.into())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for SeenSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl<S: Into<String>> Extend<S> for SeenSet {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        self.ids.extend(iter.into_iter().map(Into::into));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_reports_novelty() {
        let mut seen = SeenSet::new();
        assert!(seen.insert("101"));
        assert!(!seen.insert("101"));
        assert_eq!(seen.len(), 1);
    }

    #[test]
    fn test_serializes_as_sorted_array() {
        let seen: SeenSet = ["103", "101", "102"].into_iter().collect();
        let json = serde_json::to_string(&seen).unwrap();
        assert_eq!(json, r#"["101","102","103"]"#);
    }

    #[test]
    fn test_deserializes_from_array() {
        let seen: SeenSet = serde_json::from_str(r#"["7", "3", "7"]"#).unwrap();
        assert_eq!(seen.len(), 2);
        assert!(seen.contains("3"));
        assert!(seen.contains("7"));
    }
}
