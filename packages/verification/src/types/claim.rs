//! Claim and keyword types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::error::{Result, VerificationError};

/// The user-submitted text under verification.
///
/// Immutable for the duration of a run; its text is its identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Claim(String);

impl Claim {
    /// Create a claim, rejecting blank input.
    pub fn new(text: impl Into<String>) -> Result<Self> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(VerificationError::invalid("claim text is empty"));
        }
        Ok(Self(text))
    }

    /// The claim text.
    pub fn text(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Claim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Claim {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Discriminative keywords extracted from a claim.
///
/// Order is irrelevant; a sorted set keeps iteration deterministic so the
/// query sampler is reproducible under a fixed seed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeywordSet(BTreeSet<String>);

impl KeywordSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a keyword. Blank keywords are ignored.
    pub fn insert(&mut self, keyword: impl Into<String>) -> bool {
        let keyword = keyword.into();
        if keyword.trim().is_empty() {
            return false;
        }
        self.0.insert(keyword)
    }

    /// Whether the keyword is present.
    pub fn contains(&self, keyword: &str) -> bool {
        self.0.contains(keyword)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate keywords in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Keywords as an owned vector, sorted.
    pub fn to_vec(&self) -> Vec<String> {
        self.0.iter().cloned().collect()
    }

    /// True when no keyword is a substring of a different keyword.
    pub fn is_pruned(&self) -> bool {
        self.0
            .iter()
            .all(|a| !self.0.iter().any(|b| a != b && b.contains(a.as_str())))
    }
}

impl FromIterator<String> for KeywordSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        let mut set = Self::new();
        for keyword in iter {
            set.insert(keyword);
        }
        set
    }
}

impl<'a> FromIterator<&'a str> for KeywordSet {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        iter.into_iter().map(str::to_string).collect()
    }
}

impl IntoIterator for KeywordSet {
    type Item = String;
    type IntoIter = std::collections::btree_set::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_claim_rejected() {
        assert!(matches!(
            Claim::new("   "),
            Err(VerificationError::InvalidRequest { .. })
        ));
        assert_eq!(Claim::new("Water is wet").unwrap().text(), "Water is wet");
    }

    #[test]
    fn test_keyword_set_ignores_blanks() {
        let mut set = KeywordSet::new();
        assert!(set.insert("vaccine"));
        assert!(!set.insert(" "));
        assert!(!set.insert("vaccine"));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_is_pruned() {
        let pruned: KeywordSet = ["money account", "bank"].into_iter().collect();
        assert!(pruned.is_pruned());

        let overlapping: KeywordSet = ["money account", "account"].into_iter().collect();
        assert!(!overlapping.is_pruned());
    }
}
