//! Credible-domain allowlist and classifier.
//!
//! The allowlist is one versioned JSON asset compiled into the crate. It is
//! parsed once into a [`DomainAllowlist`] and shared by discovery (for `site:`
//! filters and the inline URL pattern) and classification.
//!
//! Matching is a plain suffix test for every entry, dotted or not. A full
//! entry such as `cnn.com` therefore also matches `notcnn.com`; that
//! over-match is kept as-is.

use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Result, VerificationError};
use crate::types::config::Region;

const BUNDLED_ALLOWLIST: &str = include_str!("../assets/credible_domains.json");

/// Outcome of a credibility check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Credibility {
    Credible,
    NotCredible,
}

impl Credibility {
    /// Tri-state integer form: 1 credible, -1 not credible.
    pub fn as_score(&self) -> i8 {
        match self {
            Self::Credible => 1,
            Self::NotCredible => -1,
        }
    }

    pub fn is_credible(&self) -> bool {
        matches!(self, Self::Credible)
    }
}

/// On-disk shape of the allowlist asset.
#[derive(Debug, Clone, Deserialize)]
struct AllowlistAsset {
    version: String,
    global: Vec<String>,
    #[serde(default)]
    regional: IndexMap<String, Vec<String>>,
    inline_pattern: Vec<String>,
}

/// Parsed, validated allowlist.
#[derive(Debug, Clone)]
pub struct DomainAllowlist {
    version: String,
    global: Vec<String>,
    regional: IndexMap<String, Vec<String>>,
    inline_pattern: Regex,
}

impl DomainAllowlist {
    /// Load the allowlist compiled into the crate.
    pub fn bundled() -> Result<Self> {
        Self::from_json(BUNDLED_ALLOWLIST)
    }

    /// Parse an allowlist from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let asset: AllowlistAsset = serde_json::from_str(json)?;

        if asset.global.is_empty() {
            return Err(VerificationError::Config(
                "allowlist has no global entries".to_string(),
            ));
        }
        if asset.inline_pattern.is_empty() {
            return Err(VerificationError::Config(
                "allowlist has no inline pattern entries".to_string(),
            ));
        }
        if let Some((key, _)) = asset.regional.iter().find(|(_, entries)| entries.is_empty()) {
            return Err(VerificationError::Config(format!(
                "regional allowlist '{key}' is empty"
            )));
        }

        let alternation = asset
            .inline_pattern
            .iter()
            .map(|entry| regex::escape(entry))
            .collect::<Vec<_>>()
            .join("|");
        let inline_pattern = Regex::new(&format!("({alternation})"))
            .map_err(|e| VerificationError::Config(format!("invalid inline pattern: {e}")))?;

        let normalize = |entries: Vec<String>| -> Vec<String> {
            entries.into_iter().map(|e| e.trim().to_lowercase()).collect()
        };

        Ok(Self {
            version: asset.version,
            global: normalize(asset.global),
            regional: asset
                .regional
                .into_iter()
                .map(|(key, entries)| (key, normalize(entries)))
                .collect(),
            inline_pattern,
        })
    }

    /// Asset version string.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Entries of the global allowlist, in asset order.
    pub fn global(&self) -> &[String] {
        &self.global
    }

    /// Domains `site:` filters are sampled from for a region.
    ///
    /// Falls back to the global list when the asset has no entry for the
    /// region.
    pub fn filter_domains(&self, region: Region) -> &[String] {
        region
            .asset_key()
            .and_then(|key| self.regional.get(key))
            .map(Vec::as_slice)
            .unwrap_or(&self.global)
    }

    /// Classify a domain against the global allowlist.
    pub fn classify(&self, domain: &str) -> Credibility {
        let domain = domain.trim().to_lowercase();
        let domain = domain.strip_prefix("www.").unwrap_or(&domain);

        if self.global.iter().any(|entry| domain.ends_with(entry.as_str())) {
            Credibility::Credible
        } else {
            Credibility::NotCredible
        }
    }

    /// Convenience wrapper over [`classify`](Self::classify).
    pub fn is_credible(&self, domain: &str) -> bool {
        self.classify(domain).is_credible()
    }

    /// Whether a URL contains one of the recognized domain substrings.
    pub fn matches_inline_pattern(&self, url: &str) -> bool {
        self.inline_pattern.is_match(url)
    }
}
