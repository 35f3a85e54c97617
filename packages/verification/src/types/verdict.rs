//! Reliability verdicts.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Final categorical judgment for a claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Verdict {
    /// Sources suggest the opposite of the claim.
    HighlyUnreliable { citation_url: Option<String> },

    /// No credible source backs the claim.
    Unreliable { citation_url: Option<String> },

    /// Some sources support it slightly.
    Ambiguous { citation_url: Option<String> },

    /// Strong supporting evidence.
    Reliable { citation_url: Option<String> },

    /// Scores fall in a gap no rule covers (e.g. max exactly 0.60).
    Undetermined,
}

impl Verdict {
    pub fn citation_url(&self) -> Option<&str> {
        match self {
            Self::HighlyUnreliable { citation_url }
            | Self::Unreliable { citation_url }
            | Self::Ambiguous { citation_url }
            | Self::Reliable { citation_url } => citation_url.as_deref(),
            Self::Undetermined => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::HighlyUnreliable { .. } => "highly_unreliable",
            Self::Unreliable { .. } => "unreliable",
            Self::Ambiguous { .. } => "ambiguous",
            Self::Reliable { .. } => "reliable",
            Self::Undetermined => "undetermined",
        }
    }

    /// User-facing sentence for this verdict, citation included.
    pub fn message(&self) -> String {
        let source = |url: &Option<String>| match url {
            Some(url) => format!("\n\n source URL: {url}"),
            None => String::new(),
        };
        match self {
            Self::HighlyUnreliable { citation_url } => format!(
                "Highly Unreliable. Sources suggest opposite of the claim.{}",
                source(citation_url)
            ),
            Self::Unreliable { citation_url } => format!(
                "Unreliable. No credible sources back the claim up.{}",
                source(citation_url)
            ),
            Self::Ambiguous { citation_url } => format!(
                "It is ambiguous whether the claim is reliable. \n Some credible sources support it slightly, but doesnt support it directly.{}",
                source(citation_url)
            ),
            Self::Reliable { citation_url } => format!(
                "There is strong evidence that the claim is reliable. The source backs it up.{}",
                source(citation_url)
            ),
            Self::Undetermined => {
                "The available scores do not map to a reliability verdict.".to_string()
            }
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
