//! Pipeline stages and the orchestrating [`Verifier`].
//!
//! Stages, leaf first:
//! - [`keywords`] - claim text to keyword set
//! - [`discovery`] - iterative credible-source search
//! - [`content`] - concurrent article body extraction
//! - [`scoring`] - four-model similarity fusion
//! - [`verdict`] - threshold rules
//!
//! [`verifier`] chains them; [`prompts`] builds explanation prompts.

pub mod content;
pub mod discovery;
pub mod keywords;
pub mod prompts;
pub mod scoring;
mod stopwords;
pub mod verdict;
pub mod verifier;

pub use content::ContentExtractor;
pub use discovery::{DiscoveryReport, SourceDiscoveryLoop};
pub use keywords::KeywordExtractor;
pub use scoring::{fuse_similarities, SimilarityFusionScorer};
pub use verdict::{classify_scores, VerdictClassifier};
pub use verifier::{VerificationOutcome, Verifier, VerifierContext};
