//! Claim Verification Library
//!
//! Scores how well credible web sources support a short factual claim and
//! maps the score to a reliability verdict.
//!
//! # Pipeline
//!
//! 1. Keyword extraction (TF-IDF over sentences, redundancy pruning)
//! 2. Source discovery (allowlisted search, paced, iterative)
//! 3. Content extraction (HTML, XML and PDF bodies, fetched concurrently)
//! 4. Similarity fusion (four embedding models, trimmed mean, sigmoid)
//! 5. Verdict (threshold rules on the best and worst article)
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use verification::{Verifier, VerifierContext, MemoryScoreStore};
//! use verification::testing::{mock_ensemble, MockFetcher, MockWebSearcher};
//!
//! let context = VerifierContext::new(
//!     Arc::new(MockWebSearcher::new()),
//!     Arc::new(MockFetcher::new()),
//!     mock_ensemble(),
//!     Arc::new(MemoryScoreStore::new()),
//! )?;
//! let verifier = Verifier::new(context);
//!
//! let outcome = verifier.verify("The WHO declared the pandemic over in 2023").await?;
//! println!("{}", outcome.verdict.message());
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Seams to search, fetch, embedding, storage and explanation
//! - [`types`] - Claims, sources, reports, verdicts and stage contracts
//! - [`pipeline`] - The stages and the orchestrating [`Verifier`]
//! - [`credibility`] - Domain allowlist and credibility checks
//! - [`searchers`], [`fetchers`], [`embedders`], [`explainers`], [`stores`] - Adapters
//! - [`pacing`] - Search request pacing
//! - [`security`] - Credential handling
//! - [`testing`] - Mock implementations for testing

pub mod credibility;
pub mod embedders;
pub mod error;
pub mod explainers;
pub mod fetchers;
pub mod pacing;
pub mod pipeline;
pub mod searchers;
pub mod security;
pub mod stores;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use credibility::{Credibility, DomainAllowlist};
pub use error::{FetchError, Result, VerificationError};
pub use traits::{
    embedder::{cosine_similarity, ModelEnsemble, SentimentClassifier, TextEmbedder},
    explainer::{ExplanationRequest, Explainer},
    fetcher::{ContentFetcher, FetchedDocument},
    pacer::Pacer,
    searcher::{SearchHit, WebSearcher},
    store::ScoreStore,
};
pub use types::{
    claim::{Claim, KeywordSet},
    config::{
        DiscoveryConfig, ExtractorConfig, KeywordConfig, Region, ScoringConfig,
        VerificationConfig,
    },
    report::{ReliabilityReport, ScoredClaimRecord, SimilarityRecord},
    source::{ArticleBody, ArticleContent, SourceCandidate},
    verdict::Verdict,
};

// Re-export pipeline components
pub use pipeline::{
    classify_scores, fuse_similarities, ContentExtractor, DiscoveryReport, KeywordExtractor,
    SimilarityFusionScorer, SourceDiscoveryLoop, VerdictClassifier, VerificationOutcome,
    Verifier, VerifierContext,
};

// Re-export adapters
pub use embedders::{TeiEmbedder, TeiSentimentClassifier};
pub use explainers::OpenAIExplainer;
pub use fetchers::HttpFetcher;
pub use pacing::{FixedDelayPacer, GovernorPacer, NoPacer};
pub use searchers::{GoogleCustomSearcher, TavilySearcher};
pub use security::SecretString;
pub use stores::MemoryScoreStore;

#[cfg(feature = "sqlite")]
pub use stores::SqliteScoreStore;
