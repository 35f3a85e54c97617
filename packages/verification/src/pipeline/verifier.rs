//! End-to-end claim verification.
//!
//! A [`Verifier`] runs the stages in order over one explicit
//! [`VerifierContext`]. Nothing is held in process-wide state, so several
//! verifiers with different collaborators can coexist.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use crate::credibility::DomainAllowlist;
use crate::error::Result;
use crate::pacing::FixedDelayPacer;
use crate::pipeline::{
    content::ContentExtractor, discovery::SourceDiscoveryLoop, keywords::KeywordExtractor,
    scoring::SimilarityFusionScorer, verdict::VerdictClassifier,
};
use crate::traits::{
    embedder::ModelEnsemble,
    explainer::{ExplanationRequest, Explainer},
    fetcher::ContentFetcher,
    pacer::Pacer,
    searcher::WebSearcher,
    store::ScoreStore,
};
use crate::types::{
    claim::{Claim, KeywordSet},
    config::VerificationConfig,
    report::ReliabilityReport,
    source::{ArticleContent, SourceCandidate},
    verdict::Verdict,
};

/// Most sources listed by [`Verifier::summarize_sources`].
const SUMMARY_MAX_SOURCES: usize = 5;

/// Summary text length after which no further sources are appended.
const SUMMARY_MAX_CHARS: usize = 3000;

/// Placeholder sent to the explainer when no top article has usable text.
const NO_SUPPORTING_CONTENT: &str = "No sufficient supporting article content could be extracted.";

/// Collaborators and configuration for a verification run.
#[derive(Clone)]
pub struct VerifierContext {
    pub allowlist: Arc<DomainAllowlist>,
    pub searcher: Arc<dyn WebSearcher>,
    pub fetcher: Arc<dyn ContentFetcher>,
    pub models: ModelEnsemble,
    pub store: Arc<dyn ScoreStore>,
    pub pacer: Arc<dyn Pacer>,
    pub explainer: Option<Arc<dyn Explainer>>,
    pub config: VerificationConfig,
}

impl VerifierContext {
    /// Create a context with the bundled allowlist, a one-second pacer and
    /// default configuration.
    pub fn new(
        searcher: Arc<dyn WebSearcher>,
        fetcher: Arc<dyn ContentFetcher>,
        models: ModelEnsemble,
        store: Arc<dyn ScoreStore>,
    ) -> Result<Self> {
        Ok(Self {
            allowlist: Arc::new(DomainAllowlist::bundled()?),
            searcher,
            fetcher,
            models,
            store,
            pacer: Arc::new(FixedDelayPacer::default()),
            explainer: None,
            config: VerificationConfig::default(),
        })
    }

    pub fn with_allowlist(mut self, allowlist: Arc<DomainAllowlist>) -> Self {
        self.allowlist = allowlist;
        self
    }

    pub fn with_pacer(mut self, pacer: Arc<dyn Pacer>) -> Self {
        self.pacer = pacer;
        self
    }

    pub fn with_explainer(mut self, explainer: Arc<dyn Explainer>) -> Self {
        self.explainer = Some(explainer);
        self
    }

    pub fn with_config(mut self, config: VerificationConfig) -> Self {
        self.config = config;
        self
    }
}

impl std::fmt::Debug for VerifierContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerifierContext")
            .field("allowlist_version", &self.allowlist.version())
            .field("searcher", &self.searcher.name())
            .field("fetcher", &self.fetcher.name())
            .field("models", &self.models)
            .field("explainer", &self.explainer.is_some())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Everything a verification run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationOutcome {
    pub run_id: Uuid,
    pub claim: Claim,
    pub keywords: KeywordSet,
    pub sources: Vec<SourceCandidate>,
    pub articles: Vec<ArticleContent>,
    pub report: ReliabilityReport,
    pub verdict: Verdict,

    /// Search iterations spent during discovery.
    pub search_iterations: usize,
}

/// Runs keyword extraction, discovery, extraction, scoring and the verdict.
pub struct Verifier {
    context: VerifierContext,
    keywords: KeywordExtractor,
    discovery: SourceDiscoveryLoop,
    extractor: ContentExtractor,
    scorer: SimilarityFusionScorer,
    classifier: VerdictClassifier,
}

impl Verifier {
    pub fn new(context: VerifierContext) -> Self {
        let config = &context.config;
        Self {
            keywords: KeywordExtractor::new(config.keywords.clone()),
            discovery: SourceDiscoveryLoop::new(
                context.allowlist.clone(),
                context.searcher.clone(),
                context.pacer.clone(),
            ),
            extractor: ContentExtractor::new(context.fetcher.clone(), config.extractor.clone()),
            scorer: SimilarityFusionScorer::new(
                context.models.clone(),
                context.store.clone(),
                config.scoring.clone(),
            ),
            classifier: VerdictClassifier::new(),
            context,
        }
    }

    pub fn context(&self) -> &VerifierContext {
        &self.context
    }

    pub fn keyword_extractor(&self) -> &KeywordExtractor {
        &self.keywords
    }

    pub fn discovery(&self) -> &SourceDiscoveryLoop {
        &self.discovery
    }

    pub fn extractor(&self) -> &ContentExtractor {
        &self.extractor
    }

    pub fn scorer(&self) -> &SimilarityFusionScorer {
        &self.scorer
    }

    pub fn classifier(&self) -> &VerdictClassifier {
        &self.classifier
    }

    /// Verify a claim.
    pub async fn verify(&self, claim: &str) -> Result<VerificationOutcome> {
        self.verify_with_cancel(claim, CancellationToken::new()).await
    }

    /// Verify a claim, aborting with `Cancelled` when the token fires.
    pub async fn verify_with_cancel(
        &self,
        claim: &str,
        cancel: CancellationToken,
    ) -> Result<VerificationOutcome> {
        let claim = Claim::new(claim)?;
        let run_id = Uuid::now_v7();
        info!(run_id = %run_id, "Verifying claim");

        let keywords = self.keywords.extract(claim.text());

        let discovered = self
            .discovery
            .discover(&keywords, claim.text(), &self.context.config.discovery, &cancel)
            .await?;

        let articles = self
            .extractor
            .extract(discovered.sources.clone(), &cancel)
            .await?;

        let report = self.scorer.score(claim.text(), &articles).await?;
        let verdict = self.classifier.classify(&report);

        info!(
            run_id = %run_id,
            keywords = keywords.len(),
            sources = discovered.sources.len(),
            articles = articles.len(),
            verdict = %verdict,
            "Verification complete"
        );

        Ok(VerificationOutcome {
            run_id,
            claim,
            keywords,
            sources: discovered.sources,
            articles,
            report,
            verdict,
            search_iterations: discovered.iterations,
        })
    }

    /// Wait for pending score store writes.
    pub async fn flush(&self) {
        self.scorer.flush().await;
    }

    /// Explain an outcome with the configured explainer, if any.
    pub async fn explain(&self, outcome: &VerificationOutcome) -> Result<Option<String>> {
        let Some(explainer) = &self.context.explainer else {
            return Ok(None);
        };

        let request = ExplanationRequest::new(
            outcome.claim.text(),
            supporting_texts(outcome),
            outcome.report.max_score,
            outcome.report.min_score,
        );
        request.validate()?;

        match explainer.explain(&request).await {
            Ok(text) => Ok(Some(text)),
            Err(e) => {
                warn!(run_id = %outcome.run_id, error = %e, "Explanation failed");
                Err(e)
            }
        }
    }

    /// Source listing for display: at most five entries, skipping XML feeds,
    /// with no further entries once the text passes 3000 characters.
    pub fn summarize_sources(sources: &[SourceCandidate]) -> String {
        let mut summary = String::new();
        let mut listed = 0;

        for source in sources {
            if listed == SUMMARY_MAX_SOURCES {
                break;
            }
            if summary.chars().count() < SUMMARY_MAX_CHARS {
                if source.url.ends_with(".xml") {
                    continue;
                }
                summary.push_str(&format!("{}\nlink: {}\n\n\n", source.title, source.url));
            }
            listed += 1;
        }

        summary
    }
}

/// Usable text of the report's top articles, labelled by URL.
pub fn supporting_texts(outcome: &VerificationOutcome) -> Vec<String> {
    let texts: Vec<String> = outcome
        .articles
        .iter()
        .filter(|article| outcome.report.top_articles.iter().any(|top| top.url == article.url))
        .filter_map(|article| {
            article
                .usable_text()
                .map(|text| format!("Source ({}):\n{}\n", article.url, text))
        })
        .collect();

    if texts.is_empty() {
        vec![NO_SUPPORTING_CONTENT.to_string()]
    } else {
        texts
    }
}
