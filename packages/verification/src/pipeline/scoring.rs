//! Similarity fusion scoring.
//!
//! Each usable article is embedded by four models and compared with the
//! claim. The four cosine similarities are fused into one calibrated score:
//!
//! 1. Trimmed mean: drop the single lowest, average the other three.
//! 2. Logistic recalibration around a midpoint.
//! 3. Banding: scores above 0.6 gain 0.08, below 0.4 lose 0.10, and the
//!    band in between loses 0.15. Exactly 0.6 is left as is.
//!
//! Fused scores are not clamped, so they can leave `[0, 1]`.
//!
//! The top article is persisted in a background task. Callers that need the
//! write to land (CLI exit, tests) await [`SimilarityFusionScorer::flush`].

use futures::future::join_all;
use std::sync::Arc;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use crate::error::{Result, VerificationError};
use crate::traits::{
    embedder::{cosine_similarity, ModelEnsemble, ENSEMBLE_SIZE},
    store::ScoreStore,
};
use crate::types::{
    config::ScoringConfig,
    contracts::{ScoringRequest, ScoringResponse},
    report::{ReliabilityReport, ScoredClaimRecord, SimilarityRecord},
    source::ArticleContent,
};

/// Mean of the similarities with the single lowest value dropped.
pub fn trimmed_mean(similarities: &[f64; ENSEMBLE_SIZE]) -> f64 {
    let total: f64 = similarities.iter().sum();
    let lowest = similarities.iter().copied().fold(f64::INFINITY, f64::min);
    (total - lowest) / (ENSEMBLE_SIZE - 1) as f64
}

/// Logistic transform `1 / (1 + e^(-k (x - t)))`.
pub fn recalibrate(mean: f64, midpoint: f64, steepness: f64) -> f64 {
    1.0 / (1.0 + (-steepness * (mean - midpoint)).exp())
}

/// Shift a recalibrated score by its band.
pub fn band(score: f64) -> f64 {
    if score > 0.6 {
        score + 0.08
    } else if score < 0.4 {
        score - 0.10
    } else if score < 0.6 {
        score - 0.15
    } else {
        score
    }
}

/// Fuse four model similarities with the default calibration.
pub fn fuse_similarities(similarities: &[f64; ENSEMBLE_SIZE]) -> f64 {
    fuse_with(similarities, &ScoringConfig::default())
}

/// Fuse four model similarities with an explicit calibration.
pub fn fuse_with(similarities: &[f64; ENSEMBLE_SIZE], config: &ScoringConfig) -> f64 {
    let mean = trimmed_mean(similarities);
    band(recalibrate(mean, config.midpoint, config.steepness))
}

/// Scores articles against a claim and aggregates a [`ReliabilityReport`].
pub struct SimilarityFusionScorer {
    models: ModelEnsemble,
    store: Arc<dyn ScoreStore>,
    config: ScoringConfig,
    writes: TaskTracker,
}

impl SimilarityFusionScorer {
    pub fn new(models: ModelEnsemble, store: Arc<dyn ScoreStore>, config: ScoringConfig) -> Self {
        Self {
            models,
            store,
            config,
            writes: TaskTracker::new(),
        }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Handle a stage request.
    pub async fn handle(&self, request: &ScoringRequest) -> Result<ScoringResponse> {
        request.validate()?;
        self.score(&request.input_text, &request.article_info).await
    }

    /// Score every usable article and aggregate the results.
    ///
    /// Only the claim embedding can fail the call. An article whose
    /// embedding fails is skipped. The store write does not hold up the
    /// report, and a failed write is logged.
    pub async fn score(&self, claim: &str, articles: &[ArticleContent]) -> Result<ReliabilityReport> {
        let usable: Vec<(&ArticleContent, &str)> = articles
            .iter()
            .filter_map(|a| a.usable_text().map(|text| (a, text)))
            .collect();

        if usable.is_empty() {
            info!(articles = articles.len(), "No usable article content, nothing to score");
            return Ok(ReliabilityReport::no_evidence());
        }

        let claim_embeddings = self.models.embed_all(claim).await.map_err(|e| {
            VerificationError::Embedding(format!("failed to embed claim: {e}"))
        })?;
        self.log_sentiment(claim).await;

        let scored: Vec<Option<SimilarityRecord>> = if self.config.parallel_articles {
            join_all(
                usable
                    .iter()
                    .map(|(article, text)| self.score_article(&claim_embeddings, article, text)),
            )
            .await
        } else {
            let mut scored = Vec::with_capacity(usable.len());
            for (article, text) in &usable {
                scored.push(self.score_article(&claim_embeddings, article, text).await);
            }
            scored
        };

        let records: Vec<SimilarityRecord> = scored.into_iter().flatten().collect();
        let scored_count = records.len();
        let report = ReliabilityReport::from_records(records);

        if let Some(top) = report.top() {
            self.persist(claim, top, &claim_embeddings[0]);
        }

        info!(
            scored = scored_count,
            usable = usable.len(),
            average = report.average_score,
            max = report.max_score,
            min = report.min_score,
            "Scoring complete"
        );

        Ok(report)
    }

    async fn score_article(
        &self,
        claim_embeddings: &[Vec<f32>; ENSEMBLE_SIZE],
        article: &ArticleContent,
        text: &str,
    ) -> Option<SimilarityRecord> {
        let embeddings = match self.models.embed_all(text).await {
            Ok(embeddings) => embeddings,
            Err(e) => {
                warn!(url = %article.url, error = %e, "Failed to embed article, skipping");
                return None;
            }
        };

        let mut similarities = [0.0; ENSEMBLE_SIZE];
        for (i, sim) in similarities.iter_mut().enumerate() {
            *sim = cosine_similarity(&claim_embeddings[i], &embeddings[i]);
        }
        let fused = fuse_with(&similarities, &self.config);

        debug!(url = %article.url, ?similarities, fused, "Scored article");
        Some(SimilarityRecord::new(&article.url, &article.title, fused))
    }

    /// Log the claim's sentiment self-similarity. It does not affect scores.
    async fn log_sentiment(&self, claim: &str) {
        let sentiment = self.models.sentiment();
        let probabilities = match sentiment.probabilities(claim).await {
            Ok(p) => p,
            Err(e) => {
                debug!(error = %e, "Sentiment classification failed");
                return;
            }
        };
        let rendered = format!("{probabilities:?}");
        match sentiment.probabilities(&rendered).await {
            Ok(echo) => debug!(
                ?probabilities,
                self_similarity = cosine_similarity(&probabilities, &echo),
                "Claim sentiment"
            ),
            Err(e) => debug!(error = %e, "Sentiment classification failed"),
        }
    }

    fn persist(&self, claim: &str, top: &SimilarityRecord, claim_embedding: &[f32]) {
        let record = match ScoredClaimRecord::new(claim, top, claim_embedding) {
            Ok(record) => record,
            Err(e) => {
                warn!(error = %e, "Failed to serialize claim embedding, not persisting");
                return;
            }
        };
        let store = self.store.clone();
        self.writes.spawn(async move {
            if let Err(e) = store.record(&record).await {
                warn!(error = %e, "Failed to persist scored claim");
            }
        });
    }

    /// Wait for every store write started so far.
    pub async fn flush(&self) {
        self.writes.close();
        self.writes.wait().await;
        self.writes.reopen();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ensemble_of, MockEmbedder};
    use crate::traits::store::MockScoreStore;
    use crate::stores::MemoryScoreStore;

    fn scorer(embedder: MockEmbedder, store: Arc<dyn ScoreStore>) -> SimilarityFusionScorer {
        SimilarityFusionScorer::new(ensemble_of(embedder), store, ScoringConfig::default())
    }

    #[test]
    fn test_trimmed_mean_drops_lowest() {
        assert!((trimmed_mean(&[0.2, 0.9, 0.6, 0.3]) - 0.6).abs() < 1e-12);
        assert!((trimmed_mean(&[0.5, 0.5, 0.5, 0.5]) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_recalibrate_midpoint() {
        assert!((recalibrate(0.62, 0.62, 10.0) - 0.5).abs() < 1e-12);
        assert!(recalibrate(1.0, 0.62, 10.0) > 0.97);
    }

    #[test]
    fn test_band_edges() {
        assert!((band(0.7) - 0.78).abs() < 1e-12);
        assert!((band(0.3) - 0.2).abs() < 1e-12);
        assert!((band(0.5) - 0.35).abs() < 1e-12);
        assert!((band(0.4) - 0.25).abs() < 1e-12);
        assert_eq!(band(0.6), 0.6);
    }

    #[test]
    fn test_fuse_is_unclamped() {
        let fused = fuse_similarities(&[1.0, 1.0, 1.0, 1.0]);
        let expected = 1.0 / (1.0 + (-3.8f64).exp()) + 0.08;
        assert!((fused - expected).abs() < 1e-12);
        assert!(fused > 1.0);
    }

    #[test]
    fn test_fuse_deterministic() {
        let sims = [0.41, 0.77, 0.52, 0.63];
        assert_eq!(fuse_similarities(&sims), fuse_similarities(&sims));
    }

    #[tokio::test]
    async fn test_no_usable_articles_is_no_evidence() {
        let mut store = MockScoreStore::new();
        store.expect_record().times(0);
        let scorer = scorer(MockEmbedder::new("m"), Arc::new(store));

        let articles = vec![
            ArticleContent::from_source(
                crate::types::source::SourceCandidate::credible("t", "https://a.gov"),
                crate::types::source::ArticleBody::failed("Error retrieving content: boom"),
            ),
            ArticleContent::with_text("https://b.gov", "t", "Main content not found in HTML."),
            ArticleContent::with_text("https://c.gov", "t", "   "),
        ];

        let report = scorer.score("claim", &articles).await.unwrap();
        assert_eq!(report, ReliabilityReport::no_evidence());
    }

    #[tokio::test]
    async fn test_identical_text_scores_high() {
        let store = Arc::new(MemoryScoreStore::new());
        let scorer = scorer(MockEmbedder::new("m"), store.clone());

        let articles = vec![ArticleContent::with_text(
            "https://who.int/a",
            "WHO",
            "vaccines are safe",
        )];
        let report = scorer.score("vaccines are safe", &articles).await.unwrap();
        scorer.flush().await;

        assert!((report.max_score - fuse_similarities(&[1.0; 4])).abs() < 1e-9);
        assert_eq!(report.max_score, report.min_score);
        assert_eq!(report.average_score, report.max_score);
        assert_eq!(report.top_articles.len(), 1);
        assert_eq!(report.supporting_url.as_deref(), Some("https://who.int/a"));
        assert_eq!(report.challenging_url.as_deref(), Some("https://who.int/a"));

        let records = store.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].top_url, "https://who.int/a");
        assert_eq!(records[0].claim, "vaccines are safe");
    }

    #[tokio::test]
    async fn test_scores_sorted_and_top_two() {
        let embedder = MockEmbedder::new("m")
            .with_embedding("claim", vec![1.0, 0.0])
            .with_embedding("close", vec![0.9, 0.1])
            .with_embedding("far", vec![0.0, 1.0])
            .with_embedding("middle", vec![0.6, 0.4]);
        let scorer = scorer(embedder, Arc::new(MemoryScoreStore::new()));

        let articles = vec![
            ArticleContent::with_text("https://a.gov/far", "far", "far"),
            ArticleContent::with_text("https://a.gov/close", "close", "close"),
            ArticleContent::with_text("https://a.gov/middle", "middle", "middle"),
        ];
        let report = scorer.score("claim", &articles).await.unwrap();

        assert_eq!(report.top_articles.len(), 2);
        assert_eq!(report.top_articles[0].url, "https://a.gov/close");
        assert_eq!(report.top_articles[1].url, "https://a.gov/middle");
        assert_eq!(report.challenging_url.as_deref(), Some("https://a.gov/far"));
        assert!(report.min_score < 0.0);
    }

    #[tokio::test]
    async fn test_store_failure_does_not_fail_scoring() {
        let mut store = MockScoreStore::new();
        store
            .expect_record()
            .times(1)
            .returning(|_| Err(VerificationError::Storage("disk full".into())));
        let scorer = scorer(MockEmbedder::new("m"), Arc::new(store));

        let articles = vec![ArticleContent::with_text("https://a.gov", "t", "text")];
        let report = scorer.score("claim", &articles).await.unwrap();
        assert!(!report.no_evidence);
        scorer.flush().await;
    }

    /// Store whose writes never complete.
    struct HangingStore;

    #[async_trait::async_trait]
    impl ScoreStore for HangingStore {
        async fn record(&self, _record: &ScoredClaimRecord) -> Result<()> {
            std::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_store_does_not_delay_report() {
        let scorer = scorer(MockEmbedder::new("m"), Arc::new(HangingStore));

        let articles = vec![ArticleContent::with_text("https://a.gov", "t", "text")];
        let report = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            scorer.score("claim", &articles),
        )
        .await
        .expect("report should not wait on the store")
        .unwrap();

        assert!(!report.no_evidence);
        assert_eq!(report.supporting_url.as_deref(), Some("https://a.gov"));
    }

    #[tokio::test]
    async fn test_article_embedding_failure_skips_article() {
        let embedder = MockEmbedder::new("m").with_failure("broken");
        let scorer = scorer(embedder, Arc::new(MemoryScoreStore::new()));

        let articles = vec![
            ArticleContent::with_text("https://a.gov/ok", "ok", "fine text"),
            ArticleContent::with_text("https://a.gov/bad", "bad", "broken"),
        ];
        let report = scorer.score("claim", &articles).await.unwrap();

        assert_eq!(report.top_articles.len(), 1);
        assert_eq!(report.supporting_url.as_deref(), Some("https://a.gov/ok"));
    }

    #[tokio::test]
    async fn test_claim_embedding_failure_is_error() {
        let embedder = MockEmbedder::new("m").with_failure("claim");
        let scorer = scorer(embedder, Arc::new(MemoryScoreStore::new()));

        let articles = vec![ArticleContent::with_text("https://a.gov", "t", "text")];
        let err = scorer.score("claim", &articles).await.unwrap_err();
        assert!(matches!(err, VerificationError::Embedding(_)));
    }

    #[tokio::test]
    async fn test_parallel_and_sequential_agree() {
        let articles: Vec<_> = (0..5)
            .map(|i| ArticleContent::with_text(format!("https://a.gov/{i}"), "t", format!("article {i}")))
            .collect();

        let parallel = scorer(MockEmbedder::new("m"), Arc::new(MemoryScoreStore::new()));
        let sequential = SimilarityFusionScorer::new(
            ensemble_of(MockEmbedder::new("m")),
            Arc::new(MemoryScoreStore::new()),
            ScoringConfig::default().sequential(),
        );

        let a = parallel.score("a claim", &articles).await.unwrap();
        let b = sequential.score("a claim", &articles).await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_handle_scores_flat_articles() {
        let scorer = scorer(MockEmbedder::new("m"), Arc::new(MemoryScoreStore::new()));
        let request: ScoringRequest = serde_json::from_str(
            r#"{"input_text": "vaccines are safe", "article_info": [
                {"url": "https://who.int/a", "title": "WHO", "article_content": "vaccines are safe"},
                {"url": "https://cdc.gov/b", "title": "CDC", "article_content": "Error retrieving content: timed out"}
            ]}"#,
        )
        .unwrap();

        let report = scorer.handle(&request).await.unwrap();
        assert_eq!(report.top_articles.len(), 1);
        assert_eq!(report.supporting_url.as_deref(), Some("https://who.int/a"));
    }

    #[tokio::test]
    async fn test_handle_rejects_blank_claim() {
        let scorer = scorer(MockEmbedder::new("m"), Arc::new(MemoryScoreStore::new()));
        let request = ScoringRequest {
            input_text: " ".into(),
            article_info: vec![],
        };
        assert!(scorer.handle(&request).await.is_err());
    }
}
