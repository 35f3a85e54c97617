//! Scoring output: per-article records, the aggregate report, and verdicts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fused similarity of one article to the claim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityRecord {
    pub url: String,
    pub title: String,
    pub fused_score: f64,
}

impl SimilarityRecord {
    pub fn new(url: impl Into<String>, title: impl Into<String>, fused_score: f64) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            fused_score,
        }
    }
}

/// Aggregate of all scored articles for one claim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReliabilityReport {
    pub average_score: f64,
    pub max_score: f64,
    pub min_score: f64,

    /// Article with the highest fused score.
    pub supporting_url: Option<String>,

    /// Article with the lowest fused score.
    pub challenging_url: Option<String>,

    /// Up to two records, highest score first.
    pub top_articles: Vec<SimilarityRecord>,

    /// Set when no article had usable content.
    #[serde(default)]
    pub no_evidence: bool,
}

impl ReliabilityReport {
    /// Zero-valued report for runs with nothing to score.
    pub fn no_evidence() -> Self {
        Self {
            average_score: 0.0,
            max_score: 0.0,
            min_score: 0.0,
            supporting_url: None,
            challenging_url: None,
            top_articles: Vec::new(),
            no_evidence: true,
        }
    }

    /// Aggregate records into a report.
    ///
    /// Records are sorted by descending score (stable, so equal scores keep
    /// input order); the first is the supporting citation and the last the
    /// challenging one.
    pub fn from_records(mut records: Vec<SimilarityRecord>) -> Self {
        if records.is_empty() {
            return Self::no_evidence();
        }

        records.sort_by(|a, b| b.fused_score.total_cmp(&a.fused_score));

        let count = records.len() as f64;
        let average_score = records.iter().map(|r| r.fused_score).sum::<f64>() / count;
        let max_score = records[0].fused_score;
        let min_score = records[records.len() - 1].fused_score;
        let supporting_url = records.first().map(|r| r.url.clone());
        let challenging_url = records.last().map(|r| r.url.clone());

        records.truncate(2);

        Self {
            average_score,
            max_score,
            min_score,
            supporting_url,
            challenging_url,
            top_articles: records,
            no_evidence: false,
        }
    }

    /// Highest-scoring record, if any.
    pub fn top(&self) -> Option<&SimilarityRecord> {
        self.top_articles.first()
    }
}

/// Row appended to the score store after each scored run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredClaimRecord {
    pub claim: String,
    pub top_score: f64,
    pub top_url: String,

    /// JSON array of the claim's first-model embedding.
    pub claim_embedding_json: String,

    pub recorded_at: DateTime<Utc>,
}

impl ScoredClaimRecord {
    pub fn new(
        claim: impl Into<String>,
        top: &SimilarityRecord,
        claim_embedding: &[f32],
    ) -> serde_json::Result<Self> {
        Ok(Self {
            claim: claim.into(),
            top_score: top.fused_score,
            top_url: top.url.clone(),
            claim_embedding_json: serde_json::to_string(claim_embedding)?,
            recorded_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_record_report() {
        let report =
            ReliabilityReport::from_records(vec![SimilarityRecord::new("https://a.gov/x", "A", 0.9)]);

        assert_eq!(report.average_score, 0.9);
        assert_eq!(report.max_score, 0.9);
        assert_eq!(report.min_score, 0.9);
        assert_eq!(report.top_articles.len(), 1);
        assert_eq!(report.supporting_url.as_deref(), Some("https://a.gov/x"));
        assert_eq!(report.challenging_url.as_deref(), Some("https://a.gov/x"));
        assert!(!report.no_evidence);
    }

    #[test]
    fn test_report_orders_and_truncates() {
        let report = ReliabilityReport::from_records(vec![
            SimilarityRecord::new("https://low.gov", "low", 0.1),
            SimilarityRecord::new("https://high.gov", "high", 0.8),
            SimilarityRecord::new("https://mid.gov", "mid", 0.4),
        ]);

        assert_eq!(report.supporting_url.as_deref(), Some("https://high.gov"));
        assert_eq!(report.challenging_url.as_deref(), Some("https://low.gov"));
        assert_eq!(report.top_articles.len(), 2);
        assert_eq!(report.top_articles[1].url, "https://mid.gov");
        assert!((report.average_score - (1.3 / 3.0)).abs() < 1e-12);
    }

    #[test]
    fn test_empty_records_are_no_evidence() {
        let report = ReliabilityReport::from_records(vec![]);
        assert!(report.no_evidence);
        assert!(report.supporting_url.is_none());
        assert!(report.top_articles.is_empty());
    }

    #[test]
    fn test_scored_claim_record_serializes_embedding() {
        let top = SimilarityRecord::new("https://a.gov", "A", 0.7);
        let record = ScoredClaimRecord::new("claim", &top, &[0.5, -1.0]).unwrap();
        assert_eq!(record.claim_embedding_json, "[0.5,-1.0]");
        assert_eq!(record.top_url, "https://a.gov");
    }
}
