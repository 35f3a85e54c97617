//! Request and response shapes for each stage.
//!
//! These mirror the logical service contracts so any transport (HTTP, queue,
//! CLI) can drive a single stage. Validation happens here, before any work.

use serde::{Deserialize, Serialize};

use crate::error::{Result, VerificationError};
use crate::types::{
    claim::KeywordSet,
    config::{DiscoveryConfig, Region},
    report::ReliabilityReport,
    source::{ArticleContent, SourceCandidate},
    verdict::Verdict,
};

fn default_redundancy_threshold() -> usize {
    15
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordRequest {
    pub text: String,
    #[serde(default = "default_redundancy_threshold")]
    pub redundancy_threshold: usize,
}

impl KeywordRequest {
    pub fn validate(&self) -> Result<()> {
        if self.text.trim().is_empty() {
            return Err(VerificationError::invalid("No text provided"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordResponse {
    pub keywords: Vec<String>,
}

fn default_max_search_count() -> usize {
    DiscoveryConfig::default().max_search_count
}

fn default_min_source_count() -> usize {
    DiscoveryConfig::default().min_source_count
}

fn default_keyword_query_percentage() -> f64 {
    DiscoveryConfig::default().keyword_query_percentage
}

fn default_max_sites_in_query() -> usize {
    DiscoveryConfig::default().max_sites_in_query
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryRequest {
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub original_query: String,
    #[serde(default = "default_max_search_count")]
    pub max_search_count: usize,
    #[serde(default = "default_min_source_count")]
    pub min_source_count: usize,
    #[serde(default = "default_keyword_query_percentage")]
    pub keyword_query_percentage: f64,
    #[serde(default = "default_max_sites_in_query")]
    pub max_sites_in_query: usize,
    #[serde(default)]
    pub region: Region,
}

impl DiscoveryRequest {
    /// Validate and split into the keyword set and loop configuration.
    pub fn into_parts(self) -> Result<(KeywordSet, DiscoveryConfig)> {
        let keywords: KeywordSet = self.keywords.into_iter().collect();
        if keywords.is_empty() {
            return Err(VerificationError::invalid("No keywords provided"));
        }
        let config = DiscoveryConfig::new()
            .with_max_search_count(self.max_search_count)
            .with_min_source_count(self.min_source_count)
            .with_keyword_query_percentage(self.keyword_query_percentage)
            .with_max_sites_in_query(self.max_sites_in_query)
            .with_region(self.region);
        Ok((keywords, config))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryResponse {
    pub results: Vec<SourceCandidate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionRequest {
    #[serde(default)]
    pub results: Vec<SourceCandidate>,
}

impl ExtractionRequest {
    pub fn validate(&self) -> Result<()> {
        if self.results.is_empty() {
            return Err(VerificationError::invalid("No URL data provided"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionResponse {
    pub results: Vec<ArticleContent>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringRequest {
    pub input_text: String,
    #[serde(default)]
    pub article_info: Vec<ArticleContent>,
}

impl ScoringRequest {
    pub fn validate(&self) -> Result<()> {
        if self.input_text.trim().is_empty() {
            return Err(VerificationError::invalid("No input text provided"));
        }
        Ok(())
    }
}

pub type ScoringResponse = ReliabilityReport;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct VerdictRequest {
    pub min_score: f64,
    pub max_score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerdictResponse {
    pub verdict: Verdict,
    pub citation_url: Option<String>,
    pub message: String,
}

impl From<Verdict> for VerdictResponse {
    fn from(verdict: Verdict) -> Self {
        Self {
            citation_url: verdict.citation_url().map(str::to_string),
            message: verdict.message(),
            verdict,
        }
    }
}
