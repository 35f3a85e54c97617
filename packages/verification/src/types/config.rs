//! Configuration types for each pipeline stage.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for keyword extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordConfig {
    /// Candidate count above which redundant keywords are pruned.
    ///
    /// Default: 15.
    pub redundancy_threshold: usize,

    /// Maximum TF-IDF features retained across all sentences.
    ///
    /// Default: 30.
    pub max_features: usize,

    /// Top-scoring terms taken from each sentence.
    ///
    /// Default: 3.
    pub terms_per_sentence: usize,
}

impl Default for KeywordConfig {
    fn default() -> Self {
        Self {
            redundancy_threshold: 15,
            max_features: 30,
            terms_per_sentence: 3,
        }
    }
}

impl KeywordConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_redundancy_threshold(mut self, threshold: usize) -> Self {
        self.redundancy_threshold = threshold;
        self
    }
}

/// Which credibility allowlist discovery samples `site:` filters from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    /// The full curated allowlist.
    #[default]
    Global,

    /// Singapore government, academic and news outlets only.
    Singapore,
}

impl Region {
    /// Key of this region in the allowlist asset (`None` for global).
    pub fn asset_key(&self) -> Option<&'static str> {
        match self {
            Self::Global => None,
            Self::Singapore => Some("sg"),
        }
    }
}

/// Configuration for the source discovery loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Hard cap on search iterations.
    ///
    /// Default: 20.
    pub max_search_count: usize,

    /// Quota of distinct credible sources that ends the loop early.
    ///
    /// Default: 25.
    pub min_source_count: usize,

    /// Lower bound of the keyword sampling fraction for large keyword sets.
    ///
    /// Values outside [0.2, 1.0] are replaced by 0.5. Default: 0.8.
    pub keyword_query_percentage: f64,

    /// Number of `site:` terms in each filter clause.
    ///
    /// Default: 5.
    pub max_sites_in_query: usize,

    /// Allowlist used to build filter clauses.
    pub region: Region,

    /// Seed for keyword and site sampling. `None` seeds from entropy.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            max_search_count: 20,
            min_source_count: 25,
            keyword_query_percentage: 0.8,
            max_sites_in_query: 5,
            region: Region::Global,
            seed: None,
        }
    }
}

impl DiscoveryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_search_count(mut self, count: usize) -> Self {
        self.max_search_count = count;
        self
    }

    pub fn with_min_source_count(mut self, count: usize) -> Self {
        self.min_source_count = count;
        self
    }

    pub fn with_keyword_query_percentage(mut self, percentage: f64) -> Self {
        self.keyword_query_percentage = percentage;
        self
    }

    pub fn with_max_sites_in_query(mut self, sites: usize) -> Self {
        self.max_sites_in_query = sites;
        self
    }

    pub fn with_region(mut self, region: Region) -> Self {
        self.region = region;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// The sampling fraction after range correction.
    pub fn effective_keyword_percentage(&self) -> f64 {
        let p = self.keyword_query_percentage;
        if (0.2..=1.0).contains(&p) {
            p
        } else {
            0.5
        }
    }
}

/// Configuration for concurrent content extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Number of concurrent fetches.
    ///
    /// Default: 8.
    pub concurrency: usize,

    /// Timeout applied to each fetch individually.
    ///
    /// Default: 10 seconds.
    #[serde(with = "duration_secs")]
    pub fetch_timeout: Duration,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            concurrency: 8,
            fetch_timeout: Duration::from_secs(10),
        }
    }
}

impl ExtractorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }
}

/// Configuration for similarity fusion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Logistic midpoint.
    ///
    /// Default: 0.62.
    pub midpoint: f64,

    /// Logistic steepness.
    ///
    /// Default: 10.
    pub steepness: f64,

    /// Embed articles concurrently instead of one after another.
    ///
    /// Default: true.
    pub parallel_articles: bool,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            midpoint: 0.62,
            steepness: 10.0,
            parallel_articles: true,
        }
    }
}

impl ScoringConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sequential(mut self) -> Self {
        self.parallel_articles = false;
        self
    }
}

/// Configuration for a full verification run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VerificationConfig {
    pub keywords: KeywordConfig,
    pub discovery: DiscoveryConfig,
    pub extractor: ExtractorConfig,
    pub scoring: ScoringConfig,
}

impl VerificationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_keywords(mut self, keywords: KeywordConfig) -> Self {
        self.keywords = keywords;
        self
    }

    pub fn with_discovery(mut self, discovery: DiscoveryConfig) -> Self {
        self.discovery = discovery;
        self
    }

    pub fn with_extractor(mut self, extractor: ExtractorConfig) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_scoring(mut self, scoring: ScoringConfig) -> Self {
        self.scoring = scoring;
        self
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}
