//! Iterative credible-source discovery.
//!
//! Each iteration samples the keyword set into a base query, restricts it to
//! a random handful of allowlisted sites, and keeps only hits that pass the
//! credibility filter. The loop stops once enough unique sources have been
//! accepted or the iteration budget is spent.

use std::collections::HashSet;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::credibility::DomainAllowlist;
use crate::error::{Result, VerificationError};
use crate::traits::{
    pacer::Pacer,
    searcher::{SearchHit, WebSearcher},
};
use crate::types::{
    claim::KeywordSet,
    config::DiscoveryConfig,
    contracts::{DiscoveryRequest, DiscoveryResponse},
    source::{domain_of, SourceCandidate, UNTITLED_SOURCE},
};

/// What a discovery run produced.
#[derive(Debug, Clone, Default)]
pub struct DiscoveryReport {
    /// Accepted sources, in acceptance order.
    pub sources: Vec<SourceCandidate>,

    /// Search iterations performed (including failed ones).
    pub iterations: usize,

    /// Iterations whose search call failed.
    pub search_failures: usize,
}

/// Runs the search/filter/dedup loop against a [`WebSearcher`].
pub struct SourceDiscoveryLoop {
    allowlist: Arc<DomainAllowlist>,
    searcher: Arc<dyn WebSearcher>,
    pacer: Arc<dyn Pacer>,
}

impl SourceDiscoveryLoop {
    pub fn new(
        allowlist: Arc<DomainAllowlist>,
        searcher: Arc<dyn WebSearcher>,
        pacer: Arc<dyn Pacer>,
    ) -> Self {
        Self {
            allowlist,
            searcher,
            pacer,
        }
    }

    /// Handle a stage request.
    pub async fn handle(
        &self,
        request: DiscoveryRequest,
        cancel: &CancellationToken,
    ) -> Result<DiscoveryResponse> {
        let original_query = request.original_query.clone();
        let (keywords, config) = request.into_parts()?;
        let report = self
            .discover(&keywords, &original_query, &config, cancel)
            .await?;
        Ok(DiscoveryResponse {
            results: report.sources,
        })
    }

    /// Discover credible sources for a keyword set.
    pub async fn discover(
        &self,
        keywords: &KeywordSet,
        original_query: &str,
        config: &DiscoveryConfig,
        cancel: &CancellationToken,
    ) -> Result<DiscoveryReport> {
        if keywords.is_empty() {
            return Err(VerificationError::invalid("No keywords provided"));
        }

        let keywords = keywords.to_vec();
        let domains = self.allowlist.filter_domains(config.region);
        let percentage = config.effective_keyword_percentage();
        let mut rng = match config.seed {
            Some(seed) => fastrand::Rng::with_seed(seed),
            None => fastrand::Rng::new(),
        };

        info!(
            searcher = self.searcher.name(),
            keywords = keywords.len(),
            original_query = %original_query,
            max_search_count = config.max_search_count,
            min_source_count = config.min_source_count,
            region = ?config.region,
            "Starting source discovery"
        );

        let mut report = DiscoveryReport::default();
        let mut seen: HashSet<String> = HashSet::new();

        while report.sources.len() < config.min_source_count
            && report.iterations < config.max_search_count
        {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(VerificationError::Cancelled),
                _ = self.pacer.pause() => {}
            }

            report.iterations += 1;

            let base = sample_keywords(&mut rng, &keywords, report.iterations, percentage);
            let clause = site_clause(&mut rng, domains, config.max_sites_in_query);
            let query = build_query(&base, &clause);
            debug!(iteration = report.iterations, query = %query, "Searching");

            let hits = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(VerificationError::Cancelled),
                result = self.searcher.search(&query) => result,
            };

            let hits = match hits {
                Ok(hits) => hits,
                Err(e) => {
                    warn!(
                        iteration = report.iterations,
                        error = %e,
                        "Search failed, skipping iteration"
                    );
                    report.search_failures += 1;
                    continue;
                }
            };

            let accepted = self.accept_hits(hits, &mut seen, &mut report.sources);
            debug!(
                iteration = report.iterations,
                accepted,
                total = report.sources.len(),
                "Search iteration complete"
            );
        }

        info!(
            sources = report.sources.len(),
            iterations = report.iterations,
            search_failures = report.search_failures,
            "Source discovery complete"
        );

        Ok(report)
    }

    /// Filter one batch of hits into `sources`. Returns how many were accepted.
    fn accept_hits(
        &self,
        hits: Vec<SearchHit>,
        seen: &mut HashSet<String>,
        sources: &mut Vec<SourceCandidate>,
    ) -> usize {
        let mut accepted = 0;
        for hit in hits {
            let key = crate::types::source::normalize_url(&hit.url);
            if seen.contains(&key) || hit.url.ends_with(".pdf") {
                continue;
            }
            seen.insert(key);

            if !self.allowlist.matches_inline_pattern(&hit.url) {
                continue;
            }
            if !self.allowlist.is_credible(&domain_of(&hit.url)) {
                debug!(url = %hit.url, "Rejected non-credible source");
                continue;
            }

            let title = hit.title.unwrap_or_else(|| UNTITLED_SOURCE.to_string());
            sources.push(SourceCandidate::credible(title, hit.url));
            accepted += 1;
        }
        accepted
    }
}

/// Build the base query for an iteration (1-based).
///
/// The first iteration uses every keyword. Later ones draw with replacement:
/// `floor(0.8 (n-1))` keywords for sets up to 10, `floor(0.7 (n-1))` up to
/// 20, and `floor(p (n-1))` beyond that with `p` uniform between
/// `percentage` and 0.8, in whichever order they fall.
pub fn sample_keywords(
    rng: &mut fastrand::Rng,
    keywords: &[String],
    iteration: usize,
    percentage: f64,
) -> String {
    if iteration <= 1 || keywords.is_empty() {
        return keywords.join(" ");
    }

    let n = keywords.len();
    let fraction = if n <= 10 {
        0.8
    } else if n <= 20 {
        0.7
    } else {
        let (low, high) = (percentage.min(0.8), percentage.max(0.8));
        low + rng.f64() * (high - low)
    };
    let k = (fraction * (n - 1) as f64) as usize;

    (0..k)
        .map(|_| keywords[rng.usize(..n)].as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Sample `count` domains with replacement into a `site:` OR clause.
pub fn site_clause(rng: &mut fastrand::Rng, domains: &[String], count: usize) -> String {
    if domains.is_empty() {
        return String::new();
    }
    (0..count)
        .map(|_| format!("site:{}", domains[rng.usize(..domains.len())]))
        .collect::<Vec<_>>()
        .join(" OR ")
}

/// Combine a base query with its site clause.
///
/// The clause appears twice inside the group; providers treat the repeat as
/// a no-op.
pub fn build_query(base: &str, clause: &str) -> String {
    format!("{base} ({clause} OR {clause})")
}
