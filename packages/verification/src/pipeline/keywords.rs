//! Keyword extraction from claim text.
//!
//! Two passes feed one candidate pool:
//!
//! 1. A permissive baseline: every whitespace-separated word of every
//!    sentence, lowercased. No stop words are removed here.
//! 2. For multi-sentence claims, a TF-IDF pass over sentences (unigrams and
//!    bigrams) contributing each sentence's top-scoring terms.
//!
//! Large pools are then pruned so no keyword survives inside a longer one
//! ("account" goes once "money account" is kept).

use indexmap::IndexMap;
use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

use crate::error::Result;
use crate::pipeline::stopwords::is_stop_word;
use crate::types::{
    claim::KeywordSet,
    config::KeywordConfig,
    contracts::{KeywordRequest, KeywordResponse},
};

fn token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\b[A-Za-z0-9]{3,}\b").expect("static token pattern"))
}

fn non_alphanumeric() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[^a-zA-Z0-9\s]").expect("static strip pattern"))
}

/// Reduces claim text to a discriminative keyword set.
#[derive(Debug, Clone, Default)]
pub struct KeywordExtractor {
    config: KeywordConfig,
}

impl KeywordExtractor {
    pub fn new(config: KeywordConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &KeywordConfig {
        &self.config
    }

    /// Handle a stage request.
    pub fn handle(&self, request: &KeywordRequest) -> Result<KeywordResponse> {
        request.validate()?;
        let extractor = Self::new(
            self.config
                .clone()
                .with_redundancy_threshold(request.redundancy_threshold),
        );
        Ok(KeywordResponse {
            keywords: extractor.extract(&request.text).to_vec(),
        })
    }

    /// Extract keywords from claim text.
    pub fn extract(&self, text: &str) -> KeywordSet {
        let sentences = split_sentences(text);
        let mut candidates: IndexMap<String, ()> = IndexMap::new();

        for sentence in &sentences {
            for word in sentence.split_whitespace() {
                candidates.insert(word.to_lowercase(), ());
            }
        }

        if sentences.len() > 1 {
            let max_df = dynamic_max_df(sentences.len());
            match TfIdf::fit(&sentences, max_df, self.config.max_features) {
                Some(model) => {
                    for row in 0..sentences.len() {
                        for term in model.top_terms(row, self.config.terms_per_sentence) {
                            candidates.insert(term.to_string(), ());
                        }
                    }
                }
                None => debug!(
                    sentences = sentences.len(),
                    "TF-IDF vocabulary empty, keeping baseline keywords only"
                ),
            }
        }

        let candidates: Vec<String> = candidates.into_keys().collect();
        let candidate_count = candidates.len();
        let keywords = remove_redundant_keywords(candidates, self.config.redundancy_threshold);

        debug!(
            sentences = sentences.len(),
            candidates = candidate_count,
            keywords = keywords.len(),
            "Extracted keywords"
        );

        keywords.into_iter().collect()
    }
}

/// Split on sentence terminators. Empty fragments count as sentences.
pub fn split_sentences(text: &str) -> Vec<&str> {
    text.split(['.', '!', '?']).collect()
}

/// Document-frequency ceiling for a corpus of `sentence_count` sentences.
pub fn dynamic_max_df(sentence_count: usize) -> f64 {
    const BASE: f64 = 0.85;
    const MIN: f64 = 0.5;

    if sentence_count <= 5 {
        1.0
    } else if sentence_count <= 10 {
        0.95
    } else {
        MIN.max(BASE - sentence_count as f64 * 0.01)
    }
}

/// Drop keywords contained in a longer kept keyword.
///
/// Only applies when there are more than `threshold` keywords. Terms are
/// stripped of punctuation first; length ties are ordered alphabetically so
/// the result is deterministic.
pub fn remove_redundant_keywords(keywords: Vec<String>, threshold: usize) -> Vec<String> {
    if keywords.len() <= threshold {
        return keywords;
    }

    let mut stripped: Vec<String> = keywords
        .iter()
        .map(|kw| non_alphanumeric().replace_all(kw, "").trim().to_string())
        .collect();
    stripped.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

    let mut unique: Vec<String> = Vec::new();
    for keyword in stripped {
        if !unique.iter().any(|longer| longer.contains(keyword.as_str())) {
            unique.push(keyword);
        }
    }
    unique
}

/// Sentence-level TF-IDF model over unigrams and bigrams.
struct TfIdf {
    /// Retained features in alphabetical order.
    features: Vec<String>,

    /// One L2-normalized weight row per sentence.
    rows: Vec<Vec<f64>>,
}

impl TfIdf {
    /// Fit on sentences. Returns `None` when no feature survives filtering.
    fn fit(sentences: &[&str], max_df: f64, max_features: usize) -> Option<Self> {
        let documents: Vec<Vec<String>> = sentences.iter().map(|s| analyze(s)).collect();
        let n_docs = documents.len();

        let mut doc_freq: IndexMap<&str, usize> = IndexMap::new();
        let mut term_freq: IndexMap<&str, usize> = IndexMap::new();
        for doc in &documents {
            let mut seen: Vec<&str> = Vec::new();
            for term in doc {
                *term_freq.entry(term.as_str()).or_default() += 1;
                if !seen.contains(&term.as_str()) {
                    seen.push(term.as_str());
                    *doc_freq.entry(term.as_str()).or_default() += 1;
                }
            }
        }

        let max_doc_count = max_df * n_docs as f64;
        let mut kept: Vec<&str> = doc_freq
            .iter()
            .filter(|(_, df)| **df as f64 <= max_doc_count)
            .map(|(term, _)| *term)
            .collect();

        if kept.len() > max_features {
            kept.sort_by(|a, b| term_freq[b].cmp(&term_freq[a]).then_with(|| a.cmp(b)));
            kept.truncate(max_features);
        }
        if kept.is_empty() {
            return None;
        }
        kept.sort_unstable();

        let idf: Vec<f64> = kept
            .iter()
            .map(|term| ((1 + n_docs) as f64 / (1 + doc_freq[term]) as f64).ln() + 1.0)
            .collect();

        let rows = documents
            .iter()
            .map(|doc| {
                let mut row: Vec<f64> = kept
                    .iter()
                    .zip(&idf)
                    .map(|(term, idf)| doc.iter().filter(|t| t == term).count() as f64 * idf)
                    .collect();
                let norm = row.iter().map(|w| w * w).sum::<f64>().sqrt();
                if norm > 0.0 {
                    row.iter_mut().for_each(|w| *w /= norm);
                }
                row
            })
            .collect();

        Some(Self {
            features: kept.into_iter().map(str::to_string).collect(),
            rows,
        })
    }

    /// Highest-weighted `k` features of a row.
    ///
    /// Ranks like a stable ascending argsort read from the end: equal weights
    /// resolve to the alphabetically later feature first, and zero-weight
    /// features fill in when a row has fewer than `k` non-zero weights.
    fn top_terms(&self, row: usize, k: usize) -> Vec<&str> {
        let weights = &self.rows[row];
        let mut order: Vec<usize> = (0..weights.len()).collect();
        order.sort_by(|a, b| weights[*a].total_cmp(&weights[*b]));
        order
            .into_iter()
            .rev()
            .take(k)
            .map(|i| self.features[i].as_str())
            .collect()
    }
}

/// Lowercase, tokenize, drop stop words, emit unigrams then bigrams.
fn analyze(sentence: &str) -> Vec<String> {
    let lowered = sentence.to_lowercase();
    let tokens: Vec<&str> = token_pattern()
        .find_iter(&lowered)
        .map(|m| m.as_str())
        .filter(|t| !is_stop_word(t))
        .collect();

    let mut terms: Vec<String> = tokens.iter().map(|t| t.to_string()).collect();
    terms.extend(tokens.windows(2).map(|pair| format!("{} {}", pair[0], pair[1])));
    terms
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_split_sentences_keeps_trailing_fragment() {
        assert_eq!(split_sentences("One. Two!"), vec!["One", " Two", ""]);
        assert_eq!(split_sentences("No terminator"), vec!["No terminator"]);
    }

    #[test]
    fn test_dynamic_max_df() {
        assert_eq!(dynamic_max_df(3), 1.0);
        assert_eq!(dynamic_max_df(5), 1.0);
        assert_eq!(dynamic_max_df(8), 0.95);
        assert!((dynamic_max_df(20) - 0.65).abs() < 1e-9);
        assert_eq!(dynamic_max_df(100), 0.5);
    }

    #[test]
    fn test_single_sentence_is_baseline_only() {
        let extractor = KeywordExtractor::default();
        let keywords = extractor.extract("COVID vaccines are SAFE");

        let expected: KeywordSet = ["covid", "vaccines", "are", "safe"].into_iter().collect();
        assert_eq!(keywords, expected);
    }

    #[test]
    fn test_multi_sentence_adds_bigrams() {
        let extractor = KeywordExtractor::default();
        let keywords = extractor.extract("Bank raises interest rates. Savers welcome higher rates.");

        assert!(keywords.contains("bank"));
        assert!(keywords.iter().any(|k| k.contains(' ')), "expected a bigram in {keywords:?}");
    }

    #[test]
    fn test_redundancy_pruning_removes_contained_terms() {
        let keywords = vec![
            "money account".to_string(),
            "account".to_string(),
            "money".to_string(),
            "bank".to_string(),
        ];
        let pruned = remove_redundant_keywords(keywords, 2);
        assert_eq!(pruned, vec!["money account".to_string(), "bank".to_string()]);
    }

    #[test]
    fn test_no_pruning_at_or_below_threshold() {
        let keywords = vec!["account".to_string(), "money account".to_string()];
        assert_eq!(remove_redundant_keywords(keywords.clone(), 2), keywords);
    }

    #[test]
    fn test_pruning_strips_punctuation() {
        let keywords = vec!["claim,".to_string(), "claims".to_string(), "x".to_string()];
        let pruned = remove_redundant_keywords(keywords, 1);
        assert_eq!(pruned, vec!["claims".to_string(), "x".to_string()]);
    }

    #[test]
    fn test_tfidf_top_terms_prefers_distinctive_words() {
        let sentences = ["vaccine vaccine trial", "vaccine rollout", "trial results"];
        let model = TfIdf::fit(&sentences, 1.0, 30).unwrap();
        let top = model.top_terms(0, 1);
        assert_eq!(top, vec!["vaccine"]);
    }

    #[test]
    fn test_tfidf_empty_vocabulary() {
        assert!(TfIdf::fit(&["a b", "of it"], 1.0, 30).is_none());
    }

    #[test]
    fn test_handle_uses_request_threshold() {
        let extractor = KeywordExtractor::default();
        let request = KeywordRequest {
            text: "money account. account money. bank account".to_string(),
            redundancy_threshold: 0,
        };
        let response = extractor.handle(&request).unwrap();
        let set: KeywordSet = response.keywords.into_iter().collect();
        assert!(set.is_pruned());
    }

    #[test]
    fn test_handle_rejects_blank_text() {
        let request = KeywordRequest {
            text: " ".to_string(),
            redundancy_threshold: 15,
        };
        assert!(KeywordExtractor::default().handle(&request).is_err());
    }

    proptest! {
        #[test]
        fn prop_pruned_keywords_never_nest(text in "[a-z ,.!?]{0,200}") {
            let extractor = KeywordExtractor::new(KeywordConfig::new().with_redundancy_threshold(0));
            let keywords = extractor.extract(&text);
            prop_assert!(keywords.is_pruned());
        }
    }
}
