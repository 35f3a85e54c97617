//! Testing utilities including mock implementations.
//!
//! These let applications exercise the verification pipeline without
//! network calls or model servers.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use crate::error::{FetchError, FetchResult, Result, VerificationError};
use crate::traits::{
    embedder::{ModelEnsemble, SentimentClassifier, TextEmbedder},
    fetcher::{ContentFetcher, FetchedDocument},
    pacer::Pacer,
    searcher::{SearchHit, WebSearcher},
};

/// A mock web searcher with scripted results.
///
/// Lookup order per call: failure mode, exact-query results, the next
/// scripted batch, then the default hits.
#[derive(Default)]
pub struct MockWebSearcher {
    /// Results for exact queries
    by_query: RwLock<HashMap<String, Vec<SearchHit>>>,

    /// Batches returned one per call, in order
    sequence: Mutex<VecDeque<Vec<SearchHit>>>,

    /// Returned when nothing else applies
    default_hits: Vec<SearchHit>,

    /// Fail every call
    fail: bool,

    /// Queries received, for assertions
    queries: RwLock<Vec<String>>,
}

impl MockWebSearcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Results for an exact query string.
    pub fn with_results(self, query: impl Into<String>, hits: Vec<SearchHit>) -> Self {
        if let Ok(mut by_query) = self.by_query.write() {
            by_query.insert(query.into(), hits);
        }
        self
    }

    /// Batches handed out one per call.
    pub fn with_sequence(self, batches: Vec<Vec<SearchHit>>) -> Self {
        if let Ok(mut sequence) = self.sequence.lock() {
            sequence.extend(batches);
        }
        self
    }

    /// Hits returned for any otherwise unscripted call.
    pub fn with_default_hits(mut self, hits: Vec<SearchHit>) -> Self {
        self.default_hits = hits;
        self
    }

    /// Make every call fail.
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    /// Queries received so far.
    pub fn queries(&self) -> Vec<String> {
        self.queries.read().map(|q| q.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl WebSearcher for MockWebSearcher {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>> {
        if let Ok(mut queries) = self.queries.write() {
            queries.push(query.to_string());
        }

        if self.fail {
            return Err(VerificationError::Search("mock search failure".into()));
        }

        if let Some(hits) = self.by_query.read().ok().and_then(|m| m.get(query).cloned()) {
            return Ok(hits);
        }

        if let Some(batch) = self.sequence.lock().ok().and_then(|mut s| s.pop_front()) {
            return Ok(batch);
        }

        Ok(self.default_hits.clone())
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// A mock fetcher serving canned documents.
///
/// Unknown URLs answer with HTTP 404.
#[derive(Default)]
pub struct MockFetcher {
    documents: HashMap<String, FetchedDocument>,
    failures: HashSet<String>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve HTML for a URL.
    pub fn with_html(self, url: impl Into<String>, html: impl Into<String>) -> Self {
        let url = url.into();
        let document = FetchedDocument::html(url.clone(), html);
        self.with_document(document)
    }

    /// Serve an arbitrary document at its URL.
    pub fn with_document(mut self, document: FetchedDocument) -> Self {
        self.documents.insert(document.url.clone(), document);
        self
    }

    /// Fail a URL with a connection error.
    pub fn with_failure(mut self, url: impl Into<String>) -> Self {
        self.failures.insert(url.into());
        self
    }

    /// Delay every fetch (uses tokio's clock).
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of fetches performed.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentFetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> FetchResult<FetchedDocument> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.failures.contains(url) {
            return Err(FetchError::Http(
                format!("connection refused: {url}").into(),
            ));
        }

        self.documents
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::Status {
                status: 404,
                url: url.to_string(),
            })
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// A deterministic embedder.
///
/// Vectors are derived from a SHA-256 of the text, so equal texts embed
/// identically and the same text always gets the same vector.
#[derive(Clone)]
pub struct MockEmbedder {
    name: String,
    dimensions: usize,
    overrides: HashMap<String, Vec<f32>>,
    failures: HashSet<String>,
}

impl MockEmbedder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dimensions: 64,
            overrides: HashMap::new(),
            failures: HashSet::new(),
        }
    }

    /// Set the embedding dimension.
    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = dimensions;
        self
    }

    /// Fixed vector for a text.
    pub fn with_embedding(mut self, text: impl Into<String>, embedding: Vec<f32>) -> Self {
        self.overrides.insert(text.into(), embedding);
        self
    }

    /// Fail when embedding this text.
    pub fn with_failure(mut self, text: impl Into<String>) -> Self {
        self.failures.insert(text.into());
        self
    }

    fn renamed(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    fn hashed_embedding(&self, text: &str) -> Vec<f32> {
        use sha2::{Digest, Sha256};

        let mut hasher = Sha256::new();
        hasher.update(text.as_bytes());
        let hash = hasher.finalize();

        (0..self.dimensions)
            .map(|i| {
                let byte = hash[i % 32] as f32;
                // Normalize to [-1, 1] range
                (byte / 127.5) - 1.0
            })
            .collect()
    }
}

#[async_trait]
impl TextEmbedder for MockEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if self.failures.contains(text) {
            return Err(VerificationError::Embedding(format!(
                "{}: mock embedding failure",
                self.name
            )));
        }
        Ok(self
            .overrides
            .get(text)
            .cloned()
            .unwrap_or_else(|| self.hashed_embedding(text)))
    }

    fn model_name(&self) -> &str {
        &self.name
    }
}

/// A sentiment classifier returning fixed probabilities.
#[derive(Debug, Clone)]
pub struct MockSentiment {
    probabilities: Vec<f32>,
}

impl Default for MockSentiment {
    fn default() -> Self {
        Self {
            probabilities: vec![0.1, 0.3, 0.6],
        }
    }
}

impl MockSentiment {
    pub fn new(probabilities: Vec<f32>) -> Self {
        Self { probabilities }
    }
}

#[async_trait]
impl SentimentClassifier for MockSentiment {
    async fn probabilities(&self, _text: &str) -> Result<Vec<f32>> {
        Ok(self.probabilities.clone())
    }
}

/// Four copies of `embedder` (named `{name}-0` .. `{name}-3`) plus a
/// default [`MockSentiment`].
pub fn ensemble_of(embedder: MockEmbedder) -> ModelEnsemble {
    let base = embedder.name.clone();
    let model = |i: usize| -> Arc<dyn TextEmbedder> {
        Arc::new(embedder.clone().renamed(format!("{base}-{i}")))
    };
    ModelEnsemble::new(
        [model(0), model(1), model(2), model(3)],
        Arc::new(MockSentiment::default()),
    )
}

/// Ensemble of default hashed embedders.
pub fn mock_ensemble() -> ModelEnsemble {
    ensemble_of(MockEmbedder::new("mock"))
}

/// A pacer that never waits and counts its calls.
#[derive(Debug, Default)]
pub struct RecordingPacer {
    pauses: AtomicUsize,
}

impl RecordingPacer {
    pub fn pauses(&self) -> usize {
        self.pauses.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Pacer for RecordingPacer {
    async fn pause(&self) {
        self.pauses.fetch_add(1, Ordering::SeqCst);
    }
}
