//! Adapters for text-embeddings-inference (TEI) servers.
//!
//! Each sentence-embedding model runs behind its own TEI instance (`/embed`);
//! the sentiment classifier is a sequence-classification model served on
//! `/predict`.
//!
//! # Example
//!
//! ```rust,ignore
//! let embedder = TeiEmbedder::new("http://localhost:8081", "all-MiniLM-L12-v2");
//! let vector = embedder.embed("COVID-19 vaccines are effective").await?;
//! ```

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{Result, VerificationError};
use crate::traits::embedder::{SentimentClassifier, TextEmbedder};

#[derive(Debug, Serialize)]
struct InputsRequest<'a> {
    inputs: &'a str,
    truncate: bool,
}

#[derive(Debug, Deserialize)]
struct LabelScore {
    label: String,
    score: f32,
}

fn trim_base_url(url: impl Into<String>) -> String {
    url.into().trim_end_matches('/').to_string()
}

/// Sentence embedder served by TEI.
#[derive(Clone)]
pub struct TeiEmbedder {
    client: Client,
    base_url: String,
    model: String,
}

impl TeiEmbedder {
    /// `model` is only used for logging; the server decides what it runs.
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: trim_base_url(base_url),
            model: model.into(),
        }
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }
}

#[async_trait]
impl TextEmbedder for TeiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let response = self
            .client
            .post(format!("{}/embed", self.base_url))
            .json(&InputsRequest {
                inputs: text,
                truncate: true,
            })
            .send()
            .await
            .map_err(|e| VerificationError::Embedding(format!("{}: {e}", self.model)))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(VerificationError::Embedding(format!(
                "{} embed error: {error_text}",
                self.model
            )));
        }

        let mut vectors: Vec<Vec<f32>> = response
            .json()
            .await
            .map_err(|e| VerificationError::Embedding(format!("{}: {e}", self.model)))?;

        vectors
            .pop()
            .ok_or_else(|| VerificationError::Embedding(format!("{} returned no embedding", self.model)))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Sentiment classifier served by TEI.
///
/// Probabilities are returned in label order (`LABEL_0`, `LABEL_1`, ...), so
/// a three-class model yields `[negative, neutral, positive]`.
#[derive(Clone)]
pub struct TeiSentimentClassifier {
    client: Client,
    base_url: String,
}

impl TeiSentimentClassifier {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: trim_base_url(base_url),
        }
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }
}

/// Order label scores by label name and keep the scores.
fn ordered_probabilities(mut scores: Vec<LabelScore>) -> Vec<f32> {
    scores.sort_by(|a, b| a.label.cmp(&b.label));
    scores.into_iter().map(|s| s.score).collect()
}

#[async_trait]
impl SentimentClassifier for TeiSentimentClassifier {
    async fn probabilities(&self, text: &str) -> Result<Vec<f32>> {
        let response = self
            .client
            .post(format!("{}/predict", self.base_url))
            .json(&InputsRequest {
                inputs: text,
                truncate: true,
            })
            .send()
            .await
            .map_err(|e| VerificationError::Embedding(format!("sentiment: {e}")))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(VerificationError::Embedding(format!(
                "sentiment predict error: {error_text}"
            )));
        }

        let scores: Vec<LabelScore> = response
            .json()
            .await
            .map_err(|e| VerificationError::Embedding(format!("sentiment: {e}")))?;

        Ok(ordered_probabilities(scores))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trimmed() {
        let embedder = TeiEmbedder::new("http://localhost:8080/", "m");
        assert_eq!(embedder.base_url, "http://localhost:8080");
        assert_eq!(embedder.model_name(), "m");
    }

    #[test]
    fn test_probabilities_in_label_order() {
        let scores: Vec<LabelScore> = serde_json::from_str(
            r#"[{"label": "LABEL_2", "score": 0.7}, {"label": "LABEL_0", "score": 0.1}, {"label": "LABEL_1", "score": 0.2}]"#,
        )
        .unwrap();
        assert_eq!(ordered_probabilities(scores), vec![0.1, 0.2, 0.7]);
    }
}
