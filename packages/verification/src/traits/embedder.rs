//! Embedding and sentiment model traits.
//!
//! Models are consumed as black boxes. Scoring needs exactly four distinct
//! sentence-embedding models plus one sentiment classifier, bundled here as a
//! [`ModelEnsemble`] that is constructed once and passed in explicitly.

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::Result;

/// A sentence-embedding model.
#[async_trait]
pub trait TextEmbedder: Send + Sync {
    /// Embed a text into a dense vector.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Model identifier (for logging).
    fn model_name(&self) -> &str;
}

/// A sentiment classifier returning a probability distribution.
#[async_trait]
pub trait SentimentClassifier: Send + Sync {
    /// Class probabilities, e.g. `[negative, neutral, positive]`.
    async fn probabilities(&self, text: &str) -> Result<Vec<f32>>;
}

/// Number of embedding models fused per article.
pub const ENSEMBLE_SIZE: usize = 4;

/// The four embedding models and the sentiment classifier used for scoring.
#[derive(Clone)]
pub struct ModelEnsemble {
    embedders: [Arc<dyn TextEmbedder>; ENSEMBLE_SIZE],
    sentiment: Arc<dyn SentimentClassifier>,
}

impl ModelEnsemble {
    pub fn new(
        embedders: [Arc<dyn TextEmbedder>; ENSEMBLE_SIZE],
        sentiment: Arc<dyn SentimentClassifier>,
    ) -> Self {
        Self {
            embedders,
            sentiment,
        }
    }

    pub fn embedders(&self) -> &[Arc<dyn TextEmbedder>; ENSEMBLE_SIZE] {
        &self.embedders
    }

    pub fn sentiment(&self) -> &dyn SentimentClassifier {
        self.sentiment.as_ref()
    }

    /// Embed a text with every model, in model order.
    pub async fn embed_all(&self, text: &str) -> Result<[Vec<f32>; ENSEMBLE_SIZE]> {
        let [a, b, c, d] = &self.embedders;
        let (a, b, c, d) = futures::try_join!(a.embed(text), b.embed(text), c.embed(text), d.embed(text))?;
        Ok([a, b, c, d])
    }

    /// Model names, in model order.
    pub fn model_names(&self) -> Vec<String> {
        self.embedders
            .iter()
            .map(|e| e.model_name().to_string())
            .collect()
    }
}

impl std::fmt::Debug for ModelEnsemble {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelEnsemble")
            .field("embedders", &self.model_names())
            .finish_non_exhaustive()
    }
}

/// Cosine similarity between two vectors.
///
/// Mismatched lengths, empty input, or a zero vector yield 0.0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f64 = a.iter().zip(b).map(|(x, y)| *x as f64 * *y as f64).sum();
    let norm_a: f64 = a.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_identical() {
        let v = vec![1.0, 2.0, 3.0];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_cosine_orthogonal() {
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-12);
    }

    #[test]
    fn test_cosine_opposite() {
        assert!((cosine_similarity(&[1.0, 1.0], &[-1.0, -1.0]) + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_cosine_degenerate_inputs() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
    }
}
