//! Embedding and sentiment model adapters.

pub mod tei;

pub use tei::{TeiEmbedder, TeiSentimentClassifier};
