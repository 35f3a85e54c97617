//! Explanation generators.

pub mod openai;

pub use openai::OpenAIExplainer;
