//! Natural-language explanation of a verdict.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{Result, VerificationError};

fn default_temperature() -> f32 {
    0.7
}

/// Inputs for explaining how sources relate to a claim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplanationRequest {
    pub claim: String,
    pub supporting_texts: Vec<String>,
    pub max_score: f64,
    pub min_score: f64,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl ExplanationRequest {
    pub fn new(
        claim: impl Into<String>,
        supporting_texts: Vec<String>,
        max_score: f64,
        min_score: f64,
    ) -> Self {
        Self {
            claim: claim.into(),
            supporting_texts,
            max_score,
            min_score,
            temperature: default_temperature(),
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.claim.trim().is_empty() || self.supporting_texts.is_empty() {
            return Err(VerificationError::invalid("Missing required parameters"));
        }
        Ok(())
    }
}

/// Produces prose explaining a verdict.
#[async_trait]
pub trait Explainer: Send + Sync {
    async fn explain(&self, request: &ExplanationRequest) -> Result<String>;
}
