//! OpenAI chat-completions explainer.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, VerificationError};
use crate::pipeline::prompts::{format_explanation_prompt, EXPLANATION_SYSTEM_PROMPT};
use crate::security::SecretString;
use crate::traits::explainer::{ExplanationRequest, Explainer};

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// Generates explanations with an OpenAI chat model (default `gpt-4o`).
#[derive(Clone)]
pub struct OpenAIExplainer {
    client: Client,
    api_key: SecretString,
    model: String,
    base_url: String,
}

impl OpenAIExplainer {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: SecretString::new(api_key),
            model: "gpt-4o".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
        }
    }

    /// Create from environment variable `OPENAI_API_KEY`.
    pub fn from_env() -> Result<Self> {
        let api_key = SecretString::new(std::env::var("OPENAI_API_KEY").unwrap_or_default());
        if api_key.is_empty() {
            return Err(VerificationError::Config("OPENAI_API_KEY not set".into()));
        }
        Ok(Self::new(api_key.expose()))
    }

    /// Set the chat model (default: gpt-4o).
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set a custom base URL (for Azure, proxies, etc.).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_request(&self, request: &ExplanationRequest) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: EXPLANATION_SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: format_explanation_prompt(request),
                },
            ],
            temperature: request.temperature,
        }
    }
}

#[async_trait]
impl Explainer for OpenAIExplainer {
    async fn explain(&self, request: &ExplanationRequest) -> Result<String> {
        request.validate()?;

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key.expose()))
            .header("Content-Type", "application/json")
            .json(&self.build_request(request))
            .send()
            .await
            .map_err(|e| VerificationError::Explanation(Box::new(e)))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(VerificationError::Explanation(
                format!("Error generating reasoning summary: {error_text}").into(),
            ));
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| VerificationError::Explanation(Box::new(e)))?;

        let text = chat_response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content.trim().to_string())
            .ok_or_else(|| VerificationError::Explanation("No response from OpenAI".into()))?;

        debug!(model = %self.model, chars = text.len(), "Generated explanation");
        Ok(text)
    }
}
