//! Tavily search adapter.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{Result, VerificationError};
use crate::security::SecretString;
use crate::traits::searcher::{SearchHit, WebSearcher};

#[derive(Debug, Serialize)]
struct TavilyRequest<'a> {
    query: &'a str,
    search_depth: &'a str,
    max_results: usize,
}

#[derive(Debug, Deserialize)]
struct TavilyResponse {
    results: Vec<TavilyResult>,
}

#[derive(Debug, Deserialize)]
struct TavilyResult {
    url: String,
    title: Option<String>,
}

/// Tavily-backed web searcher.
pub struct TavilySearcher {
    client: reqwest::Client,
    api_key: SecretString,
    search_depth: String,
    max_results: usize,
}

impl TavilySearcher {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: SecretString::new(api_key),
            search_depth: "basic".to_string(),
            max_results: 5,
        }
    }

    /// Set search depth ("basic" or "advanced").
    pub fn with_search_depth(mut self, depth: impl Into<String>) -> Self {
        self.search_depth = depth.into();
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }
}

#[async_trait]
impl WebSearcher for TavilySearcher {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>> {
        let request = TavilyRequest {
            query,
            search_depth: &self.search_depth,
            max_results: self.max_results,
        };

        let response = self
            .client
            .post("https://api.tavily.com/search")
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", self.api_key.expose()))
            .json(&request)
            .send()
            .await
            .map_err(|e| VerificationError::Search(Box::new(e)))?;

        if !response.status().is_success() {
            return Err(VerificationError::Search(
                format!("Tavily API error: {}", response.status()).into(),
            ));
        }

        let body: TavilyResponse = response
            .json()
            .await
            .map_err(|e| VerificationError::Search(Box::new(e)))?;

        Ok(body
            .results
            .into_iter()
            .map(|r| SearchHit {
                title: r.title,
                url: r.url,
            })
            .collect())
    }

    fn name(&self) -> &str {
        "tavily"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shape() {
        let request = TavilyRequest {
            query: "flu vaccine",
            search_depth: "basic",
            max_results: 5,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["query"], "flu vaccine");
        assert_eq!(json["max_results"], 5);
    }

    #[tokio::test]
    #[ignore]
    async fn test_tavily_search() {
        let api_key = std::env::var("TAVILY_API_KEY").expect("TAVILY_API_KEY required");
        let hits = TavilySearcher::new(api_key).search("influenza vaccine").await.unwrap();
        assert!(!hits.is_empty());
    }
}
