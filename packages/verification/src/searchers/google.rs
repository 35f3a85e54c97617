//! Google Custom Search JSON API adapter.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::error::{Result, VerificationError};
use crate::security::SecretString;
use crate::traits::searcher::{SearchHit, WebSearcher};

const DEFAULT_ENDPOINT: &str = "https://www.googleapis.com/customsearch/v1";

/// Results requested per query.
const DEFAULT_NUM_RESULTS: usize = 5;

/// Title used when a Google result has none.
const UNTITLED_RESULT: &str = "No Title";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    title: Option<String>,
    #[serde(default)]
    link: String,
}

/// Searches a Programmable Search Engine.
pub struct GoogleCustomSearcher {
    client: reqwest::Client,
    api_key: SecretString,
    engine_id: String,
    endpoint: String,
    num_results: usize,
}

impl GoogleCustomSearcher {
    /// Create a searcher for the engine `engine_id` (the `cx` parameter).
    pub fn new(api_key: impl Into<String>, engine_id: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: SecretString::new(api_key),
            engine_id: engine_id.into(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            num_results: DEFAULT_NUM_RESULTS,
        }
    }

    /// Set a custom HTTP client.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Point at a different endpoint (proxies, tests).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Results per query. The API caps this at 10.
    pub fn with_num_results(mut self, num: usize) -> Self {
        self.num_results = num.clamp(1, 10);
        self
    }
}

#[async_trait]
impl WebSearcher for GoogleCustomSearcher {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>> {
        let num = self.num_results.to_string();
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("key", self.api_key.expose()),
                ("cx", self.engine_id.as_str()),
                ("q", query),
                ("num", num.as_str()),
            ])
            .send()
            .await
            .map_err(|e| VerificationError::Search(Box::new(e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(VerificationError::Search(
                format!("Google Custom Search error: {status}").into(),
            ));
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| VerificationError::Search(Box::new(e)))?;

        debug!(results = body.items.len(), "Google search returned");

        Ok(body
            .items
            .into_iter()
            .map(|item| {
                SearchHit::new(item.link)
                    .with_title(item.title.unwrap_or_else(|| UNTITLED_RESULT.to_string()))
            })
            .collect())
    }

    fn name(&self) -> &str {
        "google"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_response() {
        let body: SearchResponse = serde_json::from_str(
            r#"{"items": [{"title": "CDC", "link": "https://www.cdc.gov/"}, {"link": "https://nih.gov"}]}"#,
        )
        .unwrap();
        assert_eq!(body.items.len(), 2);
        assert!(body.items[1].title.is_none());
    }

    #[test]
    fn test_parse_response_without_items() {
        let body: SearchResponse = serde_json::from_str(r#"{"kind": "customsearch#search"}"#).unwrap();
        assert!(body.items.is_empty());
    }

    #[test]
    fn test_num_results_clamped() {
        let searcher = GoogleCustomSearcher::new("key", "cx").with_num_results(50);
        assert_eq!(searcher.num_results, 10);
    }

    #[tokio::test]
    #[ignore]
    async fn test_google_search() {
        let api_key = std::env::var("GOOGLE_API_KEY").expect("GOOGLE_API_KEY required");
        let cx = std::env::var("GOOGLE_CSE_ID").expect("GOOGLE_CSE_ID required");
        let hits = GoogleCustomSearcher::new(api_key, cx)
            .search("influenza vaccine site:cdc.gov")
            .await
            .unwrap();
        assert!(!hits.is_empty());
    }
}
