//! Web searcher trait for source discovery.
//!
//! Discovery issues one query per iteration and only needs `{title, url}`
//! pairs back. This trait abstracts over providers (Google Custom Search,
//! Tavily, etc.) so the loop never sees provider specifics.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One hit returned by a search provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Title of the page, when the provider supplies one.
    pub title: Option<String>,

    /// Result URL as returned by the provider.
    pub url: String,
}

impl SearchHit {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            title: None,
            url: url.into(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// Web search trait for open-world discovery.
///
/// # Implementations
///
/// - `GoogleCustomSearcher` - Google Custom Search JSON API
/// - `TavilySearcher` - Tavily API
/// - `MockWebSearcher` - For testing
#[async_trait]
pub trait WebSearcher: Send + Sync {
    /// Search the web for pages matching the query.
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>>;

    /// Provider name (for logging).
    fn name(&self) -> &str {
        "unknown"
    }
}

#[async_trait]
impl<S: WebSearcher + ?Sized> WebSearcher for std::sync::Arc<S> {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>> {
        (**self).search(query).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
