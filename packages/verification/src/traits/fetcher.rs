//! Content fetcher trait.
//!
//! A fetcher retrieves raw bytes plus the declared content type. Parsing is
//! the extractor's job, so fetchers stay transport-only and easy to mock.

use async_trait::async_trait;

use crate::error::FetchResult;

/// Raw response for one URL.
#[derive(Debug, Clone)]
pub struct FetchedDocument {
    /// URL that was requested.
    pub url: String,

    /// `Content-Type` header value (empty when absent).
    pub content_type: String,

    /// Response body.
    pub body: Vec<u8>,
}

impl FetchedDocument {
    pub fn new(url: impl Into<String>, content_type: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            url: url.into(),
            content_type: content_type.into(),
            body: body.into(),
        }
    }

    /// Convenience constructor for HTML bodies.
    pub fn html(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self::new(url, "text/html; charset=utf-8", html.into().into_bytes())
    }

    /// Body as text, replacing invalid UTF-8.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Fetches a single URL.
///
/// Implementations must not retry internally; timeouts are applied by the
/// extractor per call.
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> FetchResult<FetchedDocument>;

    /// Fetcher name (for logging).
    fn name(&self) -> &str {
        "unknown"
    }
}

#[async_trait]
impl<F: ContentFetcher + ?Sized> ContentFetcher for std::sync::Arc<F> {
    async fn fetch(&self, url: &str) -> FetchResult<FetchedDocument> {
        (**self).fetch(url).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
