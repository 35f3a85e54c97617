//! Typed errors for the verification library.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling.

use thiserror::Error;

/// Errors that can fail a verification stage.
///
/// Per-URL fetch problems are deliberately absent here: they are captured
/// as [`FetchError`] and folded into the article body instead.
#[derive(Debug, Error)]
pub enum VerificationError {
    /// A request was missing required fields or carried unusable values
    #[error("invalid request: {reason}")]
    InvalidRequest { reason: String },

    /// Search provider call failed
    #[error("search error: {0}")]
    Search(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Embedding or sentiment model failed
    #[error("embedding error: {0}")]
    Embedding(String),

    /// Score store operation failed
    #[error("storage error: {0}")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Explanation generator failed
    #[error("explanation error: {0}")]
    Explanation(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Configuration or bundled asset could not be loaded
    #[error("config error: {0}")]
    Config(String),

    /// JSON parsing error
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Operation was cancelled
    #[error("operation cancelled")]
    Cancelled,
}

impl VerificationError {
    /// Shorthand for an [`VerificationError::InvalidRequest`].
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidRequest {
            reason: reason.into(),
        }
    }
}

/// Errors that can occur while fetching or decoding a single source.
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Server answered with a non-success status
    #[error("HTTP status {status} for {url}")]
    Status { status: u16, url: String },

    /// Fetch exceeded its own timeout
    #[error("timeout fetching: {url}")]
    Timeout { url: String },

    /// Invalid URL format
    #[error("invalid URL: {url}")]
    InvalidUrl { url: String },

    /// Body could not be decoded as text
    #[error("decode error: {0}")]
    Decode(String),

    /// PDF text extraction failed
    #[error("PDF error: {0}")]
    Pdf(String),
}

impl FetchError {
    /// Whether the failure happened before a response body was obtained.
    pub fn is_retrieval(&self) -> bool {
        matches!(
            self,
            Self::Http(_) | Self::Status { .. } | Self::Timeout { .. } | Self::InvalidUrl { .. }
        )
    }
}

/// Result type alias for verification operations.
pub type Result<T> = std::result::Result<T, VerificationError>;

/// Result type alias for fetch operations.
pub type FetchResult<T> = std::result::Result<T, FetchError>;
