//! Append-only store for scored claims.
//!
//! Scoring writes one record per scored run. Writes are best-effort: the
//! scorer logs a failed write and still returns its report.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::report::ScoredClaimRecord;

/// Insert-only persistence for scored claims.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ScoreStore: Send + Sync {
    /// Append a record.
    async fn record(&self, record: &ScoredClaimRecord) -> Result<()>;
}

#[async_trait]
impl<S: ScoreStore + ?Sized> ScoreStore for std::sync::Arc<S> {
    async fn record(&self, record: &ScoredClaimRecord) -> Result<()> {
        (**self).record(record).await
    }
}
