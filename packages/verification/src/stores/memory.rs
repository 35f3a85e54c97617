//! In-memory score store for testing and development.

use async_trait::async_trait;
use std::sync::RwLock;

use crate::error::Result;
use crate::traits::store::ScoreStore;
use crate::types::report::ScoredClaimRecord;

/// Keeps scored claims in memory. Data is lost on drop.
#[derive(Default)]
pub struct MemoryScoreStore {
    records: RwLock<Vec<ScoredClaimRecord>>,
}

impl MemoryScoreStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every record, oldest first.
    pub fn records(&self) -> Vec<ScoredClaimRecord> {
        self.records.read().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ScoreStore for MemoryScoreStore {
    async fn record(&self, record: &ScoredClaimRecord) -> Result<()> {
        let mut records = self
            .records
            .write()
            .map_err(|e| crate::error::VerificationError::Storage(e.to_string().into()))?;
        records.push(record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::report::SimilarityRecord;

    #[tokio::test]
    async fn test_append_only() {
        let store = MemoryScoreStore::new();
        assert!(store.is_empty());

        let top = SimilarityRecord::new("https://who.int/a", "WHO", 0.8);
        let record = ScoredClaimRecord::new("claim", &top, &[0.1, 0.2]).unwrap();
        store.record(&record).await.unwrap();
        store.record(&record).await.unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(store.records()[0].claim_embedding_json, "[0.1,0.2]");
    }
}
