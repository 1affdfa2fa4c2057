//! In-memory ledger for testing.

use std::sync::RwLock;

use async_trait::async_trait;

use crate::application::ports::{LedgerError, LedgerPort};
use crate::models::CycleRecord;

/// In-memory implementation of [`LedgerPort`].
///
/// Suitable for testing and development. Not for production use.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    records: RwLock<Vec<CycleRecord>>,
}

impl InMemoryLedger {
    /// Create a new empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of persisted cycles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().unwrap().len()
    }

    /// Check if the ledger is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.read().unwrap().is_empty()
    }

    /// Snapshot all persisted records (for test assertions).
    #[must_use]
    pub fn records(&self) -> Vec<CycleRecord> {
        self.records.read().unwrap().clone()
    }
}

#[async_trait]
impl LedgerPort for InMemoryLedger {
    async fn append(&self, record: &CycleRecord) -> Result<(), LedgerError> {
        let mut records = self.records.write().unwrap();
        records.push(record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(id: &str) -> CycleRecord {
        CycleRecord {
            id: id.to_string(),
            timestamp: Utc::now(),
            prompt: "p".to_string(),
            rationale: "r".to_string(),
            reasoning: "why".to_string(),
            trades: vec![],
        }
    }

    #[tokio::test]
    async fn append_preserves_order() {
        let ledger = InMemoryLedger::new();
        ledger.append(&record("a")).await.unwrap();
        ledger.append(&record("b")).await.unwrap();

        let records = ledger.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "a");
        assert_eq!(records[1].id, "b");
    }
}
