//! Ledger Port (Driven Port)
//!
//! Durable store for the decision trail. One append per cycle, atomic with
//! all nested trade records. A failed write is fatal and surfaces to the
//! scheduler; the cycle's in-memory results are otherwise lost.

use async_trait::async_trait;

use crate::models::CycleRecord;

/// Ledger port error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LedgerError {
    /// The write failed; nothing was persisted for this cycle.
    #[error("Ledger write failed: {message}")]
    WriteFailed {
        /// Error details.
        message: String,
    },
}

/// Port for the decision ledger.
#[async_trait]
pub trait LedgerPort: Send + Sync {
    /// Persist one cycle record with its trade records, atomically.
    async fn append(&self, record: &CycleRecord) -> Result<(), LedgerError>;
}
