//! Oracle Port (Driven Port)
//!
//! The generative model that proposes decisions. Its output is untrusted:
//! implementations must validate the response against the decision schema
//! and reject the whole batch on any mismatch. Timeout and schema errors
//! are cycle-fatal; exactly one attempt is made per cycle.

use async_trait::async_trait;

use crate::models::OracleProposal;

/// Oracle port error. All variants abort the cycle before any capital is
/// committed.
#[derive(Debug, Clone, thiserror::Error)]
pub enum OracleError {
    /// The oracle did not answer within the configured timeout.
    #[error("Oracle call timed out after {seconds}s")]
    Timeout {
        /// Configured timeout in seconds.
        seconds: u64,
    },

    /// Transport-level failure reaching the oracle.
    #[error("Oracle request failed: {message}")]
    Transport {
        /// Error details.
        message: String,
    },

    /// The response did not conform to the decision schema.
    #[error("Oracle response rejected by schema: {message}")]
    Schema {
        /// What failed validation.
        message: String,
    },
}

/// Port for requesting a decision batch.
#[async_trait]
pub trait OraclePort: Send + Sync {
    /// Ask the oracle for 1-5 validated decisions given the prompt.
    async fn propose(&self, prompt: &str) -> Result<OracleProposal, OracleError>;
}
