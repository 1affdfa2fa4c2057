//! Cycle-level error taxonomy.
//!
//! Only two failure classes propagate to the invoker: oracle failures
//! (timeout or schema rejection, before any capital is committed) and
//! ledger write failures (after execution, results lost). Everything else
//! is absorbed: snapshot failures shrink the cycle, risk denials and
//! execution failures become trade record reasons.

use thiserror::Error;

use crate::application::ports::{AccountError, LedgerError, OracleError};

/// Fatal cycle error surfaced to the scheduler.
#[derive(Debug, Error)]
pub enum CycleError {
    /// Every snapshot fetch failed; the cycle aborted before the oracle
    /// was invoked.
    #[error("No market data: all snapshot fetches failed")]
    NoMarketData,

    /// Account state could not be read at cycle start.
    #[error(transparent)]
    Account(#[from] AccountError),

    /// The oracle timed out or returned an out-of-schema response. No
    /// trade records were produced.
    #[error(transparent)]
    Oracle(#[from] OracleError),

    /// The ledger write failed; the cycle's results are lost.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}
