//! Market Data Port (Driven Port)
//!
//! Supplies current price/indicator state per instrument. Failures are
//! per-instrument and non-fatal: a failing fetch excludes that instrument
//! from the cycle.

use async_trait::async_trait;

use crate::models::{Instrument, MarketSnapshot};

/// Market data port error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum MarketDataError {
    /// Network or venue error.
    #[error("Market data fetch failed for {instrument}: {message}")]
    FetchFailed {
        /// Instrument whose fetch failed.
        instrument: Instrument,
        /// Error details.
        message: String,
    },

    /// Venue returned data we could not interpret.
    #[error("Malformed market data for {instrument}: {message}")]
    Malformed {
        /// Instrument whose data was malformed.
        instrument: Instrument,
        /// Error details.
        message: String,
    },
}

/// Port for fetching market snapshots.
#[async_trait]
pub trait MarketDataPort: Send + Sync {
    /// Fetch a fresh snapshot for one instrument.
    async fn get_snapshot(&self, instrument: Instrument)
    -> Result<MarketSnapshot, MarketDataError>;
}
