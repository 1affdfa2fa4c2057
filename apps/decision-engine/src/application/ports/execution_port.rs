//! Execution Port (Driven Port)
//!
//! Places orders against the venue. Failures here are non-fatal to the
//! batch: the orchestrator records them on the trade record and continues
//! with the next decision.

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::models::Instrument;

/// Confirmed execution values returned by the venue.
#[derive(Debug, Clone)]
pub struct Fill {
    /// Venue order ID.
    pub order_id: String,
    /// Actual fill price.
    pub price: Decimal,
    /// Actual filled amount, base asset units.
    pub amount: Decimal,
}

/// Execution port error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ExecutionError {
    /// Order rejected by the venue.
    #[error("Order rejected: {reason}")]
    Rejected {
        /// Rejection reason.
        reason: String,
    },

    /// Sell or protective-order request with nothing to act on. Expected
    /// and non-fatal.
    #[error("No open position for {instrument}")]
    NoPosition {
        /// The instrument with no position.
        instrument: Instrument,
    },

    /// Network failure reaching the venue.
    #[error("Venue unreachable: {message}")]
    Network {
        /// Error details.
        message: String,
    },
}

/// Port for venue order placement.
#[async_trait]
pub trait ExecutionPort: Send + Sync {
    /// Open a leveraged long. `price` is the oracle's reference price:
    /// simulated fills execute at it, live market orders use it only as a
    /// fallback reference for protective order placement.
    async fn buy(
        &self,
        instrument: Instrument,
        price: Decimal,
        amount: Decimal,
        leverage: u32,
        stop_loss_pct: Option<Decimal>,
        take_profit_pct: Option<Decimal>,
    ) -> Result<Fill, ExecutionError>;

    /// Close `percentage` (0-100) of the open position.
    async fn sell(&self, instrument: Instrument, percentage: Decimal)
    -> Result<Fill, ExecutionError>;

    /// Adjust protective orders on an open position.
    async fn set_protective(
        &self,
        instrument: Instrument,
        stop_loss_pct: Option<Decimal>,
        take_profit_pct: Option<Decimal>,
    ) -> Result<(), ExecutionError>;
}
