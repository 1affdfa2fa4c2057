//! Account state read once per cycle.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Instrument;

/// Position direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PositionSide {
    /// Long position.
    Long,
    /// Short position.
    Short,
}

/// An open position on the venue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    /// Instrument held.
    pub instrument: Instrument,
    /// Long or short.
    pub side: PositionSide,
    /// Position size in base asset units.
    pub size: Decimal,
    /// Entry price.
    pub entry_price: Decimal,
    /// Current mark price.
    pub mark_price: Decimal,
    /// Leverage the position was opened with.
    pub leverage: u32,
    /// Unrealized profit and loss.
    pub unrealized_pnl: Decimal,
}

/// Snapshot of the trading account, taken at cycle start.
///
/// Treated as immutable for the duration of the cycle; the orchestrator
/// tracks spend against `available_cash` with its own running balance rather
/// than re-fetching.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountState {
    /// Total account equity (cash + position margin + unrealized PnL).
    pub total_equity: Decimal,
    /// Cash not committed to any position.
    pub available_cash: Decimal,
    /// Open positions.
    pub positions: Vec<Position>,
}

impl AccountState {
    /// Sum of unrealized PnL across open positions.
    #[must_use]
    pub fn unrealized_pnl(&self) -> Decimal {
        self.positions.iter().map(|p| p.unrealized_pnl).sum()
    }

    /// Find the open position for an instrument, if any.
    #[must_use]
    pub fn position(&self, instrument: Instrument) -> Option<&Position> {
        self.positions.iter().find(|p| p.instrument == instrument)
    }
}
