//! Persisted outcome records.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::decision::{OperationKind, TrendPrediction};
use super::Instrument;

/// The persisted outcome of one decision after risk-gating and execution.
///
/// Immutable once written. `operation` is the final operation: a blocked Buy
/// or Sell is downgraded to Hold with the block reason recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeRecord {
    /// Record ID.
    pub id: String,
    /// Instrument the decision targeted.
    pub instrument: Instrument,
    /// Final operation after gating.
    pub operation: OperationKind,
    /// Realized price (fill price when executed, requested price otherwise).
    pub price: Decimal,
    /// Realized amount (fill amount when executed, zero when blocked/failed).
    pub amount: Decimal,
    /// Leverage applied, 0 for non-entries.
    pub leverage: u32,
    /// Stop-loss percentage, if any.
    pub stop_loss_pct: Option<Decimal>,
    /// Take-profit percentage, if any.
    pub take_profit_pct: Option<Decimal>,
    /// Trend prediction snapshot from the decision.
    pub prediction: TrendPrediction,
    /// Block or failure reason; `None` for a clean execution.
    pub reason: Option<String>,
}

/// One row per orchestrator invocation.
///
/// Written exactly once per cycle, atomically with its trade records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleRecord {
    /// Cycle ID.
    pub id: String,
    /// When the cycle ran.
    pub timestamp: DateTime<Utc>,
    /// Prompt sent to the oracle.
    pub prompt: String,
    /// Concatenated decision rationales.
    pub rationale: String,
    /// The oracle's free-form reasoning.
    pub reasoning: String,
    /// Trade records in decision order.
    pub trades: Vec<TradeRecord>,
}

/// Builder for [`TradeRecord`] with one explicit precedence rule:
/// execution-confirmed values win over requested values, which win over
/// zero defaults.
#[derive(Debug, Clone)]
pub struct TradeRecordBuilder {
    instrument: Instrument,
    operation: OperationKind,
    prediction: TrendPrediction,
    requested_price: Option<Decimal>,
    requested_amount: Option<Decimal>,
    filled_price: Option<Decimal>,
    filled_amount: Option<Decimal>,
    leverage: u32,
    stop_loss_pct: Option<Decimal>,
    take_profit_pct: Option<Decimal>,
    reason: Option<String>,
}

impl TradeRecordBuilder {
    /// Start a record for a decision.
    #[must_use]
    pub fn new(
        instrument: Instrument,
        operation: OperationKind,
        prediction: TrendPrediction,
    ) -> Self {
        Self {
            instrument,
            operation,
            prediction,
            requested_price: None,
            requested_amount: None,
            filled_price: None,
            filled_amount: None,
            leverage: 0,
            stop_loss_pct: None,
            take_profit_pct: None,
            reason: None,
        }
    }

    /// Record the values the oracle requested.
    #[must_use]
    pub const fn requested(mut self, price: Decimal, amount: Decimal) -> Self {
        self.requested_price = Some(price);
        self.requested_amount = Some(amount);
        self
    }

    /// Record execution-confirmed fill values. Takes precedence over
    /// requested values.
    #[must_use]
    pub const fn filled(mut self, price: Decimal, amount: Decimal) -> Self {
        self.filled_price = Some(price);
        self.filled_amount = Some(amount);
        self
    }

    /// Record leverage.
    #[must_use]
    pub const fn leverage(mut self, leverage: u32) -> Self {
        self.leverage = leverage;
        self
    }

    /// Record protective order percentages.
    #[must_use]
    pub const fn protective(mut self, stop_loss: Option<Decimal>, take_profit: Option<Decimal>) -> Self {
        self.stop_loss_pct = stop_loss;
        self.take_profit_pct = take_profit;
        self
    }

    /// Downgrade the record to Hold, keeping the attempted values, and
    /// record why. Used for risk denials and validation failures.
    #[must_use]
    pub fn blocked(mut self, reason: impl Into<String>) -> Self {
        self.operation = OperationKind::Hold;
        self.reason = Some(reason.into());
        self
    }

    /// Record an execution failure reason without downgrading the
    /// operation. The record keeps the attempted (requested) values; with
    /// no fill and no requested values, price and amount stay zero.
    #[must_use]
    pub fn failed(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Build the immutable record.
    #[must_use]
    pub fn build(self) -> TradeRecord {
        TradeRecord {
            id: Uuid::new_v4().to_string(),
            instrument: self.instrument,
            operation: self.operation,
            price: self
                .filled_price
                .or(self.requested_price)
                .unwrap_or(Decimal::ZERO),
            amount: self
                .filled_amount
                .or(self.requested_amount)
                .unwrap_or(Decimal::ZERO),
            leverage: self.leverage,
            stop_loss_pct: self.stop_loss_pct,
            take_profit_pct: self.take_profit_pct,
            prediction: self.prediction,
            reason: self.reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::decision::TrendDirection;
    use rust_decimal_macros::dec;

    fn prediction() -> TrendPrediction {
        TrendPrediction {
            direction: TrendDirection::Up,
            confidence: dec!(0.8),
            support: dec!(95),
            resistance: dec!(110),
            analysis: "test".to_string(),
        }
    }

    #[test]
    fn fill_values_win_over_requested() {
        let record = TradeRecordBuilder::new(Instrument::Btc, OperationKind::Buy, prediction())
            .requested(dec!(50000), dec!(0.1))
            .filled(dec!(50010), dec!(0.1))
            .leverage(10)
            .build();

        assert_eq!(record.price, dec!(50010));
        assert_eq!(record.amount, dec!(0.1));
        assert!(record.reason.is_none());
    }

    #[test]
    fn blocked_downgrades_to_hold() {
        let record = TradeRecordBuilder::new(Instrument::Eth, OperationKind::Buy, prediction())
            .requested(dec!(3000), dec!(1))
            .blocked("Leverage exceeds maximum")
            .build();

        assert_eq!(record.operation, OperationKind::Hold);
        assert_eq!(record.price, dec!(3000));
        assert_eq!(record.reason.as_deref(), Some("Leverage exceeds maximum"));
    }

    #[test]
    fn failed_sell_keeps_operation_with_zero_amount() {
        let record = TradeRecordBuilder::new(Instrument::Sol, OperationKind::Sell, prediction())
            .failed("No open position")
            .build();

        assert_eq!(record.operation, OperationKind::Sell);
        assert_eq!(record.amount, Decimal::ZERO);
        assert_eq!(record.reason.as_deref(), Some("No open position"));
    }

    #[test]
    fn failed_buy_keeps_attempted_values() {
        let record = TradeRecordBuilder::new(Instrument::Btc, OperationKind::Buy, prediction())
            .requested(dec!(50000), dec!(0.1))
            .leverage(10)
            .failed("Venue unreachable")
            .build();

        assert_eq!(record.operation, OperationKind::Buy);
        assert_eq!(record.price, dec!(50000));
        assert_eq!(record.amount, dec!(0.1));
        assert!(record.reason.is_some());
    }

    #[test]
    fn defaults_are_zero() {
        let record =
            TradeRecordBuilder::new(Instrument::Xrp, OperationKind::Hold, prediction()).build();
        assert_eq!(record.price, Decimal::ZERO);
        assert_eq!(record.amount, Decimal::ZERO);
        assert_eq!(record.leverage, 0);
    }
}
