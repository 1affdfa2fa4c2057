//! Decisions proposed by the oracle.
//!
//! Decisions are untrusted input: they are only ever constructed through the
//! schema validation in `infrastructure::oracle::schema`, which bounds every
//! numeric field before these types are built.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Instrument;

/// Inclusive leverage bounds accepted from the oracle.
pub const LEVERAGE_RANGE: std::ops::RangeInclusive<u32> = 1..=30;

/// Predicted trend direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrendDirection {
    /// Price expected to rise.
    Up,
    /// Price expected to fall.
    Down,
    /// No clear direction.
    Sideways,
}

/// The oracle's trend prediction accompanying every decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendPrediction {
    /// Predicted direction.
    pub direction: TrendDirection,
    /// Confidence, 0 to 1.
    pub confidence: Decimal,
    /// Support level.
    pub support: Decimal,
    /// Resistance level.
    pub resistance: Decimal,
    /// Short free-text analysis.
    pub analysis: String,
}

/// Payload for a Buy decision.
///
/// The required fields are optional at this layer: the schema validates
/// ranges when fields are present, but a missing field downgrades only the
/// affected decision to Hold at processing time rather than rejecting the
/// whole batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuyParams {
    /// Entry price the oracle sized against.
    pub price: Option<Decimal>,
    /// Position size in base asset units.
    pub amount: Option<Decimal>,
    /// Leverage, bounded 1-30.
    pub leverage: Option<u32>,
    /// Stop-loss distance, percent of entry.
    pub stop_loss_pct: Option<Decimal>,
    /// Take-profit distance, percent of entry.
    pub take_profit_pct: Option<Decimal>,
}

/// A Buy whose required fields are all present.
#[derive(Debug, Clone, Copy)]
pub struct ValidBuy {
    /// Entry price.
    pub price: Decimal,
    /// Size in base asset units.
    pub amount: Decimal,
    /// Leverage.
    pub leverage: u32,
}

impl ValidBuy {
    /// Margin required to back this entry: `amount * price / leverage`.
    ///
    /// `None` when the notional overflows `Decimal` or leverage is zero.
    /// Callers gate entries through the risk policy first, which computes
    /// the same product and denies the trade on overflow.
    #[must_use]
    pub fn required_margin(&self) -> Option<Decimal> {
        self.amount
            .checked_mul(self.price)?
            .checked_div(Decimal::from(self.leverage))
    }
}

impl BuyParams {
    /// Extract the required fields, naming the first missing one.
    pub fn validated(&self) -> Result<ValidBuy, &'static str> {
        let price = self.price.ok_or("Buy is missing required field: price")?;
        let amount = self.amount.ok_or("Buy is missing required field: amount")?;
        let leverage = self
            .leverage
            .ok_or("Buy is missing required field: leverage")?;
        Ok(ValidBuy {
            price,
            amount,
            leverage,
        })
    }
}

/// Payload for a Sell decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SellParams {
    /// Percentage of the open position to close, 0-100. Missing percentage
    /// downgrades the decision to Hold.
    pub percentage: Option<Decimal>,
}

/// Payload for a Hold decision.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HoldParams {
    /// Requested stop-loss adjustment, percent of entry.
    pub stop_loss_pct: Option<Decimal>,
    /// Requested take-profit adjustment, percent of entry.
    pub take_profit_pct: Option<Decimal>,
}

/// The proposed action, matched exhaustively by the orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operation {
    /// Open or extend a leveraged long.
    Buy(BuyParams),
    /// Close part or all of an open position.
    Sell(SellParams),
    /// Do nothing, optionally adjusting protective orders.
    Hold(HoldParams),
}

impl Operation {
    /// Operation tag without payload, for records and logs.
    #[must_use]
    pub const fn kind(&self) -> OperationKind {
        match self {
            Self::Buy(_) => OperationKind::Buy,
            Self::Sell(_) => OperationKind::Sell,
            Self::Hold(_) => OperationKind::Hold,
        }
    }
}

/// Operation tag persisted on trade records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationKind {
    /// Entry.
    Buy,
    /// Exit.
    Sell,
    /// No action.
    Hold,
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
            Self::Hold => "HOLD",
        };
        write!(f, "{s}")
    }
}

/// One proposed action for one instrument.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decision {
    /// Target instrument.
    pub instrument: Instrument,
    /// The proposed action with its payload.
    pub operation: Operation,
    /// Mandatory trend prediction.
    pub prediction: TrendPrediction,
    /// Free-text rationale.
    pub rationale: String,
}

/// A validated batch of decisions from one oracle call.
#[derive(Debug, Clone)]
pub struct OracleProposal {
    /// 1-5 decisions, in the order the oracle returned them.
    pub decisions: Vec<Decision>,
    /// The oracle's free-form reasoning, if it provided any.
    pub reasoning: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn required_margin() {
        let buy = BuyParams {
            price: Some(dec!(50000)),
            amount: Some(dec!(0.1)),
            leverage: Some(10),
            stop_loss_pct: None,
            take_profit_pct: None,
        };
        assert_eq!(
            buy.validated().unwrap().required_margin(),
            Some(dec!(500))
        );
    }

    #[test]
    fn required_margin_is_none_on_overflow() {
        let buy = ValidBuy {
            price: Decimal::MAX,
            amount: Decimal::MAX,
            leverage: 10,
        };
        assert_eq!(buy.required_margin(), None);
    }

    #[test]
    fn missing_required_field_is_named() {
        let buy = BuyParams {
            price: Some(dec!(50000)),
            amount: None,
            leverage: Some(10),
            stop_loss_pct: None,
            take_profit_pct: None,
        };
        assert_eq!(
            buy.validated().unwrap_err(),
            "Buy is missing required field: amount"
        );
    }

    #[test]
    fn operation_kind_tags() {
        let hold = Operation::Hold(HoldParams::default());
        assert_eq!(hold.kind(), OperationKind::Hold);
        assert_eq!(OperationKind::Buy.to_string(), "BUY");
    }

    #[test]
    fn operation_serializes_tagged() {
        let op = Operation::Sell(SellParams {
            percentage: Some(dec!(50)),
        });
        let json = serde_json::to_value(&op).unwrap();
        assert_eq!(json["operation"], "SELL");
        assert_eq!(json["percentage"], "50");
    }
}
