//! Pure risk policy evaluation.
//!
//! Every function here is referentially transparent: no I/O, no hidden
//! state. The orchestrator is the only caller and logs the verdicts; the
//! policy itself only decides.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Configured risk bounds, loaded once per cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskLimits {
    /// Maximum leverage accepted for an entry.
    pub max_leverage: u32,
    /// Maximum notional for a single entry, as a fraction of total equity.
    pub max_position_fraction: Decimal,
    /// Maximum tolerated daily loss, as a fraction of initial capital.
    /// A value of `0.1` blocks the cycle once today's PnL reaches -10%.
    pub max_daily_loss_fraction: Decimal,
}

impl Default for RiskLimits {
    fn default() -> Self {
        Self {
            max_leverage: 10,
            max_position_fraction: Decimal::new(5, 1), // 0.5
            max_daily_loss_fraction: Decimal::new(1, 1), // 0.1
        }
    }
}

/// Outcome of a risk check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// The trade is within bounds.
    Allow,
    /// The trade is denied.
    Deny {
        /// Human-readable denial reason, recorded on the trade record.
        reason: String,
    },
}

impl Verdict {
    fn deny(reason: impl Into<String>) -> Self {
        Self::Deny {
            reason: reason.into(),
        }
    }

    /// True when the check passed.
    #[must_use]
    pub const fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }

    /// Denial reason, if denied.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Allow => None,
            Self::Deny { reason } => Some(reason),
        }
    }
}

/// Check a proposed leveraged entry against per-trade bounds.
///
/// `current_balance` is the caller's *running* available balance, already
/// decremented by margin reserved for earlier entries in the same batch.
/// Checking against the running balance rather than the cycle-start balance
/// is what prevents a batch of entries from jointly overspending capital.
#[must_use]
pub fn check_buy_risk(
    amount: Decimal,
    price: Decimal,
    leverage: u32,
    current_balance: Decimal,
    total_equity: Decimal,
    limits: &RiskLimits,
) -> Verdict {
    if leverage == 0 {
        return Verdict::deny("Leverage must be at least 1x");
    }
    if leverage > limits.max_leverage {
        return Verdict::deny(format!(
            "Leverage {leverage}x exceeds maximum {}x",
            limits.max_leverage
        ));
    }

    // All arithmetic is checked: the values come from the oracle, which is
    // only bounded to "positive" by the schema, and a panic here would
    // abort the cycle mid-batch without a ledger record.
    let Some(notional) = amount.checked_mul(price) else {
        return Verdict::deny(format!("Notional {amount} x {price} overflows"));
    };
    let Some(max_notional) = total_equity.checked_mul(limits.max_position_fraction) else {
        return Verdict::deny("Equity notional bound overflows".to_string());
    };
    if notional > max_notional {
        return Verdict::deny(format!(
            "Notional {notional} exceeds {} of equity ({max_notional})",
            limits.max_position_fraction
        ));
    }

    let Some(required_margin) = notional.checked_div(Decimal::from(leverage)) else {
        return Verdict::deny(format!("Margin for notional {notional} at {leverage}x overflows"));
    };
    if required_margin > current_balance {
        return Verdict::deny(format!(
            "Required margin {required_margin} exceeds remaining balance {current_balance}"
        ));
    }

    Verdict::Allow
}

/// Check today's cumulative PnL against the daily loss limit.
///
/// Denies when `today_pnl / initial_capital` is more negative than
/// `-max_daily_loss_fraction`. A breach blocks all Buy/Sell activity for
/// the rest of the day's cycles.
#[must_use]
pub fn check_daily_loss_limit(
    today_pnl: Decimal,
    initial_capital: Decimal,
    limits: &RiskLimits,
) -> Verdict {
    if initial_capital <= Decimal::ZERO {
        return Verdict::deny("Initial capital must be positive");
    }

    let loss_fraction = today_pnl / initial_capital;
    if loss_fraction <= -limits.max_daily_loss_fraction {
        return Verdict::deny(format!(
            "Daily loss {today_pnl} is {loss_fraction} of capital, beyond -{}",
            limits.max_daily_loss_fraction
        ));
    }

    Verdict::Allow
}
