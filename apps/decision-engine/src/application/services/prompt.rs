//! Deterministic prompt construction for the oracle.
//!
//! Renders the cycle's market snapshots, account state and risk bounds into
//! a text prompt. The rendering is deterministic for a given input so that
//! persisted prompts can be replayed against the ledger.

use rust_decimal::Decimal;

use crate::models::{AccountState, MarketSnapshot};
use crate::risk::RiskLimits;

/// Instructions describing the required response shape.
const RESPONSE_CONTRACT: &str = r#"Respond with a single JSON object, no surrounding prose:
{
  "reasoning": "<your overall market reasoning>",
  "decisions": [
    {
      "symbol": "BTC",
      "operation": "BUY" | "SELL" | "HOLD",
      "price": <number, BUY only>,
      "amount": <base asset units, BUY only>,
      "leverage": <integer 1-30, BUY only>,
      "percentage": <0-100, SELL only>,
      "stop_loss_pct": <optional number>,
      "take_profit_pct": <optional number>,
      "prediction": {
        "direction": "UP" | "DOWN" | "SIDEWAYS",
        "confidence": <0-1>,
        "support": <number>,
        "resistance": <number>,
        "analysis": "<short analysis>"
      },
      "rationale": "<why this action>"
    }
  ]
}
Return between 1 and 5 decisions, at most one per instrument."#;

/// Build the oracle prompt for one cycle.
#[must_use]
pub fn build_prompt(
    snapshots: &[MarketSnapshot],
    account: &AccountState,
    limits: &RiskLimits,
) -> String {
    let mut prompt = String::new();

    prompt.push_str("You are managing a leveraged crypto perpetuals account.\n\n");

    prompt.push_str("=== MARKET STATE ===\n");
    for s in snapshots {
        prompt.push_str(&format!(
            "{}: price={} 24h[{} .. {}] change={}% volume={} ema20={} macd={} rsi14={}\n",
            s.instrument,
            s.price,
            s.low_24h,
            s.high_24h,
            s.change_24h_pct,
            s.volume_24h,
            s.ema_20,
            s.macd,
            s.rsi_14,
        ));
    }

    prompt.push_str("\n=== ACCOUNT ===\n");
    prompt.push_str(&format!(
        "Total equity: {}\nAvailable cash: {}\n",
        account.total_equity, account.available_cash
    ));
    if account.positions.is_empty() {
        prompt.push_str("Open positions: none\n");
    } else {
        prompt.push_str("Open positions:\n");
        for p in &account.positions {
            prompt.push_str(&format!(
                "  {} {:?} size={} entry={} mark={} {}x pnl={}\n",
                p.instrument, p.side, p.size, p.entry_price, p.mark_price, p.leverage,
                p.unrealized_pnl,
            ));
        }
    }

    prompt.push_str("\n=== RISK BOUNDS ===\n");
    prompt.push_str(&format!(
        "Max leverage: {}x\nMax position notional: {}% of equity\nDaily loss limit: {}% of capital\n",
        limits.max_leverage,
        limits.max_position_fraction * Decimal::ONE_HUNDRED,
        limits.max_daily_loss_fraction * Decimal::ONE_HUNDRED,
    ));

    prompt.push('\n');
    prompt.push_str(RESPONSE_CONTRACT);
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Instrument, Position, PositionSide};
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn snapshot() -> MarketSnapshot {
        MarketSnapshot {
            instrument: Instrument::Btc,
            timestamp: Utc.with_ymd_and_hms(2026, 1, 4, 12, 0, 0).unwrap(),
            price: dec!(50000),
            high_24h: dec!(51000),
            low_24h: dec!(49000),
            volume_24h: dec!(1234.5),
            change_24h_pct: dec!(1.2),
            ema_20: dec!(49800),
            macd: dec!(120.5),
            rsi_14: dec!(55.3),
        }
    }

    fn account() -> AccountState {
        AccountState {
            total_equity: dec!(10000),
            available_cash: dec!(8000),
            positions: vec![Position {
                instrument: Instrument::Eth,
                side: PositionSide::Long,
                size: dec!(2),
                entry_price: dec!(3000),
                mark_price: dec!(3100),
                leverage: 5,
                unrealized_pnl: dec!(200),
            }],
        }
    }

    #[test]
    fn prompt_is_deterministic() {
        let snapshots = vec![snapshot()];
        let limits = RiskLimits::default();
        let a = build_prompt(&snapshots, &account(), &limits);
        let b = build_prompt(&snapshots, &account(), &limits);
        assert_eq!(a, b);
    }

    #[test]
    fn prompt_contains_market_and_account_state() {
        let prompt = build_prompt(&[snapshot()], &account(), &RiskLimits::default());
        assert!(prompt.contains("BTC: price=50000"));
        assert!(prompt.contains("Available cash: 8000"));
        assert!(prompt.contains("ETH Long size=2"));
        assert!(prompt.contains("between 1 and 5 decisions"));
    }

    #[test]
    fn prompt_notes_empty_positions() {
        let account = AccountState {
            total_equity: dec!(1000),
            available_cash: dec!(1000),
            positions: vec![],
        };
        let prompt = build_prompt(&[snapshot()], &account, &RiskLimits::default());
        assert!(prompt.contains("Open positions: none"));
    }
}
