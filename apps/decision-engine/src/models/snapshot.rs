//! Market state collected fresh each cycle.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Instrument;

/// Point-in-time market state for one instrument.
///
/// Produced by the market data gateway at the start of a cycle and consumed
/// by the prompt builder. Never persisted standalone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketSnapshot {
    /// Instrument this snapshot describes.
    pub instrument: Instrument,
    /// When the snapshot was taken.
    pub timestamp: DateTime<Utc>,
    /// Last traded price.
    pub price: Decimal,
    /// 24h high.
    pub high_24h: Decimal,
    /// 24h low.
    pub low_24h: Decimal,
    /// 24h base-asset volume.
    pub volume_24h: Decimal,
    /// 24h price change, percent.
    pub change_24h_pct: Decimal,
    /// 20-period EMA of closes.
    pub ema_20: Decimal,
    /// MACD line (EMA12 - EMA26).
    pub macd: Decimal,
    /// 14-period RSI.
    pub rsi_14: Decimal,
}
