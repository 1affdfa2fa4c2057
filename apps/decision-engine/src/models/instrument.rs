//! The fixed instrument universe.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A supported trading instrument.
///
/// The universe is fixed at process start; the reference deployment trades
/// five perpetual pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Instrument {
    /// Bitcoin perpetual.
    Btc,
    /// Ethereum perpetual.
    Eth,
    /// Solana perpetual.
    Sol,
    /// BNB perpetual.
    Bnb,
    /// XRP perpetual.
    Xrp,
}

/// Error returned when parsing an unknown instrument symbol.
#[derive(Debug, Clone, Error)]
#[error("Unknown instrument: {symbol}")]
pub struct UnknownInstrument {
    /// The unrecognized symbol.
    pub symbol: String,
}

impl Instrument {
    /// All supported instruments, in prompt/display order.
    pub const ALL: [Self; 5] = [Self::Btc, Self::Eth, Self::Sol, Self::Bnb, Self::Xrp];

    /// Base asset ticker (e.g. `BTC`).
    #[must_use]
    pub const fn ticker(&self) -> &'static str {
        match self {
            Self::Btc => "BTC",
            Self::Eth => "ETH",
            Self::Sol => "SOL",
            Self::Bnb => "BNB",
            Self::Xrp => "XRP",
        }
    }

    /// Venue symbol for the USDT-margined perpetual (e.g. `BTCUSDT`).
    #[must_use]
    pub const fn venue_symbol(&self) -> &'static str {
        match self {
            Self::Btc => "BTCUSDT",
            Self::Eth => "ETHUSDT",
            Self::Sol => "SOLUSDT",
            Self::Bnb => "BNBUSDT",
            Self::Xrp => "XRPUSDT",
        }
    }

    /// Parse a ticker or venue symbol, case-insensitively.
    ///
    /// Accepts both `BTC` and `BTCUSDT` forms since the oracle is free to
    /// echo either back.
    pub fn parse(symbol: &str) -> Result<Self, UnknownInstrument> {
        let upper = symbol.trim().to_ascii_uppercase();
        Self::ALL
            .iter()
            .copied()
            .find(|i| i.ticker() == upper || i.venue_symbol() == upper)
            .ok_or(UnknownInstrument { symbol: upper })
    }
}

impl std::fmt::Display for Instrument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.ticker())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_ticker() {
        assert_eq!(Instrument::parse("btc").unwrap(), Instrument::Btc);
        assert_eq!(Instrument::parse(" SOL ").unwrap(), Instrument::Sol);
    }

    #[test]
    fn parse_venue_symbol() {
        assert_eq!(Instrument::parse("ETHUSDT").unwrap(), Instrument::Eth);
    }

    #[test]
    fn parse_unknown_fails() {
        let err = Instrument::parse("DOGE").unwrap_err();
        assert_eq!(err.symbol, "DOGE");
    }

    #[test]
    fn universe_has_five_entries() {
        assert_eq!(Instrument::ALL.len(), 5);
    }
}
