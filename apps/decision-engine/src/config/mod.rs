//! Environment-driven configuration with startup validation.
//!
//! Everything is read once at startup from the process environment;
//! missing credentials fail fast with a clear message rather than
//! surfacing mid-cycle.

use std::time::Duration;

use rust_decimal::Decimal;

use crate::infrastructure::exchange::ExchangeConfig;
use crate::infrastructure::oracle::OracleConfig;
use crate::models::Instrument;
use crate::risk::RiskLimits;

/// Configuration loading / validation error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required environment variable is not set.
    #[error("Missing required environment variable {name} for {mode} mode")]
    MissingVariable {
        /// Variable name.
        name: &'static str,
        /// The trading mode that requires it.
        mode: String,
    },

    /// A variable is set but unparsable.
    #[error("Invalid value for {name}: {value}")]
    InvalidValue {
        /// Variable name.
        name: &'static str,
        /// The offending value.
        value: String,
    },
}

/// Where orders go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradingMode {
    /// Real orders against the venue.
    Live,
    /// In-memory paper trading.
    Simulated,
}

impl std::fmt::Display for TradingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Live => write!(f, "LIVE"),
            Self::Simulated => write!(f, "SIMULATED"),
        }
    }
}

/// Full engine configuration, loaded from the environment.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Live or simulated execution.
    pub mode: TradingMode,
    /// Instruments the engine trades.
    pub instruments: Vec<Instrument>,
    /// Risk policy bounds.
    pub limits: RiskLimits,
    /// Capital base override for risk sizing; also the simulator's
    /// starting cash.
    pub initial_capital: Option<Decimal>,
    /// Oracle (chat-completion API) settings.
    pub oracle: OracleConfig,
    /// Venue REST settings.
    pub exchange: ExchangeConfig,
    /// Ledger SQLite file path.
    pub ledger_path: String,
}

impl EngineConfig {
    /// Load and validate configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mode = match env_or("TRADING_MODE", "SIMULATED").to_uppercase().as_str() {
            "LIVE" => TradingMode::Live,
            "SIMULATED" | "PAPER" => TradingMode::Simulated,
            other => {
                return Err(ConfigError::InvalidValue {
                    name: "TRADING_MODE",
                    value: other.to_string(),
                });
            }
        };

        let instruments = match std::env::var("INSTRUMENTS") {
            Ok(csv) => parse_instruments(&csv)?,
            Err(_) => Instrument::ALL.to_vec(),
        };

        let limits = RiskLimits {
            max_leverage: parse_env("MAX_LEVERAGE")?.unwrap_or(RiskLimits::default().max_leverage),
            max_position_fraction: parse_env("MAX_POSITION_FRACTION")?
                .unwrap_or(RiskLimits::default().max_position_fraction),
            max_daily_loss_fraction: parse_env("MAX_DAILY_LOSS_FRACTION")?
                .unwrap_or(RiskLimits::default().max_daily_loss_fraction),
        };

        let oracle = OracleConfig {
            api_base: env_or("ORACLE_API_BASE", "https://api.openai.com/v1"),
            api_key: std::env::var("ORACLE_API_KEY").unwrap_or_default(),
            model: env_or("ORACLE_MODEL", "gpt-4o"),
            timeout: Duration::from_secs(parse_env("ORACLE_TIMEOUT_SECS")?.unwrap_or(120)),
        };

        let exchange = ExchangeConfig {
            base_url: env_or("EXCHANGE_BASE_URL", &ExchangeConfig::default().base_url),
            api_key: std::env::var("EXCHANGE_API_KEY").unwrap_or_default(),
            api_secret: std::env::var("EXCHANGE_API_SECRET").unwrap_or_default(),
            kline_interval: env_or("KLINE_INTERVAL", "15m"),
            ..Default::default()
        };

        let config = Self {
            mode,
            instruments,
            limits,
            initial_capital: parse_env("INITIAL_CAPITAL")?,
            oracle,
            exchange,
            ledger_path: env_or("LEDGER_PATH", "decisions.db"),
        };
        config.validate()?;
        Ok(config)
    }

    /// Mode-aware credential checks, run once at startup.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.oracle.api_key.is_empty() {
            return Err(ConfigError::MissingVariable {
                name: "ORACLE_API_KEY",
                mode: self.mode.to_string(),
            });
        }
        // Simulated mode only reads public market data; live mode signs
        // account and order requests.
        if self.mode == TradingMode::Live {
            if self.exchange.api_key.is_empty() {
                return Err(ConfigError::MissingVariable {
                    name: "EXCHANGE_API_KEY",
                    mode: self.mode.to_string(),
                });
            }
            if self.exchange.api_secret.is_empty() {
                return Err(ConfigError::MissingVariable {
                    name: "EXCHANGE_API_SECRET",
                    mode: self.mode.to_string(),
                });
            }
        }
        Ok(())
    }
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T: std::str::FromStr>(name: &'static str) -> Result<Option<T>, ConfigError> {
    match std::env::var(name) {
        Ok(value) => value
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { name, value }),
        Err(_) => Ok(None),
    }
}

fn parse_instruments(csv: &str) -> Result<Vec<Instrument>, ConfigError> {
    let mut instruments = Vec::new();
    for token in csv.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        let instrument = Instrument::parse(token).map_err(|_| ConfigError::InvalidValue {
            name: "INSTRUMENTS",
            value: token.to_string(),
        })?;
        if !instruments.contains(&instrument) {
            instruments.push(instrument);
        }
    }
    if instruments.is_empty() {
        return Err(ConfigError::InvalidValue {
            name: "INSTRUMENTS",
            value: csv.to_string(),
        });
    }
    Ok(instruments)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instruments_parse_and_dedupe() {
        let parsed = parse_instruments("BTC, eth,BTC").unwrap();
        assert_eq!(parsed, vec![Instrument::Btc, Instrument::Eth]);
    }

    #[test]
    fn unknown_instrument_is_invalid() {
        assert!(matches!(
            parse_instruments("DOGE"),
            Err(ConfigError::InvalidValue { name: "INSTRUMENTS", .. })
        ));
    }

    #[test]
    fn empty_instrument_list_is_invalid() {
        assert!(parse_instruments(" , ").is_err());
    }

    #[test]
    fn live_mode_requires_venue_credentials() {
        let config = EngineConfig {
            mode: TradingMode::Live,
            instruments: Instrument::ALL.to_vec(),
            limits: RiskLimits::default(),
            initial_capital: None,
            oracle: OracleConfig {
                api_base: "http://localhost".to_string(),
                api_key: "k".to_string(),
                model: "m".to_string(),
                timeout: Duration::from_secs(120),
            },
            exchange: ExchangeConfig::default(),
            ledger_path: "ledger.db".to_string(),
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingVariable {
                name: "EXCHANGE_API_KEY",
                ..
            })
        ));
    }

    #[test]
    fn simulated_mode_needs_no_venue_credentials() {
        let config = EngineConfig {
            mode: TradingMode::Simulated,
            instruments: Instrument::ALL.to_vec(),
            limits: RiskLimits::default(),
            initial_capital: None,
            oracle: OracleConfig {
                api_base: "http://localhost".to_string(),
                api_key: "k".to_string(),
                model: "m".to_string(),
                timeout: Duration::from_secs(120),
            },
            exchange: ExchangeConfig::default(),
            ledger_path: "ledger.db".to_string(),
        };
        assert!(config.validate().is_ok());
    }
}
