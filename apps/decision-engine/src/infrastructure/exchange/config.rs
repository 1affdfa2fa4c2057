//! Venue adapter configuration.

use std::time::Duration;

/// Retry behavior for idempotent venue reads.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum retries after the initial attempt.
    pub max_retries: u32,
    /// First backoff delay.
    pub initial_backoff: Duration,
    /// Backoff ceiling.
    pub max_backoff: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_secs(2),
        }
    }
}

/// Configuration for the venue REST adapters.
#[derive(Debug, Clone)]
pub struct ExchangeConfig {
    /// REST base URL (no trailing slash).
    pub base_url: String,
    /// API key header value. Empty for public-only (market data) use.
    pub api_key: String,
    /// HMAC signing secret. Empty for public-only use.
    pub api_secret: String,
    /// Per-request timeout. Snapshot fetches inherit this, which is what
    /// keeps the parallel fan-out from blocking on one slow instrument.
    pub timeout: Duration,
    /// Retry behavior for market data reads. Order placement is never
    /// retried.
    pub retry: RetryConfig,
    /// Kline interval used for indicator computation.
    pub kline_interval: String,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            base_url: "https://fapi.binance.com".to_string(),
            api_key: String::new(),
            api_secret: String::new(),
            timeout: Duration::from_secs(10),
            retry: RetryConfig::default(),
            kline_interval: "15m".to_string(),
        }
    }
}
