//! HTTP client wrapper for the venue REST API.
//!
//! Public reads retry with jittered exponential backoff; signed requests
//! (account reads, order placement) are sent exactly once so a network
//! blip can never double-place an order.

use std::time::Duration;

use hmac::{Hmac, Mac};
use rand::Rng;
use serde::de::DeserializeOwned;
use sha2::Sha256;

use super::config::{ExchangeConfig, RetryConfig};

/// Venue transport error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum VenueError {
    /// Network-level failure.
    #[error("Network error: {0}")]
    Network(String),
    /// Non-2xx venue response.
    #[error("Venue returned HTTP {status}: {body}")]
    Http {
        /// Status code.
        status: u16,
        /// Response body.
        body: String,
    },
    /// Response body decode failure.
    #[error("Response decode failed: {0}")]
    Decode(String),
    /// Signed request attempted without credentials.
    #[error("Venue credentials not configured")]
    MissingCredentials,
    /// Retries exhausted. Carries the final attempt's error so callers
    /// see the real cause, not just the give-up.
    #[error("Giving up after {attempts} attempts: {last}")]
    MaxRetriesExceeded {
        /// Attempts made.
        attempts: u32,
        /// The error from the final attempt.
        last: String,
    },
}

type HmacSha256 = Hmac<Sha256>;

/// Jittered exponential backoff, one instance per request.
struct ExponentialBackoff {
    attempt: u32,
    max_retries: u32,
    delay: Duration,
    max_delay: Duration,
}

impl ExponentialBackoff {
    fn new(config: &RetryConfig) -> Self {
        Self {
            attempt: 0,
            max_retries: config.max_retries,
            delay: config.initial_backoff,
            max_delay: config.max_backoff,
        }
    }

    fn next_backoff(&mut self) -> Option<Duration> {
        if self.attempt >= self.max_retries {
            return None;
        }
        self.attempt += 1;
        let jitter = rand::rng().random_range(0.8..1.2);
        let delay = self.delay.mul_f64(jitter).min(self.max_delay);
        self.delay = (self.delay * 2).min(self.max_delay);
        Some(delay)
    }
}

/// Thin reqwest wrapper shared by the venue adapters.
#[derive(Debug, Clone)]
pub struct VenueHttpClient {
    client: reqwest::Client,
    config: ExchangeConfig,
}

impl VenueHttpClient {
    /// Build a client from config.
    pub fn new(config: ExchangeConfig) -> Result<Self, VenueError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| VenueError::Network(e.to_string()))?;
        Ok(Self { client, config })
    }

    /// Public GET with retry, for market data.
    pub async fn get_public<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &str,
    ) -> Result<T, VenueError> {
        let url = format!("{}{path}?{query}", self.config.base_url);
        let mut backoff = ExponentialBackoff::new(&self.config.retry);

        loop {
            match self.send_get(&url).await {
                Ok(value) => return Ok(value),
                Err(e @ (VenueError::Network(_) | VenueError::Http { status: 500..=599, .. })) => {
                    let Some(delay) = backoff.next_backoff() else {
                        tracing::warn!(error = %e, "Venue read failed, retries exhausted");
                        return Err(VenueError::MaxRetriesExceeded {
                            attempts: backoff.attempt + 1,
                            last: e.to_string(),
                        });
                    };
                    tracing::warn!(
                        error = %e,
                        delay_ms = delay.as_millis(),
                        attempt = backoff.attempt,
                        "Venue read failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Signed GET, single attempt.
    pub async fn get_signed<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &str,
    ) -> Result<T, VenueError> {
        let url = self.signed_url(path, query)?;
        let request = self
            .client
            .get(&url)
            .header("X-MBX-APIKEY", &self.config.api_key);
        Self::execute(request).await
    }

    /// Signed POST, single attempt. Never retried.
    pub async fn post_signed<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &str,
    ) -> Result<T, VenueError> {
        let url = self.signed_url(path, query)?;
        let request = self
            .client
            .post(&url)
            .header("X-MBX-APIKEY", &self.config.api_key);
        Self::execute(request).await
    }

    async fn send_get<T: DeserializeOwned>(&self, url: &str) -> Result<T, VenueError> {
        Self::execute(self.client.get(url)).await
    }

    async fn execute<T: DeserializeOwned>(request: reqwest::RequestBuilder) -> Result<T, VenueError> {
        let response = request
            .send()
            .await
            .map_err(|e| VenueError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| VenueError::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(VenueError::Http {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| VenueError::Decode(e.to_string()))
    }

    fn signed_url(&self, path: &str, query: &str) -> Result<String, VenueError> {
        if self.config.api_key.is_empty() || self.config.api_secret.is_empty() {
            return Err(VenueError::MissingCredentials);
        }

        let timestamp = chrono::Utc::now().timestamp_millis();
        let canonical = if query.is_empty() {
            format!("timestamp={timestamp}")
        } else {
            format!("{query}&timestamp={timestamp}")
        };

        let mut mac = HmacSha256::new_from_slice(self.config.api_secret.as_bytes())
            .map_err(|e| VenueError::Network(e.to_string()))?;
        mac.update(canonical.as_bytes());
        let signature = hex::encode(mac.finalize().into_bytes());

        Ok(format!(
            "{}{path}?{canonical}&signature={signature}",
            self.config.base_url
        ))
    }

    /// Kline interval configured for indicator computation.
    #[must_use]
    pub fn kline_interval(&self) -> &str {
        &self.config.kline_interval
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_respects_max_retries() {
        let config = RetryConfig {
            max_retries: 2,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(1),
        };
        let mut backoff = ExponentialBackoff::new(&config);
        assert!(backoff.next_backoff().is_some());
        assert!(backoff.next_backoff().is_some());
        assert!(backoff.next_backoff().is_none());
    }

    #[test]
    fn backoff_is_capped() {
        let config = RetryConfig {
            max_retries: 10,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(2),
        };
        let mut backoff = ExponentialBackoff::new(&config);
        for _ in 0..10 {
            let delay = backoff.next_backoff().unwrap();
            assert!(delay <= Duration::from_secs(2));
        }
    }

    #[test]
    fn signed_url_requires_credentials() {
        let client = VenueHttpClient::new(ExchangeConfig::default()).unwrap();
        let err = client.signed_url("/fapi/v2/account", "").unwrap_err();
        assert!(matches!(err, VenueError::MissingCredentials));
    }

    #[tokio::test]
    async fn retry_exhaustion_carries_last_error() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/fapi/v1/time"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let config = ExchangeConfig {
            base_url: server.uri(),
            retry: RetryConfig {
                max_retries: 1,
                initial_backoff: Duration::from_millis(1),
                max_backoff: Duration::from_millis(2),
            },
            ..Default::default()
        };
        let client = VenueHttpClient::new(config).unwrap();

        let err = client
            .get_public::<serde_json::Value>("/fapi/v1/time", "")
            .await
            .unwrap_err();
        match err {
            VenueError::MaxRetriesExceeded { attempts, last } => {
                assert_eq!(attempts, 2);
                assert!(last.contains("503"), "{last}");
                assert!(last.contains("maintenance"), "{last}");
            }
            other => panic!("expected MaxRetriesExceeded, got {other:?}"),
        }
    }

    #[test]
    fn signed_url_appends_signature() {
        let config = ExchangeConfig {
            api_key: "key".to_string(),
            api_secret: "secret".to_string(),
            ..Default::default()
        };
        let client = VenueHttpClient::new(config).unwrap();
        let url = client.signed_url("/fapi/v1/order", "symbol=BTCUSDT").unwrap();
        assert!(url.contains("symbol=BTCUSDT&timestamp="));
        assert!(url.contains("&signature="));
    }
}
