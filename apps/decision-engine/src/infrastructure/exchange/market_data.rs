//! Market data adapter over the venue's public REST endpoints.
//!
//! Builds one [`MarketSnapshot`] per instrument from the 24h ticker plus
//! recent klines, computing the indicator fields locally.

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

use super::http_client::VenueHttpClient;
use super::indicators;
use crate::application::ports::{MarketDataError, MarketDataPort};
use crate::models::{Instrument, MarketSnapshot};

/// Klines fetched per snapshot; enough for EMA(26) seeding plus history.
const KLINE_LIMIT: u32 = 100;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Ticker24h {
    last_price: String,
    high_price: String,
    low_price: String,
    volume: String,
    price_change_percent: String,
}

/// [`MarketDataPort`] adapter over the venue REST API.
#[derive(Debug, Clone)]
pub struct VenueMarketDataAdapter {
    http: VenueHttpClient,
}

impl VenueMarketDataAdapter {
    /// Create a new adapter sharing the given client.
    #[must_use]
    pub const fn new(http: VenueHttpClient) -> Self {
        Self { http }
    }

    async fn fetch_closes(&self, instrument: Instrument) -> Result<Vec<Decimal>, MarketDataError> {
        let query = format!(
            "symbol={}&interval={}&limit={KLINE_LIMIT}",
            instrument.venue_symbol(),
            self.http.kline_interval()
        );
        let klines: Vec<Vec<Value>> = self
            .http
            .get_public("/fapi/v1/klines", &query)
            .await
            .map_err(|e| fetch_failed(instrument, &e))?;

        // Kline element 4 is the close, encoded as a string.
        klines
            .iter()
            .map(|k| {
                k.get(4)
                    .and_then(Value::as_str)
                    .and_then(|s| s.parse().ok())
                    .ok_or_else(|| malformed(instrument, "kline close missing or non-numeric"))
            })
            .collect()
    }
}

#[async_trait]
impl MarketDataPort for VenueMarketDataAdapter {
    async fn get_snapshot(
        &self,
        instrument: Instrument,
    ) -> Result<MarketSnapshot, MarketDataError> {
        let query = format!("symbol={}", instrument.venue_symbol());
        let ticker: Ticker24h = self
            .http
            .get_public("/fapi/v1/ticker/24hr", &query)
            .await
            .map_err(|e| fetch_failed(instrument, &e))?;

        let closes = self.fetch_closes(instrument).await?;

        let ema_20 = indicators::ema(&closes, 20)
            .ok_or_else(|| malformed(instrument, "not enough klines for EMA(20)"))?;
        let macd = indicators::macd(&closes)
            .ok_or_else(|| malformed(instrument, "not enough klines for MACD"))?;
        let rsi_14 = indicators::rsi(&closes, 14)
            .ok_or_else(|| malformed(instrument, "not enough klines for RSI(14)"))?;

        Ok(MarketSnapshot {
            instrument,
            timestamp: Utc::now(),
            price: parse_field(instrument, "lastPrice", &ticker.last_price)?,
            high_24h: parse_field(instrument, "highPrice", &ticker.high_price)?,
            low_24h: parse_field(instrument, "lowPrice", &ticker.low_price)?,
            volume_24h: parse_field(instrument, "volume", &ticker.volume)?,
            change_24h_pct: parse_field(
                instrument,
                "priceChangePercent",
                &ticker.price_change_percent,
            )?,
            ema_20,
            macd,
            rsi_14,
        })
    }
}

fn parse_field(
    instrument: Instrument,
    name: &str,
    value: &str,
) -> Result<Decimal, MarketDataError> {
    value
        .parse()
        .map_err(|_| malformed(instrument, format!("{name} is not numeric: {value}")))
}

fn fetch_failed(instrument: Instrument, error: &dyn std::fmt::Display) -> MarketDataError {
    MarketDataError::FetchFailed {
        instrument,
        message: error.to_string(),
    }
}

fn malformed(instrument: Instrument, message: impl Into<String>) -> MarketDataError {
    MarketDataError::Malformed {
        instrument,
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::exchange::config::ExchangeConfig;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn kline(close: &str) -> Value {
        // open time, open, high, low, close, volume, ... (venue array form)
        json!([1_700_000_000_000_i64, "1", "1", "1", close, "10"])
    }

    async fn adapter_for(server: &MockServer) -> VenueMarketDataAdapter {
        let config = ExchangeConfig {
            base_url: server.uri(),
            ..Default::default()
        };
        VenueMarketDataAdapter::new(VenueHttpClient::new(config).unwrap())
    }

    #[tokio::test]
    async fn builds_snapshot_with_indicators() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/fapi/v1/ticker/24hr"))
            .and(query_param("symbol", "BTCUSDT"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "lastPrice": "50000.5",
                "highPrice": "51000",
                "lowPrice": "49000",
                "volume": "1234.5",
                "priceChangePercent": "1.25"
            })))
            .mount(&server)
            .await;
        let klines: Vec<Value> = (0..60).map(|_| kline("50000")).collect();
        Mock::given(method("GET"))
            .and(path("/fapi/v1/klines"))
            .respond_with(ResponseTemplate::new(200).set_body_json(klines))
            .mount(&server)
            .await;

        let snapshot = adapter_for(&server)
            .await
            .get_snapshot(Instrument::Btc)
            .await
            .unwrap();

        assert_eq!(snapshot.price.to_string(), "50000.5");
        assert_eq!(snapshot.ema_20.to_string(), "50000");
        assert_eq!(snapshot.macd.to_string(), "0");
    }

    #[tokio::test]
    async fn venue_failure_is_per_instrument_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/fapi/v1/ticker/24hr"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = adapter_for(&server)
            .await
            .get_snapshot(Instrument::Eth)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            MarketDataError::FetchFailed {
                instrument: Instrument::Eth,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn short_history_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/fapi/v1/ticker/24hr"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "lastPrice": "1", "highPrice": "1", "lowPrice": "1",
                "volume": "1", "priceChangePercent": "0"
            })))
            .mount(&server)
            .await;
        let klines: Vec<Value> = (0..5).map(|_| kline("1")).collect();
        Mock::given(method("GET"))
            .and(path("/fapi/v1/klines"))
            .respond_with(ResponseTemplate::new(200).set_body_json(klines))
            .mount(&server)
            .await;

        let err = adapter_for(&server)
            .await
            .get_snapshot(Instrument::Sol)
            .await
            .unwrap_err();
        assert!(matches!(err, MarketDataError::Malformed { .. }));
    }
}
