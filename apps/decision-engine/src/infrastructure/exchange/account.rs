//! Account adapter over the venue's signed account endpoint.

use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Deserialize;

use super::http_client::VenueHttpClient;
use crate::application::ports::{AccountError, AccountPort};
use crate::models::{AccountState, Instrument, Position, PositionSide};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VenueAccount {
    total_wallet_balance: String,
    available_balance: String,
    #[serde(default)]
    positions: Vec<VenuePosition>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VenuePosition {
    symbol: String,
    position_amt: String,
    entry_price: String,
    #[serde(default)]
    mark_price: String,
    unrealized_profit: String,
    leverage: String,
}

/// [`AccountPort`] adapter over the venue REST API.
#[derive(Debug, Clone)]
pub struct VenueAccountAdapter {
    http: VenueHttpClient,
}

impl VenueAccountAdapter {
    /// Create a new adapter sharing the given client.
    #[must_use]
    pub const fn new(http: VenueHttpClient) -> Self {
        Self { http }
    }
}

#[async_trait]
impl AccountPort for VenueAccountAdapter {
    async fn get_account_state(
        &self,
        capital_override: Option<Decimal>,
    ) -> Result<AccountState, AccountError> {
        let account: VenueAccount = self
            .http
            .get_signed("/fapi/v2/account", "")
            .await
            .map_err(|e| AccountError::Unavailable {
                message: e.to_string(),
            })?;

        let total_equity = capital_override
            .map_or_else(|| parse(&account.total_wallet_balance, "totalWalletBalance"), Ok)?;
        let available_cash = parse(&account.available_balance, "availableBalance")?;

        let mut positions = Vec::new();
        for raw in &account.positions {
            // The venue reports a row per symbol even when flat.
            let size = parse(&raw.position_amt, "positionAmt")?;
            if size.is_zero() {
                continue;
            }
            // Symbols outside our universe (manually traded pairs) are
            // ignored rather than treated as errors.
            let Ok(instrument) = Instrument::parse(&raw.symbol) else {
                continue;
            };
            positions.push(Position {
                instrument,
                side: if size > Decimal::ZERO {
                    PositionSide::Long
                } else {
                    PositionSide::Short
                },
                size: size.abs(),
                entry_price: parse(&raw.entry_price, "entryPrice")?,
                mark_price: parse(&raw.mark_price, "markPrice").unwrap_or(Decimal::ZERO),
                leverage: parse(&raw.leverage, "leverage")?.to_u32().unwrap_or(1),
                unrealized_pnl: parse(&raw.unrealized_profit, "unrealizedProfit")?,
            });
        }

        Ok(AccountState {
            total_equity,
            available_cash,
            positions,
        })
    }
}

fn parse(value: &str, field: &str) -> Result<Decimal, AccountError> {
    value.parse().map_err(|_| AccountError::Unavailable {
        message: format!("account field {field} is not numeric: {value}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::exchange::config::ExchangeConfig;
    use rust_decimal_macros::dec;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn adapter_for(server: &MockServer) -> VenueAccountAdapter {
        let config = ExchangeConfig {
            base_url: server.uri(),
            api_key: "key".to_string(),
            api_secret: "secret".to_string(),
            ..Default::default()
        };
        VenueAccountAdapter::new(VenueHttpClient::new(config).unwrap())
    }

    #[tokio::test]
    async fn maps_open_positions_and_skips_flat_rows() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/fapi/v2/account"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "totalWalletBalance": "10000",
                "availableBalance": "7500",
                "positions": [
                    { "symbol": "BTCUSDT", "positionAmt": "0.5", "entryPrice": "50000",
                      "markPrice": "50500", "unrealizedProfit": "250", "leverage": "10" },
                    { "symbol": "ETHUSDT", "positionAmt": "0", "entryPrice": "0",
                      "markPrice": "0", "unrealizedProfit": "0", "leverage": "20" },
                    { "symbol": "LTCUSDT", "positionAmt": "3", "entryPrice": "80",
                      "markPrice": "81", "unrealizedProfit": "3", "leverage": "5" }
                ]
            })))
            .mount(&server)
            .await;

        let state = adapter_for(&server)
            .await
            .get_account_state(None)
            .await
            .unwrap();

        assert_eq!(state.total_equity, dec!(10000));
        assert_eq!(state.available_cash, dec!(7500));
        // Flat ETH row and out-of-universe LTC row are both skipped.
        assert_eq!(state.positions.len(), 1);
        assert_eq!(state.positions[0].instrument, Instrument::Btc);
        assert_eq!(state.positions[0].leverage, 10);
    }

    #[tokio::test]
    async fn capital_override_replaces_equity() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/fapi/v2/account"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "totalWalletBalance": "10000",
                "availableBalance": "10000",
                "positions": []
            })))
            .mount(&server)
            .await;

        let state = adapter_for(&server)
            .await
            .get_account_state(Some(dec!(500)))
            .await
            .unwrap();
        assert_eq!(state.total_equity, dec!(500));
    }

    #[tokio::test]
    async fn venue_failure_is_fatal_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/fapi/v2/account"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = adapter_for(&server)
            .await
            .get_account_state(None)
            .await
            .unwrap_err();
        assert!(matches!(err, AccountError::Unavailable { .. }));
    }
}
