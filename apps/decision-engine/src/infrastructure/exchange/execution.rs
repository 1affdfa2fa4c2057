//! Live execution adapter over the venue's signed order endpoints.
//!
//! Order placement is never retried: a network blip after send could mean
//! the order exists, and a blind resend would double it. The orchestrator
//! records the failure instead.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;

use super::http_client::{VenueError, VenueHttpClient};
use crate::application::ports::{ExecutionError, ExecutionPort, Fill};
use crate::models::Instrument;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VenueOrder {
    order_id: u64,
    #[serde(default)]
    avg_price: String,
    #[serde(default)]
    executed_qty: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PositionRisk {
    position_amt: String,
    #[serde(default)]
    mark_price: String,
}

/// [`ExecutionPort`] adapter placing market orders on the venue.
#[derive(Debug, Clone)]
pub struct VenueExecutionAdapter {
    http: VenueHttpClient,
}

impl VenueExecutionAdapter {
    /// Create a new adapter sharing the given client.
    #[must_use]
    pub const fn new(http: VenueHttpClient) -> Self {
        Self { http }
    }

    async fn open_position_amt(
        &self,
        instrument: Instrument,
    ) -> Result<(Decimal, Decimal), ExecutionError> {
        let query = format!("symbol={}", instrument.venue_symbol());
        let rows: Vec<PositionRisk> = self
            .http
            .get_signed("/fapi/v2/positionRisk", &query)
            .await
            .map_err(map_venue_error)?;

        let row = rows.first().ok_or(ExecutionError::NoPosition { instrument })?;
        let amt: Decimal = row.position_amt.parse().unwrap_or(Decimal::ZERO);
        if amt.is_zero() {
            return Err(ExecutionError::NoPosition { instrument });
        }
        let mark = row.mark_price.parse().unwrap_or(Decimal::ZERO);
        Ok((amt, mark))
    }

    async fn place_market_order(
        &self,
        instrument: Instrument,
        side: &str,
        quantity: Decimal,
        reduce_only: bool,
    ) -> Result<Fill, ExecutionError> {
        let mut query = format!(
            "symbol={}&side={side}&type=MARKET&quantity={quantity}&newOrderRespType=RESULT",
            instrument.venue_symbol()
        );
        if reduce_only {
            query.push_str("&reduceOnly=true");
        }

        let order: VenueOrder = self
            .http
            .post_signed("/fapi/v1/order", &query)
            .await
            .map_err(map_venue_error)?;

        Ok(Fill {
            order_id: order.order_id.to_string(),
            price: order.avg_price.parse().unwrap_or(Decimal::ZERO),
            amount: order.executed_qty.parse().unwrap_or(quantity),
        })
    }

    async fn place_protective(
        &self,
        instrument: Instrument,
        close_side: &str,
        order_type: &str,
        stop_price: Decimal,
    ) -> Result<(), ExecutionError> {
        let query = format!(
            "symbol={}&side={close_side}&type={order_type}&stopPrice={}&closePosition=true",
            instrument.venue_symbol(),
            stop_price.round_dp(2),
        );
        let _: VenueOrder = self
            .http
            .post_signed("/fapi/v1/order", &query)
            .await
            .map_err(map_venue_error)?;
        Ok(())
    }

    /// Place stop-loss / take-profit orders around a reference price for a
    /// long position. Percentages are distances from the reference.
    async fn apply_protective_orders(
        &self,
        instrument: Instrument,
        reference_price: Decimal,
        stop_loss_pct: Option<Decimal>,
        take_profit_pct: Option<Decimal>,
    ) -> Result<(), ExecutionError> {
        let hundred = Decimal::ONE_HUNDRED;
        if let Some(sl) = stop_loss_pct {
            let stop = reference_price * (hundred - sl) / hundred;
            self.place_protective(instrument, "SELL", "STOP_MARKET", stop)
                .await?;
        }
        if let Some(tp) = take_profit_pct {
            let target = reference_price * (hundred + tp) / hundred;
            self.place_protective(instrument, "SELL", "TAKE_PROFIT_MARKET", target)
                .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl ExecutionPort for VenueExecutionAdapter {
    async fn buy(
        &self,
        instrument: Instrument,
        price: Decimal,
        amount: Decimal,
        leverage: u32,
        stop_loss_pct: Option<Decimal>,
        take_profit_pct: Option<Decimal>,
    ) -> Result<Fill, ExecutionError> {
        // Leverage must be set before the entry order.
        let query = format!(
            "symbol={}&leverage={leverage}",
            instrument.venue_symbol()
        );
        let _: serde_json::Value = self
            .http
            .post_signed("/fapi/v1/leverage", &query)
            .await
            .map_err(map_venue_error)?;

        let fill = self
            .place_market_order(instrument, "BUY", amount, false)
            .await?;

        // Protective order failures after a confirmed fill are logged, not
        // surfaced: the entry already happened.
        let reference = if fill.price.is_zero() { price } else { fill.price };
        if let Err(e) = self
            .apply_protective_orders(instrument, reference, stop_loss_pct, take_profit_pct)
            .await
        {
            tracing::warn!(%instrument, error = %e, "Protective order placement failed after fill");
        }

        Ok(fill)
    }

    async fn sell(
        &self,
        instrument: Instrument,
        percentage: Decimal,
    ) -> Result<Fill, ExecutionError> {
        let (position_amt, _) = self.open_position_amt(instrument).await?;
        let close_qty = (position_amt.abs() * percentage / Decimal::ONE_HUNDRED).round_dp(6);
        if close_qty.is_zero() {
            return Err(ExecutionError::Rejected {
                reason: format!("Close quantity rounds to zero for {percentage}%"),
            });
        }

        let side = if position_amt > Decimal::ZERO { "SELL" } else { "BUY" };
        self.place_market_order(instrument, side, close_qty, true)
            .await
    }

    async fn set_protective(
        &self,
        instrument: Instrument,
        stop_loss_pct: Option<Decimal>,
        take_profit_pct: Option<Decimal>,
    ) -> Result<(), ExecutionError> {
        let (_, mark_price) = self.open_position_amt(instrument).await?;
        self.apply_protective_orders(instrument, mark_price, stop_loss_pct, take_profit_pct)
            .await
    }
}

fn map_venue_error(error: VenueError) -> ExecutionError {
    match error {
        VenueError::Http { status, body } if status < 500 => ExecutionError::Rejected {
            reason: format!("HTTP {status}: {body}"),
        },
        other => ExecutionError::Network {
            message: other.to_string(),
        },
    }
}
