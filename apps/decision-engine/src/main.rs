//! Decision Engine Binary
//!
//! Runs one decision cycle and exits. An external scheduler (cron,
//! systemd timer) drives the cadence; the process exits non-zero when the
//! cycle fails fatally so the scheduler can alert.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin decision-engine
//! ```
//!
//! # Environment Variables
//!
//! ## Required
//! - `ORACLE_API_KEY`: Bearer token for the chat-completion API
//! - `EXCHANGE_API_KEY` / `EXCHANGE_API_SECRET`: Venue credentials
//!   (LIVE mode only)
//!
//! ## Optional
//! - `TRADING_MODE`: LIVE | SIMULATED (default: SIMULATED)
//! - `INSTRUMENTS`: Comma-separated tickers (default: BTC,ETH,SOL,BNB,XRP)
//! - `ORACLE_API_BASE`: Chat API base URL (default: <https://api.openai.com/v1>)
//! - `ORACLE_MODEL`: Model identifier (default: gpt-4o)
//! - `ORACLE_TIMEOUT_SECS`: Hard oracle timeout (default: 120)
//! - `EXCHANGE_BASE_URL`: Venue REST base URL
//! - `KLINE_INTERVAL`: Candle interval for indicators (default: 15m)
//! - `INITIAL_CAPITAL`: Capital base override for risk sizing
//! - `MAX_LEVERAGE` / `MAX_POSITION_FRACTION` / `MAX_DAILY_LOSS_FRACTION`
//! - `LEDGER_PATH`: SQLite ledger file (default: decisions.db)
//! - `RUST_LOG`: Log level (default: info)

use std::sync::Arc;

use rust_decimal_macros::dec;

use decision_engine::application::use_cases::RunCycleUseCase;
use decision_engine::config::{EngineConfig, TradingMode};
use decision_engine::infrastructure::exchange::{
    VenueAccountAdapter, VenueExecutionAdapter, VenueHttpClient, VenueMarketDataAdapter,
};
use decision_engine::infrastructure::oracle::ChatOracleAdapter;
use decision_engine::infrastructure::persistence::TursoLedger;
use decision_engine::infrastructure::simulation::SimulatedExchange;
use decision_engine::models::CycleRecord;
use decision_engine::observability::init_tracing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env is a local development convenience; absence is fine.
    let _ = dotenvy::dotenv();
    init_tracing();

    tracing::info!("Starting decision engine");

    let config = EngineConfig::from_env()?;
    tracing::info!(
        mode = %config.mode,
        instruments = ?config.instruments,
        max_leverage = config.limits.max_leverage,
        "Configuration loaded"
    );

    let record = match config.mode {
        TradingMode::Live => run_live(&config).await?,
        TradingMode::Simulated => run_simulated(&config).await?,
    };

    tracing::info!(
        cycle_id = %record.id,
        trades = record.trades.len(),
        "Cycle persisted, exiting"
    );
    Ok(())
}

/// Wire the live adapters and run one cycle against the venue.
async fn run_live(config: &EngineConfig) -> anyhow::Result<CycleRecord> {
    let http = VenueHttpClient::new(config.exchange.clone())?;
    let market_data = Arc::new(VenueMarketDataAdapter::new(http.clone()));
    let account = Arc::new(VenueAccountAdapter::new(http.clone()));
    let execution = Arc::new(VenueExecutionAdapter::new(http));
    let oracle = Arc::new(ChatOracleAdapter::new(config.oracle.clone())?);
    let ledger = Arc::new(TursoLedger::open(&config.ledger_path).await?);

    let use_case = RunCycleUseCase::new(
        market_data,
        account,
        oracle,
        execution,
        ledger,
        config.instruments.clone(),
        config.limits.clone(),
        config.oracle.timeout,
    );
    Ok(use_case.execute(config.initial_capital).await?)
}

/// Wire the paper-trading adapters: real public market data, simulated
/// account and execution.
async fn run_simulated(config: &EngineConfig) -> anyhow::Result<CycleRecord> {
    let http = VenueHttpClient::new(config.exchange.clone())?;
    let market_data = Arc::new(VenueMarketDataAdapter::new(http));
    let simulator = Arc::new(SimulatedExchange::new(
        config.initial_capital.unwrap_or(dec!(10000)),
    ));
    let oracle = Arc::new(ChatOracleAdapter::new(config.oracle.clone())?);
    let ledger = Arc::new(TursoLedger::open(&config.ledger_path).await?);

    let use_case = RunCycleUseCase::new(
        market_data,
        Arc::clone(&simulator),
        oracle,
        simulator,
        ledger,
        config.instruments.clone(),
        config.limits.clone(),
        config.oracle.timeout,
    );
    Ok(use_case.execute(config.initial_capital).await?)
}
