//! Venue (exchange) adapters: signed REST client, market data with local
//! indicator computation, account state, and live order execution.

pub mod account;
pub mod config;
pub mod execution;
pub mod http_client;
pub mod indicators;
pub mod market_data;

pub use account::VenueAccountAdapter;
pub use config::{ExchangeConfig, RetryConfig};
pub use execution::VenueExecutionAdapter;
pub use http_client::{VenueError, VenueHttpClient};
pub use market_data::VenueMarketDataAdapter;
