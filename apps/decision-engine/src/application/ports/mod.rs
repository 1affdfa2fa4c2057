//! Application Ports (Driven)
//!
//! Ports define the interfaces through which the decision loop consumes its
//! external collaborators: market data, account state, the decision oracle,
//! order execution, and the decision ledger.

mod account_port;
mod execution_port;
mod ledger_port;
mod market_data_port;
mod oracle_port;

pub use account_port::{AccountError, AccountPort};
pub use execution_port::{ExecutionError, ExecutionPort, Fill};
pub use ledger_port::{LedgerError, LedgerPort};
pub use market_data_port::{MarketDataError, MarketDataPort};
pub use oracle_port::{OracleError, OraclePort};
