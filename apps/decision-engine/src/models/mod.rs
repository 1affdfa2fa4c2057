//! Core data model: instruments, snapshots, account state, decisions and
//! the persisted records they produce.

mod account;
pub mod decision;
mod instrument;
mod record;
mod snapshot;

pub use account::{AccountState, Position, PositionSide};
pub use decision::{
    BuyParams, Decision, HoldParams, Operation, OperationKind, OracleProposal, SellParams,
    TrendDirection, TrendPrediction, ValidBuy,
};
pub use instrument::{Instrument, UnknownInstrument};
pub use record::{CycleRecord, TradeRecord, TradeRecordBuilder};
pub use snapshot::MarketSnapshot;
