//! Risk policy: pure, stateless allow/deny checks applied before any
//! capital is committed.

mod policy;

pub use policy::{RiskLimits, Verdict, check_buy_risk, check_daily_loss_limit};
