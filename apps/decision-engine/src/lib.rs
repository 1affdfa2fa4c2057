// Allow unwrap/expect in tests - tests should panic on unexpected errors
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::too_many_lines,
        clippy::match_same_arms,
        clippy::needless_pass_by_value,
        clippy::default_trait_access,
        clippy::items_after_statements
    )
)]

//! Decision Engine - Core Library
//!
//! Automated trading decision loop: each cycle collects market snapshots
//! for a fixed instrument universe, asks a generative model for
//! per-instrument decisions, risk-gates every decision against hard limits,
//! executes what survives sequentially with running-balance tracking, and
//! persists the full decision trail.
//!
//! # Architecture (Clean Architecture + Hexagonal)
//!
//! ## Layers (inside → outside)
//!
//! - **Models**: Plain data (instruments, snapshots, decisions, records)
//! - **Risk**: Pure gating policy, no I/O
//! - **Application**: The `RunCycle` use case and the driven ports it
//!   depends on (`MarketDataPort`, `AccountPort`, `OraclePort`,
//!   `ExecutionPort`, `LedgerPort`)
//! - **Infrastructure**: Adapters
//!   - `exchange`: venue REST adapters (market data, account, execution)
//!   - `oracle`: OpenAI-compatible chat adapter with schema validation
//!   - `persistence`: SQLite ledger (turso) and an in-memory double
//!   - `simulation`: paper-trading exchange double
//!
//! # Trust boundary
//!
//! The oracle is untrusted: its output is schema-validated before any
//! field reaches the risk gate, and the risk gate is the only thing that
//! can approve capital commitment.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

/// Domain models - plain data with no I/O.
pub mod models;

/// Risk policy - pure decision gating.
pub mod risk;

/// Application layer - the run-cycle use case and port definitions.
pub mod application;

/// Infrastructure layer - adapters and external integrations.
pub mod infrastructure;

/// Environment configuration with startup validation.
pub mod config;

/// Logging initialization.
pub mod observability;

/// Cycle-level error taxonomy.
pub mod error;

pub use application::use_cases::RunCycleUseCase;
pub use error::CycleError;
pub use models::{
    AccountState, CycleRecord, Decision, Instrument, MarketSnapshot, Operation, OracleProposal,
    TradeRecord,
};
pub use risk::RiskLimits;
