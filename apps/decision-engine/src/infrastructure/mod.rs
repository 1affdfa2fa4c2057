//! Infrastructure layer: adapters implementing the application ports
//! against real services (venue REST API, chat-completion oracle, SQLite
//! ledger) plus in-memory doubles for simulation and testing.

pub mod exchange;
pub mod oracle;
pub mod persistence;
pub mod simulation;

pub use simulation::SimulatedExchange;
