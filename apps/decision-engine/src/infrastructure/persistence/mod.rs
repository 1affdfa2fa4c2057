//! Ledger adapters.

pub mod in_memory;
pub mod turso;

pub use in_memory::InMemoryLedger;
pub use self::turso::TursoLedger;
