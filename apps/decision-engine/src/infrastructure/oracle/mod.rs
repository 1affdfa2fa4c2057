//! Decision oracle adapter: OpenAI-compatible chat API with strict output
//! schema validation.

mod client;
pub mod schema;

pub use client::{ChatOracleAdapter, OracleConfig};
