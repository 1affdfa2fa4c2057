//! Application layer - use cases, services and port definitions.

pub mod ports;
pub mod services;
pub mod use_cases;
