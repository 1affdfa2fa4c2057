//! Application use cases.

mod run_cycle;

pub use run_cycle::RunCycleUseCase;
