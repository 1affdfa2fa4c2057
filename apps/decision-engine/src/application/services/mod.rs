//! Application services.

pub mod prompt;

pub use prompt::build_prompt;
