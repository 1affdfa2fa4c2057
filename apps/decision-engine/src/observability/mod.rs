//! Logging initialization.

use tracing_subscriber::EnvFilter;

/// Initialize the tracing subscriber with environment filter.
///
/// `RUST_LOG` overrides; the default keeps the engine at `info`.
///
/// Uses a static directive string that is a compile-time constant
/// guaranteed to parse.
#[allow(clippy::expect_used)]
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(
                "decision_engine=info"
                    .parse()
                    .expect("static directive 'decision_engine=info' is valid"),
            ),
        )
        .init();
}
