//! Tracing setup for `fastplan`.
//!
//! Plan loading reports skipped entries at `warn`, mutations and views log at
//! `debug`. Everything goes to stderr; stdout carries only command output.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the subscriber used by the CLI
///
/// Shows warnings only, so a skipped plan entry is visible but routine
/// loads stay quiet. Set `RUST_LOG=debug` to trace dispatch and edits.
pub fn init() {
    init_with_level("warn")
}

/// Install the subscriber with `default_level` unless `RUST_LOG` is set
pub fn init_with_level(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .init();
}

/// Route debug output through the test harness; safe to call from every test
#[cfg(test)]
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(EnvFilter::new("debug"))
        .try_init();
}
