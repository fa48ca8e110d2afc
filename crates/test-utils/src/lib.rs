//! Shared helpers for bundlegate's integration tests: temporary projects,
//! a recording process runner, log capture and tracing setup.

pub mod builders;
pub mod fake_runner;
pub mod log_capture;

use std::sync::Once;

use tracing_subscriber::{EnvFilter, fmt};

static INIT: Once = Once::new();

/// Install a test subscriber once per test binary.
///
/// Output goes through the harness capture, so it only shows for failing
/// tests. `RUST_LOG` overrides the default of `bundlegate=debug`.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("warn,bundlegate=debug"));

        let _ = fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .try_init();
    });
}
