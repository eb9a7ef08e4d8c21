//! Logging setup for test runs
//!
//! Plain tracing to stderr, filtered through `RUST_LOG`. Test harnesses
//! call this once at the start of a run; repeated calls are no-ops so
//! every test can call it without coordination.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Initialize the tracing subscriber.
///
/// `RUST_LOG` controls filtering; unset defaults to `info`. Safe to
/// call from every test.
pub fn init_logging() {
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .try_init();
}
