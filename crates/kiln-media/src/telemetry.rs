//! Tracing initialization for binaries and tests.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the tracing subscriber with an env-filter.
///
/// Safe to call more than once; later calls are no-ops so integration tests
/// can each request telemetry without coordinating.
pub fn init_telemetry() {
    let result = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "kiln=debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .try_init();

    if result.is_ok() {
        tracing::debug!("Telemetry initialized");
    }
}
