//! Tracing/logging initialization.

use tracing_subscriber::EnvFilter;

/// Directives used when `RUST_LOG` is unset: third-party noise capped at
/// warn, the workspace crates at info so mutations, sweeps and delivery
/// outcomes always show. Bump a single crate for debugging, e.g.
/// `RUST_LOG=warn,scalekeeper_dispatch=debug`.
const DEFAULT_DIRECTIVES: &str = "warn,scalekeeper_core=info,scalekeeper_ledger=info,\
    scalekeeper_inventory=info,scalekeeper_forecast=info,scalekeeper_schedule=info,\
    scalekeeper_dispatch=info";

/// Initialize tracing/logging for the process.
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));

    // JSON logs with targets, so per-crate filtering works in production.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(true)
        .try_init();
}
