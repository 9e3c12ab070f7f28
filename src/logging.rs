//! Diagnostic logging setup (`tracing`).
//!
//! User-facing output goes through `ui::messages`; this is for the
//! server, the cache and the counter tasks. `RUST_LOG` wins over the
//! configured level.

use tracing_subscriber::EnvFilter;

/// Install the global subscriber, writing to stderr. Safe to call twice.
pub fn init(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
