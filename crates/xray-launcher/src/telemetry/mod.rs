//! Launcher logging.
//!
//! Events are JSON lines on stderr. After the hand-off xray owns the
//! inherited stdout, and anything the launcher printed there would be mixed
//! into the proxy's own output stream.

use anyhow::Result;
use tracing_subscriber::EnvFilter;

/// Install the stderr JSON subscriber. `RUST_LOG` overrides `log_level` when set.
///
/// # Errors
///
/// Returns an error if the subscriber has already been set.
pub fn init(log_level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialise xray-launcher tracing subscriber: {e}"))
}
