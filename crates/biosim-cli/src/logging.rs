//! Tracing subscriber setup for the command-line runner.

use anyhow::{anyhow, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber. Logs go to stderr so stdout stays free for data.
pub fn init_logging(json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,biosim_world=info".into());

    let registry = tracing_subscriber::registry().with(filter);

    let installed = if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()
    };

    installed.map_err(|e| anyhow!("failed to install tracing subscriber: {}", e))
}
