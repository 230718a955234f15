//! Diagnostics setup. Logs go to stderr so stdout stays reserved for the
//! scripting calls meant for the content surface.

use anyhow::Result;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when `RUST_LOG` is unset.
pub fn default_filter(verbose: bool) -> &'static str {
    if verbose { "misik=debug,info" } else { "misik=info,warn" }
}

/// Install the global subscriber. `RUST_LOG` overrides `verbose`.
pub fn init(verbose: bool) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(verbose),
        )
        .try_init()?;

    tracing::debug!(verbose, "logging initialized");
    Ok(())
}
