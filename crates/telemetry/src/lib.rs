//! Tracing/logging bootstrap for biblio.

use biblio_kernel::settings::{LogFormat, TelemetrySettings};
use tracing_subscriber::EnvFilter;

/// Initialize the global tracing subscriber from telemetry settings.
///
/// `RUST_LOG` takes precedence over the configured level when set.
pub fn init(settings: &TelemetrySettings) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.level.clone()));

    let result = match settings.log_format {
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .try_init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .try_init(),
    };

    // A subscriber may already be installed (tests); that is not fatal.
    if let Err(err) = result {
        tracing::debug!(target: "biblio-telemetry", %err, "tracing subscriber already set");
    }

    Ok(())
}
