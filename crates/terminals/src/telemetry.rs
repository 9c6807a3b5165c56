//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::{LogFormat, TerminalConfig};

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured level when it parses. Returns false
/// if a subscriber was already installed.
pub fn init_tracing(config: &TerminalConfig) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    let installed = match config.log_format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).try_init(),
    };

    match installed {
        Ok(()) => {
            tracing::info!(
                terminal_id = %config.terminal_id,
                role = %config.role,
                "tracing initialized"
            );
            true
        }
        Err(_) => false,
    }
}
