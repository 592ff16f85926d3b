//! Structured logging setup
//!
//! Installs a `tracing` subscriber once per process. `RUST_LOG` takes
//! precedence over the configured level.

use std::sync::atomic::{AtomicBool, Ordering};
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Registry};

use crate::config::LoggingConfig;
use crate::errors::{BridgeError, Result};

static LOGGING_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Initialize the global subscriber; later calls are no-ops
///
/// Only the `tracing` dispatcher is set. A `log` logger installed elsewhere
/// in the process does not make this fail.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    if LOGGING_INITIALIZED.swap(true, Ordering::SeqCst) {
        return Ok(());
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("spectrum_bridge={},warn", config.level)));

    let registry = Registry::default().with(filter);

    let outcome = if config.json {
        tracing::subscriber::set_global_default(
            registry.with(fmt::layer().json().with_target(true).with_writer(std::io::stderr)),
        )
    } else {
        tracing::subscriber::set_global_default(
            registry.with(fmt::layer().with_target(false).with_writer(std::io::stderr)),
        )
    };

    outcome.map_err(|e| {
        LOGGING_INITIALIZED.store(false, Ordering::SeqCst);
        BridgeError::ConfigError(format!("Failed to initialize logging: {}", e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prop_trivial(n: u8) -> bool {
        n.checked_add(0) == Some(n)
    }

    #[test]
    fn test_init_is_idempotent() {
        let config = LoggingConfig::default();
        assert!(init_logging(&config).is_ok());
        assert!(init_logging(&config).is_ok());
    }

    #[test]
    fn test_init_after_log_logger_installed() {
        // quickcheck installs its own `log` logger before running a property
        quickcheck::QuickCheck::new().tests(1).quickcheck(prop_trivial as fn(u8) -> bool);

        let config = LoggingConfig::default();
        assert!(init_logging(&config).is_ok());
    }
}
