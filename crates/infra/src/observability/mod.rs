//! Tracing subscriber installation
//!
//! `RUST_LOG` takes precedence over the configured filter directive. Output
//! goes to stderr so command results on stdout stay machine-readable.

use suitelink_domain::{LoggingConfig, Result, SuiteLinkError};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber described by `config`.
///
/// Returns `Ok(false)` when a subscriber is already installed.
///
/// # Errors
/// Returns `SuiteLinkError::Config` for an invalid filter directive.
pub fn init_tracing(config: &LoggingConfig) -> Result<bool> {
    let filter = build_filter(config)?;
    let registry = tracing_subscriber::registry().with(filter);

    let installed = if config.json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(true).with_writer(std::io::stderr))
            .try_init()
    };

    Ok(installed.is_ok())
}

fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(&config.filter)
        .map_err(|e| SuiteLinkError::Config(format!("Invalid logging.filter '{}': {e}", config.filter)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_install_is_a_noop() {
        let config = LoggingConfig::default();
        let _ = init_tracing(&config).unwrap();
        assert!(!init_tracing(&config).unwrap());
    }

    #[test]
    fn invalid_directive_is_rejected() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        let config = LoggingConfig { filter: "info,[=".into(), json: false };
        assert!(matches!(build_filter(&config), Err(SuiteLinkError::Config(_))));
    }
}
