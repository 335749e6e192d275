//! Tracing subscriber initialization.

use toggly_core::ConfigError;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, TelemetryConfig};

/// Build the `EnvFilter` for a config.
pub fn env_filter(config: &TelemetryConfig) -> Result<EnvFilter, ConfigError> {
    EnvFilter::try_new(&config.filter).map_err(|e| ConfigError::InvalidValue {
        field: "TOGGLY_LOG".to_string(),
        value: config.filter.clone(),
        reason: e.to_string(),
    })
}

/// Install the global tracing subscriber.
///
/// Returns `Ok(false)` when a global subscriber was already installed, which
/// is expected when several tests or embedders initialize logging.
pub fn init_tracing(config: &TelemetryConfig) -> Result<bool, ConfigError> {
    let filter = env_filter(config)?;
    let (json, pretty) = match config.format {
        LogFormat::Json => (Some(fmt::layer().json()), None),
        LogFormat::Pretty => (None, Some(fmt::layer())),
    };

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(json)
        .with(pretty)
        .try_init()
        .is_ok();

    if installed {
        tracing::info!(filter = %config.filter, format = %config.format, "Tracing initialized");
    }
    Ok(installed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_filter_rejected() {
        let config = TelemetryConfig::default().with_filter("toggly_engine=notalevel");
        assert!(matches!(
            env_filter(&config),
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "TOGGLY_LOG"
        ));
    }

    #[test]
    fn test_second_init_is_not_an_error() {
        let config = TelemetryConfig::default().with_format(LogFormat::Json);
        let first = init_tracing(&config).unwrap();
        let second = init_tracing(&config).unwrap();
        assert!(!second || !first);
    }
}
