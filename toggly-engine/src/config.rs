//! Engine Configuration Module
//!
//! Cache and logging settings, loaded from environment variables with
//! defaults suitable for development.

use std::fmt;
use std::time::Duration;

use toggly_core::ConfigError;

// ============================================================================
// CACHE CONFIGURATION
// ============================================================================

/// Settings for the caching decorator and its in-memory backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Whether responses are cached at all.
    pub enabled: bool,

    /// Entry lifetime. `None` keeps entries until they are flushed.
    pub ttl: Option<Duration>,

    /// Upper bound on stored entries. `None` means unbounded.
    pub max_entries: Option<usize>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl: None,
            max_entries: Some(10_000),
        }
    }
}

impl CacheConfig {
    /// Caching turned off.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ttl: None,
            max_entries: None,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = Some(max_entries);
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.enabled {
            if self.ttl.is_some() {
                return Err(ConfigError::IncompatibleOptions {
                    option_a: "cache disabled".to_string(),
                    option_b: "cache ttl".to_string(),
                });
            }
            return Ok(());
        }
        if self.ttl == Some(Duration::ZERO) {
            return Err(ConfigError::InvalidValue {
                field: "cache.ttl".to_string(),
                value: "0".to_string(),
                reason: "ttl must be positive".to_string(),
            });
        }
        if self.max_entries == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "cache.max_entries".to_string(),
                value: "0".to_string(),
                reason: "max_entries must be positive".to_string(),
            });
        }
        Ok(())
    }
}

// ============================================================================
// TELEMETRY CONFIGURATION
// ============================================================================

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

impl LogFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pretty" | "text" => Some(Self::Pretty),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pretty => f.write_str("pretty"),
            Self::Json => f.write_str("json"),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// `EnvFilter` directive string, e.g. `"toggly_engine=debug,info"`.
    pub filter: String,
    pub format: LogFormat,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            filter: "toggly_engine=info,toggly_storage=info,warn".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

impl TelemetryConfig {
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }
}

// ============================================================================
// ENGINE CONFIGURATION
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineConfig {
    pub cache: CacheConfig,
    pub telemetry: TelemetryConfig,
}

impl EngineConfig {
    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_telemetry(mut self, telemetry: TelemetryConfig) -> Self {
        self.telemetry = telemetry;
        self
    }

    /// Create EngineConfig from environment variables.
    ///
    /// Environment variables:
    /// - `TOGGLY_CACHE_ENABLED`: "true" or "false" (default: true)
    /// - `TOGGLY_CACHE_TTL_SECS`: Entry lifetime in seconds (default: none)
    /// - `TOGGLY_CACHE_MAX_ENTRIES`: Entry limit (default: 10000)
    /// - `TOGGLY_LOG`: `EnvFilter` directives
    /// - `TOGGLY_LOG_FORMAT`: "pretty" or "json" (default: pretty)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let enabled = match lookup("TOGGLY_CACHE_ENABLED") {
            Some(raw) => parse_bool("TOGGLY_CACHE_ENABLED", &raw)?,
            None => defaults.cache.enabled,
        };

        let ttl = lookup("TOGGLY_CACHE_TTL_SECS")
            .map(|raw| parse_number::<u64>("TOGGLY_CACHE_TTL_SECS", &raw))
            .transpose()?
            .map(Duration::from_secs);

        let max_entries = match lookup("TOGGLY_CACHE_MAX_ENTRIES") {
            Some(raw) => Some(parse_number::<usize>("TOGGLY_CACHE_MAX_ENTRIES", &raw)?),
            None if enabled => defaults.cache.max_entries,
            None => None,
        };

        let filter = lookup("TOGGLY_LOG").unwrap_or(defaults.telemetry.filter);

        let format = match lookup("TOGGLY_LOG_FORMAT") {
            Some(raw) => LogFormat::parse(&raw).ok_or_else(|| ConfigError::InvalidValue {
                field: "TOGGLY_LOG_FORMAT".to_string(),
                value: raw.clone(),
                reason: "expected \"pretty\" or \"json\"".to_string(),
            })?,
            None => defaults.telemetry.format,
        };

        let config = Self {
            cache: CacheConfig {
                enabled,
                ttl,
                max_entries,
            },
            telemetry: TelemetryConfig { filter, format },
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.cache.validate()?;
        if self.telemetry.filter.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "TOGGLY_LOG".to_string(),
                value: self.telemetry.filter.clone(),
                reason: "filter must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

fn parse_bool(field: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            field: field.to_string(),
            value: raw.to_string(),
            reason: "expected a boolean".to_string(),
        }),
    }
}

fn parse_number<T: std::str::FromStr>(field: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        field: field.to_string(),
        value: raw.to_string(),
        reason: "expected a non-negative integer".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert!(config.cache.enabled);
        assert_eq!(config.cache.ttl, None);
        assert_eq!(config.cache.max_entries, Some(10_000));
        assert_eq!(config.telemetry.format, LogFormat::Pretty);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_environment_gives_defaults() {
        let config = EngineConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_from_lookup_reads_all_variables() {
        let config = EngineConfig::from_lookup(lookup(&[
            ("TOGGLY_CACHE_ENABLED", "true"),
            ("TOGGLY_CACHE_TTL_SECS", "30"),
            ("TOGGLY_CACHE_MAX_ENTRIES", "500"),
            ("TOGGLY_LOG", "toggly_engine=debug"),
            ("TOGGLY_LOG_FORMAT", "JSON"),
        ]))
        .unwrap();

        assert_eq!(config.cache.ttl, Some(Duration::from_secs(30)));
        assert_eq!(config.cache.max_entries, Some(500));
        assert_eq!(config.telemetry.filter, "toggly_engine=debug");
        assert_eq!(config.telemetry.format, LogFormat::Json);
    }

    #[test]
    fn test_disabled_cache_drops_capacity_default() {
        let config = EngineConfig::from_lookup(lookup(&[("TOGGLY_CACHE_ENABLED", "false")])).unwrap();
        assert_eq!(config.cache, CacheConfig::disabled());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = EngineConfig::from_lookup(lookup(&[("TOGGLY_CACHE_ENABLED", "maybe")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "TOGGLY_CACHE_ENABLED"));

        let err = EngineConfig::from_lookup(lookup(&[("TOGGLY_CACHE_TTL_SECS", "-5")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));

        let err = EngineConfig::from_lookup(lookup(&[("TOGGLY_LOG_FORMAT", "xml")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "TOGGLY_LOG_FORMAT"));
    }

    #[test]
    fn test_validate_rejects_zero_limits() {
        assert!(CacheConfig::default().with_ttl(Duration::ZERO).validate().is_err());
        assert!(CacheConfig::default().with_max_entries(0).validate().is_err());
    }

    #[test]
    fn test_ttl_with_disabled_cache_is_incompatible() {
        let err = CacheConfig::disabled()
            .with_ttl(Duration::from_secs(5))
            .validate()
            .unwrap_err();
        assert!(matches!(err, ConfigError::IncompatibleOptions { .. }));
    }
}
