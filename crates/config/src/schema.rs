//! Configuration schema, defaults, and validation.
//!
//! - Deserialization uses `serde` (JSON or TOML).
//! - Unknown fields are rejected at every level.
//! - Validation is manual and returns typed errors mapped to `ErrorEnvelope`.

use fid_domain::{NegativeDelayPolicy, RestoreFallback};
use fid_shared::{ErrorCode, ErrorEnvelope};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Current supported configuration schema version.
pub const CURRENT_CONFIG_VERSION: u32 = 1;

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct FidConfig {
    /// Schema version for forward-compatible migrations.
    pub version: u32,
    /// Metric computation settings.
    pub metric: MetricConfig,
    /// Fallback measurer settings.
    pub fallback: FallbackConfig,
    /// Structured logging settings.
    pub logging: LoggingConfig,
}

impl Default for FidConfig {
    fn default() -> Self {
        Self {
            version: CURRENT_CONFIG_VERSION,
            metric: MetricConfig::default(),
            fallback: FallbackConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl FidConfig {
    /// Validate the config.
    pub fn validate_and_normalize(self) -> Result<ValidatedFidConfig, ConfigSchemaError> {
        self.validate_version()?;
        Ok(ValidatedFidConfig { raw: self })
    }

    const fn validate_version(&self) -> Result<(), ConfigSchemaError> {
        if self.version != CURRENT_CONFIG_VERSION {
            return Err(ConfigSchemaError::UnsupportedVersion {
                found: self.version,
                supported: CURRENT_CONFIG_VERSION,
            });
        }
        Ok(())
    }
}

/// Metric computation settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct MetricConfig {
    /// Treatment of negative computed delays.
    pub negative_delay: NegativeDelayPolicy,
}

/// Fallback measurer settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct FallbackConfig {
    /// When the fallback is reset and engaged on page restore.
    pub on_restore: RestoreFallback,
}

/// Structured logging settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct LoggingConfig {
    /// Minimum level written by the JSON logger.
    pub level: LogLevelSetting,
}

/// Configured minimum log level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevelSetting {
    /// Debug and above.
    Debug,
    /// Info and above.
    #[default]
    Info,
    /// Warnings and errors.
    Warn,
    /// Errors only.
    Error,
}

impl LogLevelSetting {
    /// Stable config string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    /// Parse the config string (case-insensitive).
    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "debug" => Some(Self::Debug),
            "info" => Some(Self::Info),
            "warn" | "warning" => Some(Self::Warn),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

impl fmt::Display for LogLevelSetting {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Validated config wrapper.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidatedFidConfig {
    raw: FidConfig,
}

impl ValidatedFidConfig {
    /// Borrow the raw config.
    #[must_use]
    pub const fn as_ref(&self) -> &FidConfig {
        &self.raw
    }

    /// Consume the wrapper and return the raw config.
    #[must_use]
    pub fn into_inner(self) -> FidConfig {
        self.raw
    }

    /// Configured negative-delay policy.
    #[must_use]
    pub const fn negative_delay(&self) -> NegativeDelayPolicy {
        self.raw.metric.negative_delay
    }

    /// Configured restore fallback mode.
    #[must_use]
    pub const fn restore_fallback(&self) -> RestoreFallback {
        self.raw.fallback.on_restore
    }

    /// Configured minimum log level.
    #[must_use]
    pub const fn log_level(&self) -> LogLevelSetting {
        self.raw.logging.level
    }
}

impl AsRef<FidConfig> for ValidatedFidConfig {
    fn as_ref(&self) -> &FidConfig {
        &self.raw
    }
}

impl std::ops::Deref for ValidatedFidConfig {
    type Target = FidConfig;

    fn deref(&self) -> &Self::Target {
        &self.raw
    }
}

/// Parse a config from a JSON string, applying validation.
pub fn parse_fid_config_json(input: &str) -> Result<ValidatedFidConfig, ErrorEnvelope> {
    let config: FidConfig = serde_json::from_str(input).map_err(|error| {
        ErrorEnvelope::expected(
            ErrorCode::new("config", "invalid_json"),
            format!("invalid config JSON: {error}"),
        )
    })?;

    config.validate_and_normalize().map_err(Into::into)
}

/// Parse a config from a TOML string, applying validation.
pub fn parse_fid_config_toml(input: &str) -> Result<ValidatedFidConfig, ErrorEnvelope> {
    let config: FidConfig = toml::from_str(input).map_err(|error| {
        ErrorEnvelope::expected(
            ErrorCode::new("config", "invalid_toml"),
            format!("invalid config TOML: {error}"),
        )
    })?;

    config.validate_and_normalize().map_err(Into::into)
}

/// Typed validation errors for the configuration schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSchemaError {
    /// The config version is not supported by this binary.
    UnsupportedVersion {
        /// Version found in the config.
        found: u32,
        /// Version supported by this crate.
        supported: u32,
    },
}

impl ConfigSchemaError {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::UnsupportedVersion { .. } => ErrorCode::new("config", "unsupported_version"),
        }
    }
}

impl fmt::Display for ConfigSchemaError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedVersion { found, supported } => {
                write!(
                    formatter,
                    "unsupported config version: {found} (supported: {supported})"
                )
            },
        }
    }
}

impl std::error::Error for ConfigSchemaError {}

impl From<ConfigSchemaError> for ErrorEnvelope {
    fn from(error: ConfigSchemaError) -> Self {
        let code = error.error_code();
        let message = error.to_string();
        let envelope = Self::expected(code, message);

        match error {
            ConfigSchemaError::UnsupportedVersion { found, supported } => envelope
                .with_metadata("found", found.to_string())
                .with_metadata("supported", supported.to_string()),
        }
    }
}
