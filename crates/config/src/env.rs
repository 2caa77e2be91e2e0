//! Environment variable parsing and env-to-config merging.
//!
//! Env parsing is strict: a present-but-empty or unrecognized value fails
//! fast instead of silently falling back to the file value.

use crate::schema::{FidConfig, LogLevelSetting, ValidatedFidConfig};
use fid_domain::{NegativeDelayPolicy, RestoreFallback};
use fid_shared::{ErrorCode, ErrorEnvelope};
use std::collections::BTreeMap;
use std::fmt;

/// Env var: negative-delay policy (`surface` | `clamp` | `drop`).
pub const ENV_NEGATIVE_DELAY: &str = "FID_NEGATIVE_DELAY";
/// Env var: restore fallback mode (`auto` | `always`).
pub const ENV_RESTORE_FALLBACK: &str = "FID_RESTORE_FALLBACK";
/// Env var: minimum JSON log level.
pub const ENV_LOG_LEVEL: &str = "FID_LOG_LEVEL";

const ENV_VARS: [&str; 3] = [ENV_NEGATIVE_DELAY, ENV_RESTORE_FALLBACK, ENV_LOG_LEVEL];

/// Typed env-derived overrides for `FidConfig`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FidEnv {
    /// Override for `metric.negativeDelay`.
    pub negative_delay: Option<NegativeDelayPolicy>,
    /// Override for `fallback.onRestore`.
    pub restore_fallback: Option<RestoreFallback>,
    /// Override for `logging.level`.
    pub log_level: Option<LogLevelSetting>,
}

impl FidEnv {
    /// Parse overrides from a name → value map.
    pub fn from_map(map: &BTreeMap<String, String>) -> Result<Self, EnvParseError> {
        Ok(Self {
            negative_delay: parse_optional_enum(map, ENV_NEGATIVE_DELAY, NegativeDelayPolicy::parse)?,
            restore_fallback: parse_optional_enum(map, ENV_RESTORE_FALLBACK, RestoreFallback::parse)?,
            log_level: parse_optional_enum(map, ENV_LOG_LEVEL, LogLevelSetting::parse)?,
        })
    }

    /// Parse overrides from the process environment.
    pub fn from_std_env() -> Result<Self, EnvParseError> {
        let mut map = BTreeMap::new();
        for name in ENV_VARS {
            if let Ok(value) = std::env::var(name) {
                map.insert(name.to_string(), value);
            }
        }

        Self::from_map(&map)
    }

    /// Whether no override is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.negative_delay.is_none() && self.restore_fallback.is_none() && self.log_level.is_none()
    }
}

/// Apply env overrides on top of `base`, then validate.
pub fn apply_env_overrides(
    base: FidConfig,
    env: &FidEnv,
) -> Result<ValidatedFidConfig, ErrorEnvelope> {
    let mut config = base;
    if let Some(policy) = env.negative_delay {
        config.metric.negative_delay = policy;
    }
    if let Some(mode) = env.restore_fallback {
        config.fallback.on_restore = mode;
    }
    if let Some(level) = env.log_level {
        config.logging.level = level;
    }

    config.validate_and_normalize().map_err(Into::into)
}

/// Env parsing errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvParseError {
    /// An env var was present but empty after trimming.
    EmptyValue {
        /// Env var name.
        var: &'static str,
    },
    /// Enum env var had an invalid value.
    InvalidEnum {
        /// Env var name.
        var: &'static str,
        /// Raw input value.
        value: String,
    },
}

impl EnvParseError {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::EmptyValue { .. } => ErrorCode::new("config", "empty_env_var"),
            Self::InvalidEnum { .. } => ErrorCode::new("config", "invalid_env_enum"),
        }
    }
}

impl fmt::Display for EnvParseError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyValue { var } => write!(formatter, "{var} must be non-empty"),
            Self::InvalidEnum { var, value } => {
                write!(formatter, "{var} has an unsupported value: {value}")
            },
        }
    }
}

impl std::error::Error for EnvParseError {}

impl From<EnvParseError> for ErrorEnvelope {
    fn from(error: EnvParseError) -> Self {
        let code = error.error_code();
        let message = error.to_string();
        let envelope = Self::expected(code, message);

        match error {
            EnvParseError::EmptyValue { var } => envelope.with_metadata("env_var", var),
            EnvParseError::InvalidEnum { var, value } => envelope
                .with_metadata("env_var", var)
                .with_metadata("value", value),
        }
    }
}

fn parse_optional_enum<T>(
    map: &BTreeMap<String, String>,
    var: &'static str,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<Option<T>, EnvParseError> {
    let Some(raw) = map.get(var) else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(EnvParseError::EmptyValue { var });
    }
    parse(trimmed)
        .map(Some)
        .ok_or_else(|| EnvParseError::InvalidEnum {
            var,
            value: trimmed.to_string(),
        })
}
