//! # fid-config
//!
//! Configuration schema, validation, and loading for the first input delay
//! metric. This crate depends on `domain` and `shared` only.

/// Environment variable parsing and merging.
pub mod env;
/// Config loading helpers (env + file + overrides).
pub mod load;
/// Configuration schema types and helpers.
pub mod schema;

pub use schema::{
    CURRENT_CONFIG_VERSION, ConfigSchemaError, FallbackConfig, FidConfig, LogLevelSetting,
    LoggingConfig, MetricConfig, ValidatedFidConfig, parse_fid_config_json,
    parse_fid_config_toml,
};

pub use env::{
    ENV_LOG_LEVEL, ENV_NEGATIVE_DELAY, ENV_RESTORE_FALLBACK, EnvParseError, FidEnv,
    apply_env_overrides,
};
pub use load::{
    load_fid_config_from_path, load_fid_config_from_sources, load_fid_config_std_env,
    to_pretty_json, to_pretty_toml,
};

/// Returns the config crate version.
#[must_use]
pub const fn config_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
