//! Integration tests for loading config fixtures from the workspace testkit.

use fid_config::{
    CURRENT_CONFIG_VERSION, FidEnv, LogLevelSetting, load_fid_config_from_path,
    parse_fid_config_json, parse_fid_config_toml,
};
use fid_domain::{NegativeDelayPolicy, RestoreFallback};
use fid_shared::ErrorCode;
use fid_testkit::fixtures::{config_path, read_fixture};
use std::error::Error;

#[test]
fn parses_toml_fixture() -> Result<(), Box<dyn Error>> {
    let contents = read_fixture("config/clamp.toml")?;
    let config = parse_fid_config_toml(&contents)?;

    assert_eq!(config.version, CURRENT_CONFIG_VERSION);
    assert_eq!(config.negative_delay(), NegativeDelayPolicy::Clamp);
    assert_eq!(config.restore_fallback(), RestoreFallback::Auto);
    assert_eq!(config.log_level(), LogLevelSetting::Warn);
    Ok(())
}

#[test]
fn parses_json_fixtures() -> Result<(), Box<dyn Error>> {
    let always = parse_fid_config_json(&read_fixture("config/always.json")?)?;
    assert_eq!(always.restore_fallback(), RestoreFallback::Always);

    let drop = parse_fid_config_json(&read_fixture("config/drop.json")?)?;
    assert_eq!(drop.negative_delay(), NegativeDelayPolicy::Drop);
    Ok(())
}

#[test]
fn format_follows_the_extension() -> Result<(), Box<dyn Error>> {
    let env = FidEnv::default();
    let toml = load_fid_config_from_path(Some(&config_path("clamp.toml")), None, &env)?;
    let json = load_fid_config_from_path(Some(&config_path("always.json")), None, &env)?;

    assert_eq!(toml.negative_delay(), NegativeDelayPolicy::Clamp);
    assert_eq!(json.restore_fallback(), RestoreFallback::Always);
    Ok(())
}

#[test]
fn unknown_field_fixture_is_rejected() -> Result<(), Box<dyn Error>> {
    let error = parse_fid_config_json(&read_fixture("config/unknown-field.json")?)
        .err()
        .ok_or_else(|| std::io::Error::other("expected unknown field error"))?;

    assert_eq!(error.code, ErrorCode::new("config", "invalid_json"));
    assert!(error.message.contains("threshold"));
    Ok(())
}

#[test]
fn future_version_fixture_is_rejected() -> Result<(), Box<dyn Error>> {
    let error = load_fid_config_from_path(
        Some(&config_path("future-version.toml")),
        None,
        &FidEnv::default(),
    )
    .err()
    .ok_or_else(|| std::io::Error::other("expected version error"))?;

    assert_eq!(error.code, ErrorCode::new("config", "unsupported_version"));
    assert_eq!(
        error.metadata.get("supported").map(String::as_str),
        Some("1")
    );
    Ok(())
}

#[test]
fn missing_config_file_is_an_expected_error() -> Result<(), Box<dyn Error>> {
    let error = load_fid_config_from_path(
        Some(&config_path("does-not-exist.toml")),
        None,
        &FidEnv::default(),
    )
    .err()
    .ok_or_else(|| std::io::Error::other("expected missing file error"))?;

    assert_eq!(error.code, ErrorCode::new("config", "config_file_not_found"));
    assert!(error.metadata.contains_key("path"));
    Ok(())
}
