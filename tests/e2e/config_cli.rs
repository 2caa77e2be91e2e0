//! Config inspection end-to-end tests through the `fid` binary.

use fid_testkit::fixtures::config_path;
use serde_json::Value;
use std::io;
use std::process::{Command, Output};

fn fid(args: &[&str], envs: &[(&str, &str)]) -> io::Result<Output> {
    let mut command = Command::new(env!("CARGO_BIN_EXE_fid"));
    command.args(args);
    for (key, _) in std::env::vars() {
        if key.starts_with("FID_") {
            command.env_remove(key);
        }
    }
    command.envs(envs.iter().copied());
    command.output()
}

fn effective(output: &Output) -> io::Result<Value> {
    let value: Value = serde_json::from_slice(&output.stdout).map_err(io::Error::other)?;
    value
        .get("effectiveConfig")
        .cloned()
        .ok_or_else(|| io::Error::other("missing effectiveConfig"))
}

#[test]
fn show_without_a_file_prints_defaults() -> io::Result<()> {
    let output = fid(&["--json", "config", "show"], &[])?;
    assert!(output.status.success());

    let config = effective(&output)?;
    assert_eq!(config.pointer("/version").and_then(Value::as_u64), Some(1));
    assert_eq!(
        config.pointer("/metric/negativeDelay").and_then(Value::as_str),
        Some("surface")
    );
    assert_eq!(
        config.pointer("/fallback/onRestore").and_then(Value::as_str),
        Some("auto")
    );
    assert_eq!(
        config.pointer("/logging/level").and_then(Value::as_str),
        Some("info")
    );
    Ok(())
}

#[test]
fn precedence_is_file_then_overrides_then_env() -> io::Result<()> {
    let path = config_path("clamp.toml");
    let path = path.to_string_lossy();
    let output = fid(
        &[
            "--json",
            "config",
            "show",
            "--path",
            path.as_ref(),
            "--overrides-json",
            r#"{ "metric": { "negativeDelay": "drop" }, "logging": { "level": "error" } }"#,
        ],
        &[("FID_LOG_LEVEL", "debug")],
    )?;
    assert!(output.status.success());

    let config = effective(&output)?;
    assert_eq!(
        config.pointer("/metric/negativeDelay").and_then(Value::as_str),
        Some("drop")
    );
    assert_eq!(
        config.pointer("/logging/level").and_then(Value::as_str),
        Some("debug")
    );
    Ok(())
}

#[test]
fn text_show_renders_toml() -> io::Result<()> {
    let path = config_path("always.json");
    let output = fid(&["config", "show", "--path", path.to_string_lossy().as_ref()], &[])?;
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.starts_with("status: ok\nconfig:\n"));
    assert!(stdout.contains("onRestore = \"always\""));
    Ok(())
}

#[test]
fn check_rejects_future_versions() -> io::Result<()> {
    let path = config_path("future-version.toml");
    let output = fid(
        &["--output", "ndjson", "config", "check", "--path", path.to_string_lossy().as_ref()],
        &[],
    )?;
    assert_eq!(output.status.code(), Some(2));

    let line: Value = serde_json::from_slice(&output.stdout).map_err(io::Error::other)?;
    assert_eq!(line.get("type").and_then(Value::as_str), Some("error"));
    assert_eq!(
        line.pointer("/error/code/code").and_then(Value::as_str),
        Some("unsupported_version")
    );
    Ok(())
}

#[test]
fn check_reports_missing_files() -> io::Result<()> {
    let path = config_path("missing.toml");
    let output = fid(&["config", "check", "--path", path.to_string_lossy().as_ref()], &[])?;
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert_eq!(output.status.code(), Some(2));
    assert!(stdout.contains("code: config:config_file_not_found"));
    Ok(())
}

#[test]
fn malformed_overrides_are_invalid_input() -> io::Result<()> {
    let output = fid(&["config", "show", "--overrides-json", "{ not json"], &[])?;
    assert_eq!(output.status.code(), Some(2));
    Ok(())
}
