//! Trace replay end-to-end tests through the `fid` binary.

use fid_testkit::fixtures::{config_path, trace_path};
use serde_json::Value;
use std::io;
use std::path::Path;
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

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn report_values(stdout: &[u8]) -> io::Result<Vec<f64>> {
    let value: Value = serde_json::from_slice(stdout).map_err(io::Error::other)?;
    let reports = value
        .get("reports")
        .and_then(Value::as_array)
        .ok_or_else(|| io::Error::other("missing reports"))?;
    Ok(reports
        .iter()
        .filter_map(|report| report.get("value").and_then(Value::as_f64))
        .collect())
}

#[test]
fn restore_scenario_reports_both_epochs() -> io::Result<()> {
    let trace = path_arg(&trace_path("scenario-d.json"));
    let output = fid(&["--output", "json", "replay", &trace], &[])?;
    assert!(output.status.success());

    let value: Value = serde_json::from_slice(&output.stdout).map_err(io::Error::other)?;
    let reports = value
        .get("reports")
        .and_then(Value::as_array)
        .ok_or_else(|| io::Error::other("missing reports"))?;
    assert_eq!(reports.len(), 2);

    let ids: Vec<&str> = reports
        .iter()
        .filter_map(|report| report.get("id").and_then(Value::as_str))
        .collect();
    assert_eq!(ids.len(), 2);
    assert_ne!(ids[0], ids[1]);
    for report in reports {
        assert_eq!(report.get("isFinal"), Some(&Value::Bool(true)));
        assert_eq!(report.get("name").and_then(Value::as_str), Some("FID"));
    }
    assert_eq!(report_values(&output.stdout)?, vec![10.0, 35.0]);
    Ok(())
}

#[test]
fn hidden_interaction_produces_no_report() -> io::Result<()> {
    let trace = path_arg(&trace_path("scenario-b.json"));
    let output = fid(&["--output", "json", "replay", &trace], &[])?;

    assert!(output.status.success());
    assert!(report_values(&output.stdout)?.is_empty());
    Ok(())
}

#[test]
fn ndjson_replay_streams_reports_then_summary() -> io::Result<()> {
    let trace = path_arg(&trace_path("fallback-restore.json"));
    let output = fid(&["--output", "ndjson", "replay", &trace], &[])?;
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<Value> = stdout
        .lines()
        .map(serde_json::from_str)
        .collect::<Result<_, _>>()
        .map_err(io::Error::other)?;
    let kinds: Vec<&str> = lines
        .iter()
        .filter_map(|line| line.get("type").and_then(Value::as_str))
        .collect();
    assert_eq!(kinds, vec!["report", "report", "summary"]);
    Ok(())
}

#[test]
fn negative_delay_policy_follows_config_then_env() -> io::Result<()> {
    let trace = path_arg(&trace_path("negative-delay.json"));
    let clamp = path_arg(&config_path("clamp.toml"));

    let surfaced = fid(&["--json", "replay", &trace], &[])?;
    assert_eq!(report_values(&surfaced.stdout)?, vec![-5.0, 3.0]);

    let clamped = fid(&["--json", "replay", &trace, "--config", &clamp], &[])?;
    assert_eq!(report_values(&clamped.stdout)?, vec![0.0, 3.0]);

    let dropped = fid(
        &["--json", "replay", &trace, "--config", &clamp],
        &[("FID_NEGATIVE_DELAY", "drop")],
    )?;
    assert_eq!(report_values(&dropped.stdout)?, vec![3.0]);
    Ok(())
}

#[test]
fn always_fallback_override_is_accepted() -> io::Result<()> {
    let trace = path_arg(&trace_path("scenario-d.json"));
    let output = fid(
        &[
            "--json",
            "replay",
            &trace,
            "--overrides-json",
            r#"{ "fallback": { "onRestore": "always" } }"#,
        ],
        &[],
    )?;

    assert!(output.status.success());
    assert_eq!(report_values(&output.stdout)?, vec![10.0, 35.0]);
    Ok(())
}

#[test]
fn invalid_env_value_fails_before_replay() -> io::Result<()> {
    let trace = path_arg(&trace_path("scenario-a.json"));
    let output = fid(
        &["--json", "replay", &trace],
        &[("FID_RESTORE_FALLBACK", "sometimes")],
    )?;
    assert_eq!(output.status.code(), Some(2));

    let value: Value = serde_json::from_slice(&output.stdout).map_err(io::Error::other)?;
    assert_eq!(value.get("status").and_then(Value::as_str), Some("error"));
    assert_eq!(
        value
            .pointer("/error/metadata/env_var")
            .and_then(Value::as_str),
        Some("FID_RESTORE_FALLBACK")
    );
    Ok(())
}
