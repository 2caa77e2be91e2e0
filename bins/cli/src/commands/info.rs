//! Info command handler.

use crate::CliOutput;
use crate::error::{CliError, ExitCode};
use crate::format::OutputMode;
use fid_adapters::adapters_crate_version;
use fid_app::app_crate_version;
use fid_config::{CURRENT_CONFIG_VERSION, config_crate_version};

struct BuildInfo {
    name: &'static str,
    version: &'static str,
    app_version: &'static str,
    adapters_version: &'static str,
    config_version: &'static str,
}

const fn build_info() -> BuildInfo {
    BuildInfo {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        app_version: app_crate_version(),
        adapters_version: adapters_crate_version(),
        config_version: config_crate_version(),
    }
}

/// Run the info command.
pub fn run_info(mode: OutputMode) -> Result<CliOutput, CliError> {
    let build = build_info();

    let stdout = if mode.is_ndjson() {
        format_info_ndjson(&build)?
    } else if mode.is_json() {
        format_info_json(&build)?
    } else {
        format_info_text(&build)
    };

    Ok(CliOutput {
        stdout,
        stderr: String::new(),
        exit_code: ExitCode::Ok,
    })
}

fn format_info_text(build: &BuildInfo) -> String {
    format!(
        "status: ok\nname: {}\nversion: {}\napp: {}\nadapters: {}\nconfig: {} (schema v{})\n",
        build.name,
        build.version,
        build.app_version,
        build.adapters_version,
        build.config_version,
        CURRENT_CONFIG_VERSION,
    )
}

fn build_json(build: &BuildInfo) -> serde_json::Value {
    serde_json::json!({
        "name": build.name,
        "version": build.version,
        "appVersion": build.app_version,
        "adaptersVersion": build.adapters_version,
        "configVersion": build.config_version,
        "configSchemaVersion": CURRENT_CONFIG_VERSION,
    })
}

fn format_info_json(build: &BuildInfo) -> Result<String, CliError> {
    let payload = serde_json::json!({
        "status": "ok",
        "build": build_json(build),
    });
    let mut output = serde_json::to_string_pretty(&payload)?;
    output.push('\n');
    Ok(output)
}

fn format_info_ndjson(build: &BuildInfo) -> Result<String, CliError> {
    let payload = serde_json::json!({
        "type": "summary",
        "status": "ok",
        "kind": "info",
        "build": build_json(build),
    });
    let mut output = serde_json::to_string(&payload)?;
    output.push('\n');
    Ok(output)
}
