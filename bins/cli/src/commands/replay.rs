//! Replay command handler.

use crate::CliOutput;
use crate::error::{CliError, ExitCode};
use crate::format::OutputMode;
use crate::{format_error_output, format_ndjson_summary, log_info};
use fid_adapters::{JsonLogger, PageStack, PageTrace, StderrLogSink};
use fid_app::{FirstInputDelayDeps, FirstInputDelayOptions, observe_first_input_delay};
use fid_config::{LogLevelSetting, ValidatedFidConfig, load_fid_config_std_env};
use fid_domain::MetricRecord;
use fid_ports::{LogLevel, LoggerPort};
use fid_shared::{ErrorEnvelope, ResultExt};
use std::cell::RefCell;
use std::fmt::Write as _;
use std::path::Path;
use std::rc::Rc;

/// Inputs for the replay command.
#[derive(Debug, Clone, Copy)]
pub struct ReplayCommandInput<'a> {
    /// Trace file (`.json` or `.toml`).
    pub trace: &'a Path,
    /// Optional config file.
    pub config: Option<&'a Path>,
    /// Optional JSON overrides applied on top of the config file.
    pub overrides_json: Option<&'a str>,
}

/// Replay a trace and print every delivered report.
pub fn run_replay(mode: OutputMode, input: ReplayCommandInput<'_>) -> Result<CliOutput, CliError> {
    let config = match load_fid_config_std_env(input.config, input.overrides_json) {
        Ok(config) => config,
        Err(error) => return Ok(format_error_output(mode, &error)),
    };
    let loaded = PageTrace::load(input.trace)
        .map_err(ErrorEnvelope::from)
        .with_context("trace", input.trace.to_string_lossy());
    let trace = match loaded {
        Ok(trace) => trace,
        Err(error) => return Ok(format_error_output(mode, &error)),
    };

    let logger: Rc<dyn LoggerPort> = Rc::new(
        JsonLogger::new(Rc::new(StderrLogSink)).with_min_level(log_level(config.log_level())),
    );
    let reports = replay_trace(&trace, &config, logger);

    let mut stderr = String::new();
    log_info(&mut stderr, "replay completed", mode.no_progress);

    let stdout = if mode.is_ndjson() {
        format_replay_ndjson(input.trace, &reports)?
    } else if mode.is_json() {
        format_replay_json(input.trace, &reports)?
    } else {
        format_replay_text(input.trace, &reports)
    };

    Ok(CliOutput {
        stdout,
        stderr,
        exit_code: ExitCode::Ok,
    })
}

/// Install the metric on a fresh page built from `trace`, replay it, and
/// return the delivered reports in order.
pub fn replay_trace(
    trace: &PageTrace,
    config: &ValidatedFidConfig,
    logger: Rc<dyn LoggerPort>,
) -> Vec<MetricRecord> {
    tracing::debug!(
        steps = trace.steps.len(),
        native = trace.native_first_input,
        negative_delay = %config.negative_delay(),
        restore_fallback = %config.restore_fallback(),
        "replaying trace"
    );

    let host = trace.build_host();
    let stack = PageStack::new(&host);
    let deps = FirstInputDelayDeps {
        visibility: stack.visibility,
        events: stack.events,
        fallback: stack.fallback,
        restore: stack.restore,
        reporter: stack.reporter,
        metrics: stack.metrics,
        logger: Some(logger),
    };
    let options = FirstInputDelayOptions {
        negative_delay: config.negative_delay(),
        restore_fallback: config.restore_fallback(),
    };

    let reports = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&reports);
    observe_first_input_delay(
        deps,
        options,
        Rc::new(move |record: &MetricRecord| sink.borrow_mut().push(record.clone())),
    );
    trace.replay(&host);

    let delivered = reports.borrow().clone();
    tracing::debug!(reports = delivered.len(), "trace replayed");
    delivered
}

const fn log_level(setting: LogLevelSetting) -> LogLevel {
    match setting {
        LogLevelSetting::Debug => LogLevel::Debug,
        LogLevelSetting::Info => LogLevel::Info,
        LogLevelSetting::Warn => LogLevel::Warn,
        LogLevelSetting::Error => LogLevel::Error,
    }
}

fn format_replay_text(trace: &Path, reports: &[MetricRecord]) -> String {
    let mut out = format!(
        "status: ok\ntrace: {}\nreports: {}\n",
        trace.to_string_lossy(),
        reports.len()
    );
    for record in reports {
        let value = record
            .value()
            .map_or_else(|| "none".to_string(), |value| value.to_string());
        let _ = write!(
            out,
            "report: id={} value={} delta={}",
            record.id().as_str(),
            value,
            record.delta()
        );
        if let Some(entry) = record.entries().first() {
            let _ = write!(out, " entry={}", entry.name);
            if let Some(target) = entry.target.as_deref() {
                let _ = write!(out, " target={target}");
            }
        }
        out.push('\n');
    }
    out
}

fn format_replay_json(trace: &Path, reports: &[MetricRecord]) -> Result<String, CliError> {
    let payload = serde_json::json!({
        "status": "ok",
        "trace": trace.to_string_lossy(),
        "reports": reports,
    });
    let mut output = serde_json::to_string_pretty(&payload)?;
    output.push('\n');
    Ok(output)
}

fn format_replay_ndjson(trace: &Path, reports: &[MetricRecord]) -> Result<String, CliError> {
    let mut out = String::new();
    for record in reports {
        let payload = serde_json::json!({
            "type": "report",
            "report": record,
        });
        out.push_str(&serde_json::to_string(&payload)?);
        out.push('\n');
    }
    out.push_str(&format_ndjson_summary(
        "ok",
        "replay",
        Some(serde_json::json!({
            "trace": trace.to_string_lossy(),
            "reports": reports.len(),
        })),
    ));
    Ok(out)
}
