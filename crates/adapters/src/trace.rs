//! Recorded page traces and their replay against [`PageHost`].
//!
//! A trace is a list of page happenings (clock advances, performance
//! entries, raw input, visibility changes, restores) stored as JSON or
//! TOML. Replay only drives the host; whoever replays decides what is
//! installed on it.

use crate::page::PageHost;
use fid_domain::{InputEvent, InputKind, Timestamp, TimingEvent};
use fid_shared::{ErrorCode, ErrorEnvelope};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Failures while loading or validating a trace.
#[derive(Debug, thiserror::Error)]
pub enum TraceError {
    /// The trace file could not be read.
    #[error("failed to read trace {}: {source}", path.display())]
    Read {
        /// Trace path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The trace is not valid JSON.
    #[error("invalid trace JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// The trace is not valid TOML.
    #[error("invalid trace TOML: {0}")]
    Toml(#[from] toml::de::Error),
    /// The trace file extension is neither `.json` nor `.toml`.
    #[error("unsupported trace format: {}", path.display())]
    UnsupportedFormat {
        /// Trace path.
        path: PathBuf,
    },
    /// A step carries an impossible value.
    #[error("step {index}: {reason}")]
    InvalidStep {
        /// Zero-based step index.
        index: usize,
        /// What is wrong with it.
        reason: String,
    },
}

impl From<TraceError> for ErrorEnvelope {
    fn from(error: TraceError) -> Self {
        let message = error.to_string();
        match error {
            TraceError::Read { path, source } => {
                let envelope = Self::from(source);
                Self {
                    message,
                    ..envelope
                }
                .with_metadata("path", path.display().to_string())
            },
            TraceError::Json(_) => Self::expected(ErrorCode::new("trace", "invalid_json"), message),
            TraceError::Toml(_) => Self::expected(ErrorCode::new("trace", "invalid_toml"), message),
            TraceError::UnsupportedFormat { path } => {
                Self::expected(ErrorCode::new("trace", "unsupported_format"), message)
                    .with_metadata("path", path.display().to_string())
            },
            TraceError::InvalidStep { index, .. } => {
                Self::expected(ErrorCode::new("trace", "invalid_step"), message)
                    .with_metadata("step", index.to_string())
            },
        }
    }
}

const fn default_true() -> bool {
    true
}

/// One page happening.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "camelCase")]
pub enum TraceStep {
    /// Move the clock forward.
    Advance {
        /// Milliseconds to advance.
        ms: f64,
    },
    /// Record a `first-input` performance entry (delivered on the next tick
    /// or flush).
    #[serde(rename_all = "camelCase")]
    Entry {
        /// Interaction event type.
        name: String,
        /// Interaction start.
        start_time: Timestamp,
        /// Processing start.
        processing_start: Timestamp,
        /// Whether the interaction was cancelable.
        #[serde(default = "default_true")]
        cancelable: bool,
        /// Optional target description.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target: Option<String>,
    },
    /// Run one host task tick.
    Tick,
    /// Dispatch a raw input event.
    #[serde(rename_all = "camelCase")]
    Input {
        /// Input event kind.
        kind: InputKind,
        /// Event creation time; defaults to the current clock.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        time_stamp: Option<Timestamp>,
        /// Whether the event is cancelable.
        #[serde(default = "default_true")]
        cancelable: bool,
        /// Optional target description.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target: Option<String>,
    },
    /// Hide the page.
    Hidden,
    /// Show the page.
    Visible,
    /// Resume the page from a suspended navigation state.
    Restore,
}

/// A recorded page trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PageTrace {
    /// Free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether the page supports native `first-input` observation.
    #[serde(default = "default_true")]
    pub native_first_input: bool,
    /// Whether the page starts hidden.
    #[serde(default)]
    pub start_hidden: bool,
    /// Steps in replay order.
    #[serde(default)]
    pub steps: Vec<TraceStep>,
}

impl PageTrace {
    /// Parse a JSON trace.
    pub fn from_json_str(input: &str) -> Result<Self, TraceError> {
        let trace: Self = serde_json::from_str(input)?;
        trace.validate()?;
        Ok(trace)
    }

    /// Parse a TOML trace.
    pub fn from_toml_str(input: &str) -> Result<Self, TraceError> {
        let trace: Self = toml::from_str(input)?;
        trace.validate()?;
        Ok(trace)
    }

    /// Load a trace file; the format follows the extension.
    pub fn load(path: &Path) -> Result<Self, TraceError> {
        let contents = fs::read_to_string(path).map_err(|source| TraceError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::from_json_str(&contents),
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Self::from_toml_str(&contents),
            _ => Err(TraceError::UnsupportedFormat {
                path: path.to_path_buf(),
            }),
        }
    }

    /// Reject steps that cannot happen on a real page.
    pub fn validate(&self) -> Result<(), TraceError> {
        for (index, step) in self.steps.iter().enumerate() {
            let reason = match step {
                TraceStep::Advance { ms } if !ms.is_finite() || *ms < 0.0 => {
                    Some(format!("advance must be a non-negative number of ms (got {ms})"))
                },
                TraceStep::Entry {
                    start_time,
                    processing_start,
                    ..
                } if !start_time.is_finite() || !processing_start.is_finite() => {
                    Some("entry timestamps must be finite".to_owned())
                },
                TraceStep::Input {
                    time_stamp: Some(time_stamp),
                    ..
                } if !time_stamp.is_finite() => Some("input timeStamp must be finite".to_owned()),
                _ => None,
            };
            if let Some(reason) = reason {
                return Err(TraceError::InvalidStep { index, reason });
            }
        }
        Ok(())
    }

    /// Build the page described by the trace header.
    #[must_use]
    pub fn build_host(&self) -> PageHost {
        let mut host = PageHost::new();
        if !self.native_first_input {
            host = host.without_native_observation();
        }
        if self.start_hidden {
            host = host.starting_hidden();
        }
        host
    }

    /// Apply every step to `host`, in order.
    pub fn replay(&self, host: &PageHost) {
        for (index, step) in self.steps.iter().enumerate() {
            tracing::trace!(index, ?step, "replaying step");
            apply_step(host, step);
        }
    }
}

/// Apply one step to `host`.
pub fn apply_step(host: &PageHost, step: &TraceStep) {
    match step {
        TraceStep::Advance { ms } => host.advance(*ms),
        TraceStep::Entry {
            name,
            start_time,
            processing_start,
            cancelable,
            target,
        } => {
            let mut event = TimingEvent::first_input(name.as_str(), *start_time, *processing_start);
            event.cancelable = *cancelable;
            event.target = target.as_deref().map(Into::into);
            host.record_entry(event);
        },
        TraceStep::Tick => host.tick(),
        TraceStep::Input {
            kind,
            time_stamp,
            cancelable,
            target,
        } => {
            let mut event = InputEvent::new(*kind, time_stamp.unwrap_or_else(|| host.now()));
            event.cancelable = *cancelable;
            event.target = target.as_deref().map(Into::into);
            host.dispatch_input(&event);
        },
        TraceStep::Hidden => host.hide(),
        TraceStep::Visible => host.show(),
        TraceStep::Restore => host.restore(),
    }
}
