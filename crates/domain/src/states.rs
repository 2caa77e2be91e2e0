//! Metric state machine phases and measurement-path types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Phase of the metric state machine within one epoch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricPhase {
    /// Observing; no event has qualified yet.
    #[default]
    Armed,
    /// A qualifying event was selected and reported.
    Finalized,
}

impl MetricPhase {
    /// Stable phase label for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Armed => "armed",
            Self::Finalized => "finalized",
        }
    }
}

impl fmt::Display for MetricPhase {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Which measurement source feeds the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasurementPath {
    /// Host-native timing observation.
    Native,
    /// Fallback measurer built on low-level input listeners.
    Fallback,
}

impl MeasurementPath {
    /// Stable path label for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Native => "native",
            Self::Fallback => "fallback",
        }
    }
}

impl fmt::Display for MeasurementPath {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// When the fallback measurer is reset and engaged on page restore.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RestoreFallback {
    /// Engage when the fallback path is active or the native source is spent:
    /// disconnected, or already past its single per-document entry.
    #[default]
    Auto,
    /// Engage on every restore regardless of the active path.
    Always,
}

impl RestoreFallback {
    /// Stable config string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Always => "always",
        }
    }

    /// Parse the config string (case-insensitive).
    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "auto" => Some(Self::Auto),
            "always" => Some(Self::Always),
            _ => None,
        }
    }

    /// Decide whether the fallback must be (re)engaged for a new epoch.
    ///
    /// `native_live` is true only while the native observer is connected
    /// and has not delivered an entry yet.
    #[must_use]
    pub const fn engages(self, path: MeasurementPath, native_live: bool) -> bool {
        match self {
            Self::Always => true,
            Self::Auto => matches!(path, MeasurementPath::Fallback) || !native_live,
        }
    }
}

impl fmt::Display for RestoreFallback {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}
