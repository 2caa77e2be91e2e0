//! Metric identity and the metric record handed to report callbacks.

use crate::TimingEvent;
use fid_shared::{ErrorCode, ErrorEnvelope};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Maximum length of a metric name tag.
pub const MAX_METRIC_NAME_CHARS: usize = 32;

/// Validation and invariant failures for metric values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetricError {
    /// `MetricName` is empty after trimming.
    EmptyMetricName,
    /// `MetricName` exceeds [`MAX_METRIC_NAME_CHARS`].
    MetricNameTooLong {
        /// Length of the trimmed input.
        length: usize,
    },
    /// `MetricId` is empty after trimming.
    EmptyMetricId,
    /// A finalized record was finalized again (invariant violation).
    AlreadyFinal {
        /// Identity of the record.
        id: String,
    },
}

impl MetricError {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::EmptyMetricName | Self::MetricNameTooLong { .. } => {
                ErrorCode::new("domain", "invalid_metric_name")
            },
            Self::EmptyMetricId => ErrorCode::new("domain", "invalid_metric_id"),
            Self::AlreadyFinal { .. } => ErrorCode::new("domain", "metric_already_final"),
        }
    }
}

impl fmt::Display for MetricError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyMetricName => formatter.write_str("MetricName must be non-empty"),
            Self::MetricNameTooLong { length } => write!(
                formatter,
                "MetricName must be at most {MAX_METRIC_NAME_CHARS} chars (got {length})"
            ),
            Self::EmptyMetricId => formatter.write_str("MetricId must be non-empty"),
            Self::AlreadyFinal { id } => write!(formatter, "metric {id} is already final"),
        }
    }
}

impl std::error::Error for MetricError {}

impl From<MetricError> for ErrorEnvelope {
    fn from(error: MetricError) -> Self {
        let code = error.error_code();
        let message = error.to_string();
        match error {
            MetricError::AlreadyFinal { id } => {
                Self::invariant(code, message).with_metadata("metricId", id)
            },
            MetricError::MetricNameTooLong { length } => {
                Self::expected(code, message).with_metadata("length", length.to_string())
            },
            MetricError::EmptyMetricName | MetricError::EmptyMetricId => {
                Self::expected(code, message)
            },
        }
    }
}

/// Constant name tag of a metric.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricName(Box<str>);

impl MetricName {
    /// Name tag of the first input delay metric.
    pub const FIRST_INPUT_DELAY: &'static str = "FID";

    /// The first input delay metric name.
    #[must_use]
    pub fn first_input_delay() -> Self {
        Self(Self::FIRST_INPUT_DELAY.into())
    }

    /// Parse a metric name (trimmed, non-empty, bounded).
    pub fn parse(input: impl AsRef<str>) -> Result<Self, MetricError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(MetricError::EmptyMetricName);
        }
        let length = trimmed.chars().count();
        if length > MAX_METRIC_NAME_CHARS {
            return Err(MetricError::MetricNameTooLong { length });
        }
        Ok(Self(trimmed.into()))
    }

    /// Borrow the name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

/// Unique identity of one metric record (one per epoch).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricId(Box<str>);

impl MetricId {
    /// Generate a fresh random id (`v1-<uuid>`).
    #[must_use]
    pub fn generate() -> Self {
        Self(format!("v1-{}", Uuid::new_v4().simple()).into_boxed_str())
    }

    /// Parse an explicit id.
    pub fn parse(input: impl AsRef<str>) -> Result<Self, MetricError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(MetricError::EmptyMetricId);
        }
        Ok(Self(trimmed.into()))
    }

    /// Borrow the id.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MetricId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

/// A metric record for one epoch.
///
/// Invariant: `entries` holds the qualifying event iff `is_final` is true.
/// The record is only mutated through [`MetricRecord::finalize`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricRecord {
    name: MetricName,
    id: MetricId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<f64>,
    delta: f64,
    entries: Vec<TimingEvent>,
    is_final: bool,
}

impl MetricRecord {
    /// Create an empty record with a freshly generated id.
    #[must_use]
    pub fn new(name: MetricName) -> Self {
        Self::with_id(name, MetricId::generate())
    }

    /// Create an empty record with an explicit id.
    #[must_use]
    pub const fn with_id(name: MetricName, id: MetricId) -> Self {
        Self {
            name,
            id,
            value: None,
            delta: 0.0,
            entries: Vec::new(),
            is_final: false,
        }
    }

    /// Metric name tag.
    #[must_use]
    pub const fn name(&self) -> &MetricName {
        &self.name
    }

    /// Record identity.
    #[must_use]
    pub const fn id(&self) -> &MetricId {
        &self.id
    }

    /// Delay value; absent until finalized.
    #[must_use]
    pub const fn value(&self) -> Option<f64> {
        self.value
    }

    /// Change since the previously reported value of this record.
    #[must_use]
    pub const fn delta(&self) -> f64 {
        self.delta
    }

    /// Timing events that contributed to the value.
    #[must_use]
    pub fn entries(&self) -> &[TimingEvent] {
        &self.entries
    }

    /// Whether the value is final.
    #[must_use]
    pub const fn is_final(&self) -> bool {
        self.is_final
    }

    /// Record the selected event and its value, marking the record final.
    pub fn finalize(&mut self, event: TimingEvent, value: f64) -> Result<(), MetricError> {
        if self.is_final {
            return Err(MetricError::AlreadyFinal {
                id: self.id.as_str().to_owned(),
            });
        }
        self.value = Some(value);
        self.entries.push(event);
        self.is_final = true;
        Ok(())
    }

    /// Copy of this record with `delta` computed against the previously
    /// reported value (`None` when nothing was reported yet).
    #[must_use]
    pub fn reported_against(&self, previous: Option<f64>) -> Self {
        let mut snapshot = self.clone();
        snapshot.delta = self.value.unwrap_or_default() - previous.unwrap_or_default();
        snapshot
    }
}
