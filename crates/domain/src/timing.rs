//! Timing events and the hidden-page threshold.
//!
//! All timestamps are milliseconds on the page's high-resolution clock
//! (time origin = navigation start).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Milliseconds since the page's time origin.
pub type Timestamp = f64;

/// Timing entry categories the metric core subscribes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntryCategory {
    /// The first discrete user interaction on the page.
    FirstInput,
}

impl EntryCategory {
    /// Stable category string as exposed by hosts.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FirstInput => "first-input",
        }
    }
}

impl fmt::Display for EntryCategory {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// A timing event delivered by the host (native observer or fallback).
///
/// Immutable once received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimingEvent {
    /// Entry category.
    pub entry_type: EntryCategory,
    /// Interaction event type (e.g. `pointerdown`, `keydown`).
    pub name: Box<str>,
    /// When the interaction began.
    pub start_time: Timestamp,
    /// When the host began processing the interaction.
    pub processing_start: Timestamp,
    /// Whether the originating input event was cancelable.
    #[serde(default)]
    pub cancelable: bool,
    /// Optional description of the interaction target.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<Box<str>>,
}

impl TimingEvent {
    /// Build a `first-input` timing event.
    #[must_use]
    pub fn first_input(
        name: impl Into<Box<str>>,
        start_time: Timestamp,
        processing_start: Timestamp,
    ) -> Self {
        Self {
            entry_type: EntryCategory::FirstInput,
            name: name.into(),
            start_time,
            processing_start,
            cancelable: true,
            target: None,
        }
    }

    /// Attach a target description.
    #[must_use]
    pub fn with_target(mut self, target: impl Into<Box<str>>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Raw input delay (`processing_start - start_time`), unvalidated.
    #[must_use]
    pub fn raw_delay(&self) -> f64 {
        self.processing_start - self.start_time
    }
}

/// Timestamp of the first page-hidden transition for one epoch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum HiddenThreshold {
    /// The page has not been hidden (infinity).
    Never,
    /// The page was first hidden at `timestamp`.
    At {
        /// Hidden transition timestamp.
        timestamp: Timestamp,
    },
}

impl HiddenThreshold {
    /// Threshold at an explicit timestamp.
    #[must_use]
    pub const fn at(timestamp: Timestamp) -> Self {
        Self::At { timestamp }
    }

    /// Threshold value in milliseconds (`Never` maps to infinity).
    #[must_use]
    pub const fn as_millis(self) -> f64 {
        match self {
            Self::Never => f64::INFINITY,
            Self::At { timestamp } => timestamp,
        }
    }

    /// Returns true when an event starting at `start_time` precedes the
    /// first hidden transition.
    ///
    /// A `NaN` start time is never admitted.
    #[must_use]
    pub fn admits(self, start_time: Timestamp) -> bool {
        start_time < self.as_millis()
    }
}

impl fmt::Display for HiddenThreshold {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Never => formatter.write_str("never"),
            Self::At { timestamp } => write!(formatter, "{timestamp}ms"),
        }
    }
}
