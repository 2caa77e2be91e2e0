//! Input delay computation and the negative-delay policy.

use crate::TimingEvent;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a negative (or non-numeric) computed delay is treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NegativeDelayPolicy {
    /// Report the raw value unmodified and flag it.
    #[default]
    Surface,
    /// Report zero and flag it.
    Clamp,
    /// Treat the event as non-qualifying and flag it.
    Drop,
}

impl NegativeDelayPolicy {
    /// Stable config string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Surface => "surface",
            Self::Clamp => "clamp",
            Self::Drop => "drop",
        }
    }

    /// Parse the config string (case-insensitive).
    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "surface" => Some(Self::Surface),
            "clamp" => Some(Self::Clamp),
            "drop" => Some(Self::Drop),
            _ => None,
        }
    }
}

impl fmt::Display for NegativeDelayPolicy {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Result of computing the delay of a candidate event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DelayOutcome {
    /// `processing_start - start_time` is zero or positive.
    Valid(f64),
    /// Negative delay reported unmodified.
    Surfaced(f64),
    /// Negative delay reported as zero.
    Clamped {
        /// Delay before clamping.
        raw: f64,
    },
    /// Negative delay; the event does not qualify.
    Dropped {
        /// Rejected delay.
        raw: f64,
    },
}

impl DelayOutcome {
    /// Value to record on the metric, or `None` when the event is dropped.
    #[must_use]
    pub const fn reported_value(self) -> Option<f64> {
        match self {
            Self::Valid(value) | Self::Surfaced(value) => Some(value),
            Self::Clamped { .. } => Some(0.0),
            Self::Dropped { .. } => None,
        }
    }

    /// Delay as computed from the event, before any policy was applied.
    #[must_use]
    pub const fn raw(self) -> f64 {
        match self {
            Self::Valid(raw) | Self::Surfaced(raw) | Self::Clamped { raw } | Self::Dropped { raw } => {
                raw
            },
        }
    }

    /// Returns true when the raw delay was not a non-negative number.
    #[must_use]
    pub const fn is_data_quality_issue(self) -> bool {
        !matches!(self, Self::Valid(_))
    }
}

/// Compute the input delay of `event` under `policy`.
#[must_use]
pub fn compute_input_delay(event: &TimingEvent, policy: NegativeDelayPolicy) -> DelayOutcome {
    let raw = event.raw_delay();
    // `NaN >= 0.0` is false, so non-numeric delays go through the policy too.
    if raw >= 0.0 {
        return DelayOutcome::Valid(raw);
    }
    match policy {
        NegativeDelayPolicy::Surface => DelayOutcome::Surfaced(raw),
        NegativeDelayPolicy::Clamp => DelayOutcome::Clamped { raw },
        NegativeDelayPolicy::Drop => DelayOutcome::Dropped { raw },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_delay_is_valid() {
        let event = TimingEvent::first_input("mousedown", 40.0, 40.0);
        let outcome = compute_input_delay(&event, NegativeDelayPolicy::Drop);
        assert_eq!(outcome, DelayOutcome::Valid(0.0));
        assert!(!outcome.is_data_quality_issue());
    }

    #[test]
    fn negative_delay_follows_policy() {
        let event = TimingEvent::first_input("keydown", 50.0, 45.0);

        let surfaced = compute_input_delay(&event, NegativeDelayPolicy::Surface);
        assert_eq!(surfaced.reported_value(), Some(-5.0));

        let clamped = compute_input_delay(&event, NegativeDelayPolicy::Clamp);
        assert_eq!(clamped.reported_value(), Some(0.0));
        assert!((clamped.raw() + 5.0).abs() < f64::EPSILON);

        let dropped = compute_input_delay(&event, NegativeDelayPolicy::Drop);
        assert_eq!(dropped.reported_value(), None);
        assert!(dropped.is_data_quality_issue());
    }

    #[test]
    fn nan_delay_is_a_data_quality_issue() {
        let event = TimingEvent::first_input("keydown", 50.0, f64::NAN);
        let outcome = compute_input_delay(&event, NegativeDelayPolicy::Clamp);
        assert_eq!(outcome.reported_value(), Some(0.0));
        assert!(outcome.is_data_quality_issue());
    }

    #[test]
    fn policy_parse_round_trips_config_strings() {
        for policy in [
            NegativeDelayPolicy::Surface,
            NegativeDelayPolicy::Clamp,
            NegativeDelayPolicy::Drop,
        ] {
            assert_eq!(NegativeDelayPolicy::parse(policy.as_str()), Some(policy));
        }
        assert_eq!(NegativeDelayPolicy::parse(" CLAMP "), Some(NegativeDelayPolicy::Clamp));
        assert_eq!(NegativeDelayPolicy::parse("ignore"), None);
    }
}
