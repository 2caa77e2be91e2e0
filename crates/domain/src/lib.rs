//! # fid-domain
//!
//! Domain entities and value objects for the first input delay metric.
//!
//! - **Timing** - `TimingEvent`, `EntryCategory`, `HiddenThreshold`
//! - **Metric** - `MetricName`, `MetricId`, `MetricRecord`
//! - **Delay** - `compute_input_delay`, `NegativeDelayPolicy`
//! - **State** - `MetricPhase`, `MeasurementPath`, `RestoreFallback`
//! - **Input** - raw `InputEvent`s for the fallback measurer
//!
//! ## Dependency Rules
//!
//! - Depends only on `shared` crate
//! - Pure domain logic with no I/O

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub use fid_shared::shared_crate_version;

pub mod delay;
pub mod input;
pub mod metric;
pub mod states;
pub mod timing;

pub use delay::{DelayOutcome, NegativeDelayPolicy, compute_input_delay};
pub use input::{InputEvent, InputKind};
pub use metric::{MAX_METRIC_NAME_CHARS, MetricError, MetricId, MetricName, MetricRecord};
pub use states::{MeasurementPath, MetricPhase, RestoreFallback};
pub use timing::{EntryCategory, HiddenThreshold, Timestamp, TimingEvent};

/// Returns the domain crate version.
#[must_use]
pub const fn domain_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
