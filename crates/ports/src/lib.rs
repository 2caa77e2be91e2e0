//! # fid-ports
//!
//! Port traits for the first-input-delay hexagonal architecture.
//!
//! Every external collaborator of the metric state machine is consumed
//! through one of these narrow contracts. The core runs single-threaded and
//! callback-driven, so handlers are `Rc`-shared rather than `Send + Sync`.
//! This crate depends only on `domain` and `shared`.

/// Returns the ports crate version.
#[must_use]
pub const fn ports_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

pub mod events;
pub mod fallback;
pub mod logger;
pub mod reporter;
pub mod restore;
pub mod visibility;

pub use events::*;
pub use fallback::*;
pub use logger::*;
pub use reporter::*;
pub use restore::*;
pub use visibility::*;

// Re-export selected domain types used in port signatures, so adapter crates
// can implement ports without directly depending on `fid-domain`.
pub use fid_domain::{
    EntryCategory, HiddenThreshold, MetricName, MetricRecord, Timestamp, TimingEvent,
};
