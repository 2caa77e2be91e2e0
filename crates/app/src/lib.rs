//! # fid-app
//!
//! The first input delay metric state machine.
//! This crate depends on `ports`, `domain`, and `shared`.

pub mod first_input_delay;

/// Returns the app crate version.
#[must_use]
pub const fn app_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

pub use first_input_delay::{
    FirstInputDelayDeps, FirstInputDelayOptions, Selection, observe_first_input_delay,
};
