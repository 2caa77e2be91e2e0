//! Page visibility boundary contract.

use fid_domain::{HiddenThreshold, Timestamp};
use std::rc::Rc;

/// Payload of a page-hidden notification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HiddenEvent {
    /// When the page became hidden.
    pub time_stamp: Timestamp,
}

/// Callback invoked on page-hidden transitions.
pub type HiddenCallback = Rc<dyn Fn(HiddenEvent)>;

/// First-hidden timestamp for one epoch.
///
/// Starts at `0` if the page was hidden when the watch was created, `Never`
/// otherwise, and latches the timestamp of the first hidden transition
/// observed after creation.
pub trait FirstHiddenWatch {
    /// Current threshold.
    fn threshold(&self) -> HiddenThreshold;
}

/// Boundary contract for visibility tracking.
pub trait VisibilityPort {
    /// Start a first-hidden watch. Called once per epoch.
    fn watch_first_hidden(&self) -> Rc<dyn FirstHiddenWatch>;

    /// Whether the page is hidden right now.
    fn is_hidden(&self) -> bool;

    /// Invoke `callback` when the page becomes hidden.
    ///
    /// With `once`, the callback fires for the first hidden transition only.
    /// Callbacks fire in registration order.
    fn on_hidden(&self, callback: HiddenCallback, once: bool);
}
