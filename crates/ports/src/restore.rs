//! Page restore boundary contract.

use fid_domain::Timestamp;
use std::rc::Rc;

/// Payload of a restore-from-suspended-navigation notification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RestoreEvent {
    /// When the page resumed.
    pub time_stamp: Timestamp,
}

/// Callback invoked on every restore.
pub type RestoreCallback = Rc<dyn Fn(RestoreEvent)>;

/// Boundary contract for restore notifications.
pub trait RestorePort {
    /// Invoke `callback` every time the page resumes from a suspended
    /// navigation state (not on fresh loads).
    fn on_restore(&self, callback: RestoreCallback);
}
