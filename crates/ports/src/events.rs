//! Timing-event observation boundary contract.

use fid_domain::{EntryCategory, TimingEvent};
use std::rc::Rc;

/// Handler receiving timing events in delivery order.
pub type EntryHandler = Rc<dyn Fn(TimingEvent)>;

/// Live subscription returned by [`EventSourcePort::observe`].
pub trait ObserverHandle {
    /// Deliver every buffered-but-undelivered event through the handler,
    /// synchronously, before returning.
    fn flush_pending(&self);

    /// Stop delivering events. Buffered events are discarded.
    fn disconnect(&self);

    /// Whether the subscription still delivers events.
    fn is_connected(&self) -> bool;
}

/// Boundary contract for host-native timing observation.
pub trait EventSourcePort {
    /// Start delivering events of `category` to `handler`.
    ///
    /// Delivery is asynchronous: `handler` is never invoked from within
    /// `observe` itself. Returns `None` when the host cannot observe the
    /// category natively.
    fn observe(
        &self,
        category: EntryCategory,
        handler: EntryHandler,
    ) -> Option<Rc<dyn ObserverHandle>>;
}
