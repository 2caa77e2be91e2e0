//! Native timing-event observation on top of [`PageHost`].

use crate::page::{EntryQueue, PageHost, WeakPageHost};
use fid_ports::{EntryCategory, EntryHandler, EventSourcePort, ObserverHandle, TimingEvent};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

/// One buffered observer subscription.
///
/// Entries are queued by the host and delivered on the next task tick, or
/// synchronously through [`ObserverHandle::flush_pending`].
pub struct PerformanceObserver {
    category: EntryCategory,
    handler: EntryHandler,
    queue: RefCell<VecDeque<TimingEvent>>,
    connected: Cell<bool>,
}

impl PerformanceObserver {
    fn drain(&self) -> Vec<TimingEvent> {
        self.queue.borrow_mut().drain(..).collect()
    }

    fn deliver(&self, events: Vec<TimingEvent>) {
        for event in events {
            // A handler may disconnect this observer mid-batch.
            if !self.connected.get() {
                break;
            }
            (self.handler)(event);
        }
    }
}

impl EntryQueue for PerformanceObserver {
    fn category(&self) -> EntryCategory {
        self.category
    }

    fn enqueue(&self, event: TimingEvent) {
        if self.connected.get() {
            self.queue.borrow_mut().push_back(event);
        }
    }

    fn deliver_queued(&self) {
        let events = self.drain();
        self.deliver(events);
    }
}

impl ObserverHandle for PerformanceObserver {
    fn flush_pending(&self) {
        let events = self.drain();
        tracing::debug!(count = events.len(), "flushing buffered entries");
        self.deliver(events);
    }

    fn disconnect(&self) {
        if self.connected.replace(false) {
            tracing::debug!(category = %self.category, "observer disconnected");
        }
        self.queue.borrow_mut().clear();
    }

    fn is_connected(&self) -> bool {
        self.connected.get()
    }
}

/// Event source adapter creating buffered observers on the host.
#[derive(Clone)]
pub struct PerformanceObserverSource {
    host: WeakPageHost,
}

impl PerformanceObserverSource {
    /// Observe entries recorded on `host`.
    #[must_use]
    pub fn new(host: &PageHost) -> Self {
        Self {
            host: host.downgrade(),
        }
    }
}

impl EventSourcePort for PerformanceObserverSource {
    fn observe(
        &self,
        category: EntryCategory,
        handler: EntryHandler,
    ) -> Option<Rc<dyn ObserverHandle>> {
        let host = self.host.upgrade()?;
        if !host.supports(category) {
            tracing::debug!(%category, "native observation unsupported");
            return None;
        }

        // Buffered observation: entries recorded before this call are
        // replayed on the next tick.
        let observer = Rc::new(PerformanceObserver {
            category,
            handler,
            queue: RefCell::new(host.entries_by_type(category).into()),
            connected: Cell::new(true),
        });
        let queue: Rc<dyn EntryQueue> = observer.clone();
        host.add_entry_queue(Rc::downgrade(&queue));
        let handle: Rc<dyn ObserverHandle> = observer;
        Some(handle)
    }
}
