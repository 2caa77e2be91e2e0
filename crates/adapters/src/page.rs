//! In-process page model shared by the page adapters.
//!
//! `PageHost` owns the clock, the visibility state, the performance-entry
//! timeline and the listener lists. Everything is single-threaded: listener
//! callbacks run synchronously on the caller's stack, in registration order,
//! and never while a host borrow is held, so callbacks may freely register
//! or remove listeners.

use fid_domain::{EntryCategory, InputEvent, InputKind, Timestamp, TimingEvent};
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

/// Handle returned by listener registration, used for removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Payload of a visibility change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibilityChange {
    /// Visibility after the change.
    pub hidden: bool,
    /// When the change happened.
    pub time_stamp: Timestamp,
}

/// Payload of a page-show notification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageShow {
    /// True when the page resumed from a suspended navigation state.
    pub persisted: bool,
    /// When the page was shown.
    pub time_stamp: Timestamp,
}

/// Visibility listener.
pub type VisibilityListener = Rc<dyn Fn(VisibilityChange)>;
/// Page-show listener.
pub type PageShowListener = Rc<dyn Fn(PageShow)>;
/// Raw input listener.
pub type InputListener = Rc<dyn Fn(&InputEvent)>;

/// Receiver of performance entries, registered by observers.
pub trait EntryQueue {
    /// Category this queue receives.
    fn category(&self) -> EntryCategory;

    /// Buffer a newly recorded entry.
    fn enqueue(&self, event: TimingEvent);

    /// Deliver everything buffered (one host task tick).
    fn deliver_queued(&self);
}

struct Registered<L> {
    id: ListenerId,
    listener: L,
}

struct InputRegistration {
    kind: InputKind,
    listener: InputListener,
}

struct PageState {
    now: Cell<Timestamp>,
    hidden: Cell<bool>,
    supported: RefCell<Vec<EntryCategory>>,
    hidden_transitions: RefCell<Vec<Timestamp>>,
    timeline: RefCell<Vec<TimingEvent>>,
    queues: RefCell<Vec<Weak<dyn EntryQueue>>>,
    visibility_listeners: RefCell<Vec<Registered<VisibilityListener>>>,
    page_show_listeners: RefCell<Vec<Registered<PageShowListener>>>,
    input_listeners: RefCell<Vec<Registered<InputRegistration>>>,
    next_listener: Cell<u64>,
}

/// The in-process page.
#[derive(Clone)]
pub struct PageHost {
    state: Rc<PageState>,
}

/// Non-owning handle to a [`PageHost`], held by adapters.
#[derive(Clone)]
pub struct WeakPageHost {
    state: Weak<PageState>,
}

impl WeakPageHost {
    /// Upgrade to a live host, if the page still exists.
    pub fn upgrade(&self) -> Option<PageHost> {
        self.state.upgrade().map(|state| PageHost { state })
    }
}

impl Default for PageHost {
    fn default() -> Self {
        Self::new()
    }
}

impl PageHost {
    /// Visible page at time 0 with native `first-input` support.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Rc::new(PageState {
                now: Cell::new(0.0),
                hidden: Cell::new(false),
                supported: RefCell::new(vec![EntryCategory::FirstInput]),
                hidden_transitions: RefCell::new(Vec::new()),
                timeline: RefCell::new(Vec::new()),
                queues: RefCell::new(Vec::new()),
                visibility_listeners: RefCell::new(Vec::new()),
                page_show_listeners: RefCell::new(Vec::new()),
                input_listeners: RefCell::new(Vec::new()),
                next_listener: Cell::new(0),
            }),
        }
    }

    /// Remove native support for every entry category.
    #[must_use]
    pub fn without_native_observation(self) -> Self {
        self.state.supported.borrow_mut().clear();
        self
    }

    /// Start the page in the hidden state (e.g. opened in a background tab).
    #[must_use]
    pub fn starting_hidden(self) -> Self {
        self.state.hidden.set(true);
        self
    }

    /// Non-owning handle.
    #[must_use]
    pub fn downgrade(&self) -> WeakPageHost {
        WeakPageHost {
            state: Rc::downgrade(&self.state),
        }
    }

    // ── Clock ──────────────────────────────────────────────────────────────

    /// Current time in milliseconds since the time origin.
    #[must_use]
    pub fn now(&self) -> Timestamp {
        self.state.now.get()
    }

    /// Move the clock forward by `ms` (negative or non-finite values are
    /// ignored).
    pub fn advance(&self, ms: f64) {
        if ms.is_finite() && ms > 0.0 {
            self.state.now.set(self.now() + ms);
        }
    }

    // ── Visibility ─────────────────────────────────────────────────────────

    /// Whether the page is hidden.
    #[must_use]
    pub fn is_hidden(&self) -> bool {
        self.state.hidden.get()
    }

    /// Number of visible-to-hidden transitions so far.
    #[must_use]
    pub fn hidden_transition_count(&self) -> usize {
        self.state.hidden_transitions.borrow().len()
    }

    /// Timestamp of the `index`-th visible-to-hidden transition.
    #[must_use]
    pub fn hidden_transition(&self, index: usize) -> Option<Timestamp> {
        self.state.hidden_transitions.borrow().get(index).copied()
    }

    /// Hide the page now. No-op when already hidden.
    pub fn hide(&self) {
        if self.state.hidden.replace(true) {
            return;
        }
        let time_stamp = self.now();
        self.state.hidden_transitions.borrow_mut().push(time_stamp);
        tracing::debug!(time_stamp, "page hidden");
        self.dispatch_visibility(VisibilityChange {
            hidden: true,
            time_stamp,
        });
    }

    /// Show the page now. No-op when already visible.
    pub fn show(&self) {
        if !self.state.hidden.replace(false) {
            return;
        }
        let time_stamp = self.now();
        tracing::debug!(time_stamp, "page visible");
        self.dispatch_visibility(VisibilityChange {
            hidden: false,
            time_stamp,
        });
    }

    /// Register a visibility listener.
    pub fn add_visibility_listener(&self, listener: VisibilityListener) -> ListenerId {
        let id = self.next_listener_id();
        self.state
            .visibility_listeners
            .borrow_mut()
            .push(Registered { id, listener });
        id
    }

    /// Remove a visibility listener. Unknown ids are ignored.
    pub fn remove_visibility_listener(&self, id: ListenerId) {
        self.state
            .visibility_listeners
            .borrow_mut()
            .retain(|registered| registered.id != id);
    }

    fn dispatch_visibility(&self, change: VisibilityChange) {
        let listeners: Vec<VisibilityListener> = self
            .state
            .visibility_listeners
            .borrow()
            .iter()
            .map(|registered| Rc::clone(&registered.listener))
            .collect();
        for listener in listeners {
            listener(change);
        }
    }

    // ── Navigation ─────────────────────────────────────────────────────────

    /// Resume the page from a suspended navigation state.
    ///
    /// The page becomes visible first, then page-show listeners run with
    /// `persisted = true`.
    pub fn restore(&self) {
        self.show();
        let time_stamp = self.now();
        tracing::debug!(time_stamp, "page restored");
        let listeners: Vec<PageShowListener> = self
            .state
            .page_show_listeners
            .borrow()
            .iter()
            .map(|registered| Rc::clone(&registered.listener))
            .collect();
        for listener in listeners {
            listener(PageShow {
                persisted: true,
                time_stamp,
            });
        }
    }

    /// Register a page-show listener.
    pub fn add_page_show_listener(&self, listener: PageShowListener) -> ListenerId {
        let id = self.next_listener_id();
        self.state
            .page_show_listeners
            .borrow_mut()
            .push(Registered { id, listener });
        id
    }

    // ── Raw input ──────────────────────────────────────────────────────────

    /// Register an input listener for one event kind.
    pub fn add_input_listener(&self, kind: InputKind, listener: InputListener) -> ListenerId {
        let id = self.next_listener_id();
        self.state.input_listeners.borrow_mut().push(Registered {
            id,
            listener: InputRegistration { kind, listener },
        });
        id
    }

    /// Remove an input listener. Unknown ids are ignored.
    pub fn remove_input_listener(&self, id: ListenerId) {
        self.state
            .input_listeners
            .borrow_mut()
            .retain(|registered| registered.id != id);
    }

    /// Number of registered input listeners.
    #[must_use]
    pub fn input_listener_count(&self) -> usize {
        self.state.input_listeners.borrow().len()
    }

    /// Dispatch a raw input event to the listeners of its kind.
    pub fn dispatch_input(&self, event: &InputEvent) {
        tracing::debug!(kind = %event.kind, time_stamp = event.time_stamp, "input dispatched");
        let listeners: Vec<InputListener> = self
            .state
            .input_listeners
            .borrow()
            .iter()
            .filter(|registered| registered.listener.kind == event.kind)
            .map(|registered| Rc::clone(&registered.listener.listener))
            .collect();
        for listener in listeners {
            listener(event);
        }
    }

    // ── Performance timeline ───────────────────────────────────────────────

    /// Whether entries of `category` can be observed natively.
    #[must_use]
    pub fn supports(&self, category: EntryCategory) -> bool {
        self.state.supported.borrow().contains(&category)
    }

    /// Record a performance entry.
    ///
    /// The entry joins the timeline and is buffered in every live queue of
    /// its category; nothing is delivered until the next [`PageHost::tick`].
    /// Entries of unsupported categories are discarded, and so is any
    /// `first-input` entry after the first one of the document.
    pub fn record_entry(&self, event: TimingEvent) {
        if !self.supports(event.entry_type) {
            tracing::debug!(category = %event.entry_type, "entry of unsupported category dropped");
            return;
        }
        if event.entry_type == EntryCategory::FirstInput
            && !self.entries_by_type(EntryCategory::FirstInput).is_empty()
        {
            tracing::debug!(
                start_time = event.start_time,
                "first-input already recorded for this document"
            );
            return;
        }
        let queues = self.live_queues();
        for queue in queues
            .iter()
            .filter(|queue| queue.category() == event.entry_type)
        {
            queue.enqueue(event.clone());
        }
        self.state.timeline.borrow_mut().push(event);
    }

    /// Entries recorded so far for `category`.
    #[must_use]
    pub fn entries_by_type(&self, category: EntryCategory) -> Vec<TimingEvent> {
        self.state
            .timeline
            .borrow()
            .iter()
            .filter(|event| event.entry_type == category)
            .cloned()
            .collect()
    }

    /// Register an entry queue.
    pub fn add_entry_queue(&self, queue: Weak<dyn EntryQueue>) {
        self.state.queues.borrow_mut().push(queue);
    }

    /// Run one task tick: every queue delivers its buffered entries.
    pub fn tick(&self) {
        for queue in self.live_queues() {
            queue.deliver_queued();
        }
    }

    fn live_queues(&self) -> Vec<Rc<dyn EntryQueue>> {
        let mut queues = self.state.queues.borrow_mut();
        queues.retain(|queue| queue.strong_count() > 0);
        queues.iter().filter_map(Weak::upgrade).collect()
    }

    fn next_listener_id(&self) -> ListenerId {
        let id = self.state.next_listener.get();
        self.state.next_listener.set(id + 1);
        ListenerId(id)
    }
}
