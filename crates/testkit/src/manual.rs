//! Hand-driven fakes for the page collaborators.
//!
//! Nothing here happens on its own: tests decide when the page hides, when
//! buffered timing events are delivered, and when a restore fires.

use fid_domain::{EntryCategory, HiddenThreshold, MetricRecord, Timestamp, TimingEvent};
use fid_ports::{
    EntryHandler, EventSourcePort, FallbackMeasurePort, FirstHiddenWatch, HiddenCallback,
    HiddenEvent, ObserverHandle, ReportHandler, ReportInvocation, ReporterBinderPort,
    RestoreCallback, RestoreEvent, RestorePort, SharedMetric, VisibilityPort,
};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

// ── Visibility ─────────────────────────────────────────────────────────────

/// First-hidden watch driven by [`ManualVisibility`].
#[derive(Debug)]
pub struct ManualWatch {
    threshold: Cell<HiddenThreshold>,
}

impl FirstHiddenWatch for ManualWatch {
    fn threshold(&self) -> HiddenThreshold {
        self.threshold.get()
    }
}

struct HiddenListener {
    callback: HiddenCallback,
    once: bool,
}

/// Visibility tracker toggled by the test.
#[derive(Default)]
pub struct ManualVisibility {
    hidden: Cell<bool>,
    watches: RefCell<Vec<Weak<ManualWatch>>>,
    listeners: RefCell<Vec<HiddenListener>>,
}

impl ManualVisibility {
    /// Visible page.
    pub fn new() -> Self {
        Self::default()
    }

    /// Page that is already hidden.
    pub fn hidden() -> Self {
        let visibility = Self::default();
        visibility.hidden.set(true);
        visibility
    }

    /// Hide the page at `time_stamp`.
    ///
    /// Latches every open watch that has not seen a hidden transition yet,
    /// then runs hidden listeners in registration order. No-op when the page
    /// is already hidden.
    pub fn hide_at(&self, time_stamp: Timestamp) {
        if self.hidden.replace(true) {
            return;
        }
        self.watches.borrow_mut().retain(|watch| {
            let Some(watch) = watch.upgrade() else {
                return false;
            };
            if watch.threshold.get() == HiddenThreshold::Never {
                watch.threshold.set(HiddenThreshold::at(time_stamp));
            }
            true
        });

        let due: Vec<HiddenCallback> = {
            let mut listeners = self.listeners.borrow_mut();
            let due = listeners
                .iter()
                .map(|listener| Rc::clone(&listener.callback))
                .collect();
            listeners.retain(|listener| !listener.once);
            due
        };
        for callback in due {
            callback(HiddenEvent { time_stamp });
        }
    }

    /// Make the page visible again.
    pub fn show(&self) {
        self.hidden.set(false);
    }

    /// Number of registered hidden listeners still pending.
    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }
}

impl VisibilityPort for ManualVisibility {
    fn watch_first_hidden(&self) -> Rc<dyn FirstHiddenWatch> {
        let initial = if self.hidden.get() {
            HiddenThreshold::at(0.0)
        } else {
            HiddenThreshold::Never
        };
        let watch = Rc::new(ManualWatch {
            threshold: Cell::new(initial),
        });
        self.watches.borrow_mut().push(Rc::downgrade(&watch));
        watch
    }

    fn is_hidden(&self) -> bool {
        self.hidden.get()
    }

    fn on_hidden(&self, callback: HiddenCallback, once: bool) {
        self.listeners
            .borrow_mut()
            .push(HiddenListener { callback, once });
    }
}

// ── Native event source ────────────────────────────────────────────────────

/// Observer handle shared between [`ManualEventSource`] and the core.
#[derive(Default)]
pub struct ManualObserver {
    handler: RefCell<Option<EntryHandler>>,
    pending: RefCell<VecDeque<TimingEvent>>,
    connected: Cell<bool>,
    flushes: Cell<usize>,
}

impl ManualObserver {
    fn take_pending(&self) -> Vec<TimingEvent> {
        self.pending.borrow_mut().drain(..).collect()
    }

    fn handler(&self) -> Option<EntryHandler> {
        if self.connected.get() {
            self.handler.borrow().clone()
        } else {
            None
        }
    }
}

impl ObserverHandle for ManualObserver {
    fn flush_pending(&self) {
        self.flushes.set(self.flushes.get() + 1);
        let Some(handler) = self.handler() else {
            return;
        };
        for event in self.take_pending() {
            handler(event);
        }
    }

    fn disconnect(&self) {
        self.connected.set(false);
        self.pending.borrow_mut().clear();
    }

    fn is_connected(&self) -> bool {
        self.connected.get()
    }
}

/// Native timing-event source fed by the test.
pub struct ManualEventSource {
    supported: bool,
    observer: Rc<ManualObserver>,
    observe_calls: Cell<usize>,
}

impl ManualEventSource {
    /// Source that supports native `first-input` observation.
    pub fn new() -> Self {
        Self {
            supported: true,
            observer: Rc::new(ManualObserver::default()),
            observe_calls: Cell::new(0),
        }
    }

    /// Source without native support (`observe` returns `None`).
    pub fn unsupported() -> Self {
        Self {
            supported: false,
            ..Self::new()
        }
    }

    /// Buffer `event` without delivering it.
    pub fn queue(&self, event: TimingEvent) {
        if self.observer.connected.get() {
            self.observer.pending.borrow_mut().push_back(event);
        }
    }

    /// Deliver every buffered event (one host task tick).
    pub fn tick(&self) {
        let Some(handler) = self.observer.handler() else {
            return;
        };
        for event in self.observer.take_pending() {
            handler(event);
        }
    }

    /// Buffer `event` and deliver it right away.
    pub fn deliver(&self, event: TimingEvent) {
        self.queue(event);
        self.tick();
    }

    /// Number of `observe` calls received.
    pub fn observe_calls(&self) -> usize {
        self.observe_calls.get()
    }

    /// Number of `flush_pending` calls received.
    pub fn flushes(&self) -> usize {
        self.observer.flushes.get()
    }

    /// Whether the subscription is still connected.
    pub fn is_connected(&self) -> bool {
        self.observer.connected.get()
    }

    /// Drop the subscription as a reporter would after its final report.
    pub fn disconnect(&self) {
        self.observer.disconnect();
    }
}

impl Default for ManualEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSourcePort for ManualEventSource {
    fn observe(
        &self,
        category: EntryCategory,
        handler: EntryHandler,
    ) -> Option<Rc<dyn ObserverHandle>> {
        self.observe_calls.set(self.observe_calls.get() + 1);
        if !self.supported || category != EntryCategory::FirstInput {
            return None;
        }
        *self.observer.handler.borrow_mut() = Some(handler);
        self.observer.connected.set(true);
        let handle: Rc<dyn ObserverHandle> = self.observer.clone();
        Some(handle)
    }
}

// ── Fallback measurer ──────────────────────────────────────────────────────

/// Fallback measurer that emits whatever the test tells it to.
///
/// Like the real measurer, pending handlers are served once and cleared.
#[derive(Default)]
pub struct ManualFallback {
    handlers: RefCell<Vec<EntryHandler>>,
    measures: Cell<usize>,
    resets: Cell<usize>,
}

impl ManualFallback {
    /// Empty measurer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `event` to every pending handler.
    pub fn emit(&self, event: TimingEvent) {
        let handlers: Vec<EntryHandler> = self.handlers.borrow_mut().drain(..).collect();
        for handler in handlers {
            handler(event.clone());
        }
    }

    /// Number of `measure` calls.
    pub fn measures(&self) -> usize {
        self.measures.get()
    }

    /// Number of `reset` calls.
    pub fn resets(&self) -> usize {
        self.resets.get()
    }
}

impl FallbackMeasurePort for ManualFallback {
    fn measure(&self, handler: EntryHandler) {
        self.measures.set(self.measures.get() + 1);
        self.handlers.borrow_mut().push(handler);
    }

    fn reset(&self) {
        self.resets.set(self.resets.get() + 1);
        self.handlers.borrow_mut().clear();
    }
}

// ── Restore notifier ───────────────────────────────────────────────────────

/// Restore notifier fired by the test.
#[derive(Default)]
pub struct ManualRestore {
    callbacks: RefCell<Vec<RestoreCallback>>,
}

impl ManualRestore {
    /// Notifier without callbacks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire every registered callback.
    pub fn restore_at(&self, time_stamp: Timestamp) {
        let callbacks = self.callbacks.borrow().clone();
        for callback in callbacks {
            callback(RestoreEvent { time_stamp });
        }
    }

    /// Number of registered callbacks.
    pub fn callback_count(&self) -> usize {
        self.callbacks.borrow().len()
    }
}

impl RestorePort for ManualRestore {
    fn on_restore(&self, callback: RestoreCallback) {
        self.callbacks.borrow_mut().push(callback);
    }
}

// ── Reporter binder ────────────────────────────────────────────────────────

struct ImmediateBinding {
    on_report: ReportHandler,
    metric: Weak<RefCell<MetricRecord>>,
    delivered: Cell<bool>,
}

impl ReportInvocation for ImmediateBinding {
    fn invoke(&self) {
        if self.delivered.get() {
            return;
        }
        let Some(metric) = self.metric.upgrade() else {
            return;
        };
        let snapshot = {
            let record = metric.borrow();
            if !record.is_final() {
                return;
            }
            record.reported_against(None)
        };
        self.delivered.set(true);
        (self.on_report)(&snapshot);
    }
}

/// Binder that reports a final record on explicit invocation only.
///
/// It never hooks the hidden transition and never touches the observer,
/// which keeps core tests independent of the real binder.
#[derive(Default)]
pub struct ImmediateBinder {
    binds: Cell<usize>,
}

impl ImmediateBinder {
    /// Binder with no bindings yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of bindings created.
    pub fn binds(&self) -> usize {
        self.binds.get()
    }
}

impl ReporterBinderPort for ImmediateBinder {
    fn bind(
        &self,
        on_report: ReportHandler,
        metric: &SharedMetric,
        _observer: Option<Rc<dyn ObserverHandle>>,
    ) -> Rc<dyn ReportInvocation> {
        self.binds.set(self.binds.get() + 1);
        Rc::new(ImmediateBinding {
            on_report,
            metric: Rc::downgrade(metric),
            delivered: Cell::new(false),
        })
    }
}
