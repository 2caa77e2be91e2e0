//! First-input detection from raw input listeners.
//!
//! Used when the host cannot observe `first-input` entries natively. The
//! delay of an interaction is the time between the input event's creation
//! and the moment its listener runs. Pointer presses are only recorded once
//! the matching release arrives, since a press that turns into a scroll or
//! pinch is cancelled instead.

use crate::page::{ListenerId, PageHost, WeakPageHost};
use fid_domain::{InputEvent, InputKind};
use fid_ports::{EntryHandler, FallbackMeasurePort, Timestamp, TimingEvent};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

#[derive(Debug, Clone)]
struct RecordedInput {
    event: InputEvent,
    delay: f64,
    recorded_at: Timestamp,
}

impl RecordedInput {
    fn synthesize(&self) -> TimingEvent {
        let start_time = self.event.time_stamp;
        let mut entry =
            TimingEvent::first_input(self.event.kind.as_str(), start_time, start_time + self.delay);
        entry.cancelable = self.event.cancelable;
        entry.target = self.event.target.clone();
        entry
    }
}

struct FallbackState {
    host: WeakPageHost,
    armed_at: Timestamp,
    handlers: RefCell<Vec<EntryHandler>>,
    recorded: RefCell<Option<RecordedInput>>,
    listeners: RefCell<Vec<ListenerId>>,
    pointer_listeners: RefCell<Vec<ListenerId>>,
}

/// Fallback measurer listening to `mousedown`, `keydown`, `touchstart` and
/// `pointerdown` on the host.
#[derive(Clone)]
pub struct InputListenerFallback {
    state: Rc<FallbackState>,
}

impl InputListenerFallback {
    /// Install the input listeners on `host`.
    #[must_use]
    pub fn install(host: &PageHost) -> Self {
        let state = Rc::new(FallbackState {
            host: host.downgrade(),
            armed_at: host.now(),
            handlers: RefCell::new(Vec::new()),
            recorded: RefCell::new(None),
            listeners: RefCell::new(Vec::new()),
            pointer_listeners: RefCell::new(Vec::new()),
        });
        add_input_listeners(&state);
        Self { state }
    }

    /// Whether an interaction has been recorded since the last reset.
    #[must_use]
    pub fn has_recorded_input(&self) -> bool {
        self.state.recorded.borrow().is_some()
    }

    /// Number of first-input listeners currently installed.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.state.listeners.borrow().len()
    }
}

impl FallbackMeasurePort for InputListenerFallback {
    fn measure(&self, handler: EntryHandler) {
        self.state.handlers.borrow_mut().push(handler);
        report_if_recorded_and_valid(&self.state);
    }

    fn reset(&self) {
        self.state.handlers.borrow_mut().clear();
        self.state.recorded.borrow_mut().take();
        remove_pointer_listeners(&self.state);
        remove_input_listeners(&self.state);
        add_input_listeners(&self.state);
        tracing::debug!("fallback measurer reset");
    }
}

fn add_input_listeners(state: &Rc<FallbackState>) {
    let Some(host) = state.host.upgrade() else {
        return;
    };
    let ids: Vec<ListenerId> = InputKind::FIRST_INPUT_KINDS
        .iter()
        .map(|kind| {
            let weak = Rc::downgrade(state);
            host.add_input_listener(
                *kind,
                Rc::new(move |event: &InputEvent| on_input(&weak, event)),
            )
        })
        .collect();
    state.listeners.borrow_mut().extend(ids);
}

fn remove_input_listeners(state: &FallbackState) {
    let ids: Vec<ListenerId> = state.listeners.borrow_mut().drain(..).collect();
    if let Some(host) = state.host.upgrade() {
        for id in ids {
            host.remove_input_listener(id);
        }
    }
}

fn remove_pointer_listeners(state: &FallbackState) {
    let ids: Vec<ListenerId> = state.pointer_listeners.borrow_mut().drain(..).collect();
    if let Some(host) = state.host.upgrade() {
        for id in ids {
            host.remove_input_listener(id);
        }
    }
}

fn on_input(state: &Weak<FallbackState>, event: &InputEvent) {
    let Some(state) = state.upgrade() else {
        return;
    };
    // Non-cancelable events are not user interactions we can attribute.
    if !event.cancelable {
        return;
    }
    let Some(host) = state.host.upgrade() else {
        return;
    };
    let delay = host.now() - event.time_stamp;

    if event.kind == InputKind::PointerDown {
        watch_pointer_release(&state, &host, delay, event.clone());
    } else {
        record_first_input(&state, delay, event.clone());
    }
}

fn watch_pointer_release(
    state: &Rc<FallbackState>,
    host: &PageHost,
    delay: f64,
    pointer_down: InputEvent,
) {
    remove_pointer_listeners(state);
    let up_state = Rc::downgrade(state);
    let cancel_state = Rc::downgrade(state);
    let up = host.add_input_listener(
        InputKind::PointerUp,
        Rc::new(move |_event: &InputEvent| {
            if let Some(state) = up_state.upgrade() {
                remove_pointer_listeners(&state);
                record_first_input(&state, delay, pointer_down.clone());
            }
        }),
    );
    let cancel = host.add_input_listener(
        InputKind::PointerCancel,
        Rc::new(move |_event: &InputEvent| {
            if let Some(state) = cancel_state.upgrade() {
                remove_pointer_listeners(&state);
            }
        }),
    );
    state.pointer_listeners.borrow_mut().extend([up, cancel]);
}

fn record_first_input(state: &FallbackState, delay: f64, event: InputEvent) {
    if state.recorded.borrow().is_some() {
        return;
    }
    let Some(host) = state.host.upgrade() else {
        return;
    };
    tracing::debug!(kind = %event.kind, delay, "fallback recorded first input");
    *state.recorded.borrow_mut() = Some(RecordedInput {
        event,
        delay,
        recorded_at: host.now(),
    });
    remove_input_listeners(state);
    report_if_recorded_and_valid(state);
}

fn report_if_recorded_and_valid(state: &FallbackState) {
    let entry = {
        let recorded = state.recorded.borrow();
        let Some(recorded) = recorded.as_ref() else {
            return;
        };
        // A delay longer than the time the listeners have been installed
        // cannot be attributed to this page.
        let window = recorded.recorded_at - state.armed_at;
        if !(recorded.delay >= 0.0 && recorded.delay < window) {
            return;
        }
        recorded.synthesize()
    };

    let handlers: Vec<EntryHandler> = state.handlers.borrow_mut().drain(..).collect();
    for handler in handlers {
        handler(entry.clone());
    }
}
