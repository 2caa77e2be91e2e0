//! The adapter stack driven through its port contracts.

use fid_adapters::{PageHost, PageStack, PageTrace};
use fid_domain::{EntryCategory, InputEvent, InputKind, TimingEvent};
use fid_ports::EntryHandler;
use fid_shared::{ErrorCode, ErrorEnvelope};
use std::cell::RefCell;
use std::error::Error;
use std::rc::Rc;

fn collector() -> (Rc<RefCell<Vec<TimingEvent>>>, EntryHandler) {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let handler: EntryHandler = Rc::new(move |event: TimingEvent| sink.borrow_mut().push(event));
    (seen, handler)
}

#[test]
fn native_entries_arrive_on_the_next_tick() {
    let host = PageHost::new();
    let stack = PageStack::new(&host);
    let (seen, handler) = collector();

    let handle = stack.events.observe(EntryCategory::FirstInput, handler);
    assert!(handle.as_ref().is_some_and(|handle| handle.is_connected()));

    host.advance(20.0);
    host.record_entry(TimingEvent::first_input("pointerdown", 5.0, 15.0));
    assert!(seen.borrow().is_empty());

    host.tick();
    assert_eq!(seen.borrow().len(), 1);
    assert_eq!(seen.borrow()[0].name.as_ref(), "pointerdown");
}

#[test]
fn fallback_measures_when_native_observation_is_missing() {
    let host = PageHost::new().without_native_observation();
    let stack = PageStack::new(&host);
    let (native, native_handler) = collector();
    let (seen, handler) = collector();

    assert!(
        stack
            .events
            .observe(EntryCategory::FirstInput, native_handler)
            .is_none()
    );
    stack.fallback.measure(handler);

    host.advance(50.0);
    host.dispatch_input(&InputEvent::new(InputKind::MouseDown, 30.0).with_target("#menu"));

    assert!(native.borrow().is_empty());
    let seen = seen.borrow();
    assert_eq!(seen.len(), 1);
    assert!((seen[0].raw_delay() - 20.0).abs() < f64::EPSILON);
    assert_eq!(seen[0].target.as_deref(), Some("#menu"));
}

#[test]
fn visibility_reflects_the_starting_state() {
    let visible_host = PageHost::new();
    let hidden_host = PageHost::new().starting_hidden();
    let visible = PageStack::new(&visible_host);
    let hidden = PageStack::new(&hidden_host);

    assert!(!visible.visibility.is_hidden());
    assert!(hidden.visibility.is_hidden());
}

#[test]
fn toml_trace_drives_the_host() -> Result<(), Box<dyn Error>> {
    let trace = PageTrace::from_toml_str(
        r#"
nativeFirstInput = true

[[steps]]
step = "advance"
ms = 40

[[steps]]
step = "hidden"

[[steps]]
step = "advance"
ms = 10
"#,
    )?;
    let host = trace.build_host();
    trace.replay(&host);

    assert!((host.now() - 50.0).abs() < f64::EPSILON);
    assert!(host.is_hidden());
    assert_eq!(host.hidden_transition(0), Some(40.0));
    Ok(())
}

#[test]
fn invalid_trace_steps_carry_their_index() {
    let error = PageTrace::from_json_str(
        r#"{ "steps": [ { "step": "tick" }, { "step": "advance", "ms": -1 } ] }"#,
    )
    .err()
    .map(ErrorEnvelope::from);

    let error = error.as_ref();
    assert_eq!(
        error.map(|error| &error.code),
        Some(&ErrorCode::new("trace", "invalid_step"))
    );
    assert_eq!(
        error.and_then(|error| error.metadata.get("step")).map(String::as_str),
        Some("1")
    );
}
