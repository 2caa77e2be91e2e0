//! First input delay: select the first qualifying interaction of each epoch
//! and report its delay exactly once.
//!
//! Lifecycle:
//! - initialization opens epoch 0, subscribes to `first-input` timing events
//!   (native observer, or the fallback measurer when native observation is
//!   unsupported), and registers a restore callback
//! - each event is offered to the current epoch; the first qualifying one
//!   finalizes the record and triggers the bound reporter
//! - on each epoch's first hidden transition, buffered native events are
//!   flushed through the same path before the reporter's own hidden hook runs
//! - on restore, the epoch is replaced wholesale and the fallback measurer is
//!   reset and re-engaged when required; a native source that already
//!   delivered its once-per-document entry counts as spent

mod epoch;

pub use epoch::Selection;

use epoch::{Epoch, EpochSeed};
use fid_domain::{
    EntryCategory, MeasurementPath, MetricName, NegativeDelayPolicy, RestoreFallback, TimingEvent,
};
use fid_ports::{
    EntryHandler, EventSourcePort, FallbackMeasurePort, LogFields, LoggerPort, MetricFactoryPort,
    ObserverHandle, ReportHandler, ReportInvocation, ReporterBinderPort, RestoreEvent, RestorePort,
    VisibilityPort,
};
use serde_json::Value;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

/// Dependencies required by the first input delay state machine.
#[derive(Clone)]
pub struct FirstInputDelayDeps {
    /// Visibility tracker (first-hidden watch + hidden notifications).
    pub visibility: Rc<dyn VisibilityPort>,
    /// Native timing-event source.
    pub events: Rc<dyn EventSourcePort>,
    /// Fallback measurer used without native observation.
    pub fallback: Rc<dyn FallbackMeasurePort>,
    /// Restore notifier.
    pub restore: Rc<dyn RestorePort>,
    /// Reporter binder.
    pub reporter: Rc<dyn ReporterBinderPort>,
    /// Metric record factory.
    pub metrics: Rc<dyn MetricFactoryPort>,
    /// Optional logger.
    pub logger: Option<Rc<dyn LoggerPort>>,
}

/// Behavioural options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FirstInputDelayOptions {
    /// Treatment of negative computed delays.
    pub negative_delay: NegativeDelayPolicy,
    /// When to reset and engage the fallback measurer on restore.
    pub restore_fallback: RestoreFallback,
}

struct Machine {
    deps: FirstInputDelayDeps,
    options: FirstInputDelayOptions,
    name: MetricName,
    on_report: ReportHandler,
    handler: EntryHandler,
    native: Option<Rc<dyn ObserverHandle>>,
    native_delivered: Cell<bool>,
    epoch: Epoch,
}

type SharedMachine = Rc<RefCell<Machine>>;

/// Register the first input delay metric.
///
/// `on_report` receives at most one finished record per epoch (initial load
/// or one restore cycle). Everything else happens in reaction to host
/// callbacks; the machine lives as long as the restore notifier keeps its
/// callback.
pub fn observe_first_input_delay(
    deps: FirstInputDelayDeps,
    options: FirstInputDelayOptions,
    on_report: ReportHandler,
) {
    let name = MetricName::first_input_delay();

    let machine: SharedMachine = Rc::new_cyclic(|weak: &Weak<RefCell<Machine>>| {
        let handler = entry_handler(weak.clone());
        let native = deps
            .events
            .observe(EntryCategory::FirstInput, native_entry_handler(weak.clone()));

        let path = if native.is_some() {
            MeasurementPath::Native
        } else {
            MeasurementPath::Fallback
        };
        let epoch = Epoch::open(
            &EpochSeed {
                visibility: deps.visibility.as_ref(),
                metrics: deps.metrics.as_ref(),
                reporter: deps.reporter.as_ref(),
                on_report: &on_report,
                observer: native.clone(),
            },
            &name,
            0,
            path,
        );

        RefCell::new(Machine {
            deps: deps.clone(),
            options,
            name,
            on_report: Rc::clone(&on_report),
            handler,
            native,
            native_delivered: Cell::new(false),
            epoch,
        })
    });

    let (path, handler, fields) = {
        let state = machine.borrow();
        (
            state.epoch.path(),
            Rc::clone(&state.handler),
            epoch_fields(&state.epoch),
        )
    };
    if let Some(logger) = deps.logger.as_ref() {
        logger.info("fid.epoch.armed", "First input delay armed", Some(fields));
    }

    if path == MeasurementPath::Fallback {
        if let Some(logger) = deps.logger.as_ref() {
            logger.info(
                "fid.source.fallback",
                "Native first-input observation unsupported; using fallback measurer",
                None,
            );
        }
        deps.fallback.measure(handler);
    }

    let anchor = Rc::clone(&machine);
    deps.restore
        .on_restore(Rc::new(move |event: RestoreEvent| rearm(&anchor, event)));
}

fn entry_handler(machine: Weak<RefCell<Machine>>) -> EntryHandler {
    Rc::new(move |event: TimingEvent| {
        if let Some(machine) = machine.upgrade() {
            dispatch(&machine, event);
        }
    })
}

fn native_entry_handler(machine: Weak<RefCell<Machine>>) -> EntryHandler {
    Rc::new(move |event: TimingEvent| {
        if let Some(machine) = machine.upgrade() {
            if let Ok(state) = machine.try_borrow() {
                state.native_delivered.set(true);
            }
            dispatch(&machine, event);
        }
    })
}

fn dispatch(machine: &SharedMachine, event: TimingEvent) {
    let report = match machine.try_borrow() {
        Ok(state) => state.handle(event),
        Err(_) => {
            tracing::warn!(
                start_time = event.start_time,
                "re-entrant first-input delivery dropped"
            );
            None
        },
    };
    // Invoked last, after every state change of this event is complete.
    if let Some(report) = report {
        report.invoke();
    }
}

impl Machine {
    fn handle(&self, event: TimingEvent) -> Option<Rc<dyn ReportInvocation>> {
        let name = event.name.clone();
        let start_time = event.start_time;
        let selection = self.epoch.offer(event, self.options.negative_delay);
        tracing::debug!(
            epoch = self.epoch.seq(),
            event = %name,
            start_time,
            selection = ?selection,
            "first-input event offered"
        );

        match selection {
            Selection::Finalized { value, outcome } => {
                if outcome.is_data_quality_issue() {
                    self.log_negative_delay(outcome.raw(), start_time);
                }
                if let Some(logger) = self.deps.logger.as_ref() {
                    let mut fields = epoch_fields(&self.epoch);
                    fields.insert("event".into(), Value::String(name.to_string()));
                    fields.insert("startTime".into(), Value::from(start_time));
                    fields.insert("value".into(), Value::from(value));
                    logger.info(
                        "fid.metric.finalized",
                        "First input delay finalized",
                        Some(fields),
                    );
                }
                Some(self.epoch.reporter())
            },
            Selection::Disqualified { threshold } => {
                if let Some(logger) = self.deps.logger.as_ref() {
                    let mut fields = epoch_fields(&self.epoch);
                    fields.insert("startTime".into(), Value::from(start_time));
                    fields.insert("hiddenAt".into(), Value::String(threshold.to_string()));
                    logger.debug(
                        "fid.event.disqualified",
                        "Input started after the page was hidden",
                        Some(fields),
                    );
                }
                None
            },
            Selection::Dropped { raw } => {
                self.log_negative_delay(raw, start_time);
                None
            },
            Selection::Ignored => None,
        }
    }

    fn log_negative_delay(&self, raw: f64, start_time: f64) {
        if let Some(logger) = self.deps.logger.as_ref() {
            let mut fields = epoch_fields(&self.epoch);
            fields.insert("rawDelay".into(), Value::from(raw));
            fields.insert("startTime".into(), Value::from(start_time));
            fields.insert(
                "policy".into(),
                Value::String(self.options.negative_delay.as_str().to_owned()),
            );
            logger.warn(
                "fid.delay.negative",
                "Timing event produced a negative input delay",
                Some(fields),
            );
        }
    }
}

struct RearmPlan {
    deps: FirstInputDelayDeps,
    name: MetricName,
    on_report: ReportHandler,
    handler: EntryHandler,
    observer: Option<Rc<dyn ObserverHandle>>,
    engage_fallback: bool,
    path: MeasurementPath,
    seq: u64,
}

fn rearm(machine: &SharedMachine, event: RestoreEvent) {
    let Some(plan) = plan_rearm(machine) else {
        tracing::warn!("restore notification arrived while the machine was busy");
        return;
    };

    // Built without holding the machine borrow: binders and watches may
    // register host listeners.
    let epoch = Epoch::open(
        &EpochSeed {
            visibility: plan.deps.visibility.as_ref(),
            metrics: plan.deps.metrics.as_ref(),
            reporter: plan.deps.reporter.as_ref(),
            on_report: &plan.on_report,
            observer: plan.observer,
        },
        &plan.name,
        plan.seq,
        plan.path,
    );
    let fields = epoch_fields(&epoch);

    match machine.try_borrow_mut() {
        Ok(mut state) => state.epoch = epoch,
        Err(_) => {
            tracing::warn!("restore re-arm lost a race with event delivery");
            return;
        },
    }

    if let Some(logger) = plan.deps.logger.as_ref() {
        let mut fields = fields;
        fields.insert("restoredAt".into(), Value::from(event.time_stamp));
        logger.info(
            "fid.restore.rearmed",
            "Page restored; first input delay re-armed",
            Some(fields),
        );
    }

    if plan.engage_fallback {
        plan.deps.fallback.reset();
        plan.deps.fallback.measure(plan.handler);
    }
}

fn plan_rearm(machine: &SharedMachine) -> Option<RearmPlan> {
    let state = machine.try_borrow().ok()?;
    let native_connected = state
        .native
        .as_ref()
        .is_some_and(|observer| observer.is_connected());
    let native_live = native_connected && !state.native_delivered.get();
    let engage_fallback = state
        .options
        .restore_fallback
        .engages(state.epoch.path(), native_live);
    let path = if engage_fallback {
        MeasurementPath::Fallback
    } else {
        MeasurementPath::Native
    };
    let observer = state.native.clone().filter(|_| native_connected);

    Some(RearmPlan {
        deps: state.deps.clone(),
        name: state.name.clone(),
        on_report: Rc::clone(&state.on_report),
        handler: Rc::clone(&state.handler),
        observer,
        engage_fallback,
        path,
        seq: state.epoch.seq().saturating_add(1),
    })
}

fn epoch_fields(epoch: &Epoch) -> LogFields {
    let mut fields = LogFields::new();
    fields.insert("epoch".into(), Value::from(epoch.seq()));
    fields.insert("metricId".into(), Value::String(epoch.metric_id()));
    fields.insert("path".into(), Value::String(epoch.path().as_str().to_owned()));
    fields.insert("phase".into(), Value::String(epoch.phase().as_str().to_owned()));
    fields
}

#[cfg(test)]
mod tests;
