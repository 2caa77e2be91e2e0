//! One measurement epoch: metric record, hidden watch, and bound reporter.

use fid_domain::{
    DelayOutcome, HiddenThreshold, MeasurementPath, MetricName, MetricPhase, NegativeDelayPolicy,
    TimingEvent, compute_input_delay,
};
use fid_ports::{
    FirstHiddenWatch, HiddenEvent, MetricFactoryPort, ObserverHandle, ReportHandler,
    ReportInvocation, ReporterBinderPort, SharedMetric, VisibilityPort,
};
use std::cell::RefCell;
use std::rc::Rc;

/// Outcome of offering one timing event to an epoch.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    /// The event qualified; the record is now final with `value`.
    Finalized {
        /// Reported delay.
        value: f64,
        /// Delay computation outcome (carries the raw delay).
        outcome: DelayOutcome,
    },
    /// The event started at or after the first hidden transition.
    Disqualified {
        /// Threshold the event was judged against.
        threshold: HiddenThreshold,
    },
    /// The event produced a negative delay and the policy dropped it.
    Dropped {
        /// Rejected delay.
        raw: f64,
    },
    /// The epoch was already finalized.
    Ignored,
}

/// Collaborators needed to open an epoch.
pub struct EpochSeed<'a> {
    /// Visibility tracker.
    pub visibility: &'a dyn VisibilityPort,
    /// Metric record factory.
    pub metrics: &'a dyn MetricFactoryPort,
    /// Reporter binder.
    pub reporter: &'a dyn ReporterBinderPort,
    /// Caller's report handler.
    pub on_report: &'a ReportHandler,
    /// Native observer handle to bind, if any.
    pub observer: Option<Rc<dyn ObserverHandle>>,
}

/// State owned by one epoch.
///
/// A restore replaces the whole value; nothing here outlives its epoch
/// except the weak view held by the reporter binding.
pub struct Epoch {
    seq: u64,
    path: MeasurementPath,
    hidden: Rc<dyn FirstHiddenWatch>,
    metric: SharedMetric,
    reporter: Rc<dyn ReportInvocation>,
}

impl Epoch {
    /// Capture the hidden watch, create a fresh record, and bind the reporter.
    ///
    /// A connected observer gets a one-shot flush on this epoch's first
    /// hidden transition, registered ahead of the binding's own hidden hook.
    pub fn open(seed: &EpochSeed<'_>, name: &MetricName, seq: u64, path: MeasurementPath) -> Self {
        let hidden = seed.visibility.watch_first_hidden();
        let live = seed
            .observer
            .as_ref()
            .filter(|observer| observer.is_connected());
        if let Some(observer) = live {
            let observer = Rc::clone(observer);
            seed.visibility
                .on_hidden(Rc::new(move |_event: HiddenEvent| observer.flush_pending()), true);
        }
        let metric: SharedMetric = Rc::new(RefCell::new(seed.metrics.make_metric(name)));
        let reporter = seed
            .reporter
            .bind(Rc::clone(seed.on_report), &metric, seed.observer.clone());
        Self {
            seq,
            path,
            hidden,
            metric,
            reporter,
        }
    }

    /// Epoch sequence number (0 for the initial load).
    pub const fn seq(&self) -> u64 {
        self.seq
    }

    /// Measurement path feeding this epoch.
    pub const fn path(&self) -> MeasurementPath {
        self.path
    }

    /// Current threshold of this epoch's hidden watch.
    pub fn threshold(&self) -> HiddenThreshold {
        self.hidden.threshold()
    }

    /// Current phase, derived from the record's final flag.
    pub fn phase(&self) -> MetricPhase {
        if self.metric.borrow().is_final() {
            MetricPhase::Finalized
        } else {
            MetricPhase::Armed
        }
    }

    /// Metric id of this epoch's record.
    pub fn metric_id(&self) -> String {
        self.metric.borrow().id().as_str().to_owned()
    }

    /// Reporter binding for this epoch.
    pub fn reporter(&self) -> Rc<dyn ReportInvocation> {
        Rc::clone(&self.reporter)
    }

    /// Apply the selection rule to `event`.
    ///
    /// Does not invoke the reporter; callers do that after releasing any
    /// borrows so report handlers observe fully-updated state.
    pub fn offer(&self, event: TimingEvent, policy: NegativeDelayPolicy) -> Selection {
        if self.phase() == MetricPhase::Finalized {
            return Selection::Ignored;
        }

        let threshold = self.threshold();
        if !threshold.admits(event.start_time) {
            return Selection::Disqualified { threshold };
        }

        let outcome = compute_input_delay(&event, policy);
        let Some(value) = outcome.reported_value() else {
            return Selection::Dropped { raw: outcome.raw() };
        };

        match self.metric.borrow_mut().finalize(event, value) {
            Ok(()) => Selection::Finalized { value, outcome },
            Err(_) => Selection::Ignored,
        }
    }
}
