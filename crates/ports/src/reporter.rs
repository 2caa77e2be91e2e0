//! Metric construction and reporting boundary contracts.

use crate::ObserverHandle;
use fid_domain::{MetricName, MetricRecord};
use std::cell::RefCell;
use std::rc::Rc;

/// Caller-supplied callback receiving finished metric records.
pub type ReportHandler = Rc<dyn Fn(&MetricRecord)>;

/// Metric record owned by the state machine and readable by a binding.
pub type SharedMetric = Rc<RefCell<MetricRecord>>;

/// A bound reporter for one epoch.
pub trait ReportInvocation {
    /// Deliver the bound record to the report handler if it is ready.
    ///
    /// Delivers at most once per binding for a final record.
    fn invoke(&self);
}

/// Boundary contract wrapping a report handler with once-only delivery.
pub trait ReporterBinderPort {
    /// Bind `on_report` to `metric` and the active observer handle.
    ///
    /// The binding may read `metric` but never mutates it.
    fn bind(
        &self,
        on_report: ReportHandler,
        metric: &SharedMetric,
        observer: Option<Rc<dyn ObserverHandle>>,
    ) -> Rc<dyn ReportInvocation>;
}

/// Boundary contract for creating empty metric records.
pub trait MetricFactoryPort {
    /// Create an empty record tagged with `name`.
    fn make_metric(&self, name: &MetricName) -> MetricRecord;
}
