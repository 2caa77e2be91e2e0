//! Once-only reporter binding and metric record construction.

use fid_ports::{
    HiddenEvent, MetricFactoryPort, MetricName, MetricRecord, ObserverHandle, ReportHandler,
    ReportInvocation, ReporterBinderPort, SharedMetric, VisibilityPort,
};
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

/// Metric factory producing records with random `v1-` ids.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIdMetricFactory;

impl MetricFactoryPort for RandomIdMetricFactory {
    fn make_metric(&self, name: &MetricName) -> MetricRecord {
        MetricRecord::new(name.clone())
    }
}

/// Binding for one epoch's record.
///
/// Holds the record weakly: once the epoch is replaced, the binding (and
/// its hidden hook) does nothing.
struct OnceBinding {
    on_report: ReportHandler,
    metric: Weak<RefCell<MetricRecord>>,
    observer: Option<Rc<dyn ObserverHandle>>,
    visibility: Rc<dyn VisibilityPort>,
    previous: Cell<Option<f64>>,
    finished: Cell<bool>,
}

impl ReportInvocation for OnceBinding {
    fn invoke(&self) {
        if self.finished.get() {
            return;
        }
        let Some(metric) = self.metric.upgrade() else {
            return;
        };

        let snapshot = {
            let record = metric.borrow();
            if record.is_final() {
                if let Some(observer) = self.observer.as_ref() {
                    observer.disconnect();
                }
            }
            let Some(value) = record.value() else {
                return;
            };
            if !record.is_final() && !self.visibility.is_hidden() {
                return;
            }
            let previous = self.previous.get();
            let snapshot = record.reported_against(previous);
            let changed = snapshot.delta() != 0.0;
            if !(changed || record.is_final() || previous.is_none()) {
                return;
            }
            self.previous.set(Some(value));
            self.finished.set(record.is_final());
            snapshot
        };

        (self.on_report)(&snapshot);
    }
}

/// Reporter binder delivering each final record once.
///
/// Every binding also reports on the first hidden transition after it was
/// created, so a value finalized late still reaches the handler.
#[derive(Clone)]
pub struct OnceReporterBinder {
    visibility: Rc<dyn VisibilityPort>,
}

impl OnceReporterBinder {
    /// Bind reporters against `visibility`.
    #[must_use]
    pub fn new(visibility: Rc<dyn VisibilityPort>) -> Self {
        Self { visibility }
    }
}

impl ReporterBinderPort for OnceReporterBinder {
    fn bind(
        &self,
        on_report: ReportHandler,
        metric: &SharedMetric,
        observer: Option<Rc<dyn ObserverHandle>>,
    ) -> Rc<dyn ReportInvocation> {
        let binding = Rc::new(OnceBinding {
            on_report,
            metric: Rc::downgrade(metric),
            observer,
            visibility: Rc::clone(&self.visibility),
            previous: Cell::new(None),
            finished: Cell::new(false),
        });

        let weak = Rc::downgrade(&binding);
        self.visibility.on_hidden(
            Rc::new(move |_event: HiddenEvent| {
                if let Some(binding) = weak.upgrade() {
                    binding.invoke();
                }
            }),
            true,
        );

        binding
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::PerformanceObserverSource;
    use crate::page::PageHost;
    use crate::visibility::FirstHiddenTracker;
    use fid_ports::{EntryCategory, EventSourcePort, TimingEvent};
    use std::error::Error;

    struct Harness {
        host: PageHost,
        binder: OnceReporterBinder,
        reports: Rc<RefCell<Vec<MetricRecord>>>,
        metric: SharedMetric,
    }

    impl Harness {
        fn new() -> Self {
            let host = PageHost::new();
            let visibility: Rc<dyn VisibilityPort> = Rc::new(FirstHiddenTracker::new(&host));
            Self {
                binder: OnceReporterBinder::new(visibility),
                host,
                reports: Rc::new(RefCell::new(Vec::new())),
                metric: Rc::new(RefCell::new(RandomIdMetricFactory.make_metric(
                    &MetricName::first_input_delay(),
                ))),
            }
        }

        fn handler(&self) -> ReportHandler {
            let reports = Rc::clone(&self.reports);
            Rc::new(move |record: &MetricRecord| reports.borrow_mut().push(record.clone()))
        }

        fn finalize(&self, value: f64) -> Result<(), Box<dyn Error>> {
            self.metric
                .borrow_mut()
                .finalize(TimingEvent::first_input("keydown", 1.0, 1.0 + value), value)?;
            Ok(())
        }
    }

    #[test]
    fn reports_final_record_once() -> Result<(), Box<dyn Error>> {
        let harness = Harness::new();
        let report = harness.binder.bind(harness.handler(), &harness.metric, None);

        report.invoke();
        assert!(harness.reports.borrow().is_empty());

        harness.finalize(12.0)?;
        report.invoke();
        report.invoke();
        harness.host.hide();

        let reports = harness.reports.borrow();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].value(), Some(12.0));
        assert!((reports[0].delta() - 12.0).abs() < f64::EPSILON);
        Ok(())
    }

    #[test]
    fn hidden_transition_reports_automatically() -> Result<(), Box<dyn Error>> {
        let harness = Harness::new();
        let _report = harness.binder.bind(harness.handler(), &harness.metric, None);
        harness.finalize(7.0)?;

        harness.host.hide();

        assert_eq!(harness.reports.borrow().len(), 1);
        Ok(())
    }

    #[test]
    fn dropped_binding_ignores_hidden_transition() -> Result<(), Box<dyn Error>> {
        let harness = Harness::new();
        let report = harness.binder.bind(harness.handler(), &harness.metric, None);
        harness.finalize(7.0)?;
        drop(report);

        harness.host.hide();

        assert!(harness.reports.borrow().is_empty());
        Ok(())
    }

    #[test]
    fn final_report_disconnects_observer() -> Result<(), Box<dyn Error>> {
        let harness = Harness::new();
        let source = PerformanceObserverSource::new(&harness.host);
        let observer = source
            .observe(EntryCategory::FirstInput, Rc::new(|_event| {}))
            .ok_or("observe returned no handle")?;
        let report = harness.binder.bind(
            harness.handler(),
            &harness.metric,
            Some(Rc::clone(&observer)),
        );

        report.invoke();
        assert!(observer.is_connected());

        harness.finalize(3.0)?;
        report.invoke();
        assert!(!observer.is_connected());
        Ok(())
    }

    #[test]
    fn random_ids_are_prefixed() {
        let record = RandomIdMetricFactory.make_metric(&MetricName::first_input_delay());
        assert!(record.id().as_str().starts_with("v1-"));
        assert_eq!(record.name().as_str(), "FID");
    }
}
