//! The full adapter set for one [`PageHost`].

use crate::fallback::InputListenerFallback;
use crate::observer::PerformanceObserverSource;
use crate::page::PageHost;
use crate::reporter::{OnceReporterBinder, RandomIdMetricFactory};
use crate::restore::PageShowRestoreNotifier;
use crate::visibility::FirstHiddenTracker;
use fid_ports::{
    EventSourcePort, FallbackMeasurePort, MetricFactoryPort, ReporterBinderPort, RestorePort,
    VisibilityPort,
};
use std::rc::Rc;

/// Every collaborator the metric core consumes, backed by one page.
///
/// The fallback listeners are installed when the stack is built, the way a
/// page script would install them at load.
#[derive(Clone)]
pub struct PageStack {
    /// First-hidden tracker.
    pub visibility: Rc<dyn VisibilityPort>,
    /// Buffered native observer source.
    pub events: Rc<dyn EventSourcePort>,
    /// Input-listener fallback.
    pub fallback: Rc<dyn FallbackMeasurePort>,
    /// Page-show restore notifier.
    pub restore: Rc<dyn RestorePort>,
    /// Once-only reporter binder.
    pub reporter: Rc<dyn ReporterBinderPort>,
    /// Random-id metric factory.
    pub metrics: Rc<dyn MetricFactoryPort>,
}

impl PageStack {
    /// Build the adapters for `host`.
    #[must_use]
    pub fn new(host: &PageHost) -> Self {
        let visibility: Rc<dyn VisibilityPort> = Rc::new(FirstHiddenTracker::new(host));
        Self {
            events: Rc::new(PerformanceObserverSource::new(host)),
            fallback: Rc::new(InputListenerFallback::install(host)),
            restore: Rc::new(PageShowRestoreNotifier::new(host)),
            reporter: Rc::new(OnceReporterBinder::new(Rc::clone(&visibility))),
            metrics: Rc::new(RandomIdMetricFactory),
            visibility,
        }
    }
}
