//! In-memory adapter implementations for port contracts.
//!
//! These implementations are intended for:
//! - Unit/integration tests
//! - Deterministic contract tests for the ports layer
//! - Asserting on reports and log output without a real host

use fid_domain::{MetricId, MetricName, MetricRecord};
use fid_ports::{LogEvent, LogFields, LoggerPort, MetricFactoryPort, ReportHandler};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// A no-op logger implementation.
#[derive(Debug, Default)]
pub struct NoopLogger;

impl LoggerPort for NoopLogger {
    fn log(&self, _event: LogEvent) {}

    fn child(&self, _fields: LogFields) -> Box<dyn LoggerPort> {
        Box::new(Self)
    }
}

/// Logger that keeps every event in memory.
///
/// Child loggers share the same storage and merge their base fields into
/// each event.
#[derive(Debug, Clone, Default)]
pub struct RecordingLogger {
    events: Rc<RefCell<Vec<LogEvent>>>,
    base: LogFields,
}

impl RecordingLogger {
    /// Create an empty recording logger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of recorded events in emission order.
    pub fn events(&self) -> Vec<LogEvent> {
        self.events.borrow().clone()
    }

    /// Names of recorded events in emission order.
    pub fn event_names(&self) -> Vec<String> {
        self.events
            .borrow()
            .iter()
            .map(|event| event.event.to_string())
            .collect()
    }

    /// Number of events recorded under `name`.
    pub fn count(&self, name: &str) -> usize {
        self.events
            .borrow()
            .iter()
            .filter(|event| event.event.as_ref() == name)
            .count()
    }
}

impl LoggerPort for RecordingLogger {
    fn log(&self, mut event: LogEvent) {
        if !self.base.is_empty() {
            let mut merged = self.base.clone();
            if let Some(fields) = event.fields.take() {
                merged.extend(fields);
            }
            event.fields = Some(merged);
        }
        self.events.borrow_mut().push(event);
    }

    fn child(&self, fields: LogFields) -> Box<dyn LoggerPort> {
        let mut base = self.base.clone();
        base.extend(fields);
        Box::new(Self {
            events: Rc::clone(&self.events),
            base,
        })
    }
}

/// Metric factory handing out deterministic ids `epoch-0`, `epoch-1`, ...
#[derive(Debug, Default)]
pub struct SequentialMetricFactory {
    next: Cell<u64>,
}

impl SequentialMetricFactory {
    /// Create a factory starting at `epoch-0`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records created so far.
    pub fn created(&self) -> u64 {
        self.next.get()
    }
}

impl MetricFactoryPort for SequentialMetricFactory {
    fn make_metric(&self, name: &MetricName) -> MetricRecord {
        let seq = self.next.get();
        self.next.set(seq + 1);
        let id = MetricId::parse(format!("epoch-{seq}")).unwrap_or_else(|_| MetricId::generate());
        MetricRecord::with_id(name.clone(), id)
    }
}

/// Report handler that stores every delivered record.
#[derive(Debug, Clone, Default)]
pub struct RecordingReports {
    records: Rc<RefCell<Vec<MetricRecord>>>,
}

impl RecordingReports {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// A report handler feeding this recorder.
    pub fn handler(&self) -> ReportHandler {
        let records = Rc::clone(&self.records);
        Rc::new(move |record: &MetricRecord| records.borrow_mut().push(record.clone()))
    }

    /// Delivered records in delivery order.
    pub fn records(&self) -> Vec<MetricRecord> {
        self.records.borrow().clone()
    }

    /// Delivered values in delivery order.
    pub fn values(&self) -> Vec<f64> {
        self.records
            .borrow()
            .iter()
            .filter_map(MetricRecord::value)
            .collect()
    }

    /// Number of delivered records.
    pub fn len(&self) -> usize {
        self.records.borrow().len()
    }

    /// Returns true when nothing was delivered.
    pub fn is_empty(&self) -> bool {
        self.records.borrow().is_empty()
    }
}
