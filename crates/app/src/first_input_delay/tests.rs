use super::*;
use fid_domain::MetricRecord;
use fid_testkit::in_memory::{RecordingLogger, RecordingReports, SequentialMetricFactory};
use fid_testkit::manual::{
    ImmediateBinder, ManualEventSource, ManualFallback, ManualRestore, ManualVisibility,
};

struct Rig {
    visibility: Rc<ManualVisibility>,
    events: Rc<ManualEventSource>,
    fallback: Rc<ManualFallback>,
    restore: Rc<ManualRestore>,
    binder: Rc<ImmediateBinder>,
    metrics: Rc<SequentialMetricFactory>,
    logger: RecordingLogger,
    reports: RecordingReports,
}

impl Rig {
    fn with(visibility: ManualVisibility, events: ManualEventSource) -> Self {
        Self {
            visibility: Rc::new(visibility),
            events: Rc::new(events),
            fallback: Rc::new(ManualFallback::new()),
            restore: Rc::new(ManualRestore::new()),
            binder: Rc::new(ImmediateBinder::new()),
            metrics: Rc::new(SequentialMetricFactory::new()),
            logger: RecordingLogger::new(),
            reports: RecordingReports::new(),
        }
    }

    fn native() -> Self {
        Self::with(ManualVisibility::new(), ManualEventSource::new())
    }

    fn without_native() -> Self {
        Self::with(ManualVisibility::new(), ManualEventSource::unsupported())
    }

    fn deps(&self) -> FirstInputDelayDeps {
        FirstInputDelayDeps {
            visibility: self.visibility.clone(),
            events: self.events.clone(),
            fallback: self.fallback.clone(),
            restore: self.restore.clone(),
            reporter: self.binder.clone(),
            metrics: self.metrics.clone(),
            logger: Some(Rc::new(self.logger.clone())),
        }
    }

    fn install(&self, options: FirstInputDelayOptions) {
        observe_first_input_delay(self.deps(), options, self.reports.handler());
    }

    fn install_default(&self) {
        self.install(FirstInputDelayOptions::default());
    }

    fn records(&self) -> Vec<MetricRecord> {
        self.reports.records()
    }
}

fn entry(start_time: f64, processing_start: f64) -> TimingEvent {
    TimingEvent::first_input("pointerdown", start_time, processing_start)
}

#[test]
fn never_hidden_page_reports_first_delay() {
    let rig = Rig::native();
    rig.install_default();

    rig.events.deliver(entry(120.0, 150.0));

    assert_eq!(rig.reports.values(), vec![30.0]);
    let record = &rig.records()[0];
    assert!(record.is_final());
    assert_eq!(record.entries().len(), 1);
    assert_eq!(record.name().as_str(), "FID");
}

#[test]
fn event_after_hidden_is_disqualified() {
    let rig = Rig::native();
    rig.install_default();

    rig.visibility.hide_at(100.0);
    rig.events.deliver(entry(150.0, 180.0));

    assert!(rig.reports.is_empty());
    assert_eq!(rig.logger.count("fid.event.disqualified"), 1);
}

#[test]
fn only_first_event_in_delivery_order_counts() {
    let rig = Rig::native();
    rig.install_default();

    rig.events.queue(entry(200.0, 260.0));
    rig.events.queue(entry(50.0, 80.0));
    rig.events.tick();

    assert_eq!(rig.reports.values(), vec![60.0]);
}

#[test]
fn second_event_in_same_epoch_is_ignored() {
    let rig = Rig::native();
    rig.install_default();

    rig.events.deliver(entry(50.0, 80.0));
    rig.events.deliver(entry(200.0, 260.0));

    assert_eq!(rig.reports.values(), vec![30.0]);
    assert_eq!(rig.logger.count("fid.metric.finalized"), 1);
}

#[test]
fn restore_opens_an_independent_epoch() {
    let rig = Rig::native();
    rig.install_default();

    rig.events.deliver(entry(5.0, 15.0));
    rig.restore.restore_at(1_000.0);
    rig.fallback.emit(entry(1_005.0, 1_040.0));

    assert_eq!(rig.reports.values(), vec![10.0, 35.0]);
    let ids: Vec<String> = rig
        .records()
        .iter()
        .map(|record| record.id().as_str().to_owned())
        .collect();
    assert_eq!(ids, vec!["epoch-0".to_owned(), "epoch-1".to_owned()]);
    assert_eq!(rig.binder.binds(), 2);
    assert_eq!(rig.events.observe_calls(), 1);
    assert_eq!(rig.logger.count("fid.restore.rearmed"), 1);
}

#[test]
fn restore_after_hidden_uses_a_fresh_threshold() {
    let rig = Rig::native();
    rig.install_default();

    rig.visibility.hide_at(100.0);
    rig.visibility.show();
    rig.restore.restore_at(500.0);
    rig.events.deliver(entry(150.0, 180.0));

    assert_eq!(rig.reports.values(), vec![30.0]);
}

#[test]
fn restore_without_a_report_still_rearms() {
    let rig = Rig::native();
    rig.install_default();

    rig.restore.restore_at(10.0);
    rig.restore.restore_at(20.0);
    rig.events.deliver(entry(30.0, 42.0));

    assert_eq!(rig.reports.values(), vec![12.0]);
    assert_eq!(rig.metrics.created(), 3);
    assert_eq!(rig.records()[0].id().as_str(), "epoch-2");
}

#[test]
fn page_hidden_at_start_disqualifies_everything() {
    let rig = Rig::with(ManualVisibility::hidden(), ManualEventSource::new());
    rig.install_default();

    rig.events.deliver(entry(0.0, 5.0));
    rig.events.deliver(entry(10.0, 15.0));

    assert!(rig.reports.is_empty());
}

#[test]
fn hiding_flushes_buffered_events_first() {
    let rig = Rig::native();
    rig.install_default();

    rig.events.queue(entry(40.0, 70.0));
    rig.visibility.hide_at(100.0);

    assert_eq!(rig.reports.values(), vec![30.0]);
    assert_eq!(rig.events.flushes(), 1);

    rig.visibility.show();
    rig.visibility.hide_at(200.0);
    assert_eq!(rig.events.flushes(), 1);
}

#[test]
fn every_epoch_flushes_before_its_hidden_report() {
    let rig = Rig::native();
    rig.install_default();

    rig.visibility.hide_at(100.0);
    rig.visibility.show();
    rig.restore.restore_at(200.0);
    rig.events.queue(entry(250.0, 254.0));
    rig.visibility.hide_at(300.0);

    assert_eq!(rig.reports.values(), vec![4.0]);
    assert_eq!(rig.events.flushes(), 2);
}

#[test]
fn buffered_events_delivered_after_hide_are_judged_against_it() {
    let rig = Rig::native();
    rig.install_default();

    rig.visibility.hide_at(100.0);
    rig.events.queue(entry(120.0, 130.0));
    rig.events.queue(entry(90.0, 95.0));
    rig.events.tick();

    assert_eq!(rig.reports.values(), vec![5.0]);
}

#[test]
fn fallback_path_is_used_without_native_support() {
    let rig = Rig::without_native();
    rig.install_default();

    assert_eq!(rig.fallback.measures(), 1);
    assert_eq!(rig.logger.count("fid.source.fallback"), 1);
    assert_eq!(rig.visibility.listener_count(), 0);

    rig.fallback.emit(entry(30.0, 50.0));

    assert_eq!(rig.reports.values(), vec![20.0]);
}

#[test]
fn fallback_fires_again_after_restore() {
    let rig = Rig::without_native();
    rig.install_default();

    rig.fallback.emit(entry(30.0, 50.0));
    rig.restore.restore_at(600.0);
    assert_eq!(rig.fallback.resets(), 1);
    assert_eq!(rig.fallback.measures(), 2);

    rig.fallback.emit(entry(620.0, 630.0));

    assert_eq!(rig.reports.values(), vec![20.0, 10.0]);
}

#[test]
fn auto_restore_keeps_an_unspent_native_source() {
    let rig = Rig::native();
    rig.install_default();

    rig.restore.restore_at(100.0);

    assert_eq!(rig.fallback.resets(), 0);
    assert_eq!(rig.fallback.measures(), 0);
}

#[test]
fn auto_restore_engages_fallback_once_native_is_gone() {
    let rig = Rig::native();
    rig.install_default();
    rig.events.deliver(entry(5.0, 15.0));
    rig.events.disconnect();

    rig.restore.restore_at(100.0);
    rig.events.deliver(entry(105.0, 106.0));
    rig.fallback.emit(entry(110.0, 135.0));

    assert_eq!(rig.fallback.resets(), 1);
    assert_eq!(rig.reports.values(), vec![10.0, 25.0]);
    assert_eq!(rig.logger.count("fid.source.fallback"), 0);
}

#[test]
fn auto_restore_engages_fallback_after_a_disqualified_native_entry() {
    let rig = Rig::with(ManualVisibility::hidden(), ManualEventSource::new());
    rig.install_default();

    rig.events.deliver(entry(55.0, 60.0));
    assert_eq!(rig.logger.count("fid.event.disqualified"), 1);
    rig.visibility.show();
    rig.restore.restore_at(100.0);
    rig.fallback.emit(entry(93.0, 100.0));

    assert!(rig.events.is_connected());
    assert_eq!(rig.fallback.resets(), 1);
    assert_eq!(rig.reports.values(), vec![7.0]);
}

#[test]
fn auto_restore_engages_fallback_after_a_dropped_native_entry() {
    let rig = Rig::native();
    rig.install(FirstInputDelayOptions {
        negative_delay: NegativeDelayPolicy::Drop,
        ..FirstInputDelayOptions::default()
    });

    rig.events.deliver(entry(50.0, 45.0));
    rig.restore.restore_at(100.0);
    rig.fallback.emit(entry(110.0, 113.0));

    assert_eq!(rig.fallback.measures(), 1);
    assert_eq!(rig.reports.values(), vec![3.0]);
}

#[test]
fn always_restore_engages_fallback_on_native_path() {
    let rig = Rig::native();
    rig.install(FirstInputDelayOptions {
        restore_fallback: RestoreFallback::Always,
        ..FirstInputDelayOptions::default()
    });

    rig.restore.restore_at(100.0);
    rig.fallback.emit(entry(110.0, 112.0));

    assert_eq!(rig.fallback.resets(), 1);
    assert_eq!(rig.reports.values(), vec![2.0]);
}

#[test]
fn negative_delay_is_surfaced_by_default() {
    let rig = Rig::native();
    rig.install_default();

    rig.events.deliver(entry(50.0, 45.0));

    assert_eq!(rig.reports.values(), vec![-5.0]);
    assert_eq!(rig.logger.count("fid.delay.negative"), 1);
}

#[test]
fn negative_delay_can_be_clamped() {
    let rig = Rig::native();
    rig.install(FirstInputDelayOptions {
        negative_delay: NegativeDelayPolicy::Clamp,
        ..FirstInputDelayOptions::default()
    });

    rig.events.deliver(entry(50.0, 45.0));

    assert_eq!(rig.reports.values(), vec![0.0]);
    assert_eq!(rig.logger.count("fid.delay.negative"), 1);
}

#[test]
fn dropped_negative_delay_leaves_epoch_armed() {
    let rig = Rig::native();
    rig.install(FirstInputDelayOptions {
        negative_delay: NegativeDelayPolicy::Drop,
        ..FirstInputDelayOptions::default()
    });

    rig.events.deliver(entry(50.0, 45.0));
    assert!(rig.reports.is_empty());
    rig.events.deliver(entry(55.0, 58.0));

    assert_eq!(rig.reports.values(), vec![3.0]);
    assert_eq!(rig.logger.count("fid.delay.negative"), 1);
}

#[test]
fn lifecycle_is_logged_in_order() {
    let rig = Rig::native();
    rig.install_default();
    rig.events.deliver(entry(1.0, 2.0));
    rig.restore.restore_at(10.0);

    assert_eq!(
        rig.logger.event_names(),
        vec![
            "fid.epoch.armed".to_owned(),
            "fid.metric.finalized".to_owned(),
            "fid.restore.rearmed".to_owned(),
        ]
    );
}

#[test]
fn report_handler_sees_a_consistent_record() {
    let rig = Rig::native();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    observe_first_input_delay(
        rig.deps(),
        FirstInputDelayOptions::default(),
        Rc::new(move |record: &MetricRecord| {
            sink.borrow_mut()
                .push((record.is_final(), record.entries().len(), record.value()));
        }),
    );

    rig.events.deliver(entry(10.0, 14.0));

    assert_eq!(*seen.borrow(), vec![(true, 1, Some(4.0))]);
}

#[test]
fn report_handler_may_trigger_a_restore() {
    let rig = Rig::native();
    let restore = Rc::clone(&rig.restore);
    let reports = rig.reports.clone();
    let inner = reports.handler();
    observe_first_input_delay(
        rig.deps(),
        FirstInputDelayOptions::default(),
        Rc::new(move |record: &MetricRecord| {
            inner(record);
            if reports.len() == 1 {
                restore.restore_at(99.0);
            }
        }),
    );

    rig.events.deliver(entry(10.0, 14.0));
    rig.events.deliver(entry(20.0, 27.0));

    assert_eq!(rig.reports.values(), vec![4.0, 7.0]);
}

#[test]
fn logger_is_optional() {
    let rig = Rig::native();
    let deps = FirstInputDelayDeps {
        logger: None,
        ..rig.deps()
    };
    observe_first_input_delay(
        deps,
        FirstInputDelayOptions::default(),
        rig.reports.handler(),
    );

    rig.events.deliver(entry(3.0, 9.0));

    assert_eq!(rig.reports.values(), vec![6.0]);
    assert!(rig.logger.events().is_empty());
}
