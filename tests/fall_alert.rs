// End-to-end alert cycles: recorded samples through the monitor on the
// replay clock (25 Hz samples, 1 s countdown steps).

use std::collections::BTreeSet;
use std::iter;

use seizealert::detector::{DetectionState, WindowCounters};
use seizealert::replay::{self, ReplayOptions};
use seizealert::reporter::{Clock, MemoryLog, Reporter};
use seizealert::{EventTag, LogRecord, Monitor, MonitorConfig, MonitorEvent, Observer, Sample};

const NOW: i64 = 1_700_000_000;

struct FixedClock;

impl Clock for FixedClock {
    fn now(&self) -> i64 {
        NOW
    }
}

#[derive(Default)]
struct Recorder(Vec<MonitorEvent>);

impl Observer for Recorder {
    fn notify(&mut self, event: &MonitorEvent) {
        self.0.push(*event);
    }
}

type Harness = Monitor<(Reporter<MemoryLog, FixedClock>, Recorder)>;

fn harness(config: MonitorConfig) -> Harness {
    let observer = (Reporter::new(MemoryLog::new(), FixedClock), Recorder::default());
    Monitor::new(config, observer).expect("valid config")
}

fn records(m: &Harness) -> &[LogRecord] {
    m.observer().0.log().records()
}

fn events(m: &Harness) -> &[MonitorEvent] {
    &m.observer().1 .0
}

fn rest(n: usize) -> impl Iterator<Item = Sample> {
    iter::repeat(Sample::new(0, 0, 1000)).take(n)
}

/// Impact, a jolt while settling, then movement during the first stillness
/// window: 80 samples, declared on the last one.
fn fall() -> Vec<Sample> {
    let mut v: Vec<Sample> = iter::repeat(Sample::new(300, 200, -1850)).take(4).collect();
    v.extend(rest(76));
    v[12] = Sample::new(1500, 0, 600);
    v[55] = Sample::new(0, -1250, 0);
    v
}

/// Impact and jolt followed by two stillness windows: a recovery.
fn stumble() -> Vec<Sample> {
    let mut v: Vec<Sample> = iter::repeat(Sample::new(0, 1900, 0)).take(5).collect();
    v.extend(rest(130));
    v[15] = Sample::new(0, 0, 1700);
    v
}

fn alert_windows_never_overlap(events: &[MonitorEvent]) -> bool {
    let mut open = false;
    for event in events {
        match event {
            MonitorEvent::CountdownStarted { .. } if open => return false,
            MonitorEvent::CountdownStarted { .. } => open = true,
            MonitorEvent::EventFinalized(_) | MonitorEvent::Cancelled(_) => open = false,
            _ => {}
        }
    }
    true
}

#[test]
fn uncancelled_fall_is_logged_twice() {
    let mut m = harness(MonitorConfig::default());
    let samples: Vec<Sample> = fall().into_iter().chain(rest(300)).collect();
    replay::run(&mut m, samples, &ReplayOptions::default());

    assert_eq!(
        records(&m),
        &[
            LogRecord { tag: EventTag::AlertStarted, timestamp: NOW },
            LogRecord { tag: EventTag::Fall, timestamp: NOW },
        ]
    );
    assert_eq!(m.stats().alerts, 1);
    assert_eq!(m.stats().finalized, 1);
    // The last step lands just before sample 329.
    assert_eq!(m.stats().dropped, 249);
    assert!(!m.is_counting());
}

#[test]
fn countdown_pending_at_end_of_input_is_drained() {
    let mut m = harness(MonitorConfig::default());
    let options = ReplayOptions { drain: true, ..ReplayOptions::default() };
    replay::run(&mut m, fall(), &options);
    assert_eq!(records(&m).len(), 2);

    let mut m = harness(MonitorConfig::default());
    replay::run(&mut m, fall(), &ReplayOptions::default());
    assert!(m.is_counting());
    assert_eq!(records(&m).len(), 1);
}

#[test]
fn cancel_during_countdown_suppresses_report() {
    let mut m = harness(MonitorConfig::default());
    let samples: Vec<Sample> = fall().into_iter().chain(rest(300)).collect();
    let options = ReplayOptions {
        cancel_at: BTreeSet::from([200]),
        drain: true,
    };
    replay::run(&mut m, samples, &options);

    assert_eq!(records(&m), &[LogRecord { tag: EventTag::AlertStarted, timestamp: NOW }]);
    assert_eq!(m.stats().cancelled, 1);
    assert_eq!(m.detection_state(), DetectionState::Idle);
    assert_eq!(m.counters(), WindowCounters::default());
    assert!(events(&m).contains(&MonitorEvent::Cancelled(EventTag::Fall)));
}

#[test]
fn stumble_and_recovery_raise_nothing() {
    let mut m = harness(MonitorConfig::default());
    replay::run(&mut m, stumble().into_iter().chain(rest(50)), &ReplayOptions::default());
    assert_eq!(m.stats().alerts, 0);
    assert!(records(&m).is_empty());
    assert_eq!(m.detection_state(), DetectionState::Idle);
}

#[test]
fn back_to_back_falls_resolve_one_at_a_time() {
    let mut m = harness(MonitorConfig::default());
    let samples: Vec<Sample> = fall()
        .into_iter()
        .chain(fall())
        .chain(rest(300))
        .chain(fall())
        .chain(rest(300))
        .collect();
    replay::run(&mut m, samples, &ReplayOptions::default());

    // The second pattern lands inside the first countdown and is ignored.
    assert_eq!(m.stats().alerts, 2);
    assert_eq!(m.stats().finalized, 2);
    assert!(alert_windows_never_overlap(events(&m)));
    let tags: Vec<EventTag> = records(&m).iter().map(|r| r.tag).collect();
    assert_eq!(
        tags,
        vec![EventTag::AlertStarted, EventTag::Fall, EventTag::AlertStarted, EventTag::Fall]
    );
}

#[test]
fn seizure_tagging_from_configuration() {
    let mut config = MonitorConfig::default();
    config.detector.seizure_shake_count = Some(8);

    let mut shaking: Vec<Sample> = iter::repeat(Sample::new(0, 0, 1900)).take(4).collect();
    shaking.extend(rest(1));
    for i in 0..75 {
        let z = if i % 3 == 0 { 1700 } else { 1000 };
        shaking.push(Sample::new(0, 0, z));
    }

    let mut m = harness(config);
    replay::run(&mut m, shaking.into_iter().chain(rest(300)), &ReplayOptions::default());
    let tags: Vec<EventTag> = records(&m).iter().map(|r| r.tag).collect();
    assert_eq!(tags, vec![EventTag::AlertStarted, EventTag::Seizure]);
}

#[test]
fn garbage_sensor_values_are_clamped_not_fatal() {
    let mut m = harness(MonitorConfig::default());
    let noisy = [
        Sample::new(i32::MAX, i32::MIN, 0),
        Sample::new(-99_999, 99_999, 99_999),
    ];
    replay::run(&mut m, noisy.into_iter().cycle().take(200), &ReplayOptions::default());
    assert_eq!(m.stats().samples, 200);
    assert_eq!(m.stats().alerts, 0);
}
