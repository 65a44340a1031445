// SeizeAlert - Monitor
//
// Owns the detector and the countdown and is the only place detection state
// changes.  Every input (sample, countdown step, cancel, reset) runs to
// completion before the next one is handled; the device funnels all of them
// through one channel into one monitor task.
//
// Side effects are expressed as `MonitorEvent`s handed to an `Observer`
// (reporter, presenter), never performed here.

use crate::config::{ConfigError, MonitorConfig};
use std::ops::Add;
use std::time::Duration;

use crate::countdown::{Countdown, CountdownState, Tick, TickSchedule};
use crate::detector::{DetectionState, Detector, WindowCounters};
use crate::events::{Input, MonitorEvent, Sample, Status};
use crate::metric;

/// Consumer of monitor events.
pub trait Observer {
    fn notify(&mut self, event: &MonitorEvent);
}

impl<A: Observer, B: Observer> Observer for (A, B) {
    fn notify(&mut self, event: &MonitorEvent) {
        self.0.notify(event);
        self.1.notify(event);
    }
}

impl<O: Observer + ?Sized> Observer for &mut O {
    fn notify(&mut self, event: &MonitorEvent) {
        (**self).notify(event);
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonitorStats {
    pub samples: u64,
    /// Samples that arrived while a countdown was running.
    pub dropped: u64,
    pub alerts: u32,
    pub finalized: u32,
    pub cancelled: u32,
}

pub struct Monitor<O> {
    config: MonitorConfig,
    detector: Detector,
    countdown: Countdown,
    observer: O,
    stats: MonitorStats,
}

impl<O: Observer> Monitor<O> {
    pub fn new(config: MonitorConfig, observer: O) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            detector: Detector::new(config.detector.clone()),
            countdown: Countdown::new(config.countdown_ticks),
            config,
            observer,
            stats: MonitorStats::default(),
        })
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn detection_state(&self) -> DetectionState {
        self.detector.state()
    }

    pub fn counters(&self) -> WindowCounters {
        self.detector.counters()
    }

    pub fn countdown_state(&self) -> CountdownState {
        self.countdown.state()
    }

    pub fn is_counting(&self) -> bool {
        self.countdown.is_active()
    }

    pub fn stats(&self) -> MonitorStats {
        self.stats
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    pub fn into_observer(self) -> O {
        self.observer
    }

    pub fn handle(&mut self, input: Input) {
        match input {
            Input::Sample(sample) => self.on_sample(sample),
            Input::Cancel => self.cancel(),
            Input::Reset => self.reset(),
        }
    }

    /// Feed one sensor sample.  Ignored while a candidate is in its
    /// countdown so that only one event is ever in flight.
    pub fn on_sample(&mut self, sample: Sample) {
        self.stats.samples += 1;
        if self.countdown.is_active() {
            self.stats.dropped += 1;
            return;
        }

        let m = metric::metric(sample, self.detector.config());
        log::trace!("sample {:?} -> metric {}", sample, m);

        if let Some(candidate) = self.detector.feed(m) {
            self.stats.alerts += 1;
            let remaining = self.countdown.start(candidate);
            log::info!("{} detected, {} s to cancel", candidate.tag, remaining);
            self.emit(MonitorEvent::CountdownStarted { candidate, remaining });
        }
    }

    /// One countdown step.  A no-op when no countdown is running.
    pub fn countdown_tick(&mut self) {
        match self.countdown.tick() {
            Tick::Idle => {}
            Tick::Remaining(remaining) => self.emit(MonitorEvent::CountdownTick { remaining }),
            Tick::Expired(tag) => {
                self.stats.finalized += 1;
                log::info!("{} confirmed", tag);
                self.emit(MonitorEvent::EventFinalized(tag));
                self.detector.reset();
                self.emit(MonitorEvent::StatusChanged(Status::Reported(tag)));
            }
        }
    }

    /// Take every countdown step whose deadline is at or before `now`, then
    /// re-arm the schedule for the current countdown state.  Returns the
    /// number of steps taken.
    pub fn step_due<T>(&mut self, schedule: &mut TickSchedule<T>, now: T) -> u32
    where
        T: Copy + Ord + Add<Duration, Output = T>,
    {
        let mut steps = 0;
        while schedule.due(now) {
            self.countdown_tick();
            steps += 1;
            schedule.sync(self.is_counting(), now);
        }
        schedule.sync(self.is_counting(), now);
        steps
    }

    /// User cancel: drop the pending candidate without reporting it.
    pub fn cancel(&mut self) {
        match self.countdown.cancel() {
            Some(candidate) => {
                self.stats.cancelled += 1;
                log::info!("{} cancelled by user", candidate.tag);
                self.detector.reset();
                self.emit(MonitorEvent::Cancelled(candidate.tag));
                self.emit(MonitorEvent::StatusChanged(Status::FalseAlarm));
            }
            None => self.reset(),
        }
    }

    /// Back to idle from anywhere, discarding any pending candidate.
    pub fn reset(&mut self) {
        if let Some(candidate) = self.countdown.cancel() {
            log::info!("{} discarded by reset", candidate.tag);
        }
        self.detector.reset();
        self.emit(MonitorEvent::StatusChanged(Status::Monitoring));
    }

    fn emit(&mut self, event: MonitorEvent) {
        self.observer.notify(&event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{EventTag, LogRecord};
    use crate::reporter::{Clock, MemoryLog, Reporter};

    #[derive(Default)]
    struct Recorder(Vec<MonitorEvent>);

    impl Observer for Recorder {
        fn notify(&mut self, event: &MonitorEvent) {
            self.0.push(*event);
        }
    }

    struct FixedClock;

    impl Clock for FixedClock {
        fn now(&self) -> i64 {
            1_234
        }
    }

    type TestMonitor = Monitor<(Reporter<MemoryLog, FixedClock>, Recorder)>;

    fn monitor() -> TestMonitor {
        let observer = (Reporter::new(MemoryLog::new(), FixedClock), Recorder::default());
        Monitor::new(MonitorConfig::default(), observer).expect("default config")
    }

    fn records(m: &TestMonitor) -> &[LogRecord] {
        m.observer().0.log().records()
    }

    fn events(m: &TestMonitor) -> &[MonitorEvent] {
        &m.observer().1 .0
    }

    /// Spike, motion, then movement inside the first stillness window.
    fn fall_pattern() -> Vec<Sample> {
        let mut v = vec![Sample::new(0, 0, 1900); 4];
        v.push(Sample::new(0, 0, 1000));
        v.extend(std::iter::repeat(Sample::new(0, 0, 1000)).take(25));
        v[10] = Sample::new(0, 1600, 0);
        v.extend(std::iter::repeat(Sample::new(0, 0, 1000)).take(50));
        v[60] = Sample::new(0, 0, 1300);
        v
    }

    fn feed(m: &mut TestMonitor, samples: &[Sample]) {
        for &s in samples {
            m.on_sample(s);
        }
    }

    #[test]
    fn rejects_invalid_config() {
        let mut config = MonitorConfig::default();
        config.detector.spike_min_samples = 0;
        let result = Monitor::new(config, Recorder::default());
        assert_eq!(result.err(), Some(ConfigError::Zero("spike_min_samples")));
    }

    #[test]
    fn pattern_starts_countdown_and_logs_alert() {
        let mut m = monitor();
        feed(&mut m, &fall_pattern());

        assert!(m.is_counting());
        assert_eq!(m.detection_state(), DetectionState::Idle);
        assert_eq!(m.stats().alerts, 1);
        assert_eq!(records(&m), &[LogRecord { tag: EventTag::AlertStarted, timestamp: 1_234 }]);
        assert!(matches!(
            events(&m),
            [MonitorEvent::CountdownStarted { remaining: 10, .. }]
        ));
    }

    #[test]
    fn full_countdown_finalizes_once() {
        let mut m = monitor();
        feed(&mut m, &fall_pattern());
        for _ in 0..10 {
            m.countdown_tick();
        }

        assert!(!m.is_counting());
        assert_eq!(
            records(&m),
            &[
                LogRecord { tag: EventTag::AlertStarted, timestamp: 1_234 },
                LogRecord { tag: EventTag::Fall, timestamp: 1_234 },
            ]
        );
        let ticks: Vec<u32> = events(&m)
            .iter()
            .filter_map(|e| match e {
                MonitorEvent::CountdownTick { remaining } => Some(*remaining),
                _ => None,
            })
            .collect();
        assert_eq!(ticks, (1..10).rev().collect::<Vec<_>>());
        assert_eq!(
            events(&m).last(),
            Some(&MonitorEvent::StatusChanged(Status::Reported(EventTag::Fall)))
        );

        // Extra steps after expiry do nothing.
        m.countdown_tick();
        assert_eq!(records(&m).len(), 2);
    }

    #[test]
    fn cancel_at_any_step_reports_nothing() {
        for step in 0..10 {
            let mut m = monitor();
            feed(&mut m, &fall_pattern());
            for _ in 0..step {
                m.countdown_tick();
            }
            m.cancel();
            for _ in 0..20 {
                m.countdown_tick();
            }

            assert!(!m.is_counting());
            assert_eq!(m.detection_state(), DetectionState::Idle);
            assert_eq!(m.counters(), WindowCounters::default());
            assert_eq!(records(&m), &[LogRecord { tag: EventTag::AlertStarted, timestamp: 1_234 }]);
            assert_eq!(m.stats().cancelled, 1);
            assert!(events(&m).contains(&MonitorEvent::Cancelled(EventTag::Fall)));
        }
    }

    #[test]
    fn samples_during_countdown_are_dropped() {
        let mut m = monitor();
        let pattern = fall_pattern();
        feed(&mut m, &pattern);
        feed(&mut m, &pattern);
        assert_eq!(m.stats().alerts, 1);
        assert_eq!(m.stats().dropped, pattern.len() as u64);
        assert_eq!(m.detection_state(), DetectionState::Idle);

        for _ in 0..10 {
            m.countdown_tick();
        }
        feed(&mut m, &pattern);
        assert_eq!(m.stats().alerts, 2);
        assert!(m.is_counting());
    }

    #[test]
    fn reset_is_idempotent() {
        let mut m = monitor();
        m.reset();
        m.reset();
        assert_eq!(m.detection_state(), DetectionState::Idle);
        assert_eq!(m.countdown_state(), CountdownState::Inactive);
        assert_eq!(
            events(&m),
            &[
                MonitorEvent::StatusChanged(Status::Monitoring),
                MonitorEvent::StatusChanged(Status::Monitoring),
            ]
        );
    }

    #[test]
    fn cancel_mid_pattern_clears_detector() {
        let mut m = monitor();
        feed(&mut m, &fall_pattern()[..20]);
        assert_eq!(m.detection_state(), DetectionState::MotionCheck);
        m.handle(Input::Cancel);
        assert_eq!(m.detection_state(), DetectionState::Idle);
        assert_eq!(m.counters(), WindowCounters::default());
        assert_eq!(m.stats().cancelled, 0);
    }

    #[test]
    fn due_steps_are_taken_between_back_to_back_inputs() {
        let mut m = monitor();
        let period = m.config().countdown_period;
        let mut schedule: TickSchedule<Duration> = TickSchedule::new(period);
        let mut now = Duration::ZERO;

        feed(&mut m, &fall_pattern());
        assert_eq!(m.step_due(&mut schedule, now), 0);
        assert_eq!(schedule.deadline(), Some(period));

        // Inputs keep arriving past each deadline; every step is still taken.
        for _ in 0..10 {
            now += period;
            m.on_sample(Sample::new(0, 0, 1000));
            assert_eq!(m.step_due(&mut schedule, now), 1);
        }
        assert!(!m.is_counting());
        assert_eq!(schedule.deadline(), None);
        assert_eq!(m.stats().finalized, 1);
    }

    #[test]
    fn overdue_steps_are_caught_up_at_once() {
        let mut m = monitor();
        let period = m.config().countdown_period;
        let mut schedule: TickSchedule<Duration> = TickSchedule::new(period);

        feed(&mut m, &fall_pattern());
        m.step_due(&mut schedule, Duration::ZERO);
        assert_eq!(m.step_due(&mut schedule, period * 3), 3);
        assert_eq!(
            m.countdown_state(),
            CountdownState::Counting {
                candidate: crate::events::CandidateEvent { tag: EventTag::Fall, peak_metric: 900 },
                remaining: 7,
            }
        );
    }
}
