// SeizeAlert - Confirmation Countdown
//
// Holds the declared candidate for a fixed number of countdown steps.  The
// user can cancel at any point; otherwise the candidate is finalized on the
// last step.

use std::ops::Add;
use std::time::Duration;

use crate::events::{CandidateEvent, EventTag};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownState {
    Inactive,
    Counting { candidate: CandidateEvent, remaining: u32 },
}

/// Result of a single countdown step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// No countdown running; the step was ignored.
    Idle,
    Remaining(u32),
    Expired(EventTag),
}

pub struct Countdown {
    length: u32,
    state: CountdownState,
}

impl Countdown {
    pub fn new(length: u32) -> Self {
        Self {
            length,
            state: CountdownState::Inactive,
        }
    }

    pub fn state(&self) -> CountdownState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, CountdownState::Counting { .. })
    }

    /// Begin counting down for `candidate`.  Returns the starting count.
    pub fn start(&mut self, candidate: CandidateEvent) -> u32 {
        self.state = CountdownState::Counting {
            candidate,
            remaining: self.length,
        };
        self.length
    }

    pub fn tick(&mut self) -> Tick {
        match &mut self.state {
            CountdownState::Inactive => Tick::Idle,
            CountdownState::Counting { candidate, remaining } => {
                *remaining = remaining.saturating_sub(1);
                if *remaining == 0 {
                    let tag = candidate.tag;
                    self.state = CountdownState::Inactive;
                    Tick::Expired(tag)
                } else {
                    Tick::Remaining(*remaining)
                }
            }
        }
    }

    /// Drop the pending candidate, if any.
    pub fn cancel(&mut self) -> Option<CandidateEvent> {
        match std::mem::replace(&mut self.state, CountdownState::Inactive) {
            CountdownState::Counting { candidate, .. } => Some(candidate),
            CountdownState::Inactive => None,
        }
    }
}

/// Countdown step deadlines over any monotonic time type: `Instant` on the
/// device, elapsed `Duration` in a simulated replay.
#[derive(Debug, Clone)]
pub struct TickSchedule<T> {
    period: Duration,
    next: Option<T>,
}

impl<T> TickSchedule<T>
where
    T: Copy + Ord + Add<Duration, Output = T>,
{
    pub fn new(period: Duration) -> Self {
        Self { period, next: None }
    }

    pub fn deadline(&self) -> Option<T> {
        self.next
    }

    /// Arm the first deadline when a countdown starts, clear it when none
    /// is running.  An already armed deadline is kept.
    pub fn sync(&mut self, counting: bool, now: T) {
        match (counting, self.next) {
            (true, None) => self.next = Some(now + self.period),
            (false, _) => self.next = None,
            (true, Some(_)) => {}
        }
    }

    /// True when the deadline has passed; the next one is then armed one
    /// period later.
    pub fn due(&mut self, now: T) -> bool {
        match self.next {
            Some(deadline) if now >= deadline => {
                self.next = Some(deadline + self.period);
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fall() -> CandidateEvent {
        CandidateEvent { tag: EventTag::Fall, peak_metric: 900 }
    }

    #[test]
    fn expires_on_the_last_step() {
        let mut cd = Countdown::new(10);
        assert_eq!(cd.start(fall()), 10);
        for expected in (1..10).rev() {
            assert_eq!(cd.tick(), Tick::Remaining(expected));
        }
        assert_eq!(cd.tick(), Tick::Expired(EventTag::Fall));
        assert!(!cd.is_active());
        assert_eq!(cd.tick(), Tick::Idle);
    }

    #[test]
    fn cancel_discards_candidate() {
        let mut cd = Countdown::new(10);
        cd.start(fall());
        cd.tick();
        assert_eq!(cd.cancel(), Some(fall()));
        assert_eq!(cd.state(), CountdownState::Inactive);
        assert_eq!(cd.cancel(), None);
        assert_eq!(cd.tick(), Tick::Idle);
    }

    #[test]
    fn single_step_countdown() {
        let mut cd = Countdown::new(1);
        cd.start(fall());
        assert_eq!(cd.tick(), Tick::Expired(EventTag::Fall));
    }

    #[test]
    fn schedule_arms_and_repeats() {
        let second = Duration::from_secs(1);
        let mut sched: TickSchedule<Duration> = TickSchedule::new(second);
        let t0 = Duration::from_millis(400);

        assert!(!sched.due(t0));
        sched.sync(true, t0);
        assert_eq!(sched.deadline(), Some(t0 + second));

        // A later sync while counting keeps the original deadline.
        sched.sync(true, t0 + Duration::from_millis(300));
        assert_eq!(sched.deadline(), Some(t0 + second));

        assert!(!sched.due(t0 + Duration::from_millis(999)));
        assert!(sched.due(t0 + second));
        assert_eq!(sched.deadline(), Some(t0 + 2 * second));

        sched.sync(false, t0 + 2 * second);
        assert_eq!(sched.deadline(), None);
    }

    #[test]
    fn schedule_works_with_instants() {
        let start = std::time::Instant::now();
        let mut sched = TickSchedule::new(Duration::from_millis(10));
        sched.sync(true, start);
        assert!(sched.due(start + Duration::from_millis(10)));
    }
}
