// SeizeAlert - Recorded Sample Replay
//
// Drives a `Monitor` from recorded `x,y,z` lines on a simulated clock: one
// sample period per line, countdown steps on their own period, exactly the
// interleaving the device produces in real time.

use std::collections::BTreeSet;
use std::io::BufRead;
use std::time::Duration;

use crate::countdown::TickSchedule;
use crate::events::Sample;
use crate::monitor::{Monitor, Observer};

/// Parse one recorded line.  Blank lines and `#` comments yield `None`;
/// anything else that is not three integers reads as a failed sample.
pub fn parse_sample(line: &str) -> Option<Sample> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    let mut axes = line
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(str::parse::<i32>);

    match (axes.next(), axes.next(), axes.next(), axes.next()) {
        (Some(Ok(x)), Some(Ok(y)), Some(Ok(z)), None) => Some(Sample::new(x, y, z)),
        _ => {
            log::warn!("Unreadable sample {:?}, using zero vector", line);
            Some(Sample::ZERO)
        }
    }
}

/// Read every sample from a recording.
pub fn read_samples<R: BufRead>(reader: R) -> anyhow::Result<Vec<Sample>> {
    let mut samples = Vec::new();
    for line in reader.lines() {
        if let Some(sample) = parse_sample(&line?) {
            samples.push(sample);
        }
    }
    Ok(samples)
}

#[derive(Debug, Clone, Default)]
pub struct ReplayOptions {
    /// Press cancel just before these sample indices.
    pub cancel_at: BTreeSet<usize>,
    /// Keep stepping a pending countdown after the last sample.
    pub drain: bool,
}

/// Replay `samples` through `monitor`.  Returns the simulated time elapsed.
pub fn run<O, I>(monitor: &mut Monitor<O>, samples: I, options: &ReplayOptions) -> Duration
where
    O: Observer,
    I: IntoIterator<Item = Sample>,
{
    let sample_period = monitor.config().sample_period;
    let mut schedule: TickSchedule<Duration> = TickSchedule::new(monitor.config().countdown_period);
    let mut now = Duration::ZERO;

    for (index, sample) in samples.into_iter().enumerate() {
        monitor.step_due(&mut schedule, now);
        if options.cancel_at.contains(&index) {
            log::info!("Replay: cancel pressed before sample {}", index);
            monitor.cancel();
            schedule.sync(monitor.is_counting(), now);
        }

        monitor.on_sample(sample);
        schedule.sync(monitor.is_counting(), now);
        now += sample_period;
    }

    if options.drain {
        while let Some(deadline) = schedule.deadline() {
            now = now.max(deadline);
            schedule.due(now);
            monitor.countdown_tick();
            schedule.sync(monitor.is_counting(), now);
        }
    }

    now
}
