// SeizeAlert - Debounce Detector
//
// Five-stage pattern match over the per-sample metric:
//
//   Idle ──in band──► SpikeConfirm ──≥ min spike samples──► MotionCheck
//                          │ too short                          │ no motion
//                          ▼                                    ▼
//                         Idle                                 Idle
//
//   MotionCheck ──motion──► StillCheck1 ──still──► StillCheck2 ──still──► Idle
//                               │ motion               │ motion
//                               └──────────────────────┴──────► Declared
//
// A motion result in StillCheck1 jumps two stages straight to Declared.
// Declared is never held: the candidate is handed out and the detector is
// back in Idle before `feed` returns.

use crate::config::DetectorConfig;
use crate::events::{CandidateEvent, EventTag};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionState {
    Idle,
    SpikeConfirm,
    MotionCheck,
    StillCheck1,
    StillCheck2,
    Declared,
}

/// Per-pattern counters.  All zero whenever the detector is idle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WindowCounters {
    /// Consecutive in-band samples while confirming a spike.
    pub spike_count: u32,
    /// Samples consumed by the current motion/stillness window.
    pub window_samples: u32,
    pub motion_seen: bool,
    /// Post-spike samples above the motion threshold.
    pub shake_count: u32,
    pub peak_metric: u32,
}

impl WindowCounters {
    fn clear_window(&mut self) {
        self.spike_count = 0;
        self.window_samples = 0;
        self.motion_seen = false;
    }
}

pub struct Detector {
    config: DetectorConfig,
    state: DetectionState,
    counters: WindowCounters,
}

impl Detector {
    pub fn new(config: DetectorConfig) -> Self {
        Self {
            config,
            state: DetectionState::Idle,
            counters: WindowCounters::default(),
        }
    }

    pub fn state(&self) -> DetectionState {
        self.state
    }

    pub fn counters(&self) -> WindowCounters {
        self.counters
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Evaluate one metric.  Returns the candidate on the sample that
    /// completes the pattern.
    pub fn feed(&mut self, metric: u32) -> Option<CandidateEvent> {
        let next = self.step(metric);
        if next == DetectionState::Declared {
            let candidate = CandidateEvent {
                tag: self.classify(),
                peak_metric: self.counters.peak_metric,
            };
            log::debug!("detector: {:?} -> Declared ({:?})", self.state, candidate);
            self.reset();
            return Some(candidate);
        }
        if next != self.state {
            log::debug!("detector: {:?} -> {:?} (metric {})", self.state, next, metric);
            self.enter(next);
        }
        None
    }

    /// Force the idle state and zero every counter.
    pub fn reset(&mut self) {
        self.state = DetectionState::Idle;
        self.counters = WindowCounters::default();
    }

    /// Update counters for `metric` and decide the next state.
    fn step(&mut self, metric: u32) -> DetectionState {
        let in_band = self.config.in_spike_band(metric);

        if self.state != DetectionState::Idle {
            self.counters.peak_metric = self.counters.peak_metric.max(metric);
        }

        match self.state {
            DetectionState::Idle => {
                if in_band {
                    self.counters.spike_count = 1;
                    self.counters.peak_metric = metric;
                    DetectionState::SpikeConfirm
                } else {
                    DetectionState::Idle
                }
            }

            DetectionState::SpikeConfirm => {
                if in_band {
                    self.counters.spike_count = self.counters.spike_count.saturating_add(1);
                    DetectionState::SpikeConfirm
                } else if self.counters.spike_count >= self.config.spike_min_samples {
                    DetectionState::MotionCheck
                } else {
                    DetectionState::Idle
                }
            }

            DetectionState::MotionCheck => {
                match self.window(metric, self.config.motion_window_samples, self.config.motion_threshold) {
                    None => DetectionState::MotionCheck,
                    Some(true) => DetectionState::StillCheck1,
                    Some(false) => DetectionState::Idle,
                }
            }

            DetectionState::StillCheck1 => {
                match self.window(metric, self.config.still_window_samples, self.config.still_ceiling) {
                    None => DetectionState::StillCheck1,
                    Some(false) => DetectionState::StillCheck2,
                    // Motion here already counts as enough evidence: skip StillCheck2.
                    Some(true) => DetectionState::Declared,
                }
            }

            DetectionState::StillCheck2 => {
                match self.window(metric, self.config.still_window_samples, self.config.still_ceiling) {
                    None => DetectionState::StillCheck2,
                    Some(false) => DetectionState::Idle,
                    Some(true) => DetectionState::Declared,
                }
            }

            DetectionState::Declared => DetectionState::Idle,
        }
    }

    /// Count one sample into the current window.  Returns whether motion
    /// above `threshold` was seen once the window is full.
    fn window(&mut self, metric: u32, len: u32, threshold: u32) -> Option<bool> {
        if metric > self.config.motion_threshold {
            self.counters.shake_count = self.counters.shake_count.saturating_add(1);
        }
        if metric > threshold {
            self.counters.motion_seen = true;
        }
        self.counters.window_samples += 1;
        (self.counters.window_samples >= len).then_some(self.counters.motion_seen)
    }

    fn enter(&mut self, next: DetectionState) {
        if next == DetectionState::Idle {
            self.reset();
            return;
        }
        // A fresh spike keeps the count `step` just set.
        if self.state != DetectionState::Idle {
            self.counters.clear_window();
        }
        self.state = next;
    }

    fn classify(&self) -> EventTag {
        match self.config.seizure_shake_count {
            Some(limit) if self.counters.shake_count >= limit => EventTag::Seizure,
            _ => EventTag::Fall,
        }
    }
}
