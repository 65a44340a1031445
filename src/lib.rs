//! SeizeAlert: fall and seizure alerting from a 3-axis accelerometer.
//!
//! Samples flow through a fixed-cost pipeline:
//!
//! 1. [`metric`] reduces each sample to its deviation from the resting
//!    magnitude.
//! 2. [`detector::Detector`] matches the impact / residual motion / settling
//!    pattern and declares at most one candidate event at a time.
//! 3. [`countdown::Countdown`] gives the wearer a window to cancel before the
//!    event is reported.
//! 4. [`reporter::Reporter`] writes the audit trail to an
//!    [`reporter::EventLog`].
//!
//! [`monitor::Monitor`] owns the whole state machine.  The firmware and the
//! host replay tool both drive it one input at a time.

pub mod config;
pub mod countdown;
pub mod detector;
pub mod display;
pub mod events;
pub mod input;
pub mod metric;
pub mod monitor;
pub mod replay;
pub mod reporter;

pub use config::{ConfigError, DetectorConfig, MonitorConfig};
pub use events::{CandidateEvent, EventTag, Input, LogRecord, MonitorEvent, Sample, Status};
pub use monitor::{Monitor, MonitorStats, Observer};
