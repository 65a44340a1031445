// SeizeAlert - Event Reporter & Log Sinks
//
// The reporter turns monitor events into append-only log records.  Appends
// are best-effort: a failing sink is logged and otherwise ignored, the
// monitor never waits on it.

use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;

use crate::events::{EventTag, LogRecord, MonitorEvent};
use crate::monitor::Observer;

/// Why a log sink refused a record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LogError {
    #[error("log is busy")]
    Busy,
    #[error("log is full")]
    Full,
    #[error("log not found")]
    NotFound,
    #[error("log is closed")]
    Closed,
    #[error("invalid log parameters")]
    InvalidParams,
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<io::Error> for LogError {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            ErrorKind::WouldBlock | ErrorKind::Interrupted => LogError::Busy,
            ErrorKind::NotFound => LogError::NotFound,
            ErrorKind::InvalidInput => LogError::InvalidParams,
            _ => LogError::Storage(e.to_string()),
        }
    }
}

/// Append-only event store.
pub trait EventLog {
    fn append(&mut self, record: LogRecord) -> Result<(), LogError>;
}

/// Source of wall-clock timestamps (unix seconds).
pub trait Clock {
    fn now(&self) -> i64;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0)
    }
}

// ---------------------------------------------------------------------------
// In-memory log
// ---------------------------------------------------------------------------

/// Bounded in-memory log; refuses records once `capacity` is reached.
#[derive(Debug, Default)]
pub struct MemoryLog {
    records: Vec<LogRecord>,
    capacity: Option<usize>,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: Vec::with_capacity(capacity),
            capacity: Some(capacity),
        }
    }

    pub fn records(&self) -> &[LogRecord] {
        &self.records
    }
}

impl EventLog for MemoryLog {
    fn append(&mut self, record: LogRecord) -> Result<(), LogError> {
        if self.capacity.is_some_and(|cap| self.records.len() >= cap) {
            return Err(LogError::Full);
        }
        self.records.push(record);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Text file log: one `timestamp,TAG` line per record
// ---------------------------------------------------------------------------

pub struct FileLog {
    path: PathBuf,
    file: Option<File>,
}

impl FileLog {
    pub fn open<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self { path, file: Some(file) })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn close(&mut self) {
        self.file = None;
    }

    /// Read back every well-formed record in `path`.
    pub fn read_all<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<LogRecord>> {
        let reader = BufReader::new(File::open(path)?);
        let mut records = Vec::new();
        for line in reader.lines() {
            let line = line?;
            let Some((ts, tag)) = line.split_once(',') else {
                continue;
            };
            if let (Ok(timestamp), Some(tag)) = (ts.trim().parse::<i64>(), EventTag::parse(tag.trim())) {
                records.push(LogRecord { tag, timestamp });
            }
        }
        Ok(records)
    }
}

impl EventLog for FileLog {
    fn append(&mut self, record: LogRecord) -> Result<(), LogError> {
        let file = self.file.as_mut().ok_or(LogError::Closed)?;
        writeln!(file, "{},{}", record.timestamp, record.tag)
            .and_then(|_| file.flush())
            .map_err(LogError::from)
    }
}

// ---------------------------------------------------------------------------
// Reporter
// ---------------------------------------------------------------------------

pub struct Reporter<L, C> {
    log: L,
    clock: C,
    failures: u32,
}

impl<L: EventLog, C: Clock> Reporter<L, C> {
    pub fn new(log: L, clock: C) -> Self {
        Self { log, clock, failures: 0 }
    }

    pub fn log(&self) -> &L {
        &self.log
    }

    pub fn into_log(self) -> L {
        self.log
    }

    /// Appends the sink refused so far.
    pub fn failures(&self) -> u32 {
        self.failures
    }

    fn record(&mut self, tag: EventTag) {
        let record = LogRecord { tag, timestamp: self.clock.now() };
        match self.log.append(record) {
            Ok(()) => log::info!("Logged {} at {}", tag, record.timestamp),
            Err(e) => {
                self.failures += 1;
                log::warn!("Could not log {}: {}", tag, e);
            }
        }
    }
}

impl<L: EventLog, C: Clock> Observer for Reporter<L, C> {
    fn notify(&mut self, event: &MonitorEvent) {
        match *event {
            MonitorEvent::CountdownStarted { candidate, .. } => {
                log::info!("Alert raised: {} (peak deviation {})", candidate.tag, candidate.peak_metric);
                self.record(EventTag::AlertStarted);
            }
            MonitorEvent::EventFinalized(tag) => self.record(tag),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::CandidateEvent;

    struct FixedClock(i64);

    impl Clock for FixedClock {
        fn now(&self) -> i64 {
            self.0
        }
    }

    fn started() -> MonitorEvent {
        MonitorEvent::CountdownStarted {
            candidate: CandidateEvent { tag: EventTag::Fall, peak_metric: 950 },
            remaining: 10,
        }
    }

    #[test]
    fn writes_alert_and_final_records() {
        let mut reporter = Reporter::new(MemoryLog::new(), FixedClock(1_700_000_000));
        reporter.notify(&started());
        reporter.notify(&MonitorEvent::CountdownTick { remaining: 9 });
        reporter.notify(&MonitorEvent::EventFinalized(EventTag::Fall));

        assert_eq!(
            reporter.log().records(),
            &[
                LogRecord { tag: EventTag::AlertStarted, timestamp: 1_700_000_000 },
                LogRecord { tag: EventTag::Fall, timestamp: 1_700_000_000 },
            ]
        );
    }

    #[test]
    fn cancellation_writes_nothing() {
        let mut reporter = Reporter::new(MemoryLog::new(), FixedClock(5));
        reporter.notify(&MonitorEvent::Cancelled(EventTag::Fall));
        assert!(reporter.log().records().is_empty());
    }

    #[test]
    fn full_log_is_counted_not_fatal() {
        let mut reporter = Reporter::new(MemoryLog::with_capacity(1), FixedClock(5));
        reporter.notify(&started());
        reporter.notify(&MonitorEvent::EventFinalized(EventTag::Fall));
        assert_eq!(reporter.log().records().len(), 1);
        assert_eq!(reporter.failures(), 1);
    }

    #[test]
    fn system_clock_is_after_2020() {
        assert!(SystemClock.now() > 1_577_836_800);
    }

    #[test]
    fn file_log_appends_lines() -> anyhow::Result<()> {
        let path = std::env::temp_dir().join(format!("seizealert-log-{}.txt", std::process::id()));
        let _ = std::fs::remove_file(&path);

        let mut log = FileLog::open(&path)?;
        log.append(LogRecord { tag: EventTag::AlertStarted, timestamp: 10 })?;
        log.append(LogRecord { tag: EventTag::Seizure, timestamp: 20 })?;
        log.close();
        assert_eq!(log.append(LogRecord { tag: EventTag::Fall, timestamp: 30 }), Err(LogError::Closed));

        let records = FileLog::read_all(&path)?;
        std::fs::remove_file(&path)?;
        assert_eq!(
            records,
            vec![
                LogRecord { tag: EventTag::AlertStarted, timestamp: 10 },
                LogRecord { tag: EventTag::Seizure, timestamp: 20 },
            ]
        );
        Ok(())
    }

    #[test]
    fn io_failures_map_to_log_errors() {
        let kind = |k: ErrorKind| LogError::from(io::Error::from(k));
        assert_eq!(kind(ErrorKind::WouldBlock), LogError::Busy);
        assert_eq!(kind(ErrorKind::NotFound), LogError::NotFound);
        assert_eq!(kind(ErrorKind::InvalidInput), LogError::InvalidParams);
        assert!(matches!(kind(ErrorKind::PermissionDenied), LogError::Storage(_)));
    }

    #[test]
    fn file_log_keeps_its_path() -> anyhow::Result<()> {
        let path = std::env::temp_dir().join(format!("seizealert-path-{}.txt", std::process::id()));
        let log = FileLog::open(&path)?;
        assert_eq!(log.path(), path.as_path());
        drop(log);
        std::fs::remove_file(&path)?;
        Ok(())
    }
}
