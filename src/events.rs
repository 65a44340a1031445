// SeizeAlert - System Events & Data Types

// ---------------------------------------------------------------------------
// Sensor Data (3-axis accelerometer reading, milli-g)
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sample {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Sample {
    /// Stand-in for a failed sensor read.
    pub const ZERO: Sample = Sample { x: 0, y: 0, z: 0 };

    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }
}

// ---------------------------------------------------------------------------
// Event tags (numeric values are the data-log session tags)
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventTag {
    Fall,
    Seizure,
    AlertStarted,
}

impl EventTag {
    pub const fn log_tag(self) -> u32 {
        match self {
            Self::Fall => 0x5,
            Self::Seizure => 0xd,
            Self::AlertStarted => 0xa,
        }
    }

    pub fn from_log_tag(tag: u32) -> Option<Self> {
        match tag {
            0x5 => Some(Self::Fall),
            0xd => Some(Self::Seizure),
            0xa => Some(Self::AlertStarted),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fall => "FALL",
            Self::Seizure => "SEIZURE",
            Self::AlertStarted => "ALERT_STARTED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "FALL" => Some(Self::Fall),
            "SEIZURE" => Some(Self::Seizure),
            "ALERT_STARTED" => Some(Self::AlertStarted),
            _ => None,
        }
    }
}

impl std::fmt::Display for EventTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Log records
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogRecord {
    pub tag: EventTag,
    /// Unix seconds.
    pub timestamp: i64,
}

impl LogRecord {
    pub const ENCODED_LEN: usize = 12;

    /// Fixed layout for byte-oriented stores: u32 LE tag, i64 LE timestamp.
    pub fn to_bytes(&self) -> [u8; Self::ENCODED_LEN] {
        let mut out = [0u8; Self::ENCODED_LEN];
        out[..4].copy_from_slice(&self.tag.log_tag().to_le_bytes());
        out[4..].copy_from_slice(&self.timestamp.to_le_bytes());
        out
    }

    pub fn from_bytes(raw: &[u8]) -> Option<Self> {
        if raw.len() != Self::ENCODED_LEN {
            return None;
        }
        let tag = u32::from_le_bytes(raw[..4].try_into().ok()?);
        let timestamp = i64::from_le_bytes(raw[4..].try_into().ok()?);
        Some(Self {
            tag: EventTag::from_log_tag(tag)?,
            timestamp,
        })
    }
}

// ---------------------------------------------------------------------------
// Detector output
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandidateEvent {
    pub tag: EventTag,
    /// Largest metric seen while the pattern was matched.
    pub peak_metric: u32,
}

// ---------------------------------------------------------------------------
// Status shown when no countdown is running
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Monitoring,
    FalseAlarm,
    Reported(EventTag),
}

impl Status {
    pub fn text(&self) -> &'static str {
        match self {
            Self::Monitoring => "Monitoring",
            Self::FalseAlarm => "False alarm\ncancelled",
            Self::Reported(EventTag::Seizure) => "Seizure\nreported",
            Self::Reported(_) => "Fall\nreported",
        }
    }
}

// ---------------------------------------------------------------------------
// Monitor events - consumed by the reporter and the presenter
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorEvent {
    StatusChanged(Status),
    /// A candidate was declared and its countdown began.
    CountdownStarted { candidate: CandidateEvent, remaining: u32 },
    CountdownTick { remaining: u32 },
    /// Countdown expired without a cancel.
    EventFinalized(EventTag),
    Cancelled(EventTag),
}

// ---------------------------------------------------------------------------
// Monitor inputs - everything that may mutate detection state
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Sample(Sample),
    Cancel,
    Reset,
}

// ---------------------------------------------------------------------------
// UI Events - sent to the UI task via channel
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    ShowStatus(String),
    ShowCountdown(u32),
}
