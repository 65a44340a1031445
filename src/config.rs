// SeizeAlert - Hardware, Timing & Detection Configuration
// Target: Seeed Studio Xiao ESP32-C3 (RISC-V) with MPU6050 + SSD1306.
//
// The `pub const` items are the compile-time defaults.  `MonitorConfig` and
// `DetectorConfig` carry them at run time so the host replay tool (and tests)
// can override any of them; `MonitorConfig::validate` rejects values the
// state machine cannot work with before it starts.

use std::time::Duration;

use thiserror::Error;

// ---------------------------------------------------------------------------
// GPIO Pin Definitions (Xiao ESP32-C3 pinout)
// ---------------------------------------------------------------------------
pub const PIN_BUTTON: i32 = 3;      // D1/A1 - Cancel button (INPUT_PULLUP, active LOW)
pub const PIN_HAPTIC: i32 = 4;      // D2/A2 - Haptic motor control
pub const PIN_I2C_SDA: i32 = 6;     // D4    - I2C data line
pub const PIN_I2C_SCL: i32 = 7;     // D5    - I2C clock line

// ---------------------------------------------------------------------------
// I2C Bus
// ---------------------------------------------------------------------------
pub const I2C_ADDR_MPU6050: u8 = 0x68;
pub const I2C_ADDR_OLED: u8 = 0x3C;
pub const I2C_TIMEOUT_TICKS: u32 = 1000; // FreeRTOS ticks

// ---------------------------------------------------------------------------
// Display (SSD1306 OLED)
// ---------------------------------------------------------------------------
pub const SCREEN_WIDTH: u32 = 128;
pub const SCREEN_HEIGHT: u32 = 64;
pub const DISPLAY_BUFFER_SIZE: usize = (SCREEN_WIDTH as usize * SCREEN_HEIGHT as usize) / 8; // 1024

// ---------------------------------------------------------------------------
// Task Stack Sizes (bytes)
// ---------------------------------------------------------------------------
pub const STACK_SENSOR: usize = 4096;
pub const STACK_MONITOR: usize = 8192;
pub const STACK_UI: usize = 8192;

// ---------------------------------------------------------------------------
// Timing (milliseconds)
// ---------------------------------------------------------------------------
pub const SENSOR_SAMPLE_INTERVAL_MS: u64 = 40;         // 25 Hz
pub const COUNTDOWN_TICK_MS: u64 = 1000;               // 1 s per countdown step
pub const UI_POLL_INTERVAL_MS: u64 = 10;               // 100 Hz input poll / refresh
pub const DEBOUNCE_MS: u64 = 50;
pub const LONG_PRESS_MS: u64 = 3000;                   // 3-second hold -> reset
pub const HAPTIC_PULSE_MS: u64 = 50;

// ---------------------------------------------------------------------------
// Accelerometer (milli-g units, MPU6050 at ±4 g)
// ---------------------------------------------------------------------------
pub const ACCEL_SCALE_4G: i32 = 8192;   // LSB/g at ±4 g
pub const MAX_AXIS_MG: i32 = 4000;      // clamp bound per axis
pub const REST_MAGNITUDE_MG: i32 = 1000; // 1 g at rest

// ---------------------------------------------------------------------------
// Detection thresholds (metric = |magnitude - rest| in milli-g)
// ---------------------------------------------------------------------------
pub const SPIKE_LOW: u32 = 800;
pub const SPIKE_HIGH: u32 = 1000;
pub const SPIKE_MIN_SAMPLES: u32 = 4;
pub const MOTION_WINDOW_SAMPLES: u32 = 25;
pub const MOTION_THRESHOLD: u32 = 500;
pub const STILL_WINDOW_SAMPLES: u32 = 50;
pub const STILL_CEILING: u32 = 100;
pub const COUNTDOWN_TICKS: u32 = 10;

// ---------------------------------------------------------------------------
// Square-root approximation
// ---------------------------------------------------------------------------
pub const SQRT_MAX_ITERATIONS: u32 = 40;
pub const SQRT_TOLERANCE: f64 = 0.001;

/// Rejected configuration, reported once at startup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("spike band is empty: low {low} > high {high}")]
    EmptySpikeBand { low: u32, high: u32 },

    #[error("axis clamp {max_axis} cannot represent rest magnitude {rest}")]
    ClampBelowRest { max_axis: i32, rest: i32 },
}

/// Thresholds and window lengths driving the [`Detector`](crate::detector::Detector).
#[derive(Debug, Clone, PartialEq)]
pub struct DetectorConfig {
    pub rest_magnitude: i32,
    pub max_axis: i32,
    pub spike_low: u32,
    pub spike_high: u32,
    pub spike_min_samples: u32,
    pub motion_window_samples: u32,
    pub motion_threshold: u32,
    pub still_window_samples: u32,
    pub still_ceiling: u32,
    /// Tag a candidate as a seizure once this many post-spike samples exceed
    /// the motion threshold. `None` reports every candidate as a fall.
    pub seizure_shake_count: Option<u32>,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            rest_magnitude: REST_MAGNITUDE_MG,
            max_axis: MAX_AXIS_MG,
            spike_low: SPIKE_LOW,
            spike_high: SPIKE_HIGH,
            spike_min_samples: SPIKE_MIN_SAMPLES,
            motion_window_samples: MOTION_WINDOW_SAMPLES,
            motion_threshold: MOTION_THRESHOLD,
            still_window_samples: STILL_WINDOW_SAMPLES,
            still_ceiling: STILL_CEILING,
            seizure_shake_count: None,
        }
    }
}

impl DetectorConfig {
    pub fn in_spike_band(&self, metric: u32) -> bool {
        (self.spike_low..=self.spike_high).contains(&metric)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rest_magnitude <= 0 {
            return Err(ConfigError::Zero("rest_magnitude"));
        }
        if self.max_axis < self.rest_magnitude {
            return Err(ConfigError::ClampBelowRest {
                max_axis: self.max_axis,
                rest: self.rest_magnitude,
            });
        }
        if self.spike_low > self.spike_high {
            return Err(ConfigError::EmptySpikeBand {
                low: self.spike_low,
                high: self.spike_high,
            });
        }
        if self.spike_min_samples == 0 {
            return Err(ConfigError::Zero("spike_min_samples"));
        }
        if self.motion_window_samples == 0 {
            return Err(ConfigError::Zero("motion_window_samples"));
        }
        if self.still_window_samples == 0 {
            return Err(ConfigError::Zero("still_window_samples"));
        }
        if self.seizure_shake_count == Some(0) {
            return Err(ConfigError::Zero("seizure_shake_count"));
        }
        Ok(())
    }
}

/// Everything the [`Monitor`](crate::monitor::Monitor) needs at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorConfig {
    pub sample_period: Duration,
    pub countdown_ticks: u32,
    pub countdown_period: Duration,
    pub detector: DetectorConfig,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            sample_period: Duration::from_millis(SENSOR_SAMPLE_INTERVAL_MS),
            countdown_ticks: COUNTDOWN_TICKS,
            countdown_period: Duration::from_millis(COUNTDOWN_TICK_MS),
            detector: DetectorConfig::default(),
        }
    }
}

impl MonitorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_period.is_zero() {
            return Err(ConfigError::Zero("sample_period"));
        }
        if self.countdown_ticks == 0 {
            return Err(ConfigError::Zero("countdown_ticks"));
        }
        if self.countdown_period.is_zero() {
            return Err(ConfigError::Zero("countdown_period"));
        }
        self.detector.validate()
    }
}
