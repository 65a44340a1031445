// SeizeAlert - Entry Point
//
// On the watch (target_os = "espidf"):
//   1. Bring up logging, I2C, the OLED and the MPU6050.
//   2. Self-test both devices and show the result.
//   3. Open the NVS event log.
//   4. Spawn the sensor, monitor and UI tasks.
//
// Everywhere else the binary replays a recorded `x,y,z` sample file through
// the same monitor on a simulated clock.

#[cfg(target_os = "espidf")]
mod drivers;
#[cfg(target_os = "espidf")]
mod tasks;

#[cfg(target_os = "espidf")]
fn main() -> anyhow::Result<()> {
    firmware::run()
}

#[cfg(not(target_os = "espidf"))]
fn main() -> anyhow::Result<()> {
    replay_tool::run()
}

// ---------------------------------------------------------------------------
// Firmware
// ---------------------------------------------------------------------------
#[cfg(target_os = "espidf")]
mod firmware {
    use std::sync::mpsc;
    use std::sync::Mutex;
    use std::thread;
    use std::time::Duration;

    use esp_idf_hal::gpio::{AnyInputPin, AnyOutputPin, Input, InputPin, Output, OutputPin, PinDriver};
    use esp_idf_hal::i2c::{I2cConfig, I2cDriver};
    use esp_idf_hal::prelude::*;
    use esp_idf_svc::nvs::EspDefaultNvsPartition;

    use seizealert::config::*;
    use seizealert::display::{DisplaySink, Screen};
    use seizealert::MonitorConfig;

    use crate::drivers::imu::Mpu6050;
    use crate::drivers::nvs_log::NvsEventLog;
    use crate::drivers::oled::OledDisplay;
    use crate::tasks;

    pub fn run() -> anyhow::Result<()> {
        // Link esp-idf-sys runtime patches and initialise logging.
        esp_idf_svc::sys::link_patches();
        esp_idf_svc::log::EspLogger::initialize_default();
        log::info!("SeizeAlert firmware starting…");

        let config = MonitorConfig::default();
        config.validate()?;

        // ---- Peripherals ------------------------------------------------------
        let peripherals = Peripherals::take()?;

        // Cancel button (pull-up, active LOW).
        let button = PinDriver::input(peripherals.pins.gpio3.downgrade_input())?;
        configure_pullup(&button);

        // ---- I2C bus (shared between OLED and MPU6050) ------------------------
        let i2c_config = I2cConfig::new().baudrate(400u32.kHz().into());
        let i2c = I2cDriver::new(
            peripherals.i2c0,
            peripherals.pins.gpio6, // SDA
            peripherals.pins.gpio7, // SCL
            &i2c_config,
        )?;
        // SAFETY: The I2C peripheral is a singleton obtained from `Peripherals::take()`.
        // It will live for the entire programme duration (embedded firmware never exits).
        let i2c_bus: &'static Mutex<I2cDriver<'static>> =
            Box::leak(Box::new(Mutex::new(unsafe { core::mem::transmute(i2c) })));

        // ---- Self-test --------------------------------------------------------
        let mut display = OledDisplay::new(i2c_bus);
        display.init()?;

        let oled_ok = display.is_connected();
        let imu_ok = Mpu6050::new(i2c_bus).is_connected();

        let mut screen = Screen::new();
        screen.show_status(&format!(
            "OLED {}\nIMU {}",
            if oled_ok { "OK" } else { "FAIL" },
            if imu_ok { "OK" } else { "FAIL" }
        ));
        if let Some(frame) = screen.take_dirty() {
            display.flush(frame)?;
        }
        thread::sleep(Duration::from_secs(1));

        if !oled_ok || !imu_ok {
            log::error!("Boot check FAILED - OLED:{} IMU:{}", oled_ok, imu_ok);
            // Continue anyway so we can still debug via serial.
        }

        // ---- Event log --------------------------------------------------------
        let event_log = NvsEventLog::open(EspDefaultNvsPartition::take()?)?;
        for record in event_log.recent() {
            log::info!("History: {} at {}", record.tag, record.timestamp);
        }

        // ---- Channels ---------------------------------------------------------
        let (input_tx, input_rx) = mpsc::channel();
        let (ui_tx, ui_rx) = mpsc::channel();

        // ---- Prepare GPIO handles for tasks -----------------------------------
        // SAFETY: GPIO peripheral lives forever, same argument as I2C above.
        let button_static: PinDriver<'static, AnyInputPin, Input> =
            unsafe { core::mem::transmute(button) };

        let haptic_pin = PinDriver::output(peripherals.pins.gpio4.downgrade_output())?;
        let haptic_static: PinDriver<'static, AnyOutputPin, Output> =
            unsafe { core::mem::transmute(haptic_pin) };

        // ---- Spawn tasks (map to FreeRTOS tasks via std::thread) ---------------

        // Sensor task - tightest timing.
        let sensor_tx = input_tx.clone();
        let sample_period = config.sample_period;
        thread::Builder::new()
            .name("sensor".into())
            .stack_size(STACK_SENSOR)
            .spawn(move || {
                tasks::sensor::sensor_task(i2c_bus, sensor_tx, sample_period);
            })?;

        // Monitor task - sole owner of detection state.
        thread::Builder::new()
            .name("monitor".into())
            .stack_size(STACK_MONITOR)
            .spawn(move || {
                tasks::monitor::monitor_task(config, input_rx, ui_tx, event_log);
            })?;

        // UI task (display + button + haptic)
        thread::Builder::new()
            .name("ui".into())
            .stack_size(STACK_UI)
            .spawn(move || {
                tasks::ui::ui_task(i2c_bus, button_static, haptic_static, ui_rx, input_tx);
            })?;

        log::info!("Boot complete - monitoring");

        // Main thread has nothing left to do - park it forever.
        loop {
            thread::sleep(Duration::from_secs(60));
        }
    }

    /// `PinDriver::input` only sets the direction; the pull-up goes through
    /// the raw GPIO API because the downgraded pin type has no `set_pull`.
    fn configure_pullup(_pin: &PinDriver<'_, AnyInputPin, Input>) {
        unsafe {
            esp_idf_sys::gpio_set_pull_mode(
                PIN_BUTTON,
                esp_idf_sys::gpio_pull_mode_t_GPIO_PULLUP_ONLY,
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Host replay tool
// ---------------------------------------------------------------------------
#[cfg(not(target_os = "espidf"))]
mod replay_tool {
    use std::fs::File;
    use std::io::{self, BufReader};
    use std::path::PathBuf;
    use std::time::Duration;

    use anyhow::Context;
    use clap::Parser;

    use seizealert::config::*;
    use seizealert::display::{DisplaySink, Presenter};
    use seizealert::replay::{self, ReplayOptions};
    use seizealert::reporter::{EventLog, FileLog, LogError, MemoryLog, Reporter, SystemClock};
    use seizealert::{DetectorConfig, LogRecord, Monitor, MonitorConfig};

    #[derive(Parser)]
    #[command(name = env!("CARGO_PKG_NAME"))]
    #[command(version = env!("CARGO_PKG_VERSION"))]
    #[command(about = "Replay recorded accelerometer samples through the fall detector.")]
    pub struct Cli {
        /// Recording with one `x,y,z` sample (milli-g) per line; stdin if omitted.
        pub input: Option<PathBuf>,

        /// Append confirmed events to this file instead of keeping them in memory.
        #[arg(long)]
        pub log_file: Option<PathBuf>,

        /// Press cancel just before this sample index (repeatable).
        #[arg(long = "cancel-at")]
        pub cancel_at: Vec<usize>,

        /// Stop at the last sample instead of finishing a pending countdown.
        #[arg(long)]
        pub no_drain: bool,

        #[arg(long, default_value_t = SENSOR_SAMPLE_INTERVAL_MS)]
        pub sample_period_ms: u64,
        #[arg(long, default_value_t = COUNTDOWN_TICKS)]
        pub countdown_ticks: u32,
        #[arg(long, default_value_t = COUNTDOWN_TICK_MS)]
        pub countdown_period_ms: u64,
        #[arg(long, default_value_t = REST_MAGNITUDE_MG)]
        pub rest_magnitude: i32,
        #[arg(long, default_value_t = MAX_AXIS_MG)]
        pub max_axis: i32,
        #[arg(long, default_value_t = SPIKE_LOW)]
        pub spike_low: u32,
        #[arg(long, default_value_t = SPIKE_HIGH)]
        pub spike_high: u32,
        #[arg(long, default_value_t = SPIKE_MIN_SAMPLES)]
        pub spike_min_samples: u32,
        #[arg(long, default_value_t = MOTION_WINDOW_SAMPLES)]
        pub motion_window: u32,
        #[arg(long, default_value_t = MOTION_THRESHOLD)]
        pub motion_threshold: u32,
        #[arg(long, default_value_t = STILL_WINDOW_SAMPLES)]
        pub still_window: u32,
        #[arg(long, default_value_t = STILL_CEILING)]
        pub still_ceiling: u32,
        /// Tag candidates with at least this many shakes as seizures.
        #[arg(long)]
        pub seizure_shakes: Option<u32>,
    }

    impl Cli {
        pub fn monitor_config(&self) -> MonitorConfig {
            MonitorConfig {
                sample_period: Duration::from_millis(self.sample_period_ms),
                countdown_ticks: self.countdown_ticks,
                countdown_period: Duration::from_millis(self.countdown_period_ms),
                detector: DetectorConfig {
                    rest_magnitude: self.rest_magnitude,
                    max_axis: self.max_axis,
                    spike_low: self.spike_low,
                    spike_high: self.spike_high,
                    spike_min_samples: self.spike_min_samples,
                    motion_window_samples: self.motion_window,
                    motion_threshold: self.motion_threshold,
                    still_window_samples: self.still_window,
                    still_ceiling: self.still_ceiling,
                    seizure_shake_count: self.seizure_shakes,
                },
            }
        }
    }

    /// Display output goes to the log.
    struct LogDisplay;

    impl DisplaySink for LogDisplay {
        fn show_status(&mut self, text: &str) {
            log::info!("[display] {}", text.replace('\n', " "));
        }

        fn show_countdown(&mut self, remaining: u32) {
            log::info!("[display] ALERT {}", remaining);
        }
    }

    enum Sink {
        File(FileLog),
        Memory(MemoryLog),
    }

    impl EventLog for Sink {
        fn append(&mut self, record: LogRecord) -> Result<(), LogError> {
            match self {
                Sink::File(log) => log.append(record),
                Sink::Memory(log) => log.append(record),
            }
        }
    }

    pub fn run() -> anyhow::Result<()> {
        env_logger::init();
        let cli = Cli::parse();

        let samples = match &cli.input {
            Some(path) => {
                let file = File::open(path)
                    .with_context(|| format!("Failed to open recording {}", path.display()))?;
                replay::read_samples(BufReader::new(file))?
            }
            None => replay::read_samples(io::stdin().lock())?,
        };

        let sink = match &cli.log_file {
            Some(path) => {
                let log = FileLog::open(path)
                    .with_context(|| format!("Failed to open event log {}", path.display()))?;
                log::info!("Appending events to {}", log.path().display());
                Sink::File(log)
            }
            None => Sink::Memory(MemoryLog::new()),
        };

        let observer = (Reporter::new(sink, SystemClock), Presenter::new(LogDisplay));
        let mut monitor = Monitor::new(cli.monitor_config(), observer)
            .context("Invalid detector configuration")?;

        let options = ReplayOptions {
            cancel_at: cli.cancel_at.iter().copied().collect(),
            drain: !cli.no_drain,
        };
        let elapsed = replay::run(&mut monitor, samples, &options);

        let stats = monitor.stats();
        println!(
            "samples={} simulated={:.2}s alerts={} confirmed={} cancelled={} dropped={}",
            stats.samples,
            elapsed.as_secs_f64(),
            stats.alerts,
            stats.finalized,
            stats.cancelled,
            stats.dropped,
        );

        let (reporter, _) = monitor.into_observer();
        if let Sink::Memory(log) = reporter.into_log() {
            for record in log.records() {
                println!("{},{}", record.timestamp, record.tag);
            }
        }
        Ok(())
    }
}
