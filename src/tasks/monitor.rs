// SeizeAlert - Monitor Task
//
// The single owner of detection state.  Inputs from the sensor and UI tasks
// arrive on one channel and are handled strictly one at a time; countdown
// steps are taken when the channel wait times out at the next deadline.

use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::time::Instant;

use seizealert::countdown::TickSchedule;
use seizealert::display::Presenter;
use seizealert::events::UiEvent;
use seizealert::reporter::{Reporter, SystemClock};
use seizealert::{Input, Monitor, MonitorConfig};

use crate::drivers::nvs_log::NvsEventLog;

pub fn monitor_task(
    config: MonitorConfig,
    input_rx: Receiver<Input>,
    ui_tx: Sender<UiEvent>,
    event_log: NvsEventLog,
) {
    log::info!("Monitor task started");

    let observer = (Reporter::new(event_log, SystemClock), Presenter::new(ui_tx));
    let mut schedule: TickSchedule<Instant> = TickSchedule::new(config.countdown_period);
    let mut monitor = match Monitor::new(config, observer) {
        Ok(m) => m,
        Err(e) => {
            log::error!("Invalid monitor configuration: {}", e);
            return;
        }
    };

    loop {
        let next = match schedule.deadline() {
            Some(deadline) => {
                let wait = deadline.saturating_duration_since(Instant::now());
                match input_rx.recv_timeout(wait) {
                    Ok(input) => Some(input),
                    Err(RecvTimeoutError::Timeout) => None,
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            None => match input_rx.recv() {
                Ok(input) => Some(input),
                Err(_) => break,
            },
        };

        if let Some(input) = next {
            monitor.handle(input);
        }
        // Steps are due whether the wait timed out or an input arrived late.
        monitor.step_due(&mut schedule, Instant::now());
    }

    let stats = monitor.stats();
    log::warn!(
        "Input channel closed - exiting monitor task ({} samples, {} alerts, {} confirmed, {} cancelled)",
        stats.samples,
        stats.alerts,
        stats.finalized,
        stats.cancelled
    );
}
