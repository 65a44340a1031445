// SeizeAlert - UI Task
//
// Owns the OLED, the haptic motor and the cancel button.  Polls the button at
// ~100 Hz, forwards gestures to the monitor and renders whatever the monitor
// asks to show.

use std::sync::mpsc::{Receiver, Sender};
use std::thread;
use std::time::{Duration, Instant};

use esp_idf_hal::gpio::{AnyInputPin, AnyOutputPin, Input as GpioInput, Output, PinDriver};

use seizealert::config::*;
use seizealert::display::{DisplaySink, Screen};
use seizealert::input::ButtonInput;
use seizealert::{Input, Status};
use seizealert::events::UiEvent;

use crate::drivers::haptic::HapticDriver;
use crate::drivers::imu::SharedBus;
use crate::drivers::oled::OledDisplay;

pub fn ui_task(
    bus: SharedBus,
    button_pin: PinDriver<'static, AnyInputPin, GpioInput>,
    haptic_pin: PinDriver<'static, AnyOutputPin, Output>,
    ui_rx: Receiver<UiEvent>,
    input_tx: Sender<Input>,
) {
    log::info!("UI task started");

    let mut display = OledDisplay::new(bus);
    let mut haptic = HapticDriver::new(haptic_pin);
    let mut button = ButtonInput::new(Instant::now());
    let mut screen = Screen::new();

    screen.show_status(Status::Monitoring.text());

    let poll_interval = Duration::from_millis(UI_POLL_INTERVAL_MS);

    loop {
        // 1. Poll the button (active LOW with pull-up).
        if let Some(gesture) = button.update(button_pin.is_low(), Instant::now()) {
            haptic.trigger();
            log::info!("Button: {:?}", gesture);
            if input_tx.send(gesture.to_input()).is_err() {
                log::warn!("Input channel closed - exiting UI task");
                return;
            }
        }

        // 2. Drain all pending UI events (non-blocking).
        while let Ok(event) = ui_rx.try_recv() {
            match event {
                UiEvent::ShowStatus(text) => screen.show_status(&text),
                UiEvent::ShowCountdown(remaining) => {
                    screen.show_countdown(remaining);
                    haptic.trigger();
                }
            }
        }

        // 3. Push the frame if anything changed.
        if let Some(frame) = screen.take_dirty() {
            if let Err(e) = display.flush(frame) {
                log::error!("Display error: {}", e);
            }
        }

        thread::sleep(poll_interval);
    }
}
