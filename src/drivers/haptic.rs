// SeizeAlert - Haptic Motor Driver
//
// GPIO-driven vibration motor: acknowledges button presses and pulses once
// per countdown step while an alert is pending.

use std::thread;
use std::time::Duration;

use esp_idf_hal::gpio::{AnyOutputPin, Output, PinDriver};

use seizealert::config::HAPTIC_PULSE_MS;

pub struct HapticDriver<'d> {
    pin: PinDriver<'d, AnyOutputPin, Output>,
}

impl<'d> HapticDriver<'d> {
    pub fn new(pin: PinDriver<'d, AnyOutputPin, Output>) -> Self {
        Self { pin }
    }

    /// Short pulse for tactile feedback.
    pub fn trigger(&mut self) {
        self.buzz(Duration::from_millis(HAPTIC_PULSE_MS));
    }

    /// Vibrate for a custom duration (blocks the calling thread).
    pub fn buzz(&mut self, duration: Duration) {
        let _ = self.pin.set_high();
        thread::sleep(duration);
        let _ = self.pin.set_low();
    }
}
