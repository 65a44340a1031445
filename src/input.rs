// SeizeAlert - Button Input
//
// Debounced cancel button with click and long-press detection.  Polled at
// ~100 Hz from the UI task with the raw pin level; kept free of GPIO types
// so the timing logic runs anywhere.

use std::time::{Duration, Instant};

use crate::config::{DEBOUNCE_MS, LONG_PRESS_MS};
use crate::events::Input;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonEvent {
    Click,
    LongPress,
}

impl ButtonEvent {
    /// Monitor input for this gesture: a click cancels a pending alert, a
    /// long press resets the monitor.
    pub fn to_input(self) -> Input {
        match self {
            Self::Click => Input::Cancel,
            Self::LongPress => Input::Reset,
        }
    }
}

pub struct ButtonInput {
    debounce: Duration,
    long_press: Duration,

    // Debounce state
    last_raw: bool,
    last_change: Instant,

    // Press tracking
    button_down: bool,
    press_start: Option<Instant>,
    long_press_sent: bool,
}

impl ButtonInput {
    pub fn new(now: Instant) -> Self {
        Self::with_timing(
            Duration::from_millis(DEBOUNCE_MS),
            Duration::from_millis(LONG_PRESS_MS),
            now,
        )
    }

    pub fn with_timing(debounce: Duration, long_press: Duration, now: Instant) -> Self {
        Self {
            debounce,
            long_press,
            last_raw: false,
            last_change: now,
            button_down: false,
            press_start: None,
            long_press_sent: false,
        }
    }

    /// Feed the raw level (`pressed == true` while held).
    ///
    /// A long press fires while the button is still held, so the user gets
    /// feedback without letting go; the release that follows is swallowed.
    pub fn update(&mut self, pressed: bool, now: Instant) -> Option<ButtonEvent> {
        // ---- debounce filter ----
        if pressed != self.last_raw {
            self.last_raw = pressed;
            self.last_change = now;
        }
        if now.duration_since(self.last_change) < self.debounce {
            return None;
        }

        // ---- pressed edge ----
        if pressed && !self.button_down {
            self.button_down = true;
            self.press_start = Some(now);
            self.long_press_sent = false;
            return None;
        }

        // ---- held ----
        if pressed && !self.long_press_sent {
            let held = self.press_start.map(|t| now.duration_since(t)).unwrap_or_default();
            if held >= self.long_press {
                self.long_press_sent = true;
                return Some(ButtonEvent::LongPress);
            }
            return None;
        }

        // ---- released edge ----
        if !pressed && self.button_down {
            self.button_down = false;
            self.press_start = None;
            if !std::mem::take(&mut self.long_press_sent) {
                return Some(ButtonEvent::Click);
            }
        }

        None
    }
}
