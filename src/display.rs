// SeizeAlert - Presentation
//
// `Presenter` maps monitor events onto a `DisplaySink`.  On the device the
// sink is the UI channel; the UI task renders into a `FrameBuffer` through
// `Screen` and flushes it to the SSD1306.

use std::convert::Infallible;
use std::sync::mpsc::Sender;

use embedded_graphics::mono_font::ascii::{FONT_10X20, FONT_6X10};
use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::text::{Alignment, Baseline, Text, TextStyleBuilder};

use crate::config::{DISPLAY_BUFFER_SIZE, SCREEN_HEIGHT, SCREEN_WIDTH};
use crate::events::{MonitorEvent, UiEvent};
use crate::monitor::Observer;

/// Output side of the UI.  Purely informational.
pub trait DisplaySink {
    fn show_status(&mut self, text: &str);
    fn show_countdown(&mut self, remaining: u32);
}

impl DisplaySink for Sender<UiEvent> {
    fn show_status(&mut self, text: &str) {
        let _ = self.send(UiEvent::ShowStatus(text.to_owned()));
    }

    fn show_countdown(&mut self, remaining: u32) {
        let _ = self.send(UiEvent::ShowCountdown(remaining));
    }
}

pub struct Presenter<D> {
    sink: D,
}

impl<D: DisplaySink> Presenter<D> {
    pub fn new(sink: D) -> Self {
        Self { sink }
    }

    pub fn sink(&self) -> &D {
        &self.sink
    }
}

impl<D: DisplaySink> Observer for Presenter<D> {
    fn notify(&mut self, event: &MonitorEvent) {
        match *event {
            MonitorEvent::StatusChanged(status) => self.sink.show_status(status.text()),
            MonitorEvent::CountdownStarted { remaining, .. } | MonitorEvent::CountdownTick { remaining } => {
                self.sink.show_countdown(remaining)
            }
            MonitorEvent::EventFinalized(_) | MonitorEvent::Cancelled(_) => {}
        }
    }
}

// ---------------------------------------------------------------------------
// Frame buffer (SSD1306 page layout: 8 vertical pixels per byte)
// ---------------------------------------------------------------------------

pub struct FrameBuffer {
    buf: [u8; DISPLAY_BUFFER_SIZE],
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self { buf: [0; DISPLAY_BUFFER_SIZE] }
    }

    pub fn as_bytes(&self) -> &[u8; DISPLAY_BUFFER_SIZE] {
        &self.buf
    }

    pub fn clear_all(&mut self) {
        self.buf.fill(0);
    }

    pub fn pixel(&self, x: u32, y: u32) -> bool {
        if x >= SCREEN_WIDTH || y >= SCREEN_HEIGHT {
            return false;
        }
        let (idx, bit) = Self::locate(x, y);
        self.buf[idx] & bit != 0
    }

    pub fn lit_pixels(&self) -> u32 {
        self.buf.iter().map(|b| b.count_ones()).sum()
    }

    fn locate(x: u32, y: u32) -> (usize, u8) {
        let idx = x as usize + (y as usize / 8) * SCREEN_WIDTH as usize;
        (idx, 1 << (y % 8))
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl OriginDimensions for FrameBuffer {
    fn size(&self) -> Size {
        Size::new(SCREEN_WIDTH, SCREEN_HEIGHT)
    }
}

impl DrawTarget for FrameBuffer {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if point.x < 0 || point.y < 0 {
                continue;
            }
            let (x, y) = (point.x as u32, point.y as u32);
            if x >= SCREEN_WIDTH || y >= SCREEN_HEIGHT {
                continue;
            }
            let (idx, bit) = Self::locate(x, y);
            if color.is_on() {
                self.buf[idx] |= bit;
            } else {
                self.buf[idx] &= !bit;
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Screen: renders status and countdown layouts into the frame buffer
// ---------------------------------------------------------------------------

pub struct Screen {
    frame: FrameBuffer,
    dirty: bool,
}

impl Screen {
    pub fn new() -> Self {
        Self { frame: FrameBuffer::new(), dirty: true }
    }

    pub fn frame(&self) -> &FrameBuffer {
        &self.frame
    }

    /// Returns the frame if it changed since the last call.
    pub fn take_dirty(&mut self) -> Option<&FrameBuffer> {
        if std::mem::take(&mut self.dirty) {
            Some(&self.frame)
        } else {
            None
        }
    }

    fn draw_centered(&mut self, text: &str, y: i32, large: bool) {
        let font = if large { &FONT_10X20 } else { &FONT_6X10 };
        let style = MonoTextStyle::new(font, BinaryColor::On);
        let layout = TextStyleBuilder::new()
            .alignment(Alignment::Center)
            .baseline(Baseline::Top)
            .build();
        let origin = Point::new(SCREEN_WIDTH as i32 / 2, y);
        let _ = Text::with_text_style(text, origin, style, layout).draw(&mut self.frame);
    }
}

impl Default for Screen {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplaySink for Screen {
    fn show_status(&mut self, text: &str) {
        self.frame.clear_all();
        self.draw_centered("SeizeAlert", 0, false);
        self.draw_centered(text, 22, false);
        self.dirty = true;
    }

    fn show_countdown(&mut self, remaining: u32) {
        self.frame.clear_all();
        self.draw_centered("ALERT - press", 0, false);
        self.draw_centered("to cancel", 10, false);
        self.draw_centered(&remaining.to_string(), 30, true);
        self.dirty = true;
    }
}
