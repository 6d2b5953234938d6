//! Turns raw 16-bit frames into 8-bit images.
//!
//! The sensor's dynamic range sits well above 8 bits, so a linear level/gain
//! transform is applied before quantization: `(sample - level) * gain / 256`,
//! clamped to `0..=255`. The defaults were tuned by eye against the sensor;
//! both knobs are adjustable in fixed steps while viewing.

use image::{GrayImage, Rgb, RgbImage};

use crate::frame::{Frame, FRAME_HEIGHT, FRAME_WIDTH};

pub const DEFAULT_LEVEL: i32 = 20000;
pub const DEFAULT_GAIN: f32 = 10.0;

/// Step applied by the level adjustment methods.
pub const LEVEL_STEP: i32 = 100;
/// Step applied by the gain adjustment methods.
pub const GAIN_STEP: f32 = 0.1;

/// Level/gain settings for rendering a capture session.
///
/// Held by whoever drives the render loop and adjusted between frames; the
/// decoder itself never looks at these.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Levels {
    level: i32,
    gain: f32,
}

impl Default for Levels {
    fn default() -> Self {
        Self {
            level: DEFAULT_LEVEL,
            gain: DEFAULT_GAIN,
        }
    }
}

impl Levels {
    pub fn new(level: i32, gain: f32) -> Self {
        Self { level, gain }
    }

    pub fn level(&self) -> i32 {
        self.level
    }

    pub fn gain(&self) -> f32 {
        self.gain
    }

    pub fn raise_level(&mut self) {
        self.level += LEVEL_STEP;
    }

    pub fn lower_level(&mut self) {
        self.level -= LEVEL_STEP;
    }

    pub fn raise_gain(&mut self) {
        self.gain += GAIN_STEP;
    }

    pub fn lower_gain(&mut self) {
        self.gain -= GAIN_STEP;
    }

    /// Maps one raw sample to an 8-bit value.
    pub fn quantize(&self, sample: u16) -> u8 {
        let scaled = (sample as f32 - self.level as f32) * self.gain / 256.0;
        scaled.clamp(0.0, 255.0) as u8
    }

    /// Renders a frame as an 8-bit grayscale image.
    pub fn grayscale(&self, frame: &Frame) -> GrayImage {
        let pixels = frame.samples().iter().map(|&s| self.quantize(s)).collect();
        // Frame dimensions are fixed, so the buffer always fits.
        GrayImage::from_vec(FRAME_WIDTH as u32, FRAME_HEIGHT as u32, pixels).unwrap()
    }

    /// Renders a frame through a rainbow false-color map, low values blue and
    /// high values red.
    pub fn colormap(&self, frame: &Frame) -> RgbImage {
        let pixels = frame
            .samples()
            .iter()
            .flat_map(|&s| rainbow(self.quantize(s)))
            .collect();
        RgbImage::from_vec(FRAME_WIDTH as u32, FRAME_HEIGHT as u32, pixels).unwrap()
    }
}

/// Piecewise-linear blue -> cyan -> green -> yellow -> red ramp.
fn rainbow(value: u8) -> [u8; 3] {
    let v = value as u32;
    match v {
        0..=63 => [0, (v * 4) as u8, 255],
        64..=127 => [0, 255, (255 - (v - 64) * 4) as u8],
        128..=191 => [((v - 128) * 4) as u8, 255, 0],
        _ => [255, (255 - (v - 192) * 4) as u8, 0],
    }
}

/// Convenience for dumping a color-mapped frame.
pub fn render_frame(frame: &Frame, levels: &Levels) -> RgbImage {
    levels.colormap(frame)
}
