//! The frame model for the TAXI video stream.
//!
//! A frame is a fixed 245x327 grid of 16-bit samples. The sensor pads each
//! frame with runs of `0x7FFF` words; four of those in a row form the
//! [`SYNC_MARKER`] that [`crate::sync`] uses to locate frame boundaries, and a
//! single `0x7FFF` word at a fixed pixel position acts as an alignment
//! sentinel for a decoded frame.

use crate::decode::{Decode, DecodeError};

/// Number of rows in a frame.
pub const FRAME_HEIGHT: usize = 245;

/// Number of columns in a frame.
pub const FRAME_WIDTH: usize = 327;

/// Samples per frame.
pub const FRAME_PIXELS: usize = FRAME_HEIGHT * FRAME_WIDTH;

/// Bytes per frame on the wire (two bytes per sample).
pub const FRAME_BYTES: usize = FRAME_PIXELS * 2;

/// Byte sequence marking the start of a frame header.
pub const SYNC_MARKER: [u8; 8] = [0xFF, 0x7F, 0xFF, 0x7F, 0xFF, 0x7F, 0xFF, 0x7F];

/// Sample value expected at [`SENTINEL_POSITION`] of every correctly aligned frame.
pub const ALIGNMENT_SENTINEL: u16 = 0x7FFF;

/// (row, column) of the alignment sentinel.
pub const SENTINEL_POSITION: (usize, usize) = (FRAME_HEIGHT - 5, FRAME_WIDTH - 1);

/// One captured image: a row-major [`FRAME_HEIGHT`] x [`FRAME_WIDTH`] grid of
/// 16-bit samples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    samples: Box<[u16]>,
}

impl Frame {
    /// Returns the sample at the given row and column.
    ///
    /// # Panics
    ///
    /// Panics if the position is outside the frame.
    pub fn sample(&self, row: usize, col: usize) -> u16 {
        assert!(row < FRAME_HEIGHT && col < FRAME_WIDTH, "position out of frame");
        self.samples[row * FRAME_WIDTH + col]
    }

    /// All samples in row-major order.
    pub fn samples(&self) -> &[u16] {
        &self.samples
    }

    /// Whether the alignment sentinel is where the sensor puts it.
    ///
    /// A frame that decodes but fails this check was extracted at a byte
    /// offset that merely looked like a frame boundary and must be dropped.
    pub fn is_aligned(&self) -> bool {
        let (row, col) = SENTINEL_POSITION;
        self.sample(row, col) == ALIGNMENT_SENTINEL
    }
}

impl Decode for Frame {
    fn decode(data: &mut &[u8]) -> Result<Self, DecodeError> {
        let bytes = data.get(..FRAME_BYTES).ok_or(DecodeError::UnexpectedEnd)?;
        *data = &data[FRAME_BYTES..];

        let samples = bytes
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();

        Ok(Self { samples })
    }
}
