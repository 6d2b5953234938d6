//! Frame synchronization for the raw TAXI byte stream.
//!
//! The stream carries no length fields or checksums; the only framing is the
//! run of `0x7FFF` padding words the sensor emits between images. This module
//! locates that run, derives the byte offset where the next frame begins, and
//! extracts fixed-size frames from an accumulating buffer.
//!
//! The whole pipeline is lossy by contract: a marker that never shows up, a
//! candidate alignment whose sentinel check fails, or a degenerate buffer all
//! result in silently skipped data. Nothing in here returns an error to the
//! caller; the stream either synchronizes eventually or never renders.

use log::{debug, trace};

use crate::decode::Decode;
use crate::frame::{Frame, FRAME_BYTES, SYNC_MARKER};

/// Bytes that must be buffered before a scan is attempted.
///
/// Two frames' worth of margin avoids false negatives when the marker sits
/// near the edge of the buffered window. Tuned against the sensor's timing;
/// keep literal.
pub const SCAN_THRESHOLD: usize = FRAME_BYTES * 2;

/// Result of scanning a buffer for the start of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scan {
    /// A frame begins at this byte offset.
    Start(usize),
    /// The marker was seen, but its run of marker bytes reaches the end of
    /// the buffer, so the frame-start offset cannot be derived yet.
    TailCandidate,
    /// No marker in the buffer.
    Absent,
}

impl Scan {
    /// The located offset, if any.
    pub fn offset(&self) -> Option<usize> {
        match self {
            Scan::Start(offset) => Some(*offset),
            Scan::TailCandidate | Scan::Absent => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    /// Looking for the first occurrence of the sync marker.
    Searching,
    /// Marker seen; looking for the first byte that diverges from the
    /// marker's `FF`/`7F` alphabet.
    Candidate,
}

/// Scans `buf` for the first frame boundary.
///
/// The sync marker needs eight bytes of lookahead, so the marker search stops
/// seven bytes short of the end. Once the marker has been seen the scan keeps
/// going byte-by-byte to the end of the buffer; the frame starts two bytes
/// before the first byte that is neither `0xFF` nor `0x7F` (the last padding
/// word belongs to the frame).
///
/// Degenerate input (empty, shorter than the marker) is simply [`Scan::Absent`].
pub fn locate_frame_start(buf: &[u8]) -> Scan {
    let mut state = ScanState::Searching;

    for i in 0..buf.len() {
        if state == ScanState::Searching {
            if buf.len() - i < SYNC_MARKER.len() {
                return Scan::Absent;
            }
            if buf[i..i + SYNC_MARKER.len()] == SYNC_MARKER {
                state = ScanState::Candidate;
            }
        }

        if state == ScanState::Candidate && buf[i] != 0xFF && buf[i] != 0x7F {
            // The divergent byte is always preceded by the marker's run, so
            // this cannot underflow.
            return Scan::Start(i - 2);
        }
    }

    match state {
        ScanState::Searching => Scan::Absent,
        ScanState::Candidate => Scan::TailCandidate,
    }
}

/// State of a [`FrameSynchronizer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// Not aligned; waiting for enough bytes to scan for the marker.
    Searching,
    /// A frame boundary was located; waiting for a full frame to check the
    /// alignment sentinel against.
    Validating,
    /// The last extracted frame passed the sentinel check; the next frame is
    /// assumed to follow back-to-back.
    Synced,
}

/// Consumes an accumulating byte stream and yields aligned frames.
///
/// Feed bytes in with [`extend`](Self::extend) and drain frames with
/// [`poll`](Self::poll). The synchronizer owns its buffer exclusively; there
/// is one reader and one writer by construction.
#[derive(Debug, Default)]
pub struct FrameSynchronizer {
    buffer: Vec<u8>,
    state: SyncState,
}

impl Default for SyncState {
    fn default() -> Self {
        SyncState::Searching
    }
}

impl FrameSynchronizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends newly received bytes to the buffer.
    pub fn extend(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
        trace!("buffered {} bytes, {} total", bytes.len(), self.buffer.len());
    }

    /// Bytes currently buffered.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    /// Extracts the next aligned frame, if the buffer holds one.
    ///
    /// Call repeatedly after each [`extend`](Self::extend) until it returns
    /// `None`. Misaligned data is consumed and dropped along the way:
    /// a buffer with no marker is discarded wholesale (the marker may have
    /// straddled the discarded window, so nothing is carried over), and an
    /// extracted frame that fails the sentinel check is dropped without
    /// flushing the bytes that follow it.
    pub fn poll(&mut self) -> Option<Frame> {
        loop {
            match self.state {
                SyncState::Searching => {
                    if self.buffer.len() < SCAN_THRESHOLD {
                        return None;
                    }
                    match locate_frame_start(&self.buffer) {
                        Scan::Start(offset) => {
                            debug!("frame boundary at offset {offset}");
                            self.buffer.drain(..offset);
                            self.state = SyncState::Validating;
                        }
                        scan @ (Scan::TailCandidate | Scan::Absent) => {
                            debug!("no frame boundary ({scan:?}), discarding {} bytes", self.buffer.len());
                            self.buffer.clear();
                            return None;
                        }
                    }
                }
                SyncState::Validating | SyncState::Synced => {
                    if self.buffer.len() < FRAME_BYTES {
                        return None;
                    }
                    let mut data = self.buffer.as_slice();
                    // The length was just checked, so decoding cannot fail.
                    let frame = Frame::decode(&mut data).unwrap();
                    self.buffer.drain(..FRAME_BYTES);

                    if frame.is_aligned() {
                        self.state = SyncState::Synced;
                        return Some(frame);
                    }
                    debug!("sentinel mismatch, dropping frame");
                    self.state = SyncState::Searching;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{
        tests::frame_bytes, ALIGNMENT_SENTINEL, FRAME_BYTES, FRAME_WIDTH, SENTINEL_POSITION,
    };

    #[test]
    fn marker_absent() {
        assert_eq!(Scan::Absent, locate_frame_start(&[0xAB; 4096]));
    }

    #[test]
    fn degenerate_buffers() {
        assert_eq!(Scan::Absent, locate_frame_start(&[]));
        assert_eq!(Scan::Absent, locate_frame_start(&SYNC_MARKER[..7]));
    }

    #[test]
    fn marker_then_divergent_byte() {
        let mut buf = SYNC_MARKER.to_vec();
        buf.push(0x00);
        assert_eq!(Scan::Start(6), locate_frame_start(&buf));
    }

    #[test]
    fn marker_with_trailing_padding() {
        // Marker at index 5, three more padding bytes, divergence at 5 + 8 + 3.
        let mut buf = vec![0xAB; 5];
        buf.extend_from_slice(&SYNC_MARKER);
        buf.extend_from_slice(&[0x7F, 0xFF, 0x7F]);
        buf.push(0x01);
        assert_eq!(Scan::Start(5 + 8 + 3 - 2), locate_frame_start(&buf));
    }

    #[test]
    fn marker_at_buffer_tail() {
        let mut buf = vec![0xAB; 16];
        buf.extend_from_slice(&SYNC_MARKER);
        assert_eq!(Scan::TailCandidate, locate_frame_start(&buf));
        assert_eq!(None, locate_frame_start(&buf).offset());
    }

    /// Wire bytes of one aligned frame: the first sample is the padding word
    /// (a frame starts two bytes before the divergence), the rest of the body
    /// is a recognizable fill, and the sentinel sits at its fixed position.
    fn synthetic_frame(fill: u16) -> Vec<u8> {
        let mut bytes = frame_bytes(fill, ALIGNMENT_SENTINEL);
        bytes[..2].copy_from_slice(&0x7FFFu16.to_le_bytes());
        bytes
    }

    fn stream_of(frames: &[Vec<u8>]) -> Vec<u8> {
        let mut stream = SYNC_MARKER.to_vec();
        for frame in frames {
            stream.extend_from_slice(frame);
        }
        stream
    }

    #[test]
    fn single_frame_decodes() {
        let mut sync = FrameSynchronizer::new();
        // Pad past the scan threshold with a second frame's worth of bytes.
        sync.extend(&stream_of(&[synthetic_frame(0x0101), synthetic_frame(0x0202)]));

        let frame = sync.poll().expect("first frame");
        assert_eq!(0x0101, frame.sample(0, 1));
        assert!(frame.is_aligned());
        assert_eq!(SyncState::Synced, sync.state());
    }

    #[test]
    fn scan_gated_by_threshold() {
        let mut sync = FrameSynchronizer::new();
        sync.extend(&stream_of(&[synthetic_frame(0x0101)]));

        // One frame plus the marker is below the scan threshold; nothing
        // happens and nothing is discarded.
        assert_eq!(None, sync.poll());
        assert_eq!(8 + FRAME_BYTES, sync.buffered());
        assert_eq!(SyncState::Searching, sync.state());

        // Crossing the threshold triggers the scan and frees the frame.
        sync.extend(&vec![0xAB; FRAME_BYTES]);
        assert!(sync.poll().is_some());
    }

    #[test]
    fn noise_discards_whole_buffer() {
        let mut sync = FrameSynchronizer::new();
        for _ in 0..3 {
            sync.extend(&vec![0xAB; SCAN_THRESHOLD]);
            assert_eq!(None, sync.poll());
            // The buffer never grows across cycles of unsynchronizable input.
            assert_eq!(0, sync.buffered());
        }
    }

    #[test]
    fn sentinel_mismatch_drops_frame_but_keeps_remainder() {
        let mut bad = frame_bytes(0x0101, 0x0101);
        bad[..2].copy_from_slice(&0x7FFFu16.to_le_bytes());
        let mut sync = FrameSynchronizer::new();
        sync.extend(&stream_of(&[bad, synthetic_frame(0x0202)]));

        assert_eq!(None, sync.poll());
        assert_eq!(SyncState::Searching, sync.state());
        // The second frame's bytes are still buffered, not flushed.
        assert_eq!(FRAME_BYTES, sync.buffered());
    }

    #[test]
    fn back_to_back_frames_decode_in_order() {
        let mut sync = FrameSynchronizer::new();
        sync.extend(&stream_of(&[
            synthetic_frame(0x0101),
            synthetic_frame(0x0202),
            synthetic_frame(0x0303),
        ]));

        let mut fills = Vec::new();
        while let Some(frame) = sync.poll() {
            fills.push(frame.sample(0, 1));
        }
        assert_eq!(vec![0x0101, 0x0202, 0x0303], fills);
        assert_eq!(0, sync.buffered());
    }

    #[test]
    fn resynchronizes_after_garbage() {
        let mut sync = FrameSynchronizer::new();
        sync.extend(&vec![0xAB; SCAN_THRESHOLD]);
        assert_eq!(None, sync.poll());

        sync.extend(&stream_of(&[synthetic_frame(0x0404), synthetic_frame(0x0505)]));
        let frame = sync.poll().expect("frame after resync");
        assert_eq!(0x0404, frame.sample(0, 1));
    }

    #[test]
    fn sentinel_position_is_fixed() {
        // The sentinel lives in the last column, five rows from the bottom.
        assert_eq!((240, 326), SENTINEL_POSITION);
        assert_eq!(FRAME_WIDTH - 1, SENTINEL_POSITION.1);
    }
}
