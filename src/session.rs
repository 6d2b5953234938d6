//! The capture loop: pull chunks from a source, keep the raw copy if asked,
//! and hand every aligned frame to the caller.
//!
//! One task does everything in sequence, read then decode; the synchronizer's
//! buffer has exactly one reader and one writer. The loop runs until the
//! source ends. Interruption is cooperative: race [`CaptureSession::run`]
//! against a shutdown signal and drop the session to cancel it.

use log::{debug, info};
use thiserror::Error;

use crate::frame::Frame;
use crate::source::{ByteSource, RawSink, SourceError};
use crate::sync::FrameSynchronizer;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Source(#[from] SourceError),
}

/// Totals for a finished capture.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaptureStats {
    /// Raw bytes consumed from the source.
    pub bytes: u64,
    /// Aligned frames emitted.
    pub frames: u64,
}

/// Drives a [`ByteSource`] through a [`FrameSynchronizer`].
#[derive(Debug)]
pub struct CaptureSession<S: ByteSource> {
    source: S,
    synchronizer: FrameSynchronizer,
    sink: Option<RawSink>,
}

impl<S: ByteSource> CaptureSession<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            synchronizer: FrameSynchronizer::new(),
            sink: None,
        }
    }

    /// Also writes every raw chunk to `sink`, verbatim, before decoding.
    pub fn with_raw_sink(mut self, sink: RawSink) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Runs the loop until the source ends, calling `on_frame` for every
    /// aligned frame in stream order.
    pub async fn run(
        mut self,
        mut on_frame: impl FnMut(Frame),
    ) -> Result<CaptureStats, SessionError> {
        let mut stats = CaptureStats::default();

        while let Some(chunk) = self.source.read_chunk().await? {
            if chunk.is_empty() {
                continue;
            }
            stats.bytes += chunk.len() as u64;

            if let Some(sink) = &mut self.sink {
                sink.write_chunk(&chunk).await?;
            }

            self.synchronizer.extend(&chunk);
            while let Some(frame) = self.synchronizer.poll() {
                stats.frames += 1;
                debug!("frame {}", stats.frames);
                on_frame(frame);
            }
        }

        if let Some(sink) = &mut self.sink {
            sink.flush().await?;
        }

        info!(
            "capture finished: {} bytes, {} frames",
            stats.bytes, stats.frames
        );
        Ok(stats)
    }
}
