//! Byte sources and sinks for a capture session.
//!
//! The decoder only ever sees a stream of chunks; where they come from is
//! behind [`ByteSource`]. The concrete implementations here read from regular
//! files and FIFOs, which covers replaying captures and piping live data in
//! from a device bridge.

use std::path::Path;

use log::trace;
use thiserror::Error;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// Chunk size for reads, matching the device's USB streaming buffer.
pub const CHUNK_SIZE: usize = 16384;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A blocking, chunk-at-a-time byte producer.
///
/// `Ok(Some(chunk))` may be empty — a zero-length read is valid and simply
/// contributes nothing. `Ok(None)` means the stream has ended.
#[allow(async_fn_in_trait)]
pub trait ByteSource {
    fn read_chunk(&mut self) -> impl std::future::Future<Output = Result<Option<Vec<u8>>, SourceError>>;
}

/// Reads a raw capture from a file or FIFO.
#[derive(Debug)]
pub struct FileSource {
    file: File,
}

impl FileSource {
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        Ok(Self {
            file: File::open(path).await?,
        })
    }
}

impl ByteSource for FileSource {
    async fn read_chunk(&mut self) -> Result<Option<Vec<u8>>, SourceError> {
        let mut buf = vec![0u8; CHUNK_SIZE];
        let n = self.file.read(&mut buf).await?;
        trace!("read {n} bytes");
        if n == 0 {
            return Ok(None);
        }
        buf.truncate(n);
        Ok(Some(buf))
    }
}

/// Writes captured bytes verbatim to a file.
#[derive(Debug)]
pub struct RawSink {
    file: File,
}

impl RawSink {
    pub async fn create(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        Ok(Self {
            file: File::create(path).await?,
        })
    }

    pub async fn write_chunk(&mut self, bytes: &[u8]) -> Result<(), SourceError> {
        self.file.write_all(bytes).await?;
        Ok(())
    }

    pub async fn flush(&mut self) -> Result<(), SourceError> {
        self.file.flush().await?;
        Ok(())
    }
}
