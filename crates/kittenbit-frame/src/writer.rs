use std::io::{ErrorKind, Write};

use kittenbit_transport::SerialStream;

use crate::codec::{FrameConfig, DELIMITER};
use crate::error::{FrameError, Result};
use crate::reader::transport_to_frame_error;

/// Writes encoded bytes to any `Write` stream, one flushed unit at a time.
///
/// The robot side writes responses exactly as encoded (the protocol decides its
/// own terminators); the host side uses [`send_line`](Self::send_line) to add the
/// request delimiter.
pub struct LineWriter<T> {
    inner: T,
    config: FrameConfig,
}

impl<T: Write> LineWriter<T> {
    /// Create a new writer with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new writer with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self { inner, config }
    }

    /// Write `bytes` verbatim and flush (blocking).
    pub fn send(&mut self, bytes: &[u8]) -> Result<()> {
        self.write_all(bytes)?;
        self.flush()
    }

    /// Write `line` followed by the `\n` delimiter and flush.
    pub fn send_line(&mut self, line: &[u8]) -> Result<()> {
        self.write_all(line)?;
        self.write_all(&[DELIMITER])?;
        self.flush()
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        let mut offset = 0usize;
        while offset < bytes.len() {
            match self.inner.write(&bytes[offset..]) {
                Ok(0) => return Err(FrameError::ConnectionClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
        Ok(())
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current writer configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl LineWriter<SerialStream> {
    /// Create a writer for a `SerialStream` and apply the write timeout from config.
    pub fn with_config_serial(inner: SerialStream, config: FrameConfig) -> Result<Self> {
        inner
            .set_write_timeout(config.write_timeout)
            .map_err(transport_to_frame_error)?;
        Ok(Self::with_config(inner, config))
    }
}
