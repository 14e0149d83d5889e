use std::io::{ErrorKind, Read};

use kittenbit_transport::SerialStream;

use crate::codec::{Frame, FrameConfig, LineDecoder};
use crate::error::{FrameError, Result};

const READ_CHUNK_SIZE: usize = 256;

/// Reads complete request lines from any `Read` stream.
///
/// Handles partial reads internally; callers always get complete frames.
pub struct LineReader<T> {
    inner: T,
    decoder: LineDecoder,
    config: FrameConfig,
}

impl<T: Read> LineReader<T> {
    /// Create a new line reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new line reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            decoder: LineDecoder::new(config.max_line_length),
            config,
        }
    }

    /// Read the next complete line (blocking).
    ///
    /// Returns `Err(FrameError::ConnectionClosed)` when EOF is reached.
    pub fn read_frame(&mut self) -> Result<Frame> {
        loop {
            if let Some(frame) = self.decoder.next_frame() {
                return Ok(frame);
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            };

            if read == 0 {
                return Err(FrameError::ConnectionClosed);
            }

            self.decoder.feed(&chunk[..read]);
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

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl<T: Read> Iterator for LineReader<T> {
    type Item = Result<Frame>;

    /// Yields frames until the stream closes; EOF ends iteration.
    fn next(&mut self) -> Option<Self::Item> {
        match self.read_frame() {
            Ok(frame) => Some(Ok(frame)),
            Err(FrameError::ConnectionClosed) => None,
            Err(err) => Some(Err(err)),
        }
    }
}

impl LineReader<SerialStream> {
    /// Create a line reader for a `SerialStream` and apply the read timeout from config.
    pub fn with_config_serial(inner: SerialStream, config: FrameConfig) -> Result<Self> {
        inner
            .set_read_timeout(config.read_timeout)
            .map_err(transport_to_frame_error)?;
        Ok(Self::with_config(inner, config))
    }
}

pub(crate) fn transport_to_frame_error(err: kittenbit_transport::TransportError) -> FrameError {
    match err {
        kittenbit_transport::TransportError::Io(io)
        | kittenbit_transport::TransportError::Accept(io) => FrameError::Io(io),
        kittenbit_transport::TransportError::Bind { source, .. }
        | kittenbit_transport::TransportError::Connect { source, .. } => FrameError::Io(source),
        other => FrameError::Io(std::io::Error::other(other.to_string())),
    }
}
