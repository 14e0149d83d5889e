use std::io::{Read, Write};

use bytes::BytesMut;
use kittenbit_frame::{Frame, FrameError, LineReader, LineWriter};
use tracing::{debug, info};

use crate::actuator::Actuators;
use crate::dispatcher::{Dispatcher, Outcome};
use crate::error::Result;
use crate::response::Response;

/// Per-connection options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Write the version response once before reading the first frame. Default: true.
    pub announce: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { announce: true }
    }
}

/// Counters reported when a session ends on EOF.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub frames: u64,
    pub responses: u64,
    pub dropped: u64,
}

/// Drives a [`Dispatcher`] over one byte stream until the peer closes it.
///
/// Frames are serviced strictly one at a time: a blocking command holds up
/// everything queued behind it.
pub struct Session<'a, R, W, A> {
    reader: LineReader<R>,
    writer: LineWriter<W>,
    dispatcher: &'a mut Dispatcher,
    actuators: &'a mut A,
    config: SessionConfig,
    summary: SessionSummary,
    encode_buf: BytesMut,
}

impl<'a, R, W, A> Session<'a, R, W, A>
where
    R: Read,
    W: Write,
    A: Actuators,
{
    pub fn new(
        reader: LineReader<R>,
        writer: LineWriter<W>,
        dispatcher: &'a mut Dispatcher,
        actuators: &'a mut A,
    ) -> Self {
        Self::with_config(
            reader,
            writer,
            dispatcher,
            actuators,
            SessionConfig::default(),
        )
    }

    pub fn with_config(
        reader: LineReader<R>,
        writer: LineWriter<W>,
        dispatcher: &'a mut Dispatcher,
        actuators: &'a mut A,
        config: SessionConfig,
    ) -> Self {
        Self {
            reader,
            writer,
            dispatcher,
            actuators,
            config,
            summary: SessionSummary::default(),
            encode_buf: BytesMut::with_capacity(64),
        }
    }

    /// Serve frames until EOF.
    ///
    /// Returns the summary when the peer closes the stream. A reset request
    /// flushes pending output and hands control to
    /// [`Actuators::reset_device`], which never returns.
    pub fn run(mut self) -> Result<SessionSummary> {
        if self.config.announce {
            self.announce()?;
        }

        loop {
            let frame = match self.reader.read_frame() {
                Ok(frame) => frame,
                Err(FrameError::ConnectionClosed) => {
                    info!(
                        frames = self.summary.frames,
                        responses = self.summary.responses,
                        dropped = self.summary.dropped,
                        "session closed"
                    );
                    return Ok(self.summary);
                }
                Err(err) => return Err(err.into()),
            };

            if self.handle_frame(&frame)? == Outcome::Reset {
                self.writer.flush()?;
                info!("device reset");
                self.actuators.reset_device();
            }
        }
    }

    /// Write the version response.
    pub fn announce(&mut self) -> Result<()> {
        let firmware = self.dispatcher.config().firmware.clone();
        debug!(%firmware, "announcing");
        self.write_response(&Response::Version { firmware })
    }

    /// Dispatch one frame and write its response, if any.
    ///
    /// Reset is returned to the caller without being acted on.
    pub fn handle_frame(&mut self, frame: &Frame) -> Result<Outcome> {
        self.summary.frames += 1;
        debug!(line = %frame.to_text(), "frame");

        let outcome = self.dispatcher.dispatch(frame, &mut *self.actuators);
        match &outcome {
            Outcome::Respond(response) => self.write_response(response)?,
            Outcome::Dropped(reason) => {
                debug!(?reason, "frame dropped");
                self.summary.dropped += 1;
            }
            Outcome::Silent | Outcome::Reset => {}
        }
        Ok(outcome)
    }

    fn write_response(&mut self, response: &Response) -> Result<()> {
        self.encode_buf.clear();
        response.encode(self.dispatcher.config().line_ending, &mut self.encode_buf);
        self.writer.send(&self.encode_buf)?;
        self.summary.responses += 1;
        Ok(())
    }

    pub fn summary(&self) -> SessionSummary {
        self.summary
    }

    pub fn writer(&self) -> &LineWriter<W> {
        &self.writer
    }
}
