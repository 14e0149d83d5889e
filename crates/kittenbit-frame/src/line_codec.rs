//! `tokio_util::codec` adapter for async transports.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use crate::codec::{decode_line, Frame, DEFAULT_MAX_LINE};
use crate::error::FrameError;

/// Line codec with the same trimming, empty-line and overflow rules as
/// [`LineDecoder`](crate::LineDecoder).
///
/// Encoding writes bytes verbatim; responses carry their own terminators.
#[derive(Debug, Clone)]
pub struct LineCodec {
    max_line_length: usize,
    discarding: bool,
}

impl LineCodec {
    pub fn new(max_line_length: usize) -> Self {
        Self {
            max_line_length,
            discarding: false,
        }
    }
}

impl Default for LineCodec {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LINE)
    }
}

impl Decoder for LineCodec {
    type Item = Frame;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Frame>, FrameError> {
        Ok(decode_line(src, self.max_line_length, &mut self.discarding))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Frame>, FrameError> {
        let frame = self.decode(src)?;
        if frame.is_none() {
            // Unterminated tail never dispatches.
            src.clear();
        }
        Ok(frame)
    }
}

impl Encoder<&[u8]> for LineCodec {
    type Error = FrameError;

    fn encode(&mut self, item: &[u8], dst: &mut BytesMut) -> Result<(), FrameError> {
        dst.extend_from_slice(item);
        Ok(())
    }
}
