use std::borrow::Cow;

use bytes::{Bytes, BytesMut};
use tracing::{trace, warn};

/// Line delimiter.
pub const DELIMITER: u8 = b'\n';

/// Default bound on a single buffered line: 1 KiB.
///
/// The longest valid request (`M205` with four signed speeds) is under 40 bytes.
pub const DEFAULT_MAX_LINE: usize = 1024;

/// One complete request line, delimiter and trailing control characters removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Raw line bytes.
    pub line: Bytes,
}

impl Frame {
    /// Create a frame from already-delimited line bytes.
    pub fn new(line: impl Into<Bytes>) -> Self {
        Self { line: line.into() }
    }

    /// Raw bytes of the line.
    pub fn as_bytes(&self) -> &[u8] {
        self.line.as_ref()
    }

    /// Leading byte, which selects the command class.
    pub fn class(&self) -> Option<u8> {
        self.line.first().copied()
    }

    /// Everything after the class byte.
    pub fn body(&self) -> &[u8] {
        self.line.get(1..).unwrap_or_default()
    }

    /// The line as text, with invalid UTF-8 replaced.
    pub fn to_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.as_bytes())
    }

    pub fn len(&self) -> usize {
        self.line.len()
    }

    pub fn is_empty(&self) -> bool {
        self.line.is_empty()
    }
}

/// Configuration for line reading and writing.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Longest line kept in the buffer, in bytes. Default: 1 KiB.
    pub max_line_length: usize,
    /// Read timeout for blocking operations.
    pub read_timeout: Option<std::time::Duration>,
    /// Write timeout for blocking operations.
    pub write_timeout: Option<std::time::Duration>,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_line_length: DEFAULT_MAX_LINE,
            read_timeout: None,
            write_timeout: None,
        }
    }
}

/// Incremental splitter from arriving bytes to [`Frame`]s.
///
/// Bytes are appended with [`feed`](Self::feed) as they arrive; complete lines are
/// drained with [`next_frame`](Self::next_frame). A line split across arrivals and
/// several lines in one arrival both come out in order.
#[derive(Debug)]
pub struct LineDecoder {
    buf: BytesMut,
    max_line_length: usize,
    discarding: bool,
}

impl LineDecoder {
    pub fn new(max_line_length: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(max_line_length.min(DEFAULT_MAX_LINE)),
            max_line_length,
            discarding: false,
        }
    }

    /// Append newly arrived bytes.
    pub fn feed(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Take the next complete, non-empty line if one is buffered.
    pub fn next_frame(&mut self) -> Option<Frame> {
        decode_line(&mut self.buf, self.max_line_length, &mut self.discarding)
    }

    /// Feed one arrival and collect every line it completes.
    pub fn decode(&mut self, bytes: &[u8]) -> Vec<Frame> {
        self.feed(bytes);
        std::iter::from_fn(|| self.next_frame()).collect()
    }

    /// Bytes waiting for a delimiter.
    pub fn buffered_len(&self) -> usize {
        self.buf.len()
    }

    /// True while the remainder of an oversized line is being skipped.
    pub fn is_discarding(&self) -> bool {
        self.discarding
    }

    pub fn set_max_line_length(&mut self, max_line_length: usize) {
        self.max_line_length = max_line_length;
    }
}

impl Default for LineDecoder {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LINE)
    }
}

/// Split one line off the front of `src`.
///
/// Returns `None` when no complete line is buffered. Empty lines and oversized lines
/// are consumed and skipped. The bound applies to the trimmed line, so a trailing
/// `\r` never counts against it. When `src` grows past `max_line + 1` bytes without a
/// delimiter the buffered bytes are dropped and `discarding` stays set until the
/// next delimiter.
pub(crate) fn decode_line(
    src: &mut BytesMut,
    max_line: usize,
    discarding: &mut bool,
) -> Option<Frame> {
    loop {
        let Some(pos) = src.iter().position(|b| *b == DELIMITER) else {
            if *discarding {
                src.clear();
            } else if src.len() > max_line.saturating_add(1) {
                warn!(
                    buffered = src.len(),
                    max = max_line,
                    "line too long; discarding"
                );
                src.clear();
                *discarding = true;
            }
            return None;
        };

        let mut line = src.split_to(pos + 1).freeze();
        if std::mem::take(discarding) {
            trace!("skipped remainder of oversized line");
            continue;
        }

        let end = line[..pos]
            .iter()
            .rposition(|b| *b >= 0x20)
            .map_or(0, |last| last + 1);
        if end > max_line {
            warn!(len = end, max = max_line, "line too long; discarding");
            continue;
        }
        line.truncate(end);

        if line.is_empty() {
            trace!("dropping empty line");
            continue;
        }
        return Some(Frame { line });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(frames: &[Frame]) -> Vec<&[u8]> {
        frames.iter().map(Frame::as_bytes).collect()
    }

    #[test]
    fn burst_yields_frames_in_order() {
        let mut decoder = LineDecoder::default();
        let frames = decoder.decode(b"M0\nM203\n");
        assert_eq!(lines(&frames), vec![b"M0".as_ref(), b"M203".as_ref()]);
        assert_eq!(decoder.buffered_len(), 0);
    }

    #[test]
    fn byte_at_a_time_yields_same_frames() {
        let mut decoder = LineDecoder::default();
        let mut frames = Vec::new();
        for byte in b"M0\nM203\n" {
            frames.extend(decoder.decode(std::slice::from_ref(byte)));
        }
        assert_eq!(lines(&frames), vec![b"M0".as_ref(), b"M203".as_ref()]);
    }

    #[test]
    fn split_line_waits_for_delimiter() {
        let mut decoder = LineDecoder::default();
        assert!(decoder.decode(b"M204 50").is_empty());
        assert_eq!(decoder.buffered_len(), 7);
        let frames = decoder.decode(b" -50 100\n");
        assert_eq!(lines(&frames), vec![b"M204 50 -50 100".as_ref()]);
    }

    #[test]
    fn trailing_carriage_return_trimmed() {
        let mut decoder = LineDecoder::default();
        let frames = decoder.decode(b"M0\r\n");
        assert_eq!(lines(&frames), vec![b"M0".as_ref()]);
    }

    #[test]
    fn control_only_lines_dropped() {
        let mut decoder = LineDecoder::default();
        let frames = decoder.decode(b"\n\r\n\x00\x01\r\nM0\n");
        assert_eq!(lines(&frames), vec![b"M0".as_ref()]);
    }

    #[test]
    fn inner_spaces_preserved() {
        let mut decoder = LineDecoder::default();
        let frames = decoder.decode(b"M204  50 \n");
        assert_eq!(lines(&frames), vec![b"M204  50 ".as_ref()]);
    }

    #[test]
    fn oversized_unterminated_line_discarded_until_delimiter() {
        let mut decoder = LineDecoder::new(8);
        assert!(decoder.decode(b"M123456789").is_empty());
        assert!(decoder.is_discarding());
        assert_eq!(decoder.buffered_len(), 0);

        assert!(decoder.decode(b"more junk").is_empty());
        assert_eq!(decoder.buffered_len(), 0);

        let frames = decoder.decode(b"tail\nM0\n");
        assert_eq!(lines(&frames), vec![b"M0".as_ref()]);
        assert!(!decoder.is_discarding());
    }

    #[test]
    fn oversized_complete_line_discarded() {
        let mut decoder = LineDecoder::new(4);
        let frames = decoder.decode(b"M2041234\nM0\n");
        assert_eq!(lines(&frames), vec![b"M0".as_ref()]);
    }

    #[test]
    fn bound_applies_after_trimming() {
        let mut decoder = LineDecoder::new(4);
        assert_eq!(lines(&decoder.decode(b"M203\n")), vec![b"M203".as_ref()]);
        assert_eq!(lines(&decoder.decode(b"M203\r\n")), vec![b"M203".as_ref()]);

        assert!(decoder.decode(b"M203\r").is_empty());
        assert!(!decoder.is_discarding());
        assert_eq!(lines(&decoder.decode(b"\n")), vec![b"M203".as_ref()]);

        assert!(decoder.decode(b"M2030\r\n").is_empty());
        assert_eq!(decoder.buffered_len(), 0);
    }

    #[test]
    fn frame_class_and_body() {
        let frame = Frame::new(&b"M204 1 2"[..]);
        assert_eq!(frame.class(), Some(b'M'));
        assert_eq!(frame.body(), b"204 1 2");
        assert_eq!(frame.to_text(), "M204 1 2");
        assert_eq!(frame.len(), 8);

        let single = Frame::new(&b"X"[..]);
        assert_eq!(single.body(), b"");
    }
}
