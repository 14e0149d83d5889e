//! Newline-delimited framing for the kittenbit serial protocol.
//!
//! Every request on the wire is one ASCII line terminated by `\n`:
//! - trailing control characters (`\r`, stray NULs) are trimmed
//! - lines that are empty after trimming are dropped
//! - lines longer than the configured bound are discarded whole
//!
//! No partial reads, no buffer management in user code.

pub mod codec;
pub mod error;
pub mod reader;
pub mod writer;

#[cfg(feature = "async")]
pub mod line_codec;

pub use codec::{Frame, FrameConfig, LineDecoder, DEFAULT_MAX_LINE, DELIMITER};
pub use error::{FrameError, Result};
#[cfg(feature = "async")]
pub use line_codec::LineCodec;
pub use reader::LineReader;
pub use writer::LineWriter;
