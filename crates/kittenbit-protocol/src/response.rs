//! Response frames written back to the host.
//!
//! Wire forms:
//! ```text
//! M0 <firmware>\r\n        version echo (carries its own terminator)
//! M<id> -1                 unknown command
//! M<id> not implemented    reserved command with no behavior
//! M<id> -2                 argument rejected (strict mode only)
//! <bytes>                  extension reply, verbatim
//! ```
//! Only the version echo is terminated. Everything else is written as-is unless
//! [`LineEnding::Crlf`] is selected.

use bytes::{BufMut, Bytes, BytesMut};

use crate::command::CommandId;

/// Prefix of every built-in response.
pub const RESPONSE_PREFIX: u8 = b'M';

const CRLF: &[u8] = b"\r\n";

/// Terminator policy for responses that do not carry their own.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LineEnding {
    /// Byte-for-byte firmware behavior: only the version echo ends in `\r\n`.
    #[default]
    Native,
    /// Append `\r\n` to any response not already ending in a newline.
    Crlf,
}

/// A response to one dispatched frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Reply to id 0.
    Version { firmware: String },
    /// No registry entry for this id. Invalid ids are echoed verbatim.
    Unknown { id: String },
    /// Registered id reserved for a command with no behavior.
    NotImplemented { id: u32 },
    /// Strict-mode argument rejection.
    ArgumentError { id: u32 },
    /// Reply produced by an extension handler.
    Extension(Bytes),
}

impl Response {
    pub fn unknown(id: &CommandId) -> Self {
        Response::Unknown { id: id.to_string() }
    }

    /// Serialise into `dst`.
    pub fn encode(&self, line_ending: LineEnding, dst: &mut BytesMut) {
        let start = dst.len();
        match self {
            Response::Version { firmware } => {
                dst.put_u8(RESPONSE_PREFIX);
                dst.put_slice(b"0 ");
                dst.put_slice(firmware.as_bytes());
                dst.put_slice(CRLF);
            }
            Response::Unknown { id } => {
                dst.put_u8(RESPONSE_PREFIX);
                dst.put_slice(id.as_bytes());
                dst.put_slice(b" -1");
            }
            Response::NotImplemented { id } => {
                dst.put_u8(RESPONSE_PREFIX);
                dst.put_slice(format!("{id} not implemented").as_bytes());
            }
            Response::ArgumentError { id } => {
                dst.put_u8(RESPONSE_PREFIX);
                dst.put_slice(format!("{id} -2").as_bytes());
            }
            Response::Extension(payload) => dst.put_slice(payload),
        }

        if line_ending == LineEnding::Crlf && !dst[start..].ends_with(b"\n") {
            dst.put_slice(CRLF);
        }
    }

    pub fn to_bytes(&self, line_ending: LineEnding) -> Bytes {
        let mut buf = BytesMut::new();
        self.encode(line_ending, &mut buf);
        buf.freeze()
    }
}
