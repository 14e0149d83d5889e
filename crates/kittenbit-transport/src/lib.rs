//! Byte-stream transport for the kittenbit serial protocol.
//!
//! The robot talks over a UART. On a host the same byte stream is carried by:
//! - Unix domain sockets (a stand-in for the serial link, Linux/macOS)
//! - the process's own stdin/stdout
//!
//! This is the lowest layer of kittenbit. Line framing and command dispatch
//! build on top of the [`SerialStream`] type provided here.

pub mod config;
pub mod error;
pub mod traits;

#[cfg(unix)]
pub mod uds;

pub use config::{SerialConfig, DEFAULT_BAUD_RATE, STANDARD_BAUD_RATES};
pub use error::{Result, TransportError};
pub use traits::SerialStream;

#[cfg(unix)]
pub use uds::UnixSerialSocket;
