//! Serial command firmware for the Kittenbot robot:bit, runnable on a host.
//!
//! A controller sends newline-delimited requests (`M0`, `M204 50 -50 100`, ...)
//! over a serial link; the firmware parses each one, drives the motor and tone
//! actuators, and answers on the same link.
//!
//! # Crate Structure
//!
//! - [`transport`]: Byte-stream transport (UDS stand-in for the UART, stdio)
//! - [`frame`]: Newline framing with overflow protection
//! - [`protocol`]: Command parsing, registry, dispatcher and session driver
//! - [`sim`]: Simulated robot:bit actuator binding

/// Re-export transport types.
pub mod transport {
    pub use kittenbit_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use kittenbit_frame::*;
}

/// Re-export protocol types.
pub mod protocol {
    pub use kittenbit_protocol::*;
}

pub mod sim;
