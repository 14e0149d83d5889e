use std::fmt;

use crate::error::{Result, TransportError};

/// Baud rate the firmware redirects its serial port to at startup.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Baud rates accepted by the board's UART.
pub const STANDARD_BAUD_RATES: [u32; 9] =
    [1_200, 2_400, 4_800, 9_600, 14_400, 19_200, 38_400, 57_600, 115_200];

/// Highest edge-connector pin number (`P20`).
const MAX_PIN: u8 = 20;

/// Serial line settings: baud rate and the edge-connector pins carrying TX/RX.
///
/// A host transport has no pins to drive, but the settings are still validated and
/// reported so that a session can be checked against the firmware build it mirrors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialConfig {
    /// Line speed in bits per second. Default: 115200.
    pub baud_rate: u32,
    /// Transmit pin name, e.g. `P0`.
    pub tx_pin: String,
    /// Receive pin name, e.g. `P1`.
    pub rx_pin: String,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baud_rate: DEFAULT_BAUD_RATE,
            tx_pin: "P0".to_string(),
            rx_pin: "P1".to_string(),
        }
    }
}

impl SerialConfig {
    /// Check the baud rate against the standard set and the pin names against `P0`..`P20`.
    pub fn validate(&self) -> Result<()> {
        if !STANDARD_BAUD_RATES.contains(&self.baud_rate) {
            return Err(TransportError::InvalidConfig(format!(
                "unsupported baud rate {}",
                self.baud_rate
            )));
        }

        let tx = parse_pin(&self.tx_pin)?;
        let rx = parse_pin(&self.rx_pin)?;
        if tx == rx {
            return Err(TransportError::InvalidConfig(format!(
                "tx and rx share pin {}",
                self.tx_pin
            )));
        }
        Ok(())
    }
}

impl fmt::Display for SerialConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "tx={} rx={} baud={}",
            self.tx_pin, self.rx_pin, self.baud_rate
        )
    }
}

fn parse_pin(name: &str) -> Result<u8> {
    name.strip_prefix('P')
        .and_then(|n| n.parse::<u8>().ok())
        .filter(|n| *n <= MAX_PIN)
        .ok_or_else(|| TransportError::InvalidConfig(format!("unknown pin {name:?}")))
}
