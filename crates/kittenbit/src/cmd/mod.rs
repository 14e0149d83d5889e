use clap::{Args, Subcommand};
use std::path::PathBuf;

use kittenbit::frame::DEFAULT_MAX_LINE;
use kittenbit::protocol::FIRMWARE;
use kittenbit::transport::DEFAULT_BAUD_RATE;

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod commands;
pub mod send;
pub mod serve;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the firmware against a simulated robot.
    Serve(ServeArgs),
    /// Send one request line to a serving firmware.
    Send(SendArgs),
    /// List the command registry.
    Commands(CommandsArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Serve(args) => serve::run(args, format),
        Command::Send(args) => send::run(args, format),
        Command::Commands(args) => commands::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Socket path standing in for the serial link. Default: stdin/stdout.
    #[arg(long, value_name = "PATH", env = "KITTENBIT_SOCKET")]
    pub socket: Option<PathBuf>,
    /// Serial line speed.
    #[arg(long, default_value_t = DEFAULT_BAUD_RATE, env = "KITTENBIT_BAUD")]
    pub baud: u32,
    /// Transmit pin.
    #[arg(long, default_value = "P0", env = "KITTENBIT_TX_PIN")]
    pub tx_pin: String,
    /// Receive pin.
    #[arg(long, default_value = "P1", env = "KITTENBIT_RX_PIN")]
    pub rx_pin: String,
    /// Reject missing or non-numeric arguments with `M<id> -2`.
    #[arg(long)]
    pub strict: bool,
    /// Terminate every response with CRLF.
    #[arg(long)]
    pub crlf: bool,
    /// Upper bound for timed motion, in milliseconds.
    #[arg(long, value_name = "MS")]
    pub max_motion_ms: Option<u64>,
    /// Do not announce the firmware version when a controller connects.
    #[arg(long)]
    pub no_announce: bool,
    /// Firmware identifier reported by `M0`.
    #[arg(long, default_value = FIRMWARE, env = "KITTENBIT_FIRMWARE")]
    pub firmware: String,
    /// Longest accepted request line, in bytes.
    #[arg(long, value_name = "BYTES", default_value_t = DEFAULT_MAX_LINE)]
    pub max_line: usize,
    /// Return from timed motion immediately instead of sleeping.
    #[arg(long)]
    pub no_delay: bool,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Socket path to connect to.
    pub path: PathBuf,
    /// Request line, without the trailing newline (e.g. "M204 50 -50 100").
    pub line: String,
    /// Print whatever response bytes arrive before the timeout.
    #[arg(long)]
    pub wait: bool,
    /// How long to wait for response bytes when --wait is set (e.g. 1s, 500ms).
    #[arg(long, default_value = "1s")]
    pub wait_timeout: String,
}

#[derive(Args, Debug, Default)]
pub struct CommandsArgs {}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
