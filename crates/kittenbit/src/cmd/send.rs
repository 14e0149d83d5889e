use std::io::{ErrorKind, Read};
use std::time::Duration;

use kittenbit::frame::{FrameConfig, LineWriter, DELIMITER};
use tracing::debug;

use crate::cmd::SendArgs;
use crate::exit::{
    frame_error, io_error, CliError, CliResult, DATA_INVALID, SUCCESS, TIMEOUT, USAGE,
};
use crate::output::{print_response, OutputFormat};

pub fn run(args: SendArgs, format: OutputFormat) -> CliResult<i32> {
    let wait_timeout = parse_duration(&args.wait_timeout)?;
    validate_line(&args.line)?;
    connect_and_send(args, wait_timeout, format)
}

#[cfg(unix)]
fn connect_and_send(
    args: SendArgs,
    wait_timeout: Duration,
    format: OutputFormat,
) -> CliResult<i32> {
    use kittenbit::transport::UnixSerialSocket;

    use crate::exit::transport_error;

    let stream = UnixSerialSocket::connect(&args.path)
        .map_err(|err| transport_error("connect failed", err))?;
    let mut read_half = stream
        .try_clone()
        .map_err(|err| transport_error("stream clone failed", err))?;

    let mut writer = LineWriter::with_config_serial(stream, FrameConfig::default())
        .map_err(|err| frame_error("writer setup failed", err))?;
    writer
        .send_line(args.line.as_bytes())
        .map_err(|err| frame_error("send failed", err))?;
    debug!(line = %args.line, "request sent");

    if args.wait {
        read_half
            .set_read_timeout(Some(wait_timeout))
            .map_err(|err| transport_error("receive setup failed", err))?;
        let response = collect_response(&mut read_half)
            .map_err(|err| io_error("receive failed", err))?;
        if response.is_empty() {
            return Err(CliError::new(
                TIMEOUT,
                format!("no response within {}", args.wait_timeout),
            ));
        }
        print_response(&args.line, &response, format);
    }

    Ok(SUCCESS)
}

#[cfg(not(unix))]
fn connect_and_send(
    _args: SendArgs,
    _wait_timeout: Duration,
    _format: OutputFormat,
) -> CliResult<i32> {
    Err(CliError::new(
        USAGE,
        "send is only supported on Unix platforms",
    ))
}

/// A request is one line: an embedded delimiter would split it into several.
fn validate_line(line: &str) -> CliResult<()> {
    if line.as_bytes().contains(&DELIMITER) {
        return Err(CliError::new(
            DATA_INVALID,
            "request line must not contain a newline",
        ));
    }
    if line.is_empty() {
        return Err(CliError::new(USAGE, "request line must not be empty"));
    }
    Ok(())
}

/// Read until the peer goes quiet for one timeout period or closes.
///
/// Responses carry no common terminator (`M42 -1` has none), so silence is the
/// only end marker.
fn collect_response<R: Read>(reader: &mut R) -> std::io::Result<Vec<u8>> {
    let mut response = Vec::new();
    let mut chunk = [0u8; 256];
    loop {
        match reader.read(&mut chunk) {
            Ok(0) => return Ok(response),
            Ok(n) => response.extend_from_slice(&chunk[..n]),
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) if matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                return Ok(response);
            }
            Err(err) => return Err(err),
        }
    }
}

fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}
