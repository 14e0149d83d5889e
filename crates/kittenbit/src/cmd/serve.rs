use std::path::Path;
#[cfg(unix)]
use std::path::PathBuf;
#[cfg(unix)]
use std::sync::atomic::{AtomicBool, Ordering};
#[cfg(unix)]
use std::sync::Arc;
use std::time::Duration;

use kittenbit::frame::{FrameConfig, LineReader, LineWriter};
use kittenbit::protocol::{
    ArgumentMode, Dispatcher, DispatcherConfig, LineEnding, Session, SessionConfig,
};
use kittenbit::sim::SimulatedRobot;
use kittenbit::transport::{SerialConfig, SerialStream};
use tracing::info;
#[cfg(unix)]
use tracing::warn;

use crate::cmd::ServeArgs;
use crate::exit::{
    frame_error, session_error, transport_error, CliError, CliResult, DEVICE_RESET, SUCCESS, USAGE,
};
use crate::output::OutputFormat;

pub fn run(args: ServeArgs, format: OutputFormat) -> CliResult<i32> {
    let serial = serial_config(&args);
    serial
        .validate()
        .map_err(|err| transport_error("invalid serial settings", err))?;
    if args.max_line == 0 {
        return Err(CliError::new(USAGE, "--max-line must be greater than zero"));
    }

    let mut dispatcher = Dispatcher::new(dispatcher_config(&args));
    let session_config = SessionConfig {
        announce: !args.no_announce,
    };
    let frame_config = FrameConfig {
        max_line_length: args.max_line,
        ..FrameConfig::default()
    };
    let mut robot = SimulatedRobot::new().with_reset_code(DEVICE_RESET);
    if args.no_delay {
        robot = robot.without_delays();
    }

    info!(
        %serial,
        firmware = %dispatcher.config().firmware,
        strict = args.strict,
        "firmware starting"
    );

    match &args.socket {
        None => serve_stdio(&mut dispatcher, &mut robot, frame_config, session_config),
        Some(path) => serve_socket(
            path,
            &mut dispatcher,
            &mut robot,
            frame_config,
            session_config,
            format,
        ),
    }
}

fn serial_config(args: &ServeArgs) -> SerialConfig {
    SerialConfig {
        baud_rate: args.baud,
        tx_pin: args.tx_pin.clone(),
        rx_pin: args.rx_pin.clone(),
    }
}

fn dispatcher_config(args: &ServeArgs) -> DispatcherConfig {
    DispatcherConfig {
        firmware: args.firmware.clone(),
        argument_mode: if args.strict {
            ArgumentMode::Strict
        } else {
            ArgumentMode::Lenient
        },
        line_ending: if args.crlf {
            LineEnding::Crlf
        } else {
            LineEnding::Native
        },
        max_timed_motion: args.max_motion_ms.map(Duration::from_millis),
    }
}

fn open_link(
    stream: SerialStream,
    config: FrameConfig,
) -> CliResult<(LineReader<SerialStream>, LineWriter<SerialStream>)> {
    let read_half = stream
        .try_clone()
        .map_err(|err| transport_error("stream clone failed", err))?;
    let reader = LineReader::with_config_serial(read_half, config.clone())
        .map_err(|err| frame_error("reader setup failed", err))?;
    let writer = LineWriter::with_config_serial(stream, config)
        .map_err(|err| frame_error("writer setup failed", err))?;
    Ok((reader, writer))
}

fn serve_stdio(
    dispatcher: &mut Dispatcher,
    robot: &mut SimulatedRobot,
    frame_config: FrameConfig,
    session_config: SessionConfig,
) -> CliResult<i32> {
    let (reader, writer) = open_link(SerialStream::stdio(), frame_config)?;
    Session::with_config(reader, writer, dispatcher, robot, session_config)
        .run()
        .map_err(|err| session_error("serial link failed", err))?;
    Ok(SUCCESS)
}

#[cfg(unix)]
fn serve_socket(
    path: &Path,
    dispatcher: &mut Dispatcher,
    robot: &mut SimulatedRobot,
    frame_config: FrameConfig,
    session_config: SessionConfig,
    format: OutputFormat,
) -> CliResult<i32> {
    use kittenbit::transport::UnixSerialSocket;

    use crate::output::print_summary;

    let socket =
        UnixSerialSocket::bind(path).map_err(|err| transport_error("bind failed", err))?;
    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone(), socket.path().to_path_buf())?;
    info!(path = %socket.path().display(), "waiting for controllers");

    let mut accepted = 0u64;
    while running.load(Ordering::SeqCst) {
        let stream = socket
            .accept()
            .map_err(|err| transport_error("accept failed", err))?;
        if !running.load(Ordering::SeqCst) {
            break;
        }

        accepted += 1;
        let controller = format!("controller-{accepted}");
        info!(%controller, "controller connected");

        let (reader, writer) = open_link(stream, frame_config.clone())?;
        let session = Session::with_config(
            reader,
            writer,
            &mut *dispatcher,
            &mut *robot,
            session_config.clone(),
        );
        match session.run() {
            Ok(summary) => print_summary(&controller, &summary, format),
            Err(err) => warn!(%controller, error = %err, "controller dropped"),
        }
    }

    info!(controllers = accepted, "shutting down");
    Ok(SUCCESS)
}

#[cfg(not(unix))]
fn serve_socket(
    _path: &Path,
    _dispatcher: &mut Dispatcher,
    _robot: &mut SimulatedRobot,
    _frame_config: FrameConfig,
    _session_config: SessionConfig,
    _format: OutputFormat,
) -> CliResult<i32> {
    Err(CliError::new(
        USAGE,
        "--socket is only supported on Unix platforms",
    ))
}

#[cfg(unix)]
fn install_ctrlc_handler(running: Arc<AtomicBool>, wake: PathBuf) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
        // Unblock the pending accept.
        let _ = std::os::unix::net::UnixStream::connect(&wake);
    })
    .map_err(|err| {
        CliError::new(
            crate::exit::INTERNAL,
            format!("signal handler setup failed: {err}"),
        )
    })
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::cmd::Command;

    #[derive(Parser)]
    struct Harness {
        #[command(subcommand)]
        command: Command,
    }

    fn serve_args(extra: &[&str]) -> ServeArgs {
        let argv = ["kittenbit", "serve"].iter().chain(extra).copied();
        match Harness::try_parse_from(argv).expect("serve args should parse").command {
            Command::Serve(args) => args,
            _ => panic!("expected serve"),
        }
    }

    #[test]
    fn default_dispatcher_matches_firmware() {
        let config = dispatcher_config(&serve_args(&[]));
        assert_eq!(config, DispatcherConfig::default());
    }

    #[test]
    fn flags_map_to_dispatcher_config() {
        let config = dispatcher_config(&serve_args(&[
            "--strict",
            "--crlf",
            "--max-motion-ms",
            "1500",
            "--firmware",
            "Kitten:bit sim",
        ]));
        assert_eq!(config.argument_mode, ArgumentMode::Strict);
        assert_eq!(config.line_ending, LineEnding::Crlf);
        assert_eq!(config.max_timed_motion, Some(Duration::from_millis(1500)));
        assert_eq!(config.firmware, "Kitten:bit sim");
    }

    #[test]
    fn invalid_pins_rejected_before_serving() {
        let err = run(
            serve_args(&["--tx-pin", "P1", "--rx-pin", "P1"]),
            OutputFormat::Json,
        )
        .expect_err("shared pin should fail");
        assert_eq!(err.code, USAGE);
    }

    #[test]
    fn zero_line_bound_rejected() {
        let err = run(serve_args(&["--max-line", "0"]), OutputFormat::Json)
            .expect_err("zero bound should fail");
        assert_eq!(err.code, USAGE);
    }
}
