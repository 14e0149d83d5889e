mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(
    name = "kittenbit",
    version,
    about = "Kittenbit serial command firmware on a host"
)]
struct Cli {
    /// Output format for reports (never the wire stream).
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(
        long,
        value_name = "FORMAT",
        default_value = "text",
        env = "KITTENBIT_LOG_FORMAT",
        global = true
    )]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(
        long,
        value_name = "LEVEL",
        default_value = "info",
        env = "KITTENBIT_LOG_LEVEL",
        global = true
    )]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_serve_defaults() {
        let cli = Cli::try_parse_from(["kittenbit", "serve"]).expect("serve should parse");
        let Command::Serve(args) = cli.command else {
            panic!("expected serve");
        };
        assert!(args.socket.is_none());
        assert_eq!(args.baud, 115_200);
        assert_eq!(args.tx_pin, "P0");
        assert_eq!(args.rx_pin, "P1");
        assert!(!args.strict);
        assert!(!args.no_announce);
        assert_eq!(args.firmware, "Kitten:bit V3.9");
    }

    #[test]
    fn parses_serve_socket_options() {
        let cli = Cli::try_parse_from([
            "kittenbit",
            "serve",
            "--socket",
            "/tmp/robot.sock",
            "--strict",
            "--crlf",
            "--max-motion-ms",
            "2000",
            "--baud",
            "9600",
        ])
        .expect("serve args should parse");
        let Command::Serve(args) = cli.command else {
            panic!("expected serve");
        };
        assert_eq!(
            args.socket.as_deref(),
            Some(std::path::Path::new("/tmp/robot.sock"))
        );
        assert!(args.strict && args.crlf);
        assert_eq!(args.max_motion_ms, Some(2000));
        assert_eq!(args.baud, 9600);
    }

    #[test]
    fn parses_send_subcommand() {
        let cli = Cli::try_parse_from([
            "kittenbit",
            "send",
            "/tmp/robot.sock",
            "M204 50 -50 100",
            "--wait",
        ])
        .expect("send args should parse");
        let Command::Send(args) = cli.command else {
            panic!("expected send");
        };
        assert_eq!(args.line, "M204 50 -50 100");
        assert!(args.wait);
    }

    #[test]
    fn send_requires_line() {
        let err = Cli::try_parse_from(["kittenbit", "send", "/tmp/robot.sock"])
            .expect_err("missing line should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn parses_commands_with_global_format() {
        let cli = Cli::try_parse_from(["kittenbit", "commands", "--format", "json"])
            .expect("commands should parse");
        assert!(matches!(cli.command, Command::Commands(_)));
        assert!(matches!(cli.format, Some(OutputFormat::Json)));
    }
}
