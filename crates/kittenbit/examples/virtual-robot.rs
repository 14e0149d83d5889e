//! Virtual robot. Runs a scripted controller session against the simulated
//! robot:bit, with an `X` extension that drives an LED strip.
//!
//! Run with:
//!   cargo run --example virtual-robot

use std::io::Cursor;

use kittenbit::frame::{LineReader, LineWriter};
use kittenbit::protocol::{
    parse_lenient_int, Actuators, Dispatcher, DispatcherConfig, Response, Session,
};
use kittenbit::sim::SimulatedRobot;

const SCRIPT: &[u8] = b"M0\n\
M204 120 120 300\n\
M205 80 -80 80 -80\n\
Xled 3\n\
M6 0 523 200\n\
M42\n\
M5\n\
M203\n";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut dispatcher = Dispatcher::new(DispatcherConfig::default());
    dispatcher.install_extension(
        |body: &str, _actuators: &mut dyn Actuators| -> Option<Response> {
            let count = parse_lenient_int(body.strip_prefix("led ")?);
            Some(Response::Extension(format!("Xled {count}\r\n").into()))
        },
    );

    let mut robot = SimulatedRobot::new().without_delays();
    let mut wire = Vec::new();
    let summary = Session::new(
        LineReader::new(Cursor::new(SCRIPT)),
        LineWriter::new(&mut wire),
        &mut dispatcher,
        &mut robot,
    )
    .run()?;

    println!("wire output:");
    for line in String::from_utf8_lossy(&wire).split("\r\n") {
        if !line.is_empty() {
            println!("  {line:?}");
        }
    }
    println!(
        "frames={} responses={} dropped={}",
        summary.frames, summary.responses, summary.dropped
    );
    println!("final speeds: {:?}", robot.speeds());
    println!("last tone: {:?}", robot.last_tone());
    Ok(())
}
