//! Async firmware loop. Serves the protocol over a tokio Unix socket using
//! `LineCodec`, then plays a short controller script against it.
//!
//! Run with:
//!   cargo run --example async-controller --features async

use futures_util::{SinkExt, StreamExt};
use kittenbit::frame::{FrameError, LineCodec};
use kittenbit::protocol::{Dispatcher, Outcome};
use kittenbit::sim::SimulatedRobot;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tokio_util::codec::{FramedRead, FramedWrite};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let sock_dir = std::env::temp_dir().join(format!("kittenbit-async-{}", std::process::id()));
    std::fs::create_dir_all(&sock_dir)?;
    let sock_path = sock_dir.join("robot.sock");
    let _ = std::fs::remove_file(&sock_path);

    let listener = UnixListener::bind(&sock_path)?;
    let firmware = tokio::spawn(async move {
        match listener.accept().await {
            Ok((stream, _)) => serve(stream).await,
            Err(err) => Err(FrameError::Io(err)),
        }
    });

    let mut controller = UnixStream::connect(&sock_path).await?;
    controller
        .write_all(b"M0\nM204 60 60 200\nM42\nM9\n")
        .await?;
    controller.shutdown().await?;

    let mut wire = Vec::new();
    controller.read_to_end(&mut wire).await?;
    println!("wire output: {:?}", String::from_utf8_lossy(&wire));

    let robot = firmware.await??;
    println!("final speeds: {:?}", robot.speeds());

    let _ = std::fs::remove_dir_all(&sock_dir);
    Ok(())
}

async fn serve(stream: UnixStream) -> Result<SimulatedRobot, FrameError> {
    let (read_half, write_half) = stream.into_split();
    let mut frames = FramedRead::new(read_half, LineCodec::default());
    let mut sink = FramedWrite::new(write_half, LineCodec::default());

    let mut dispatcher = Dispatcher::default();
    let mut robot = SimulatedRobot::new();

    while let Some(frame) = frames.next().await {
        let frame = frame?;
        // Timed motion sleeps on the worker thread, like the firmware does.
        let outcome = tokio::task::block_in_place(|| dispatcher.dispatch(&frame, &mut robot));
        match outcome {
            Outcome::Respond(response) => {
                let bytes = response.to_bytes(dispatcher.config().line_ending);
                sink.send(&bytes[..]).await?;
            }
            Outcome::Reset => break,
            Outcome::Silent | Outcome::Dropped(_) => {}
        }
    }

    Ok(robot)
}
