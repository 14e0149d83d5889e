//! Built-in command handlers.
//!
//! Actuation commands answer nothing on success.

use std::time::Duration;

use tracing::{debug, warn};

use crate::command::ArgumentMode;
use crate::error::ArgumentError;
use crate::motors::Motor;
use crate::registry::{CommandContext, HandlerResult};
use crate::response::Response;

/// `M0`: firmware identification.
pub fn echo_version(ctx: &mut CommandContext<'_>) -> HandlerResult {
    Ok(Some(Response::Version {
        firmware: ctx.config.firmware.clone(),
    }))
}

/// `M6 <pin> <frequency> <duration_ms>`: play a tone.
///
/// The board has a single analog pitch output; the pin token is read but unused.
pub fn tone(ctx: &mut CommandContext<'_>) -> HandlerResult {
    let pin = ctx.args.int(0)?;
    let frequency = ctx.args.int(1)?;
    let duration = ctx.args.int(2)?;
    debug!(pin, frequency, duration, "tone on fixed pitch output");

    ctx.actuators
        .set_pitch(non_negative(frequency), millis(duration));
    Ok(None)
}

/// `M200 <index> <speed>`: run one motor channel.
pub fn motor_run(ctx: &mut CommandContext<'_>) -> HandlerResult {
    let index = ctx.args.int(0)?;
    let speed = ctx.args.int(1)?;

    match Motor::from_index(index) {
        Some(motor) => ctx.actuators.set_motor_speed(motor, speed),
        None if ctx.args.mode() == ArgumentMode::Strict => {
            return Err(ArgumentError::OutOfRange {
                index: 0,
                value: index,
            });
        }
        None => warn!(index, "motor index outside 0..=3; ignored"),
    }
    Ok(None)
}

/// `M203`: stop every channel.
pub fn motor_stop_all(ctx: &mut CommandContext<'_>) -> HandlerResult {
    ctx.actuators.stop_all_motors();
    Ok(None)
}

/// `M204 <speed_a> <speed_b> [duration_ms]`: run chip 1's pair, optionally timed.
///
/// With a positive duration the dispatcher blocks for that long and then stops
/// both channels. No other frame is serviced meanwhile.
pub fn motor_dual(ctx: &mut CommandContext<'_>) -> HandlerResult {
    let speed_a = ctx.args.int(0)?;
    let speed_b = ctx.args.int(1)?;
    let duration = ctx.args.optional_int(2)?.unwrap_or(0);

    ctx.actuators
        .run_dual((Motor::M1A, speed_a), (Motor::M1B, speed_b));

    if duration > 0 {
        let mut wait = millis(duration);
        if let Some(max) = ctx.config.max_timed_motion {
            if wait > max {
                warn!(
                    requested_ms = duration,
                    max_ms = max.as_millis() as u64,
                    "clamping timed motion"
                );
                wait = max;
            }
        }
        ctx.actuators.sleep(wait);
        ctx.actuators.stop_motor(Motor::M1A);
        ctx.actuators.stop_motor(Motor::M1B);
    }
    Ok(None)
}

/// `M205 <a1> <b1> <a2> <b2>`: run both pairs.
pub fn motor_quad(ctx: &mut CommandContext<'_>) -> HandlerResult {
    let a1 = ctx.args.int(0)?;
    let b1 = ctx.args.int(1)?;
    let a2 = ctx.args.int(2)?;
    let b2 = ctx.args.int(3)?;

    ctx.actuators.run_dual((Motor::M1A, a1), (Motor::M1B, b1));
    ctx.actuators.run_dual((Motor::M2A, a2), (Motor::M2B, b2));
    Ok(None)
}

fn non_negative(value: i32) -> u32 {
    u32::try_from(value).unwrap_or(0)
}

fn millis(value: i32) -> Duration {
    Duration::from_millis(u64::from(non_negative(value)))
}
