//! Simulated robot:bit actuators.
//!
//! Stands in for the motor driver and the pitch output when the firmware runs
//! on a host. Every effect is logged; state is kept so tests and the CLI can
//! inspect it.

use std::time::Duration;

use kittenbit_protocol::{Actuators, Motor};
use tracing::{debug, info};

/// Full-scale motor speed accepted by the robot:bit driver.
pub const MAX_SPEED: i32 = 255;

/// Process exit code used when a controller requests a device reset.
pub const RESET_EXIT_CODE: i32 = 10;

/// Last tone played on the pitch output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tone {
    pub frequency: u32,
    pub duration: Duration,
}

/// In-memory actuator binding.
#[derive(Debug, Clone)]
pub struct SimulatedRobot {
    speeds: [i32; 4],
    last_tone: Option<Tone>,
    realtime: bool,
    reset_code: i32,
}

impl SimulatedRobot {
    /// Robot with all channels stopped; [`sleep`](Actuators::sleep) blocks for real.
    pub fn new() -> Self {
        Self {
            speeds: [0; 4],
            last_tone: None,
            realtime: true,
            reset_code: RESET_EXIT_CODE,
        }
    }

    /// Skip real sleeping. Timed motion still stops its motors afterwards.
    pub fn without_delays(mut self) -> Self {
        self.realtime = false;
        self
    }

    /// Exit code passed to `std::process::exit` on reset.
    pub fn with_reset_code(mut self, code: i32) -> Self {
        self.reset_code = code;
        self
    }

    /// Current signed speed of `motor`.
    pub fn speed(&self, motor: Motor) -> i32 {
        self.speeds[motor.index()]
    }

    /// Speeds of M1A, M1B, M2A, M2B in that order.
    pub fn speeds(&self) -> [i32; 4] {
        self.speeds
    }

    pub fn last_tone(&self) -> Option<Tone> {
        self.last_tone
    }

    pub fn is_idle(&self) -> bool {
        self.speeds.iter().all(|&speed| speed == 0)
    }
}

impl Default for SimulatedRobot {
    fn default() -> Self {
        Self::new()
    }
}

impl Actuators for SimulatedRobot {
    fn set_motor_speed(&mut self, motor: Motor, speed: i32) {
        let clamped = speed.clamp(-MAX_SPEED, MAX_SPEED);
        if clamped != speed {
            debug!(%motor, requested = speed, applied = clamped, "speed clamped");
        }
        self.speeds[motor.index()] = clamped;
        info!(%motor, speed = clamped, "motor");
    }

    fn stop_motor(&mut self, motor: Motor) {
        self.speeds[motor.index()] = 0;
        info!(%motor, "motor stop");
    }

    fn stop_all_motors(&mut self) {
        self.speeds = [0; 4];
        info!("all motors stopped");
    }

    fn set_pitch(&mut self, frequency: u32, duration: Duration) {
        self.last_tone = Some(Tone {
            frequency,
            duration,
        });
        info!(frequency, duration_ms = duration.as_millis() as u64, "tone");
    }

    fn sleep(&mut self, duration: Duration) {
        debug!(duration_ms = duration.as_millis() as u64, "sleep");
        if self.realtime {
            std::thread::sleep(duration);
        }
    }

    fn reset_device(&mut self) -> ! {
        info!(code = self.reset_code, "device reset; exiting");
        std::process::exit(self.reset_code)
    }
}
