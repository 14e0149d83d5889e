use std::time::Duration;

use crate::motors::Motor;

/// Hardware effects available to command handlers.
///
/// Implementations own all actuator state. The dispatcher calls these methods
/// synchronously, one command at a time, so implementations need no locking.
pub trait Actuators {
    /// Set a channel's signed speed. Sign selects direction.
    fn set_motor_speed(&mut self, motor: Motor, speed: i32);

    fn stop_motor(&mut self, motor: Motor);

    fn stop_all_motors(&mut self);

    /// Drive the pitch output at `frequency` Hz for `duration`.
    fn set_pitch(&mut self, frequency: u32, duration: Duration);

    /// Block the caller for `duration`.
    fn sleep(&mut self, duration: Duration);

    /// Full device reset. Does not return.
    fn reset_device(&mut self) -> !;

    /// Set two channels together.
    ///
    /// Drivers that can latch both channels in one bus transaction should override this.
    fn run_dual(&mut self, first: (Motor, i32), second: (Motor, i32)) {
        self.set_motor_speed(first.0, first.1);
        self.set_motor_speed(second.0, second.1);
    }
}
