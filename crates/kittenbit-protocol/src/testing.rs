//! Recording actuator binding for unit tests.

use std::time::Duration;

use crate::actuator::Actuators;
use crate::motors::Motor;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Speed(Motor, i32),
    Stop(Motor),
    StopAll,
    Pitch(u32, Duration),
    Sleep(Duration),
}

#[derive(Debug, Default)]
pub struct RecordingActuators {
    pub calls: Vec<Call>,
}

impl Actuators for RecordingActuators {
    fn set_motor_speed(&mut self, motor: Motor, speed: i32) {
        self.calls.push(Call::Speed(motor, speed));
    }

    fn stop_motor(&mut self, motor: Motor) {
        self.calls.push(Call::Stop(motor));
    }

    fn stop_all_motors(&mut self) {
        self.calls.push(Call::StopAll);
    }

    fn set_pitch(&mut self, frequency: u32, duration: Duration) {
        self.calls.push(Call::Pitch(frequency, duration));
    }

    fn sleep(&mut self, duration: Duration) {
        self.calls.push(Call::Sleep(duration));
    }

    fn reset_device(&mut self) -> ! {
        panic!("reset_device called");
    }
}
