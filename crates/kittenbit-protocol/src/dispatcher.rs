use std::time::Duration;

use kittenbit_frame::Frame;
use tracing::{debug, warn};

use crate::actuator::Actuators;
use crate::command::{ArgumentMode, Arguments, Command, CommandId};
use crate::extension::ExtensionHandler;
use crate::registry::{CommandContext, CommandKind, CommandRegistry};
use crate::response::{LineEnding, Response};

/// Class selector for built-in commands.
pub const COMMAND_CLASS: u8 = b'M';

/// Class selector for the extension slot.
pub const EXTENSION_CLASS: u8 = b'X';

/// Firmware identifier reported by `M0`.
pub const FIRMWARE: &str = "Kitten:bit V3.9";

/// Dispatcher behavior knobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatcherConfig {
    /// Identifier returned by the version echo. Default: `Kitten:bit V3.9`.
    pub firmware: String,
    /// Missing/unparseable argument policy. Default: lenient.
    pub argument_mode: ArgumentMode,
    /// Response terminator policy. Default: native.
    pub line_ending: LineEnding,
    /// Upper bound for `M204` timed motion. Default: unbounded.
    pub max_timed_motion: Option<Duration>,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            firmware: FIRMWARE.to_string(),
            argument_mode: ArgumentMode::default(),
            line_ending: LineEnding::default(),
            max_timed_motion: None,
        }
    }
}

/// Why a frame produced neither an effect nor a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// Nothing to dispatch.
    Empty,
    /// Leading character is neither `M` nor `X`.
    UnknownClass(u8),
    /// `X` frame with no extension installed.
    NoExtension,
}

/// Result of dispatching one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Ignored without effect.
    Dropped(DropReason),
    /// Handled; nothing to write.
    Silent,
    /// Handled; write this response.
    Respond(Response),
    /// Reset requested. The driver must not dispatch anything further.
    Reset,
}

/// Protocol state machine: one frame in, one [`Outcome`] out.
///
/// Each call to [`dispatch`](Self::dispatch) runs to completion
/// (`Idle → Reading → Dispatching → Idle`); no state carries over between frames.
/// The registry and the extension slot are owned here rather than in globals.
pub struct Dispatcher {
    registry: CommandRegistry,
    extension: Option<Box<dyn ExtensionHandler>>,
    config: DispatcherConfig,
}

impl Dispatcher {
    /// Dispatcher over the built-in command set.
    pub fn new(config: DispatcherConfig) -> Self {
        Self::with_registry(CommandRegistry::builtin(), config)
    }

    /// Dispatcher over an explicit registry.
    pub fn with_registry(registry: CommandRegistry, config: DispatcherConfig) -> Self {
        Self {
            registry,
            extension: None,
            config,
        }
    }

    /// Install the `X` class handler, returning the one it replaces.
    pub fn install_extension(
        &mut self,
        handler: impl ExtensionHandler + 'static,
    ) -> Option<Box<dyn ExtensionHandler>> {
        if self.extension.is_some() {
            debug!("replacing installed extension handler");
        }
        self.extension.replace(Box::new(handler))
    }

    /// Remove the `X` class handler; `X` frames are dropped afterwards.
    pub fn remove_extension(&mut self) -> Option<Box<dyn ExtensionHandler>> {
        self.extension.take()
    }

    pub fn has_extension(&self) -> bool {
        self.extension.is_some()
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Dispatch one frame against `actuators`.
    pub fn dispatch(&mut self, frame: &Frame, actuators: &mut dyn Actuators) -> Outcome {
        let Some(class) = frame.class() else {
            return Outcome::Dropped(DropReason::Empty);
        };
        let body = String::from_utf8_lossy(frame.body());

        match class {
            COMMAND_CLASS => self.dispatch_command(&body, actuators),
            EXTENSION_CLASS => match self.extension.as_mut() {
                Some(extension) => extension
                    .handle(&body, actuators)
                    .map_or(Outcome::Silent, Outcome::Respond),
                None => {
                    debug!("no extension installed; dropping X frame");
                    Outcome::Dropped(DropReason::NoExtension)
                }
            },
            other => {
                debug!(class = other, "dropping frame with unknown class");
                Outcome::Dropped(DropReason::UnknownClass(other))
            }
        }
    }

    /// Dispatch an `M` body (class character already stripped).
    pub fn dispatch_command(&self, body: &str, actuators: &mut dyn Actuators) -> Outcome {
        let command = Command::parse(body);
        let id = match command.id {
            CommandId::Number(id) => id,
            CommandId::Invalid(_) => {
                debug!(id = %command.id, "non-numeric command id");
                return Outcome::Respond(Response::unknown(&command.id));
            }
        };

        let Some(descriptor) = self.registry.get(id) else {
            debug!(id, "unknown command");
            return Outcome::Respond(Response::unknown(&command.id));
        };

        let handler = match descriptor.kind {
            CommandKind::Handler(handler) => handler,
            CommandKind::NotImplemented => {
                debug!(id, name = descriptor.name, "command not implemented");
                return Outcome::Respond(Response::NotImplemented { id });
            }
            CommandKind::Reset => {
                debug!(id, "reset requested");
                return Outcome::Reset;
            }
        };

        let mode = self.config.argument_mode;
        if command.args.len() < descriptor.required_args {
            match mode {
                ArgumentMode::Strict => {
                    warn!(
                        id,
                        given = command.args.len(),
                        required = descriptor.required_args,
                        "missing arguments"
                    );
                    return Outcome::Respond(Response::ArgumentError { id });
                }
                ArgumentMode::Lenient => debug!(
                    id,
                    given = command.args.len(),
                    required = descriptor.required_args,
                    "missing arguments read as zero"
                ),
            }
        }

        let mut ctx = CommandContext {
            id,
            args: Arguments::new(&command.args, mode),
            actuators,
            config: &self.config,
        };

        debug!(
            id,
            name = descriptor.name,
            args = command.args.len(),
            "dispatching"
        );
        match handler(&mut ctx) {
            Ok(Some(response)) => Outcome::Respond(response),
            Ok(None) => Outcome::Silent,
            Err(err) => {
                warn!(id, error = %err, "argument rejected");
                Outcome::Respond(Response::ArgumentError { id })
            }
        }
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(DispatcherConfig::default())
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("commands", &self.registry.len())
            .field("extension", &self.extension.is_some())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::motors::Motor;
    use crate::registry::{CommandDescriptor, NOT_IMPLEMENTED_IDS};
    use crate::testing::{Call, RecordingActuators};

    fn run(dispatcher: &mut Dispatcher, line: &str) -> (Outcome, Vec<Call>) {
        let mut actuators = RecordingActuators::default();
        let outcome = dispatcher.dispatch(&Frame::new(line.to_string()), &mut actuators);
        (outcome, actuators.calls)
    }

    fn lenient() -> Dispatcher {
        Dispatcher::default()
    }

    fn strict() -> Dispatcher {
        Dispatcher::new(DispatcherConfig {
            argument_mode: ArgumentMode::Strict,
            ..DispatcherConfig::default()
        })
    }

    fn unknown(id: &str) -> Outcome {
        Outcome::Respond(Response::Unknown { id: id.to_string() })
    }

    #[test]
    fn version_echo() {
        let (outcome, calls) = run(&mut lenient(), "M0");
        assert_eq!(
            outcome,
            Outcome::Respond(Response::Version {
                firmware: "Kitten:bit V3.9".to_string()
            })
        );
        assert!(calls.is_empty());
    }

    #[test]
    fn configured_firmware_name() {
        let mut dispatcher = Dispatcher::new(DispatcherConfig {
            firmware: "Kitten:bit test".to_string(),
            ..DispatcherConfig::default()
        });
        let (outcome, _) = run(&mut dispatcher, "M0");
        let Outcome::Respond(response) = outcome else {
            panic!("expected response");
        };
        assert_eq!(
            response.to_bytes(LineEnding::Native).as_ref(),
            b"M0 Kitten:bit test\r\n"
        );
    }

    #[test]
    fn unregistered_ids_answer_minus_one_without_effect() {
        let mut dispatcher = lenient();
        for id in [12u32, 42, 202, 206, 998, 4_000_000_000] {
            let (outcome, calls) = run(&mut dispatcher, &format!("M{id} 1 2 3"));
            assert_eq!(outcome, unknown(&id.to_string()));
            assert!(calls.is_empty());
        }
    }

    #[test]
    fn non_numeric_id_answers_minus_one() {
        let mut dispatcher = lenient();
        assert_eq!(run(&mut dispatcher, "Mfoo 1").0, unknown("foo"));
        assert_eq!(run(&mut dispatcher, "M").0, unknown(""));
        assert_eq!(run(&mut dispatcher, "M 0").0, unknown(""));
    }

    #[test]
    fn signed_id_answers_minus_one() {
        let mut dispatcher = lenient();
        let (outcome, calls) = run(&mut dispatcher, "M+5 1");
        assert_eq!(outcome, unknown("+5"));
        assert!(calls.is_empty());
        assert_eq!(run(&mut dispatcher, "M-0").0, unknown("-0"));
    }

    fn assert_send<T: Send>() {}

    #[test]
    fn dispatcher_moves_across_threads() {
        assert_send::<Dispatcher>();

        let mut dispatcher = lenient();
        dispatcher.install_extension(Echo);
        let handle = std::thread::spawn(move || run(&mut dispatcher, "Xping").0);
        let outcome = handle.join().unwrap();
        assert_eq!(
            outcome,
            Outcome::Respond(Response::Extension(Bytes::from_static(b"Xping")))
        );
    }

    #[test]
    fn stubs_answer_diagnostic_without_effect() {
        let mut dispatcher = lenient();
        for &id in NOT_IMPLEMENTED_IDS {
            let (outcome, calls) = run(&mut dispatcher, &format!("M{id} 1 2"));
            assert_eq!(outcome, Outcome::Respond(Response::NotImplemented { id }));
            assert!(calls.is_empty(), "stub {id} touched actuators");
        }
    }

    #[test]
    fn dual_without_duration_never_stops() {
        let (outcome, calls) = run(&mut lenient(), "M204 50 -50 0");
        assert_eq!(outcome, Outcome::Silent);
        assert_eq!(
            calls,
            vec![Call::Speed(Motor::M1A, 50), Call::Speed(Motor::M1B, -50)]
        );

        let (_, calls) = run(&mut lenient(), "M204 50 -50");
        assert_eq!(calls.len(), 2);
    }

    #[test]
    fn dual_with_duration_blocks_then_stops() {
        let (outcome, calls) = run(&mut lenient(), "M204 50 -50 100");
        assert_eq!(outcome, Outcome::Silent);
        assert_eq!(
            calls,
            vec![
                Call::Speed(Motor::M1A, 50),
                Call::Speed(Motor::M1B, -50),
                Call::Sleep(Duration::from_millis(100)),
                Call::Stop(Motor::M1A),
                Call::Stop(Motor::M1B),
            ]
        );
    }

    #[test]
    fn dual_negative_duration_is_untimed() {
        let (_, calls) = run(&mut lenient(), "M204 10 10 -5");
        assert_eq!(
            calls,
            vec![Call::Speed(Motor::M1A, 10), Call::Speed(Motor::M1B, 10)]
        );
    }

    #[test]
    fn timed_motion_clamped_when_configured() {
        let mut dispatcher = Dispatcher::new(DispatcherConfig {
            max_timed_motion: Some(Duration::from_millis(250)),
            ..DispatcherConfig::default()
        });
        let (_, calls) = run(&mut dispatcher, "M204 1 1 60000");
        assert_eq!(calls[2], Call::Sleep(Duration::from_millis(250)));
    }

    #[test]
    fn quad_sets_four_channels_silently() {
        let (outcome, calls) = run(&mut lenient(), "M205 10 20 30 40");
        assert_eq!(outcome, Outcome::Silent);
        assert_eq!(
            calls,
            vec![
                Call::Speed(Motor::M1A, 10),
                Call::Speed(Motor::M1B, 20),
                Call::Speed(Motor::M2A, 30),
                Call::Speed(Motor::M2B, 40),
            ]
        );
    }

    #[test]
    fn single_motor_uses_index_table() {
        let mut dispatcher = lenient();
        for (index, motor) in Motor::ALL.iter().enumerate() {
            let (outcome, calls) = run(&mut dispatcher, &format!("M200 {index} -80"));
            assert_eq!(outcome, Outcome::Silent);
            assert_eq!(calls, vec![Call::Speed(*motor, -80)]);
        }
    }

    #[test]
    fn single_motor_out_of_range() {
        let (outcome, calls) = run(&mut lenient(), "M200 7 100");
        assert_eq!(outcome, Outcome::Silent);
        assert!(calls.is_empty());

        let (outcome, calls) = run(&mut strict(), "M200 7 100");
        assert_eq!(
            outcome,
            Outcome::Respond(Response::ArgumentError { id: 200 })
        );
        assert!(calls.is_empty());
    }

    #[test]
    fn stop_all_is_idempotent() {
        let mut dispatcher = lenient();
        let mut actuators = RecordingActuators::default();
        for _ in 0..3 {
            let outcome = dispatcher.dispatch(&Frame::new("M203"), &mut actuators);
            assert_eq!(outcome, Outcome::Silent);
        }
        assert_eq!(actuators.calls, vec![Call::StopAll; 3]);
    }

    #[test]
    fn tone_ignores_pin() {
        let (outcome, calls) = run(&mut lenient(), "M6 13 440 250");
        assert_eq!(outcome, Outcome::Silent);
        assert_eq!(calls, vec![Call::Pitch(440, Duration::from_millis(250))]);

        let (_, other_pin) = run(&mut lenient(), "M6 0 440 250");
        assert_eq!(calls, other_pin);
    }

    #[test]
    fn reset_yields_reset_outcome() {
        let (outcome, calls) = run(&mut lenient(), "M999");
        assert_eq!(outcome, Outcome::Reset);
        assert!(calls.is_empty());
    }

    #[test]
    fn lenient_missing_and_garbage_args_are_zero() {
        let (outcome, calls) = run(&mut lenient(), "M204 abc");
        assert_eq!(outcome, Outcome::Silent);
        assert_eq!(
            calls,
            vec![Call::Speed(Motor::M1A, 0), Call::Speed(Motor::M1B, 0)]
        );

        let (_, calls) = run(&mut lenient(), "M204  50");
        assert_eq!(
            calls,
            vec![Call::Speed(Motor::M1A, 0), Call::Speed(Motor::M1B, 50)],
            "doubled separator yields an empty token"
        );
    }

    #[test]
    fn strict_rejects_missing_and_garbage_args() {
        let mut dispatcher = strict();
        for line in ["M204 50", "M204 abc 5", "M205 1 2 3", "M204 1 2 x"] {
            let (outcome, calls) = run(&mut dispatcher, line);
            assert!(
                matches!(outcome, Outcome::Respond(Response::ArgumentError { .. })),
                "{line} should be rejected"
            );
            assert!(calls.is_empty(), "{line} touched actuators");
        }
        let (outcome, _) = run(&mut dispatcher, "M204 50 -50");
        assert_eq!(outcome, Outcome::Silent);
    }

    #[test]
    fn unknown_class_and_empty_frames_drop() {
        let mut dispatcher = lenient();
        assert_eq!(
            run(&mut dispatcher, "G0").0,
            Outcome::Dropped(DropReason::UnknownClass(b'G'))
        );
        assert_eq!(
            run(&mut dispatcher, "m0").0,
            Outcome::Dropped(DropReason::UnknownClass(b'm'))
        );
        assert_eq!(
            run(&mut dispatcher, "").0,
            Outcome::Dropped(DropReason::Empty)
        );
    }

    #[test]
    fn extension_frames_drop_without_handler() {
        let mut dispatcher = lenient();
        assert!(!dispatcher.has_extension());
        assert_eq!(
            run(&mut dispatcher, "Xanything").0,
            Outcome::Dropped(DropReason::NoExtension)
        );
    }

    struct Echo;

    impl ExtensionHandler for Echo {
        fn handle(&mut self, body: &str, _actuators: &mut dyn Actuators) -> Option<Response> {
            Some(Response::Extension(Bytes::from(format!("X{body}"))))
        }
    }

    #[test]
    fn extension_receives_body_verbatim() {
        let mut dispatcher = lenient();
        assert!(dispatcher.install_extension(Echo).is_none());
        let (outcome, _) = run(&mut dispatcher, "X led  1 ");
        assert_eq!(
            outcome,
            Outcome::Respond(Response::Extension(Bytes::from_static(b"X led  1 ")))
        );
    }

    #[test]
    fn second_extension_replaces_first() {
        let mut dispatcher = lenient();
        dispatcher.install_extension(Echo);
        let previous = dispatcher.install_extension(
            |body: &str, actuators: &mut dyn Actuators| -> Option<Response> {
                if body == "stop" {
                    actuators.stop_all_motors();
                }
                None
            },
        );
        assert!(previous.is_some());

        let (outcome, calls) = run(&mut dispatcher, "Xstop");
        assert_eq!(outcome, Outcome::Silent);
        assert_eq!(calls, vec![Call::StopAll]);

        assert!(dispatcher.remove_extension().is_some());
        assert_eq!(
            run(&mut dispatcher, "Xstop").0,
            Outcome::Dropped(DropReason::NoExtension)
        );
    }

    #[test]
    fn custom_registry() {
        let mut registry = CommandRegistry::new();
        registry.register(CommandDescriptor::not_implemented(0, "version"));
        let mut dispatcher = Dispatcher::with_registry(registry, DispatcherConfig::default());
        assert_eq!(
            run(&mut dispatcher, "M0").0,
            Outcome::Respond(Response::NotImplemented { id: 0 })
        );
        assert_eq!(run(&mut dispatcher, "M203").0, unknown("203"));
    }
}
