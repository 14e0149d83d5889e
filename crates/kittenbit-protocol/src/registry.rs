use std::collections::BTreeMap;
use std::fmt;

use crate::actuator::Actuators;
use crate::command::Arguments;
use crate::dispatcher::DispatcherConfig;
use crate::error::ArgumentError;
use crate::handlers;
use crate::response::Response;

/// Registered ids that answer with the not-implemented diagnostic and never touch hardware.
pub const NOT_IMPLEMENTED_IDS: &[u32] = &[
    1, 2, 3, 4, 5, 7, 8, 9, 10, 11, 20, 21, 22, 30, 31, 100, 101, 102, 103, 104, 105, 201, 209,
    212, 213, 220, 221, 222, 250,
];

/// What a handler returns: an optional response, or a rejected argument.
pub type HandlerResult = Result<Option<Response>, ArgumentError>;

/// Command handler entry point.
pub type HandlerFn = fn(&mut CommandContext<'_>) -> HandlerResult;

/// Everything a handler may touch while it runs.
pub struct CommandContext<'a> {
    pub id: u32,
    pub args: Arguments<'a>,
    pub actuators: &'a mut dyn Actuators,
    pub config: &'a DispatcherConfig,
}

/// How a registered command is executed.
#[derive(Clone, Copy)]
pub enum CommandKind {
    /// Run a handler synchronously.
    Handler(HandlerFn),
    /// Answer with the fixed diagnostic.
    NotImplemented,
    /// Terminal device reset.
    Reset,
}

impl CommandKind {
    pub fn label(&self) -> &'static str {
        match self {
            CommandKind::Handler(_) => "handler",
            CommandKind::NotImplemented => "not-implemented",
            CommandKind::Reset => "reset",
        }
    }
}

impl fmt::Debug for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Static registry entry.
#[derive(Debug, Clone, Copy)]
pub struct CommandDescriptor {
    pub id: u32,
    pub name: &'static str,
    /// Tokens a well-formed request carries after the id.
    pub required_args: usize,
    /// Trailing tokens that may be omitted.
    pub optional_args: usize,
    pub kind: CommandKind,
}

impl CommandDescriptor {
    pub const fn handler(
        id: u32,
        name: &'static str,
        required_args: usize,
        handler: HandlerFn,
    ) -> Self {
        Self {
            id,
            name,
            required_args,
            optional_args: 0,
            kind: CommandKind::Handler(handler),
        }
    }

    pub const fn with_optional(mut self, optional_args: usize) -> Self {
        self.optional_args = optional_args;
        self
    }

    pub const fn not_implemented(id: u32, name: &'static str) -> Self {
        Self {
            id,
            name,
            required_args: 0,
            optional_args: 0,
            kind: CommandKind::NotImplemented,
        }
    }

    pub const fn reset(id: u32) -> Self {
        Self {
            id,
            name: "reset",
            required_args: 0,
            optional_args: 0,
            kind: CommandKind::Reset,
        }
    }
}

/// Id-keyed table of command descriptors.
///
/// Built once before the dispatcher starts and read-only afterwards: the
/// [`Dispatcher`](crate::Dispatcher) takes ownership and exposes only shared access.
#[derive(Debug, Clone, Default)]
pub struct CommandRegistry {
    descriptors: BTreeMap<u32, CommandDescriptor>,
}

impl CommandRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The firmware's command set.
    pub fn builtin() -> Self {
        let mut registry = Self::new();

        let handled = [
            CommandDescriptor::handler(0, "version", 0, handlers::echo_version),
            CommandDescriptor::handler(6, "tone", 3, handlers::tone),
            CommandDescriptor::handler(200, "motor-run", 2, handlers::motor_run),
            CommandDescriptor::handler(203, "motor-stop-all", 0, handlers::motor_stop_all),
            CommandDescriptor::handler(204, "motor-dual", 2, handlers::motor_dual).with_optional(1),
            CommandDescriptor::handler(205, "motor-quad", 4, handlers::motor_quad),
            CommandDescriptor::reset(999),
        ];
        for descriptor in handled {
            registry.register(descriptor);
        }

        for &id in NOT_IMPLEMENTED_IDS {
            registry.register(CommandDescriptor::not_implemented(id, reserved_name(id)));
        }

        registry
    }

    /// Add or replace a descriptor. Returns the one it replaced.
    pub fn register(&mut self, descriptor: CommandDescriptor) -> Option<CommandDescriptor> {
        self.descriptors.insert(descriptor.id, descriptor)
    }

    pub fn get(&self, id: u32) -> Option<&CommandDescriptor> {
        self.descriptors.get(&id)
    }

    pub fn contains(&self, id: u32) -> bool {
        self.descriptors.contains_key(&id)
    }

    /// Descriptors in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &CommandDescriptor> {
        self.descriptors.values()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

/// Functional group of a reserved id, for listings.
fn reserved_name(id: u32) -> &'static str {
    match id {
        1..=11 => "reserved-pin-io",
        20..=22 => "reserved-sensor",
        30..=31 => "reserved-led",
        100..=105 => "reserved-stepper",
        201..=213 => "reserved-motor",
        220..=222 => "reserved-servo",
        250 => "reserved-gamepad",
        _ => "reserved",
    }
}
