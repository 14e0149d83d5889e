//! Command protocol for the kittenbit robot controller.
//!
//! A host sends newline-delimited ASCII requests; the first character picks the
//! command class:
//! - `M<id> <args...>`: built-in motor/IO commands, looked up in a [`CommandRegistry`]
//! - `X<body>`: handed to the single installed [`ExtensionHandler`], if any
//!
//! The [`Dispatcher`] parses, validates and runs one frame at a time against an
//! [`Actuators`] binding and produces an [`Outcome`]. Nothing here raises: every
//! input ends in silence or an explicit [`Response`]. [`Session`] drives a dispatcher
//! over a byte stream.

pub mod actuator;
pub mod command;
pub mod dispatcher;
pub mod error;
pub mod extension;
pub mod handlers;
pub mod motors;
pub mod registry;
pub mod response;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

pub use actuator::Actuators;
pub use command::{parse_lenient_int, ArgumentMode, Arguments, Command, CommandId, SEPARATOR};
pub use dispatcher::{
    Dispatcher, DispatcherConfig, DropReason, Outcome, COMMAND_CLASS, EXTENSION_CLASS, FIRMWARE,
};
pub use error::{ArgumentError, SessionError};
pub use extension::ExtensionHandler;
pub use motors::{Motor, Terminal};
pub use registry::{
    CommandContext, CommandDescriptor, CommandKind, CommandRegistry, HandlerFn, HandlerResult,
    NOT_IMPLEMENTED_IDS,
};
pub use response::{LineEnding, Response};
pub use session::{Session, SessionConfig, SessionSummary};
