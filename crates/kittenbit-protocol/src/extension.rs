use crate::actuator::Actuators;
use crate::response::Response;

/// Owner of the `X` command class.
///
/// The body after the `X` is opaque to the dispatcher and passed through
/// untouched. Returning `None` writes nothing. Handlers must be `Send` so a
/// [`Dispatcher`](crate::Dispatcher) can move onto another thread or task.
pub trait ExtensionHandler: Send {
    fn handle(&mut self, body: &str, actuators: &mut dyn Actuators) -> Option<Response>;
}

impl<F> ExtensionHandler for F
where
    F: FnMut(&str, &mut dyn Actuators) -> Option<Response> + Send,
{
    fn handle(&mut self, body: &str, actuators: &mut dyn Actuators) -> Option<Response> {
        self(body, actuators)
    }
}
