/// Outcome of offering a key to a component.
///
/// Views try components in order and fall through on `NotHandled`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyResult<T> {
  /// Consumed, nothing for the parent to do
  Handled,
  /// Consumed, and the parent should react to this event
  Event(T),
  /// Not consumed, try the next handler
  NotHandled,
}
