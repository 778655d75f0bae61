/// Host capability to read and move keyboard focus.
///
/// The controller records [`FocusHost::focused`] when a modal opens and hands
/// the target back through a `RestoreFocus` signal once it has closed.
pub trait FocusHost {
    type Target: Clone + Send + 'static;

    /// The element that currently holds focus.
    fn focused(&self) -> Self::Target;

    /// Move focus to `target`.
    fn restore_focus(&mut self, target: Self::Target);
}
