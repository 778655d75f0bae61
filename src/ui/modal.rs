//! Modal trait for ephemeral overlay dialogs.

use crossterm::event::{KeyEvent, MouseEvent};
use ratatui::Frame;
use ratatui::layout::Rect;

use crate::Theme;
use crate::ui::{Handled, Result};

/// Ephemeral overlay that blocks the screen below.
///
/// Modals are transient views for specific tasks like confirmations or
/// input forms. They capture all input until dismissed.
///
/// # Examples
///
/// - `FormDialog` - the application form
pub trait Modal {
    /// The message type this modal emits
    type Msg;

    /// Handle a key event.
    ///
    /// Returns `Ok(Handled::...)` where:
    /// - `Ignored` - key was not handled (unusual for modals)
    /// - `Consumed` - key was handled but produced no message
    /// - `Event(msg)` - key was handled and produced a message
    ///
    /// Returns `Err(...)` if an error occurred during handling.
    fn handle_key(&mut self, key: KeyEvent) -> Result<Handled<Self::Msg>>;

    /// Handle a mouse event. Clicks outside the modal belong to the modal too.
    fn handle_mouse(&mut self, mouse: MouseEvent) -> Result<Handled<Self::Msg>> {
        _ = mouse;
        Ok(Handled::Consumed)
    }

    /// Handle bracketed-paste text.
    fn handle_paste(&mut self, text: &str) -> Result<Handled<Self::Msg>> {
        _ = text;
        Ok(Handled::Consumed)
    }

    /// Render the modal (typically as a centered overlay).
    fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme);

    /// Title shown in the modal header (optional).
    fn title(&self) -> Option<&str> {
        None
    }
}
