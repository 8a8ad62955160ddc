//! Component trait.

use crate::core::input_event::InputEvent;

/// Renderable component interface.
pub trait Component {
    /// Render to a list of lines at the given width.
    fn render(&mut self, width: usize) -> Vec<String>;

    /// Handle input events.
    fn handle_event(&mut self, _event: &InputEvent) {}

    /// Invalidate any cached state.
    fn invalidate(&mut self) {}

    /// Provide the current terminal row count (optional).
    ///
    /// Full-screen components use this to size their scrollable viewport.
    fn set_terminal_rows(&mut self, _rows: usize) {}
}
