//! Full-screen terminal UI runtime for line-oriented chat applications.
//!
//! Invariant: single output gate. Only `core::output::OutputGate::flush(..)` writes to the
//! terminal.
//!
//! # Public API Overview
//! - Implement [`Component`] for the root view and hand it to [`TUI`].
//! - Dispatch work from worker threads through a [`RuntimeHandle`]; custom commands run on the
//!   UI thread between input handling and rendering.
//! - Use the text helpers for width-correct wrapping and truncation of CJK and emoji text.

pub mod core;
pub mod platform;
pub mod render;
pub mod runtime;
pub mod widgets;

/// Built-in UI components.
pub use crate::widgets::{Input, Loader};

pub use crate::core::component::Component;
pub use crate::core::input_event::InputEvent;
pub use crate::core::terminal::Terminal;
pub use crate::platform::process_terminal::ProcessTerminal;

/// Runtime command plumbing.
pub use crate::runtime::{
    Command, CustomCommand, CustomCommandCtx, CustomCommandError, RenderHandle, RuntimeHandle,
};

/// Alias for the main runtime type.
pub type TUI<T> = crate::runtime::tui::TuiRuntime<T>;

/// ANSI-aware truncation helper.
pub use crate::core::text::width::truncate_to_width;
/// Visible width helper that ignores ANSI control sequences.
pub use crate::core::text::width::visible_width;
/// Word wrapping helper.
pub use crate::core::text::wrap::wrap_text;
/// Escape-sequence stripping helper.
pub use crate::core::text::ansi::strip_ansi;
