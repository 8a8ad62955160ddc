//! Built-in widgets.

pub mod input;
pub mod loader;

pub use input::Input;
pub use loader::Loader;
