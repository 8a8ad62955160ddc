//! Rendering layer.

pub mod renderer;

pub use renderer::DiffRenderer;
