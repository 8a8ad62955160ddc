//! Text helpers (ANSI parsing, width calculations, wrapping, truncation).
//!
//! These helpers are pure (string in/string out) so widgets can depend on them without importing
//! anything from the render layer.

pub mod ansi;
pub mod width;
pub mod wrap;
