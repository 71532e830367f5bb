//! Editable timeline assembly and the render instruction set.

/// Composition model and builder.
pub mod composition;
/// Render program built from a composition and its crop geometry.
pub mod program;
