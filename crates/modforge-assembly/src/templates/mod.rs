//! Template rendering for project files
//!
//! Provides placeholder parsing, case filters, and whole-tree rendering.

pub mod placeholder;
pub mod renderer;

// Re-export public API
pub use placeholder::{CaseTransform, Placeholder};
pub use renderer::{RenderResult, TemplateRenderer, AUTHOR_VAR, PROJECT_NAME_VAR};
