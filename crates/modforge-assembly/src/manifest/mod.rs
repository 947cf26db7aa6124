//! Preset and module manifests
//!
//! Provides descriptor parsing, on-disk catalogue loading and the shared
//! read-only catalogue snapshot.

pub mod catalogue;
mod descriptor;
pub mod loader;

pub use catalogue::{Catalogue, CatalogueBuilder, CatalogueHandle};
pub use loader::ManifestLoader;
pub(crate) use descriptor::is_project_relative;
