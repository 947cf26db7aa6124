#![warn(missing_docs)]

//! Module composition and project assembly engine
//!
//! Builds a project from a preset plus optional feature modules: validates
//! the selection, orders modules deterministically, merges their manifests,
//! injects code at anchor markers and renders templates. Finished projects
//! are handed to a [`ProjectSink`].

pub mod assembler;
pub mod config;
pub mod error;
pub mod injector;
pub mod manifest;
pub mod merger;
pub mod models;
pub mod resolver;
pub mod sink;
pub mod templates;

// Re-export public API
pub use assembler::{
    validate_project_name, AssemblyFailure, AssemblyPhase, FinalizedProject, ProjectAssembler,
};
pub use config::{AssemblyConfig, ConfigManager, MarkerConfig};
pub use error::{AssemblyError, Result};
pub use injector::{inject_before_marker, CodeInjector};
pub use manifest::{Catalogue, CatalogueBuilder, CatalogueHandle, ManifestLoader};
pub use merger::{ManifestMerger, SimpleSpec};
pub use models::{
    AnchorDirective, BaseManifest, DependencyMap, DirectiveKind, FileContents, MergedManifest,
    Module, ModuleManifest, OutputKind, Preset, ProjectTree, ResolvedPlan, SelectionRequest,
    TreeFile, VersionResolution,
};
pub use resolver::DependencyResolver;
pub use sink::{DirectorySink, ProjectSink, SinkReport};
pub use templates::{CaseTransform, RenderResult, TemplateRenderer};
