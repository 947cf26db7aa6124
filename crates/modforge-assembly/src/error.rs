//! Error types for project assembly

use std::path::PathBuf;

use serde_json::{json, Value};
use thiserror::Error;

/// Result type used throughout the assembly engine
pub type Result<T> = std::result::Result<T, AssemblyError>;

/// Errors that can occur while composing a project
///
/// Every variant is fatal to the run it occurred in. None of them are
/// retried internally: the inputs are deterministic, so the caller has to
/// change the selection request before resubmitting.
#[derive(Debug, Error)]
pub enum AssemblyError {
    /// A preset or module descriptor could not be parsed or failed validation
    #[error("Invalid manifest {path}: {message}")]
    ManifestParse {
        /// Descriptor the problem was found in
        path: PathBuf,
        /// What was wrong with it
        message: String,
    },

    /// A selected module requires modules that are not part of the selection
    #[error("Module '{module}' requires missing modules: {}", missing.join(", "))]
    MissingDependency {
        /// Module whose `requires` set is unmet
        module: String,
        /// Required modules absent from the selection, sorted
        missing: Vec<String>,
    },

    /// Two selected modules conflict with each other
    #[error("Modules '{first}' and '{second}' conflict")]
    Conflict {
        /// Lexicographically smaller module of the pair
        first: String,
        /// Lexicographically larger module of the pair
        second: String,
    },

    /// Two version specs for the same package cannot be reconciled
    #[error(
        "Cannot reconcile versions for package '{package}': '{existing}' vs '{incoming}' (from {contributor})"
    )]
    DependencyVersionConflict {
        /// Package name
        package: String,
        /// Spec already recorded
        existing: String,
        /// Spec declared by the later contributor
        incoming: String,
        /// Module (or preset) that declared the incoming spec
        contributor: String,
    },

    /// An injection marker is absent from its target file
    #[error("Anchor '{marker}' not found in {file} (module '{module}')")]
    AnchorNotFound {
        /// Module declaring the directive
        module: String,
        /// Target file path inside the project tree
        file: String,
        /// Marker text that was searched for
        marker: String,
    },

    /// A template placeholder has no supplied value
    #[error("Unresolved variable '{variable}' in {file}")]
    UnresolvedVariable {
        /// Template file containing the placeholder
        file: String,
        /// Placeholder name
        variable: String,
    },

    /// The requested preset is not in the catalogue
    #[error("Unknown preset: {0}")]
    UnknownPreset(String),

    /// One or more requested modules are not in the catalogue
    #[error("Unknown modules: {}", .0.join(", "))]
    UnknownModule(Vec<String>),

    /// The selection request itself is malformed
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The `requires` relation among selected modules contains a cycle
    #[error("Dependency cycle between modules: {}", .0.join(", "))]
    DependencyCycle(Vec<String>),

    /// A template file uses unsupported placeholder syntax
    #[error("Invalid template {file}: {message}")]
    InvalidTemplate {
        /// Template file path
        file: String,
        /// Syntax problem
        message: String,
    },

    /// Configuration could not be loaded or failed validation
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AssemblyError {
    /// Stable machine-readable kind, surfaced to callers unchanged
    pub fn kind(&self) -> &'static str {
        match self {
            AssemblyError::ManifestParse { .. } => "manifest_parse",
            AssemblyError::MissingDependency { .. } => "missing_dependency",
            AssemblyError::Conflict { .. } => "conflict",
            AssemblyError::DependencyVersionConflict { .. } => "dependency_version_conflict",
            AssemblyError::AnchorNotFound { .. } => "anchor_not_found",
            AssemblyError::UnresolvedVariable { .. } => "unresolved_variable",
            AssemblyError::UnknownPreset(_) => "unknown_preset",
            AssemblyError::UnknownModule(_) => "unknown_module",
            AssemblyError::InvalidRequest(_) => "invalid_request",
            AssemblyError::DependencyCycle(_) => "dependency_cycle",
            AssemblyError::InvalidTemplate { .. } => "invalid_template",
            AssemblyError::Config(_) => "config",
            AssemblyError::Io(_) => "io",
        }
    }

    /// Structured details for the failure payload
    pub fn details(&self) -> Value {
        match self {
            AssemblyError::ManifestParse { path, .. } => json!({ "path": path }),
            AssemblyError::MissingDependency { module, missing } => {
                json!({ "module": module, "missing": missing })
            }
            AssemblyError::Conflict { first, second } => json!({ "modules": [first, second] }),
            AssemblyError::DependencyVersionConflict {
                package,
                existing,
                incoming,
                contributor,
            } => json!({
                "package": package,
                "specs": [existing, incoming],
                "contributor": contributor,
            }),
            AssemblyError::AnchorNotFound {
                module,
                file,
                marker,
            } => json!({ "module": module, "file": file, "marker": marker }),
            AssemblyError::UnresolvedVariable { file, variable } => {
                json!({ "file": file, "variable": variable })
            }
            AssemblyError::UnknownPreset(name) => json!({ "preset": name }),
            AssemblyError::UnknownModule(names) => json!({ "modules": names }),
            AssemblyError::DependencyCycle(names) => json!({ "modules": names }),
            AssemblyError::InvalidTemplate { file, .. } => json!({ "file": file }),
            AssemblyError::InvalidRequest(_) | AssemblyError::Config(_) | AssemblyError::Io(_) => {
                Value::Null
            }
        }
    }

    pub(crate) fn manifest(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        AssemblyError::ManifestParse {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl From<config::ConfigError> for AssemblyError {
    fn from(err: config::ConfigError) -> Self {
        AssemblyError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for AssemblyError {
    fn from(err: toml::ser::Error) -> Self {
        AssemblyError::Config(err.to_string())
    }
}
