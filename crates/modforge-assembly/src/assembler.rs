//! Orchestration of one assembly run
//!
//! A run walks `Idle → Loading → Resolving → Copying → Applying → Rendering →
//! Finalized`. Any error moves it straight to `Failed`, recorded together with
//! the phase it happened in. The project tree lives only inside the run until
//! it is finalized.

use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use tracing::{debug, info};

use crate::config::AssemblyConfig;
use crate::error::{AssemblyError, Result};
use crate::injector::CodeInjector;
use crate::manifest::{Catalogue, CatalogueHandle, ManifestLoader};
use crate::merger::ManifestMerger;
use crate::models::{
    MergedManifest, Module, ModuleManifest, OutputKind, Preset, ProjectTree, ResolvedPlan,
    SelectionRequest,
};
use crate::resolver::DependencyResolver;
use crate::templates::TemplateRenderer;

static PROJECT_NAME_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9_-]{0,63}$").expect("project name pattern is valid")
});

/// Phase of an assembly run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssemblyPhase {
    /// Request received, nothing done yet
    Idle,
    /// Looking up the preset and modules
    Loading,
    /// Ordering modules and merging manifests
    Resolving,
    /// Copying the preset's files into a fresh tree
    Copying,
    /// Overlaying module files and injecting directives
    Applying,
    /// Rendering template files
    Rendering,
    /// Run completed
    Finalized,
    /// Run aborted
    Failed,
}

impl AssemblyPhase {
    /// Whether no further transition is possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, AssemblyPhase::Finalized | AssemblyPhase::Failed)
    }

    /// Snake-case name
    pub fn as_str(&self) -> &'static str {
        match self {
            AssemblyPhase::Idle => "idle",
            AssemblyPhase::Loading => "loading",
            AssemblyPhase::Resolving => "resolving",
            AssemblyPhase::Copying => "copying",
            AssemblyPhase::Applying => "applying",
            AssemblyPhase::Rendering => "rendering",
            AssemblyPhase::Finalized => "finalized",
            AssemblyPhase::Failed => "failed",
        }
    }
}

impl fmt::Display for AssemblyPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a successful run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizedProject {
    /// Preset the project was built from
    pub preset: String,
    /// Project identifier
    pub project_name: String,
    /// Where the tree is headed
    pub output_kind: OutputKind,
    /// Modules in the order they were applied
    pub application_order: Vec<String>,
    /// The finished file tree
    pub tree: ProjectTree,
    /// Merged dependencies and environment
    pub merged_manifest: MergedManifest,
    /// Environment variables the project needs, sorted
    pub required_env: Vec<String>,
    /// Non-fatal notes gathered during the run
    pub warnings: Vec<String>,
    /// Phases the run went through
    pub phases: Vec<AssemblyPhase>,
}

/// Result of a failed run
#[derive(Debug)]
pub struct AssemblyFailure {
    /// Phase the error occurred in
    pub phase: AssemblyPhase,
    /// The error itself
    pub error: AssemblyError,
}

impl AssemblyFailure {
    /// Stable machine-readable error kind
    pub fn error_kind(&self) -> &'static str {
        self.error.kind()
    }

    /// Human-readable message
    pub fn message(&self) -> String {
        self.error.to_string()
    }

    /// Structured details
    pub fn details(&self) -> Value {
        self.error.details()
    }
}

impl fmt::Display for AssemblyFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "assembly failed while {}: {}", self.phase, self.error)
    }
}

impl std::error::Error for AssemblyFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

impl Serialize for AssemblyFailure {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("AssemblyFailure", 4)?;
        state.serialize_field("errorKind", self.error_kind())?;
        state.serialize_field("message", &self.message())?;
        state.serialize_field("details", &self.details())?;
        state.serialize_field("phase", &self.phase)?;
        state.end()
    }
}

/// Phase bookkeeping for one run
struct RunState {
    phase: AssemblyPhase,
    history: Vec<AssemblyPhase>,
}

impl RunState {
    fn new() -> Self {
        Self {
            phase: AssemblyPhase::Idle,
            history: vec![AssemblyPhase::Idle],
        }
    }

    fn enter(&mut self, phase: AssemblyPhase) {
        debug!(from = %self.phase, to = %phase, "Assembly phase transition");
        self.phase = phase;
        self.history.push(phase);
    }

    fn fail(mut self, error: AssemblyError) -> AssemblyFailure {
        let phase = self.phase;
        self.enter(AssemblyPhase::Failed);
        debug!(phase = %phase, kind = error.kind(), "Assembly failed");
        AssemblyFailure { phase, error }
    }
}

/// Preset and modules looked up for a request, with the resolved plan
struct Prepared<'c> {
    preset: &'c Preset,
    modules: Vec<&'c Module>,
    plan: ResolvedPlan,
}

/// Drives assembly runs against a shared catalogue
///
/// Every run takes its own catalogue snapshot and builds its own tree, so
/// concurrent runs share nothing mutable.
#[derive(Debug, Clone)]
pub struct ProjectAssembler {
    catalogue: CatalogueHandle,
    config: Arc<AssemblyConfig>,
}

impl ProjectAssembler {
    /// Create an assembler over an existing catalogue handle
    pub fn new(catalogue: CatalogueHandle, config: AssemblyConfig) -> Self {
        Self {
            catalogue,
            config: Arc::new(config),
        }
    }

    /// Load the catalogue named by the configuration
    pub fn from_config(config: AssemblyConfig) -> Result<Self> {
        config.validate()?;
        let loader = ManifestLoader::new(&config);
        let catalogue = CatalogueHandle::load(&config.catalogue_root, loader)?;
        Ok(Self::new(catalogue, config))
    }

    /// Catalogue handle, for listing and reloading
    pub fn catalogue(&self) -> &CatalogueHandle {
        &self.catalogue
    }

    /// Active configuration
    pub fn config(&self) -> &AssemblyConfig {
        &self.config
    }

    /// Validate a request and compute its plan without building anything
    pub fn plan(&self, request: &SelectionRequest) -> Result<ResolvedPlan> {
        let catalogue = self.catalogue.snapshot();
        let mut run = RunState::new();
        Ok(self.prepare(&catalogue, request, &mut run)?.plan)
    }

    /// Run one assembly to completion
    pub fn assemble(
        &self,
        request: &SelectionRequest,
    ) -> std::result::Result<FinalizedProject, AssemblyFailure> {
        let catalogue = self.catalogue.snapshot();
        let mut run = RunState::new();
        match self.run(&catalogue, request, &mut run) {
            Ok(project) => Ok(project),
            Err(error) => Err(run.fail(error)),
        }
    }

    /// Run one assembly on the blocking thread pool
    ///
    /// Dropping the returned future discards the run's result; nothing the run
    /// built is reachable afterwards.
    pub async fn assemble_async(
        &self,
        request: SelectionRequest,
    ) -> std::result::Result<FinalizedProject, AssemblyFailure> {
        let assembler = self.clone();
        tokio::task::spawn_blocking(move || assembler.assemble(&request))
            .await
            .unwrap_or_else(|err| {
                Err(AssemblyFailure {
                    phase: AssemblyPhase::Failed,
                    error: AssemblyError::Io(std::io::Error::other(format!(
                        "assembly task did not complete: {}",
                        err
                    ))),
                })
            })
    }

    fn run(
        &self,
        catalogue: &Catalogue,
        request: &SelectionRequest,
        run: &mut RunState,
    ) -> Result<FinalizedProject> {
        let Prepared {
            preset,
            modules,
            plan,
        } = self.prepare(catalogue, request, run)?;

        run.enter(AssemblyPhase::Copying);
        let mut tree = ProjectTree::new();
        for (path, file) in &preset.files {
            tree.insert(path.clone(), file.clone());
        }
        debug!(preset = %preset.name, files = tree.len(), "Copied preset files");

        run.enter(AssemblyPhase::Applying);
        let mut injector = CodeInjector::new();
        for module in &modules {
            for (path, file) in &module.files {
                if tree.insert(path.clone(), file.clone()) {
                    debug!(module = %module.name(), file = %path, "Module file overlays an earlier one");
                }
            }
            let applied = injector.apply_module(&module.manifest, &mut tree)?;
            debug!(
                module = %module.name(),
                files = module.files.len(),
                directives = applied,
                "Applied module"
            );
        }

        run.enter(AssemblyPhase::Rendering);
        let renderer = TemplateRenderer::for_request(request, self.config.strict_variables);
        let warnings = renderer.render_all(&mut tree)?;

        run.enter(AssemblyPhase::Finalized);
        let ResolvedPlan {
            application_order,
            merged,
            ..
        } = plan;
        info!(
            project = %request.project_name,
            preset = %preset.name,
            modules = application_order.len(),
            files = tree.len(),
            warnings = warnings.len(),
            "Project assembled"
        );

        Ok(FinalizedProject {
            preset: preset.name.clone(),
            project_name: request.project_name.clone(),
            output_kind: request.output_kind,
            application_order,
            tree,
            required_env: merged.env.iter().cloned().collect(),
            merged_manifest: merged,
            warnings,
            phases: run.history.clone(),
        })
    }

    /// Idle, Loading and Resolving: everything up to the plan
    fn prepare<'c>(
        &self,
        catalogue: &'c Catalogue,
        request: &SelectionRequest,
        run: &mut RunState,
    ) -> Result<Prepared<'c>> {
        validate_project_name(&request.project_name)?;

        run.enter(AssemblyPhase::Loading);
        let preset = catalogue
            .preset(&request.preset_name)
            .ok_or_else(|| AssemblyError::UnknownPreset(request.preset_name.clone()))?;

        let mut unknown = Vec::new();
        let mut manifests: Vec<&ModuleManifest> = Vec::with_capacity(request.module_names.len());
        for name in &request.module_names {
            match catalogue.manifest(name) {
                Some(manifest) => manifests.push(manifest),
                None => unknown.push(name.clone()),
            }
        }
        if !unknown.is_empty() {
            return Err(AssemblyError::UnknownModule(unknown));
        }

        run.enter(AssemblyPhase::Resolving);
        let application_order = DependencyResolver::resolve_manifests(&manifests)?;
        let modules: Vec<&Module> = application_order
            .iter()
            .filter_map(|name| catalogue.module(name))
            .collect();
        let ordered: Vec<&ModuleManifest> = modules.iter().map(|module| &module.manifest).collect();
        let merged = ManifestMerger::merge(&preset.name, &preset.manifest, &ordered)?;

        Ok(Prepared {
            preset,
            modules,
            plan: ResolvedPlan {
                application_order,
                merged,
                selection: request.clone(),
            },
        })
    }
}

/// Check a project name against the safe identifier pattern
pub fn validate_project_name(name: &str) -> Result<()> {
    if PROJECT_NAME_PATTERN.is_match(name) {
        Ok(())
    } else {
        Err(AssemblyError::InvalidRequest(format!(
            "project name '{}' must start with a letter and contain at most 64 letters, digits, '-' or '_'",
            name
        )))
    }
}
