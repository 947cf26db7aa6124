//! Read-only catalogue snapshot of presets and modules
//!
//! The catalogue is the only state shared between assembly runs. It is built
//! once, never mutated, and replaced wholesale by [`CatalogueHandle::reload`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::error::{AssemblyError, Result};
use crate::manifest::descriptor::validate_directives;
use crate::manifest::loader::ManifestLoader;
use crate::models::{Module, ModuleManifest, Preset};

/// Immutable set of presets and modules
#[derive(Debug, Clone, Default)]
pub struct Catalogue {
    presets: BTreeMap<String, Preset>,
    modules: BTreeMap<String, Module>,
    root: Option<PathBuf>,
}

impl Catalogue {
    /// Start building an in-memory catalogue
    pub fn builder() -> CatalogueBuilder {
        CatalogueBuilder::default()
    }

    /// Preset by name
    pub fn preset(&self, name: &str) -> Option<&Preset> {
        self.presets.get(name)
    }

    /// Module by name
    pub fn module(&self, name: &str) -> Option<&Module> {
        self.modules.get(name)
    }

    /// Module manifest by name
    pub fn manifest(&self, name: &str) -> Option<&ModuleManifest> {
        self.modules.get(name).map(|module| &module.manifest)
    }

    /// All presets, sorted by name
    pub fn presets(&self) -> impl Iterator<Item = &Preset> {
        self.presets.values()
    }

    /// All modules, sorted by name
    pub fn modules(&self) -> impl Iterator<Item = &Module> {
        self.modules.values()
    }

    /// Directory the catalogue was loaded from, if any
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }
}

/// Collects presets and modules and validates them as a whole
#[derive(Debug, Default)]
pub struct CatalogueBuilder {
    presets: Vec<(PathBuf, Preset)>,
    modules: Vec<(PathBuf, Module)>,
    root: Option<PathBuf>,
}

impl CatalogueBuilder {
    /// Add a preset defined in memory
    pub fn preset(mut self, preset: Preset) -> Self {
        let origin = PathBuf::from(format!("<preset:{}>", preset.name));
        self.presets.push((origin, preset));
        self
    }

    /// Add a module defined in memory
    pub fn module(mut self, module: Module) -> Self {
        let origin = PathBuf::from(format!("<module:{}>", module.manifest.name));
        self.modules.push((origin, module));
        self
    }

    pub(crate) fn preset_from(&mut self, origin: PathBuf, preset: Preset) {
        self.presets.push((origin, preset));
    }

    pub(crate) fn module_from(&mut self, origin: PathBuf, module: Module) {
        self.modules.push((origin, module));
    }

    pub(crate) fn root(mut self, root: PathBuf) -> Self {
        self.root = Some(root);
        self
    }

    /// Validate and freeze the catalogue
    pub fn build(self) -> Result<Catalogue> {
        let mut presets = BTreeMap::new();
        for (origin, preset) in self.presets {
            if preset.name.trim().is_empty() {
                return Err(AssemblyError::manifest(origin, "preset name is empty"));
            }
            if presets.contains_key(&preset.name) {
                return Err(AssemblyError::manifest(
                    origin,
                    format!("duplicate preset name '{}'", preset.name),
                ));
            }
            presets.insert(preset.name.clone(), preset);
        }

        let mut modules = BTreeMap::new();
        for (origin, module) in self.modules {
            validate_manifest(&origin, &module.manifest)?;
            if modules.contains_key(&module.manifest.name) {
                return Err(AssemblyError::manifest(
                    origin,
                    format!("duplicate module name '{}'", module.manifest.name),
                ));
            }
            modules.insert(module.manifest.name.clone(), module);
        }

        for module in modules.values() {
            let manifest = &module.manifest;
            for name in manifest.requires.iter().chain(&manifest.conflicts) {
                if !modules.contains_key(name) {
                    warn!(
                        module = %manifest.name,
                        reference = %name,
                        "Module references a name that is not in the catalogue"
                    );
                }
            }
        }

        debug!(
            presets = presets.len(),
            modules = modules.len(),
            "Catalogue built"
        );

        Ok(Catalogue {
            presets,
            modules,
            root: self.root,
        })
    }
}

fn validate_manifest(origin: &Path, manifest: &ModuleManifest) -> Result<()> {
    if manifest.name.trim().is_empty() {
        return Err(AssemblyError::manifest(origin, "module name is empty"));
    }
    if manifest.requires.contains(&manifest.name) {
        return Err(AssemblyError::manifest(origin, "module requires itself"));
    }
    if manifest.conflicts.contains(&manifest.name) {
        return Err(AssemblyError::manifest(origin, "module conflicts with itself"));
    }
    if let Some(both) = manifest.requires.intersection(&manifest.conflicts).next() {
        return Err(AssemblyError::manifest(
            origin,
            format!("module both requires and conflicts with '{}'", both),
        ));
    }
    validate_directives(origin, manifest)
}

/// Shared handle to the current catalogue snapshot
///
/// Readers take an `Arc` snapshot and keep it for the whole run, so a reload
/// never changes the catalogue underneath an in-flight assembly.
#[derive(Debug, Clone)]
pub struct CatalogueHandle {
    current: Arc<RwLock<Arc<Catalogue>>>,
    loader: ManifestLoader,
}

impl CatalogueHandle {
    /// Wrap an already built catalogue
    pub fn new(catalogue: Catalogue, loader: ManifestLoader) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(catalogue))),
            loader,
        }
    }

    /// Load a catalogue from disk and wrap it
    pub fn load(root: impl AsRef<Path>, loader: ManifestLoader) -> Result<Self> {
        let catalogue = loader.load_catalogue(root.as_ref())?;
        Ok(Self::new(catalogue, loader))
    }

    /// Current snapshot
    pub fn snapshot(&self) -> Arc<Catalogue> {
        Arc::clone(&*self.current.read())
    }

    /// Re-read the catalogue from its root directory
    ///
    /// The snapshot is swapped only when the whole catalogue loads; on error
    /// the previous snapshot stays in place.
    pub fn reload(&self) -> Result<Arc<Catalogue>> {
        let root = self
            .snapshot()
            .root()
            .map(Path::to_path_buf)
            .ok_or_else(|| {
                AssemblyError::Config("catalogue was built in memory and has no root to reload".to_string())
            })?;

        let fresh = Arc::new(self.loader.load_catalogue(&root)?);
        *self.current.write() = Arc::clone(&fresh);
        info!(root = %root.display(), "Catalogue reloaded");
        Ok(fresh)
    }

    /// Swap in a catalogue built elsewhere
    pub fn replace(&self, catalogue: Catalogue) {
        *self.current.write() = Arc::new(catalogue);
    }
}
