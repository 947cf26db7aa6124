//! Catalogue loading from preset and module directories
//!
//! Layout under the catalogue root:
//!
//! ```text
//! presets/<dir>/preset.json
//! presets/<dir>/files/**
//! modules/<dir>/module.json
//! modules/<dir>/files/**
//! ```
//!
//! Files whose name ends with the template suffix are flagged as templates
//! and stored without the suffix.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::config::{AssemblyConfig, MarkerConfig};
use crate::error::{AssemblyError, Result};
use crate::manifest::catalogue::{Catalogue, CatalogueBuilder};
use crate::manifest::descriptor::{ModuleDescriptor, PresetDescriptor};
use crate::models::{FileContents, Module, ModuleManifest, Preset, TreeFile};

const PRESETS_DIR: &str = "presets";
const MODULES_DIR: &str = "modules";
const FILES_DIR: &str = "files";
const PRESET_DESCRIPTOR: &str = "preset.json";
const MODULE_DESCRIPTOR: &str = "module.json";

/// Parses preset and module descriptors into manifests
#[derive(Debug, Clone)]
pub struct ManifestLoader {
    template_suffix: String,
    markers: MarkerConfig,
}

impl ManifestLoader {
    /// Create a loader using the suffix and markers from `config`
    pub fn new(config: &AssemblyConfig) -> Self {
        Self {
            template_suffix: config.template_suffix.clone(),
            markers: config.markers.clone(),
        }
    }

    /// Parse a single `module.json` document
    ///
    /// `origin` is only used to label errors.
    pub fn parse_module(&self, json: &str, origin: &Path) -> Result<ModuleManifest> {
        ModuleDescriptor::parse(json, origin)?.into_manifest(origin, &self.markers)
    }

    /// Load every preset and module below `root`
    pub fn load_catalogue(&self, root: &Path) -> Result<Catalogue> {
        if !root.is_dir() {
            return Err(AssemblyError::manifest(root, "catalogue root is not a directory"));
        }

        let mut builder = CatalogueBuilder::default();

        for dir in subdirectories(&root.join(PRESETS_DIR))? {
            let origin = dir.join(PRESET_DESCRIPTOR);
            let preset = self.load_preset(&dir)?;
            debug!(preset = %preset.name, files = preset.files.len(), "Loaded preset");
            builder.preset_from(origin, preset);
        }

        for dir in subdirectories(&root.join(MODULES_DIR))? {
            let origin = dir.join(MODULE_DESCRIPTOR);
            let module = self.load_module(&dir)?;
            debug!(module = %module.name(), files = module.files.len(), "Loaded module");
            builder.module_from(origin, module);
        }

        builder.root(root.to_path_buf()).build()
    }

    /// Load one preset directory
    pub fn load_preset(&self, dir: &Path) -> Result<Preset> {
        let origin = dir.join(PRESET_DESCRIPTOR);
        let json = read_descriptor(&origin)?;
        let descriptor = PresetDescriptor::parse(&json, &origin)?;

        Ok(Preset {
            manifest: descriptor.base_manifest(),
            name: descriptor.name,
            description: descriptor.description,
            version: descriptor.version,
            files: self.load_files(&dir.join(FILES_DIR), &origin)?,
        })
    }

    /// Load one module directory
    pub fn load_module(&self, dir: &Path) -> Result<Module> {
        let origin = dir.join(MODULE_DESCRIPTOR);
        let json = read_descriptor(&origin)?;

        Ok(Module {
            manifest: self.parse_module(&json, &origin)?,
            files: self.load_files(&dir.join(FILES_DIR), &origin)?,
        })
    }

    /// Read every file under `files_dir` into memory, keyed by relative path
    fn load_files(&self, files_dir: &Path, origin: &Path) -> Result<BTreeMap<String, TreeFile>> {
        let mut files = BTreeMap::new();
        if !files_dir.is_dir() {
            return Ok(files);
        }

        for entry in WalkDir::new(files_dir).sort_by_file_name() {
            let entry = entry.map_err(|e| AssemblyError::manifest(origin, e.to_string()))?;
            if !entry.file_type().is_file() {
                continue;
            }

            let relative = entry
                .path()
                .strip_prefix(files_dir)
                .map_err(|e| AssemblyError::manifest(origin, e.to_string()))?;
            let relative = to_tree_path(relative).ok_or_else(|| {
                AssemblyError::manifest(
                    origin,
                    format!("file name is not valid UTF-8: {}", entry.path().display()),
                )
            })?;

            let contents = FileContents::from_bytes(fs::read(entry.path())?);
            let stripped = relative
                .strip_suffix(self.template_suffix.as_str())
                .filter(|stripped| !stripped.is_empty() && !stripped.ends_with('/'))
                .map(str::to_string);

            let (path, file) = match stripped {
                Some(stripped) => {
                    if contents.as_text().is_none() {
                        return Err(AssemblyError::manifest(
                            origin,
                            format!("template {} is not valid UTF-8", relative),
                        ));
                    }
                    (stripped, TreeFile { contents, template: true })
                }
                None => (relative, TreeFile { contents, template: false }),
            };

            if files.insert(path.clone(), file).is_some() {
                return Err(AssemblyError::manifest(
                    origin,
                    format!("{} is provided both as a template and as a plain file", path),
                ));
            }
        }

        Ok(files)
    }
}

fn read_descriptor(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| AssemblyError::manifest(path, e.to_string()))
}

/// Immediate subdirectories of `dir`, sorted; a missing directory has none
fn subdirectories(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut dirs = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            dirs.push(entry.path());
        }
    }
    dirs.sort();
    Ok(dirs)
}

/// Forward-slash path string for a relative filesystem path
fn to_tree_path(path: &Path) -> Option<String> {
    let parts = path
        .components()
        .map(|component| component.as_os_str().to_str())
        .collect::<Option<Vec<_>>>()?;
    Some(parts.join("/"))
}
