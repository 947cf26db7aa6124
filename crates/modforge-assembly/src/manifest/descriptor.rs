//! On-disk descriptor shapes and their conversion into manifests

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::Deserialize;

use crate::config::MarkerConfig;
use crate::error::{AssemblyError, Result};
use crate::models::{AnchorDirective, BaseManifest, DependencyMap, DirectiveKind, ModuleManifest};

fn default_version() -> String {
    "0.0.0".to_string()
}

/// `module.json`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ModuleDescriptor {
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default = "default_version")]
    version: String,
    #[serde(default)]
    deps: DependencyMap,
    #[serde(default)]
    dev_deps: DependencyMap,
    #[serde(default)]
    env: Vec<String>,
    #[serde(default)]
    inject: BTreeMap<String, BTreeMap<String, InjectEntry>>,
    #[serde(default)]
    conflicts: Vec<String>,
    #[serde(default)]
    requires: Vec<String>,
}

/// One kind's entry under a target file: bare lines, or lines with their own marker
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InjectEntry {
    Lines(Vec<String>),
    Anchored { marker: String, lines: Vec<String> },
}

/// `preset.json`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PresetDescriptor {
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) description: String,
    #[serde(default = "default_version")]
    pub(crate) version: String,
    #[serde(default)]
    deps: DependencyMap,
    #[serde(default)]
    dev_deps: DependencyMap,
    #[serde(default)]
    env: Vec<String>,
}

impl PresetDescriptor {
    pub(crate) fn parse(json: &str, origin: &Path) -> Result<Self> {
        let descriptor: Self = serde_json::from_str(json)
            .map_err(|e| AssemblyError::manifest(origin, e.to_string()))?;
        if descriptor.name.trim().is_empty() {
            return Err(AssemblyError::manifest(origin, "preset name is empty"));
        }
        Ok(descriptor)
    }

    pub(crate) fn base_manifest(&self) -> BaseManifest {
        BaseManifest {
            deps: self.deps.clone(),
            dev_deps: self.dev_deps.clone(),
            env: self.env.iter().cloned().collect(),
        }
    }
}

impl ModuleDescriptor {
    pub(crate) fn parse(json: &str, origin: &Path) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| AssemblyError::manifest(origin, e.to_string()))
    }

    /// Resolve markers and produce the immutable manifest
    pub(crate) fn into_manifest(self, origin: &Path, markers: &MarkerConfig) -> Result<ModuleManifest> {
        let mut inject = BTreeMap::new();

        for (target_file, entries) in self.inject {
            let mut directives = Vec::with_capacity(entries.len());
            for (key, entry) in entries {
                let kind = DirectiveKind::from_key(&key);
                let (anchor_marker, lines) = match entry {
                    InjectEntry::Anchored { marker, lines } => (marker, lines),
                    InjectEntry::Lines(lines) => {
                        let marker = markers.default_for(&kind).ok_or_else(|| {
                            AssemblyError::manifest(
                                origin,
                                format!("custom directive '{}' for {} needs an explicit marker", key, target_file),
                            )
                        })?;
                        (marker.to_string(), lines)
                    }
                };

                directives.push(AnchorDirective {
                    target_file: target_file.clone(),
                    kind,
                    lines,
                    anchor_marker,
                });
            }
            directives.sort_by(|a, b| a.kind.cmp(&b.kind));
            inject.insert(target_file, directives);
        }

        let manifest = ModuleManifest {
            name: self.name,
            description: self.description,
            version: self.version,
            deps: self.deps,
            dev_deps: self.dev_deps,
            env: self.env.into_iter().collect(),
            inject,
            conflicts: self.conflicts.into_iter().collect::<BTreeSet<_>>(),
            requires: self.requires.into_iter().collect::<BTreeSet<_>>(),
        };
        validate_directives(origin, &manifest)?;
        Ok(manifest)
    }
}

/// Check every injection directive of a manifest
///
/// Applies to manifests parsed from disk and to manifests built in memory.
pub(crate) fn validate_directives(origin: &Path, manifest: &ModuleManifest) -> Result<()> {
    for (target_file, directives) in &manifest.inject {
        if !is_project_relative(target_file) {
            return Err(AssemblyError::manifest(
                origin,
                format!("injection target '{}' must be a relative path inside the project", target_file),
            ));
        }

        for directive in directives {
            if directive.target_file != *target_file {
                return Err(AssemblyError::manifest(
                    origin,
                    format!(
                        "directive '{}' is listed under {} but targets {}",
                        directive.kind, target_file, directive.target_file
                    ),
                ));
            }
            if directive.lines.is_empty() {
                return Err(AssemblyError::manifest(
                    origin,
                    format!("directive '{}' for {} has no lines", directive.kind, target_file),
                ));
            }
            if directive.anchor_marker.trim().is_empty() {
                return Err(AssemblyError::manifest(
                    origin,
                    format!("directive '{}' for {} has an empty marker", directive.kind, target_file),
                ));
            }
        }
    }
    Ok(())
}

/// Relative, forward-slash path that cannot escape the project root
pub(crate) fn is_project_relative(path: &str) -> bool {
    !path.is_empty()
        && !path.starts_with('/')
        && !path.contains('\\')
        && !Path::new(path).is_absolute()
        && path.split('/').all(|part| !part.is_empty() && part != "." && part != "..")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> &'static Path {
        Path::new("modules/auth/module.json")
    }

    #[test]
    fn test_bare_lines_use_default_markers() {
        let json = r#"{
            "name": "auth",
            "inject": {
                "src/app.module.ts": {
                    "register": ["AuthModule,"],
                    "import": ["import { AuthModule } from './auth';"]
                }
            }
        }"#;
        let manifest = ModuleDescriptor::parse(json, origin())
            .unwrap()
            .into_manifest(origin(), &MarkerConfig::default())
            .unwrap();

        let directives = &manifest.inject["src/app.module.ts"];
        assert_eq!(directives.len(), 2);
        assert_eq!(directives[0].kind, DirectiveKind::Import);
        assert_eq!(directives[0].anchor_marker, "// IMPORTS");
        assert_eq!(directives[1].kind, DirectiveKind::Register);
        assert_eq!(directives[1].anchor_marker, "// MODULES");
        assert_eq!(manifest.version, "0.0.0");
    }

    #[test]
    fn test_explicit_marker_overrides_default() {
        let json = r#"{
            "name": "auth",
            "inject": {
                "src/main.ts": { "register": { "marker": "/* PLUGINS */", "lines": ["app.use(auth);"] } }
            }
        }"#;
        let manifest = ModuleDescriptor::parse(json, origin())
            .unwrap()
            .into_manifest(origin(), &MarkerConfig::default())
            .unwrap();
        assert_eq!(manifest.inject["src/main.ts"][0].anchor_marker, "/* PLUGINS */");
    }

    #[test]
    fn test_custom_kind_requires_marker() {
        let json = r#"{ "name": "auth", "inject": { "src/routes.ts": { "routes": ["authRoutes,"] } } }"#;
        let err = ModuleDescriptor::parse(json, origin())
            .unwrap()
            .into_manifest(origin(), &MarkerConfig::default())
            .unwrap_err();
        assert!(matches!(err, AssemblyError::ManifestParse { .. }));
    }

    #[test]
    fn test_missing_name_is_parse_error() {
        let err = ModuleDescriptor::parse(r#"{ "description": "x" }"#, origin()).unwrap_err();
        assert_eq!(err.kind(), "manifest_parse");
    }

    #[test]
    fn test_escaping_target_rejected() {
        let json = r#"{ "name": "auth", "inject": { "../etc/passwd": { "import": ["x"] } } }"#;
        let err = ModuleDescriptor::parse(json, origin())
            .unwrap()
            .into_manifest(origin(), &MarkerConfig::default())
            .unwrap_err();
        assert!(err.to_string().contains("relative path"));
    }

    #[test]
    fn test_directive_without_lines_rejected() {
        let json = r#"{ "name": "auth", "inject": { "src/app.module.ts": { "import": [] } } }"#;
        let err = ModuleDescriptor::parse(json, origin())
            .unwrap()
            .into_manifest(origin(), &MarkerConfig::default())
            .unwrap_err();
        assert!(err.to_string().contains("has no lines"));
    }

    #[test]
    fn test_is_project_relative() {
        assert!(is_project_relative("src/app.module.ts"));
        assert!(!is_project_relative("/src/app.ts"));
        assert!(!is_project_relative("src/../../x"));
        assert!(!is_project_relative("src//x"));
        assert!(!is_project_relative(""));
    }
}
