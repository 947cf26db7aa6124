//! Core data models for project assembly

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

/// Package name to version-spec mapping
pub type DependencyMap = BTreeMap<String, String>;

/// Kind of an injection directive
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DirectiveKind {
    /// Import statements, usually at the top of a file
    Import,
    /// Registration calls, e.g. entries in a module list
    Register,
    /// Any other kind; always carries an explicit marker
    #[serde(untagged)]
    Custom(String),
}

impl DirectiveKind {
    /// Parse a kind from its descriptor key
    pub fn from_key(key: &str) -> Self {
        match key {
            "import" => DirectiveKind::Import,
            "register" => DirectiveKind::Register,
            other => DirectiveKind::Custom(other.to_string()),
        }
    }

    /// Descriptor key for this kind
    pub fn as_str(&self) -> &str {
        match self {
            DirectiveKind::Import => "import",
            DirectiveKind::Register => "register",
            DirectiveKind::Custom(name) => name,
        }
    }
}

impl fmt::Display for DirectiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A declarative code edit: insert `lines` next to `anchor_marker` in `target_file`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnchorDirective {
    /// Path of the file to edit, relative to the project root
    pub target_file: String,
    /// Directive kind
    pub kind: DirectiveKind,
    /// Lines to insert, in order
    pub lines: Vec<String>,
    /// Sentinel text the lines attach to
    pub anchor_marker: String,
}

/// Descriptor of an optional feature module
///
/// Immutable once loaded into a catalogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleManifest {
    /// Unique module name
    pub name: String,
    /// Human-readable description
    pub description: String,
    /// Module version
    pub version: String,
    /// Runtime dependencies
    pub deps: DependencyMap,
    /// Development dependencies
    pub dev_deps: DependencyMap,
    /// Required environment variable names
    pub env: BTreeSet<String>,
    /// Injection directives keyed by target file
    pub inject: BTreeMap<String, Vec<AnchorDirective>>,
    /// Modules this one cannot be combined with
    pub conflicts: BTreeSet<String>,
    /// Modules that must be selected alongside this one
    pub requires: BTreeSet<String>,
}

impl ModuleManifest {
    /// Create an empty manifest with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            version: "0.0.0".to_string(),
            deps: DependencyMap::new(),
            dev_deps: DependencyMap::new(),
            env: BTreeSet::new(),
            inject: BTreeMap::new(),
            conflicts: BTreeSet::new(),
            requires: BTreeSet::new(),
        }
    }

    /// All directives in application order: by target file, then by kind
    pub fn directives(&self) -> impl Iterator<Item = &AnchorDirective> {
        self.inject.values().flatten()
    }
}

/// Contents of a file in a project tree
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FileContents {
    /// UTF-8 text
    Text(String),
    /// Anything that is not valid UTF-8
    Binary(Vec<u8>),
}

impl FileContents {
    /// Build contents from raw bytes, keeping text when it is valid UTF-8
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        match String::from_utf8(bytes) {
            Ok(text) => FileContents::Text(text),
            Err(err) => FileContents::Binary(err.into_bytes()),
        }
    }

    /// Text view, if this is a text file
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FileContents::Text(text) => Some(text),
            FileContents::Binary(_) => None,
        }
    }

    /// Raw bytes
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            FileContents::Text(text) => text.as_bytes(),
            FileContents::Binary(bytes) => bytes,
        }
    }
}

/// A file carried by a preset, a module, or a project tree
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TreeFile {
    /// File contents
    pub contents: FileContents,
    /// Whether placeholders in this file are rendered
    pub template: bool,
}

impl TreeFile {
    /// A plain text file
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            contents: FileContents::Text(content.into()),
            template: false,
        }
    }

    /// A text file flagged as a template
    pub fn template(content: impl Into<String>) -> Self {
        Self {
            contents: FileContents::Text(content.into()),
            template: true,
        }
    }
}

/// Dependencies and environment a preset contributes unconditionally
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseManifest {
    /// Runtime dependencies
    pub deps: DependencyMap,
    /// Development dependencies
    pub dev_deps: DependencyMap,
    /// Required environment variable names
    pub env: BTreeSet<String>,
}

/// The base project skeleton modules are layered onto
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preset {
    /// Unique preset name
    pub name: String,
    /// Human-readable description
    pub description: String,
    /// Preset version
    pub version: String,
    /// Default manifest
    pub manifest: BaseManifest,
    /// Base files keyed by project-relative path
    pub files: BTreeMap<String, TreeFile>,
}

impl Preset {
    /// Create an empty preset
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            version: "0.0.0".to_string(),
            manifest: BaseManifest::default(),
            files: BTreeMap::new(),
        }
    }
}

/// A module together with the files it contributes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    /// Parsed descriptor
    pub manifest: ModuleManifest,
    /// Files keyed by project-relative path
    pub files: BTreeMap<String, TreeFile>,
}

impl Module {
    /// Module name
    pub fn name(&self) -> &str {
        &self.manifest.name
    }
}

/// Where the finished tree is headed once finalized
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    /// Packaged into a zip archive
    #[default]
    Zip,
    /// Pushed to a remote repository
    Github,
}

/// What the caller asked to assemble
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionRequest {
    /// Preset to start from
    pub preset_name: String,
    /// Selected modules; input order carries no meaning
    #[serde(default)]
    pub module_names: BTreeSet<String>,
    /// Project identifier
    pub project_name: String,
    /// Optional author
    #[serde(default)]
    pub author: Option<String>,
    /// Values for template substitution
    #[serde(default)]
    pub variables: BTreeMap<String, String>,
    /// Destination of the finished tree
    #[serde(default)]
    pub output_kind: OutputKind,
}

impl SelectionRequest {
    /// Create a request with no modules selected
    pub fn new(preset_name: impl Into<String>, project_name: impl Into<String>) -> Self {
        Self {
            preset_name: preset_name.into(),
            module_names: BTreeSet::new(),
            project_name: project_name.into(),
            author: None,
            variables: BTreeMap::new(),
            output_kind: OutputKind::default(),
        }
    }

    /// Add modules to the selection
    pub fn with_modules<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.module_names.extend(names.into_iter().map(Into::into));
        self
    }

    /// Set the author
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    /// Add a template variable
    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }

    /// Set the output kind
    pub fn with_output_kind(mut self, kind: OutputKind) -> Self {
        self.output_kind = kind;
        self
    }
}

/// A decided version tie-break, kept for reporting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionResolution {
    /// Package name
    pub package: String,
    /// Spec that won
    pub kept: String,
    /// Spec that lost
    pub discarded: String,
    /// Contributor of the later spec
    pub contributor: String,
}

/// Dependencies and environment merged across the preset and selected modules
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergedManifest {
    /// Runtime dependencies
    pub deps: DependencyMap,
    /// Development dependencies
    pub dev_deps: DependencyMap,
    /// Union of required environment variables
    pub env: BTreeSet<String>,
    /// Tie-breaks applied while merging
    pub resolutions: Vec<VersionResolution>,
}

/// Output of resolution and merging, consumed by the injector and assembler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedPlan {
    /// Application order
    pub application_order: Vec<String>,
    /// Merged manifest
    pub merged: MergedManifest,
    /// The selection this plan was built from
    pub selection: SelectionRequest,
}

/// Mapping of project-relative paths to files, built during one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectTree {
    files: BTreeMap<String, TreeFile>,
}

impl ProjectTree {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a file; returns whether an existing file was replaced
    pub(crate) fn insert(&mut self, path: impl Into<String>, file: TreeFile) -> bool {
        self.files.insert(path.into(), file).is_some()
    }

    pub(crate) fn get_mut(&mut self, path: &str) -> Option<&mut TreeFile> {
        self.files.get_mut(path)
    }

    pub(crate) fn files_mut(&mut self) -> impl Iterator<Item = (&String, &mut TreeFile)> {
        self.files.iter_mut()
    }

    /// File at `path`
    pub fn get(&self, path: &str) -> Option<&TreeFile> {
        self.files.get(path)
    }

    /// Text content of the file at `path`, if it exists and is text
    pub fn text(&self, path: &str) -> Option<&str> {
        self.files.get(path).and_then(|file| file.contents.as_text())
    }

    /// Whether a file exists at `path`
    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    /// All paths, sorted
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    /// All files, sorted by path
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TreeFile)> {
        self.files.iter().map(|(path, file)| (path.as_str(), file))
    }

    /// Number of files
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether the tree has no files
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directive_kind_ordering() {
        let mut kinds = vec![
            DirectiveKind::Custom("routes".to_string()),
            DirectiveKind::Register,
            DirectiveKind::Import,
        ];
        kinds.sort();
        assert_eq!(
            kinds,
            vec![
                DirectiveKind::Import,
                DirectiveKind::Register,
                DirectiveKind::Custom("routes".to_string()),
            ]
        );
    }

    #[test]
    fn test_file_contents_from_bytes() {
        assert_eq!(
            FileContents::from_bytes(b"hello".to_vec()),
            FileContents::Text("hello".to_string())
        );
        let binary = FileContents::from_bytes(vec![0xff, 0xfe, 0x00]);
        assert!(binary.as_text().is_none());
        assert_eq!(binary.as_bytes(), &[0xff, 0xfe, 0x00]);
    }

    #[test]
    fn test_selection_request_deserializes_camel_case() {
        let request: SelectionRequest = serde_json::from_str(
            r#"{
                "presetName": "base",
                "moduleNames": ["file-storage", "auth", "auth"],
                "projectName": "shop",
                "outputKind": "github"
            }"#,
        )
        .unwrap();

        assert_eq!(request.preset_name, "base");
        assert_eq!(
            request.module_names.iter().collect::<Vec<_>>(),
            vec!["auth", "file-storage"]
        );
        assert_eq!(request.output_kind, OutputKind::Github);
        assert!(request.variables.is_empty());
    }

    #[test]
    fn test_project_tree_overlay_reports_replacement() {
        let mut tree = ProjectTree::new();
        assert!(!tree.insert("README.md", TreeFile::text("one")));
        assert!(tree.insert("README.md", TreeFile::text("two")));
        assert_eq!(tree.text("README.md"), Some("two"));
        assert_eq!(tree.len(), 1);
    }
}
