//! Engine configuration and its layered loader

use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AssemblyError, Result};
use crate::models::DirectiveKind;

/// Default marker for `import` directives
pub const DEFAULT_IMPORT_MARKER: &str = "// IMPORTS";
/// Default marker for `register` directives
pub const DEFAULT_REGISTER_MARKER: &str = "// MODULES";

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AssemblyConfig {
    /// Directory holding `presets/` and `modules/`
    pub catalogue_root: PathBuf,
    /// File-name suffix that flags a file as a template
    pub template_suffix: String,
    /// Fail on placeholders without a value instead of leaving them in place
    pub strict_variables: bool,
    /// Default markers for the built-in directive kinds
    pub markers: MarkerConfig,
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        Self {
            catalogue_root: PathBuf::from("catalogue"),
            template_suffix: ".tmpl".to_string(),
            strict_variables: true,
            markers: MarkerConfig::default(),
        }
    }
}

impl AssemblyConfig {
    /// Check the configuration for values the engine cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.template_suffix.len() < 2 || !self.template_suffix.starts_with('.') {
            return Err(AssemblyError::Config(format!(
                "template_suffix must start with '.' and name an extension, got '{}'",
                self.template_suffix
            )));
        }
        if self.markers.import.trim().is_empty() || self.markers.register.trim().is_empty() {
            return Err(AssemblyError::Config(
                "directive markers must not be empty".to_string(),
            ));
        }
        if self.markers.import == self.markers.register {
            return Err(AssemblyError::Config(
                "import and register markers must differ".to_string(),
            ));
        }
        Ok(())
    }
}

/// Markers used when a module lists bare lines for a built-in kind
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MarkerConfig {
    /// Marker for `import` directives
    pub import: String,
    /// Marker for `register` directives
    pub register: String,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            import: DEFAULT_IMPORT_MARKER.to_string(),
            register: DEFAULT_REGISTER_MARKER.to_string(),
        }
    }
}

impl MarkerConfig {
    /// Default marker for a kind; custom kinds have none
    pub fn default_for(&self, kind: &DirectiveKind) -> Option<&str> {
        match kind {
            DirectiveKind::Import => Some(&self.import),
            DirectiveKind::Register => Some(&self.register),
            DirectiveKind::Custom(_) => None,
        }
    }
}

/// Loads configuration from a TOML file layered under `MODFORGE_*` environment variables
pub struct ConfigManager {
    /// Configuration file path
    config_path: PathBuf,
    /// Environment prefix
    env_prefix: String,
}

impl ConfigManager {
    /// Create a manager reading the default config path
    pub fn new() -> Self {
        Self::with_path(Self::default_config_path())
    }

    /// Create with custom config path
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
            env_prefix: "MODFORGE".to_string(),
        }
    }

    /// Override the environment prefix
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Path the manager reads from and writes to
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("modforge")
            .join("modforge.toml")
    }

    /// Load, layer and validate the configuration
    ///
    /// A missing file is not an error; defaults fill every unset key.
    pub fn load_config(&self) -> Result<AssemblyConfig> {
        debug!(path = %self.config_path.display(), "Loading configuration");

        let builder = Config::builder()
            .add_source(File::from(self.config_path.clone()).required(false))
            .add_source(
                Environment::with_prefix(&self.env_prefix)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        let config: AssemblyConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Persist a configuration as TOML
    pub fn save_config(&self, config: &AssemblyConfig) -> Result<()> {
        config.validate()?;
        let toml = toml::to_string_pretty(config)?;
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.config_path, toml)?;
        Ok(())
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}
