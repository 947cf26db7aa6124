//! Command handlers for the modforge CLI

pub mod assemble;
pub mod config;
pub mod list;
pub mod plan;

pub use assemble::AssembleCommand;
pub use config::{ConfigAction, ConfigCommand};
pub use list::ListCommand;
pub use plan::PlanCommand;

use std::path::Path;

use modforge_assembly::{AssemblyConfig, ConfigManager, OutputKind, SelectionRequest};

use crate::error::{CliError, CliResult};

/// Trait for command handlers
#[async_trait::async_trait]
pub trait Command: Send + Sync {
    /// Execute the command
    async fn execute(&self) -> CliResult<()>;
}

/// Config manager for an explicit path, or the platform default
pub fn config_manager(path: Option<&Path>) -> ConfigManager {
    match path {
        Some(path) => ConfigManager::with_path(path),
        None => ConfigManager::new(),
    }
}

/// Effective configuration: file and environment, then CLI overrides
pub fn load_config(config_path: Option<&Path>, catalogue: Option<&Path>) -> CliResult<AssemblyConfig> {
    let mut config = config_manager(config_path).load_config()?;
    if let Some(root) = catalogue {
        config.catalogue_root = root.to_path_buf();
    }
    Ok(config)
}

/// Split a `KEY=VALUE` argument
pub fn parse_variable(raw: &str) -> CliResult<(String, String)> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(CliError::InvalidArgument {
            message: format!("expected KEY=VALUE, got '{}'", raw),
        }),
    }
}

/// Inputs for building a selection request
#[derive(Debug, Clone, Default)]
pub struct RequestArgs {
    /// Preset name
    pub preset: String,
    /// Selected modules
    pub modules: Vec<String>,
    /// Project name
    pub name: String,
    /// Optional author
    pub author: Option<String>,
    /// Raw `KEY=VALUE` variables
    pub vars: Vec<String>,
    /// Output destination kind
    pub output_kind: OutputKind,
}

impl RequestArgs {
    /// Build the selection request
    pub fn into_request(self) -> CliResult<SelectionRequest> {
        let mut request = SelectionRequest::new(self.preset, self.name)
            .with_modules(self.modules)
            .with_output_kind(self.output_kind);
        if let Some(author) = self.author {
            request = request.with_author(author);
        }
        for raw in &self.vars {
            let (key, value) = parse_variable(raw)?;
            request = request.with_variable(key, value);
        }
        Ok(request)
    }
}
