//! Configuration management

use modforge_assembly::{AssemblyConfig, ConfigManager};

use super::Command;
use crate::error::{CliError, CliResult};
use crate::output::OutputStyle;

/// What to do with the configuration
#[derive(Debug, Clone)]
pub enum ConfigAction {
    /// Print the effective configuration as TOML
    Show,
    /// Print the configuration file path
    Path,
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        force: bool,
    },
}

/// Manage configuration
pub struct ConfigCommand {
    action: ConfigAction,
    manager: ConfigManager,
    effective: CliResult<AssemblyConfig>,
}

impl ConfigCommand {
    /// Create a config command
    ///
    /// `effective` is the configuration after CLI overrides; a load error is
    /// only reported by actions that need it.
    pub fn new(action: ConfigAction, manager: ConfigManager, effective: CliResult<AssemblyConfig>) -> Self {
        Self {
            action,
            manager,
            effective,
        }
    }

    /// Perform the action and return what should be printed
    pub fn render(&self) -> CliResult<String> {
        match &self.action {
            ConfigAction::Show => match &self.effective {
                Ok(config) => Ok(toml::to_string_pretty(config)?),
                Err(err) => Err(CliError::Config(err.to_string())),
            },
            ConfigAction::Path => Ok(format!("{}\n", self.manager.config_path().display())),
            ConfigAction::Init { force } => {
                let path = self.manager.config_path();
                if path.exists() && !force {
                    return Err(CliError::Config(format!(
                        "{} already exists; pass --force to overwrite it",
                        path.display()
                    )));
                }
                self.manager.save_config(&AssemblyConfig::default())?;
                Ok(format!(
                    "{}\n",
                    OutputStyle::default().success(&format!("Wrote {}", path.display()))
                ))
            }
        }
    }
}

#[async_trait::async_trait]
impl Command for ConfigCommand {
    async fn execute(&self) -> CliResult<()> {
        print!("{}", self.render()?);
        Ok(())
    }
}
