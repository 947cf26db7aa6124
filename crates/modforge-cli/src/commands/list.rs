//! List presets and modules in the catalogue

use modforge_assembly::{AssemblyConfig, Catalogue, ProjectAssembler};

use super::Command;
use crate::error::CliResult;
use crate::output::OutputStyle;

/// Print the catalogue
pub struct ListCommand {
    config: AssemblyConfig,
}

impl ListCommand {
    /// Create a list command for the configured catalogue
    pub fn new(config: AssemblyConfig) -> Self {
        Self { config }
    }

    /// Render the catalogue as text
    pub fn render(catalogue: &Catalogue, style: &OutputStyle) -> String {
        let mut out = String::new();

        out.push_str(&style.header("Presets"));
        out.push('\n');
        for preset in catalogue.presets() {
            out.push_str(&format!(
                "  {} {}  {}\n",
                style.name(&preset.name),
                style.dim(&format!("v{}", preset.version)),
                preset.description
            ));
        }

        out.push('\n');
        out.push_str(&style.header("Modules"));
        out.push('\n');
        for module in catalogue.modules() {
            let manifest = &module.manifest;
            out.push_str(&format!(
                "  {} {}  {}\n",
                style.name(&manifest.name),
                style.dim(&format!("v{}", manifest.version)),
                manifest.description
            ));
            if !manifest.requires.is_empty() {
                let names: Vec<&str> = manifest.requires.iter().map(String::as_str).collect();
                out.push_str(&format!("      {}\n", style.dim(&format!("requires: {}", names.join(", ")))));
            }
            if !manifest.conflicts.is_empty() {
                let names: Vec<&str> = manifest.conflicts.iter().map(String::as_str).collect();
                out.push_str(&format!("      {}\n", style.dim(&format!("conflicts: {}", names.join(", ")))));
            }
        }

        out
    }
}

#[async_trait::async_trait]
impl Command for ListCommand {
    async fn execute(&self) -> CliResult<()> {
        let assembler = ProjectAssembler::from_config(self.config.clone())?;
        let catalogue = assembler.catalogue().snapshot();
        print!("{}", Self::render(&catalogue, &OutputStyle::default()));
        Ok(())
    }
}
