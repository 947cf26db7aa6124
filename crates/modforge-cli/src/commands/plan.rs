//! Show the resolved plan for a selection without building anything

use modforge_assembly::{AssemblyConfig, ProjectAssembler, SelectionRequest};

use super::Command;
use crate::error::CliResult;

/// Print application order and merged manifest as JSON
pub struct PlanCommand {
    config: AssemblyConfig,
    request: SelectionRequest,
}

impl PlanCommand {
    /// Create a plan command
    pub fn new(config: AssemblyConfig, request: SelectionRequest) -> Self {
        Self { config, request }
    }

    /// Compute the plan and format it
    pub fn render(&self) -> CliResult<String> {
        let assembler = ProjectAssembler::from_config(self.config.clone())?;
        let plan = assembler.plan(&self.request)?;
        Ok(serde_json::to_string_pretty(&plan)?)
    }
}

#[async_trait::async_trait]
impl Command for PlanCommand {
    async fn execute(&self) -> CliResult<()> {
        println!("{}", self.render()?);
        Ok(())
    }
}
