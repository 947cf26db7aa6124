//! Assemble a project and write it to a directory

use std::path::PathBuf;

use modforge_assembly::{
    AssemblyConfig, DirectorySink, FinalizedProject, ProjectAssembler, ProjectSink,
    SelectionRequest, SinkReport,
};
use tracing::debug;

use super::Command;
use crate::error::{CliError, CliResult};
use crate::output::OutputStyle;

/// Assemble a project into a new directory
pub struct AssembleCommand {
    config: AssemblyConfig,
    request: SelectionRequest,
    out: PathBuf,
}

impl AssembleCommand {
    /// Create an assemble command
    pub fn new(config: AssemblyConfig, request: SelectionRequest, out: impl Into<PathBuf>) -> Self {
        Self {
            config,
            request,
            out: out.into(),
        }
    }

    /// Run the assembly and write the result
    ///
    /// A failed run prints its structured failure as JSON on stdout before
    /// the error is returned.
    pub async fn run(&self) -> CliResult<(FinalizedProject, SinkReport)> {
        let assembler = ProjectAssembler::from_config(self.config.clone())?;

        let project = match assembler.assemble_async(self.request.clone()).await {
            Ok(project) => project,
            Err(failure) => {
                println!("{}", serde_json::to_string_pretty(&failure)?);
                return Err(failure.into());
            }
        };
        debug!(files = project.tree.len(), "Writing assembled project");

        let sink = DirectorySink::new(&self.out);
        let (project, report) = tokio::task::spawn_blocking(move || {
            let report = sink.deliver(&project);
            (project, report)
        })
        .await
        .map_err(|e| CliError::Internal(e.to_string()))?;

        Ok((project, report?))
    }

    /// Human-readable summary of a finished run
    pub fn summary(project: &FinalizedProject, report: &SinkReport, style: &OutputStyle) -> String {
        let mut out = style.success(&format!(
            "Assembled '{}' from preset '{}' into {} ({} files)",
            project.project_name,
            project.preset,
            report.root.display(),
            report.files_written
        ));
        out.push('\n');

        if !project.application_order.is_empty() {
            out.push_str(&format!("  modules: {}\n", project.application_order.join(" → ")));
        }
        for resolution in &project.merged_manifest.resolutions {
            out.push_str(&format!(
                "  {} kept {} over {} ({})\n",
                resolution.package, resolution.kept, resolution.discarded, resolution.contributor
            ));
        }
        if !project.required_env.is_empty() {
            out.push_str(&format!("  required env: {}\n", project.required_env.join(", ")));
        }
        for warning in &project.warnings {
            out.push_str(&style.warning(warning));
            out.push('\n');
        }

        out
    }
}

#[async_trait::async_trait]
impl Command for AssembleCommand {
    async fn execute(&self) -> CliResult<()> {
        let (project, report) = self.run().await?;
        print!("{}", Self::summary(&project, &report, &OutputStyle::default()));
        Ok(())
    }
}
