//! Command routing and dispatch

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use modforge_assembly::OutputKind;

use crate::commands::*;
use crate::error::CliResult;

/// modforge - assemble projects from a preset and feature modules
#[derive(Parser, Debug)]
#[command(name = "modforge")]
#[command(bin_name = "modforge")]
#[command(about = "Assemble projects from a preset and optional feature modules")]
#[command(
    long_about = "modforge builds a project from a preset skeleton plus optional feature modules.\n\nModules are validated against their requires/conflicts declarations, applied in a\ndeterministic order, merged into one dependency manifest, injected at anchor markers\nand rendered with your project variables.\n\nQuick start:\n  • modforge list                                   Show presets and modules\n  • modforge plan -p base -m auth                   Preview the plan as JSON\n  • modforge assemble -p base -m auth -n shop -o shop   Build a project"
)]
#[command(version)]
#[command(disable_help_subcommand = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Minimize output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file (default: platform config dir)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Catalogue root, overriding the configuration
    #[arg(long, global = true, value_name = "DIR")]
    pub catalogue: Option<PathBuf>,
}

/// Destination kind of an assembled project
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputArg {
    /// Packaged into a zip archive
    #[default]
    Zip,
    /// Pushed to a remote repository
    Github,
}

impl From<OutputArg> for OutputKind {
    fn from(arg: OutputArg) -> Self {
        match arg {
            OutputArg::Zip => OutputKind::Zip,
            OutputArg::Github => OutputKind::Github,
        }
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// List presets and modules
    #[command(about = "List the presets and modules in the catalogue")]
    List,

    /// Show the resolved plan for a selection
    #[command(about = "Print application order and merged manifest as JSON")]
    Plan {
        /// Preset to start from
        #[arg(short, long)]
        preset: String,

        /// Module to include (repeatable)
        #[arg(short = 'm', long = "module", value_name = "MODULE")]
        modules: Vec<String>,

        /// Project name
        #[arg(short, long, default_value = "app")]
        name: String,
    },

    /// Assemble a project into a directory
    #[command(about = "Assemble a project and write it to a new directory")]
    Assemble {
        /// Preset to start from
        #[arg(short, long)]
        preset: String,

        /// Module to include (repeatable)
        #[arg(short = 'm', long = "module", value_name = "MODULE")]
        modules: Vec<String>,

        /// Project name
        #[arg(short, long)]
        name: String,

        /// Project author
        #[arg(short, long)]
        author: Option<String>,

        /// Template variable (repeatable)
        #[arg(long = "var", value_name = "KEY=VALUE")]
        vars: Vec<String>,

        /// Destination directory; must not exist
        #[arg(short, long, value_name = "DIR")]
        out: PathBuf,

        /// Leave unresolved placeholders in place instead of failing
        #[arg(long)]
        lenient: bool,

        /// Where the project is headed
        #[arg(long, value_enum, default_value_t = OutputArg::Zip)]
        output: OutputArg,
    },

    /// Manage configuration settings
    #[command(about = "View and manage modforge configuration")]
    Config {
        #[command(subcommand)]
        action: Option<ConfigSubcommand>,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigSubcommand {
    /// Print the effective configuration
    Show,
    /// Print the configuration file path
    Path,
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Parses arguments and dispatches to command handlers
pub struct CommandRouter;

impl CommandRouter {
    /// Parse CLI arguments and route to appropriate handler
    pub async fn route() -> CliResult<()> {
        let cli = Cli::parse();

        crate::logging::init_logging(cli.verbose, cli.quiet);

        Self::execute(&cli).await
    }

    /// Execute a command
    pub async fn execute(cli: &Cli) -> CliResult<()> {
        let config_path = cli.config.as_deref();
        let catalogue = cli.catalogue.as_deref();

        match &cli.command {
            Commands::List => {
                let cmd = ListCommand::new(load_config(config_path, catalogue)?);
                cmd.execute().await
            }
            Commands::Plan {
                preset,
                modules,
                name,
            } => {
                let request = RequestArgs {
                    preset: preset.clone(),
                    modules: modules.clone(),
                    name: name.clone(),
                    ..RequestArgs::default()
                }
                .into_request()?;
                let cmd = PlanCommand::new(load_config(config_path, catalogue)?, request);
                cmd.execute().await
            }
            Commands::Assemble {
                preset,
                modules,
                name,
                author,
                vars,
                out,
                lenient,
                output,
            } => {
                let request = RequestArgs {
                    preset: preset.clone(),
                    modules: modules.clone(),
                    name: name.clone(),
                    author: author.clone(),
                    vars: vars.clone(),
                    output_kind: (*output).into(),
                }
                .into_request()?;

                let mut config = load_config(config_path, catalogue)?;
                if *lenient {
                    config.strict_variables = false;
                }
                let cmd = AssembleCommand::new(config, request, out.clone());
                cmd.execute().await
            }
            Commands::Config { action } => {
                let config_action = match action {
                    Some(ConfigSubcommand::Show) | None => ConfigAction::Show,
                    Some(ConfigSubcommand::Path) => ConfigAction::Path,
                    Some(ConfigSubcommand::Init { force }) => ConfigAction::Init { force: *force },
                };
                let cmd = ConfigCommand::new(
                    config_action,
                    config_manager(config_path),
                    load_config(config_path, catalogue),
                );
                cmd.execute().await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_assemble() {
        let cli = Cli::try_parse_from([
            "modforge",
            "-v",
            "--catalogue",
            "cat",
            "assemble",
            "-p",
            "base",
            "-m",
            "auth",
            "--module",
            "mailer",
            "-n",
            "shop",
            "--var",
            "port=3000",
            "-o",
            "out/shop",
            "--lenient",
            "--output",
            "github",
        ])
        .unwrap();

        assert!(cli.verbose);
        assert_eq!(cli.catalogue, Some(PathBuf::from("cat")));
        match cli.command {
            Commands::Assemble {
                preset,
                modules,
                name,
                vars,
                out,
                lenient,
                output,
                author,
            } => {
                assert_eq!(preset, "base");
                assert_eq!(modules, vec!["auth", "mailer"]);
                assert_eq!(name, "shop");
                assert_eq!(vars, vec!["port=3000"]);
                assert_eq!(out, PathBuf::from("out/shop"));
                assert!(lenient);
                assert_eq!(output, OutputArg::Github);
                assert!(author.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_plan_defaults_project_name() {
        let cli = Cli::try_parse_from(["modforge", "plan", "-p", "base"]).unwrap();
        assert!(matches!(cli.command, Commands::Plan { ref name, .. } if name == "app"));
    }

    #[test]
    fn test_assemble_requires_out() {
        assert!(Cli::try_parse_from(["modforge", "assemble", "-p", "base", "-n", "shop"]).is_err());
    }
}
