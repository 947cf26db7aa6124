//! CLI error types

use modforge_assembly::{AssemblyError, AssemblyFailure};
use thiserror::Error;

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// A command-line argument could not be interpreted
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// What was wrong
        message: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration could not be loaded, validated or written
    #[error("Configuration error: {0}")]
    Config(String),

    /// The engine rejected an operation
    #[error("{0}")]
    Assembly(AssemblyError),

    /// An assembly run failed
    #[error("{0}")]
    Failed(Box<AssemblyFailure>),

    /// Output could not be serialised
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A background task did not complete
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<AssemblyError> for CliError {
    fn from(err: AssemblyError) -> Self {
        match err {
            AssemblyError::Config(message) => CliError::Config(message),
            other => CliError::Assembly(other),
        }
    }
}

impl From<AssemblyFailure> for CliError {
    fn from(failure: AssemblyFailure) -> Self {
        CliError::Failed(Box::new(failure))
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        CliError::Serialization(err.to_string())
    }
}

impl From<toml::ser::Error> for CliError {
    fn from(err: toml::ser::Error) -> Self {
        CliError::Serialization(err.to_string())
    }
}

impl CliError {
    /// Get a user-friendly error message with suggestions
    pub fn user_message(&self) -> String {
        match self {
            CliError::InvalidArgument { message } => {
                format!("Invalid argument: {}\n\nRun 'modforge --help' for usage information.", message)
            }
            CliError::Io(e) => format!("File operation failed: {}", e),
            CliError::Config(msg) => {
                format!(
                    "Configuration error: {}\n\nRun 'modforge config show' to check your configuration.",
                    msg
                )
            }
            CliError::Assembly(err) => match err {
                AssemblyError::UnknownPreset(_) | AssemblyError::UnknownModule(_) => {
                    format!("{}\n\nRun 'modforge list' to see what the catalogue offers.", err)
                }
                AssemblyError::ManifestParse { .. } => {
                    format!("{}\n\nFix the descriptor and run the command again.", err)
                }
                _ => err.to_string(),
            },
            CliError::Failed(failure) => {
                format!("Assembly failed while {}: {}", failure.phase, failure.error)
            }
            CliError::Serialization(msg) => format!("Could not format output: {}", msg),
            CliError::Internal(msg) => format!("Internal error: {}\n\nPlease report this issue.", msg),
        }
    }

    /// Get technical details for verbose mode
    pub fn technical_details(&self) -> String {
        format!("{:?}", self)
    }
}

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;
