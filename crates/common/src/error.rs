//! Launcher error taxonomy.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Every way the launcher can fail before control reaches the proxy binary.
///
/// All variants are fatal. Variants map to process exit codes:
/// - [`LaunchError::TemplateRead`] → 66
/// - [`LaunchError::DirectoryCreate`] → 73
/// - [`LaunchError::ConfigWrite`] → 74
/// - [`LaunchError::Launch`] → 126
/// - [`LaunchError::BinaryNotFound`] → 127
#[derive(Debug, Error)]
pub enum LaunchError {
    /// The template file is missing or unreadable.
    #[error("failed to read template {}: {source}", path.display())]
    TemplateRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The parent directory of the rendered configuration could not be created.
    #[error("failed to create directory {}: {source}", path.display())]
    DirectoryCreate {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The rendered configuration could not be written.
    #[error("failed to write config {}: {source}", path.display())]
    ConfigWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The proxy binary is not on the executable search path.
    #[error("{name} binary not found in PATH: {reason}")]
    BinaryNotFound { name: String, reason: String },

    /// Neither in-place exec nor the fallback spawn could start the binary.
    #[error("failed to start {}: {source}", path.display())]
    Launch {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl LaunchError {
    /// Returns the process exit code that should be used for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            LaunchError::TemplateRead { .. } => 66,
            LaunchError::DirectoryCreate { .. } => 73,
            LaunchError::ConfigWrite { .. } => 74,
            LaunchError::Launch { .. } => 126,
            LaunchError::BinaryNotFound { .. } => 127,
        }
    }

    /// Short name of the startup step that failed, used as a log field.
    pub fn step(&self) -> &'static str {
        match self {
            LaunchError::TemplateRead { .. } => "read_template",
            LaunchError::DirectoryCreate { .. } => "create_dir",
            LaunchError::ConfigWrite { .. } => "write_config",
            LaunchError::BinaryNotFound { .. } => "resolve_binary",
            LaunchError::Launch { .. } => "launch",
        }
    }
}
