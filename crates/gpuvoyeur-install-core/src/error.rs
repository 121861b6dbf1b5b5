//! Error types for the layer installer.
//!
//! Every failure is terminal for a single install run. The variants group into
//! four categories (configuration, resolution, I/O and descriptor patching),
//! which `InstallError::exit_code` maps onto process exit codes.

use std::path::PathBuf;
use thiserror::Error;

use crate::config::ActivationMode;

/// Main error type for the installer.
#[derive(Debug, Error)]
pub enum InstallError {
    // Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    // Resolution errors
    #[error(
        "Could not locate an {mode} layer search directory (searched {}). \
         Perhaps specify one with --layerSearchPath?",
        display_paths(.searched)
    )]
    Resolution {
        mode: ActivationMode,
        searched: Vec<PathBuf>,
    },

    // File system errors
    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Path is not a directory: {0}")]
    NotADirectory(PathBuf),

    // Registry errors
    #[error("Registry error at {key}: {message}")]
    Registry {
        key: String,
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("Operation not supported on this platform: {0}")]
    UnsupportedPlatform(String),

    // Descriptor errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<serde_json::Error>,
    },

    #[error("Invalid layer descriptor {path:?}: {message}")]
    InvalidDescriptor {
        path: Option<PathBuf>,
        message: String,
    },
}

/// Result type alias for installer operations.
pub type Result<T> = std::result::Result<T, InstallError>;

fn display_paths(paths: &[PathBuf]) -> String {
    if paths.is_empty() {
        return "no directories".to_string();
    }
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<std::io::Error> for InstallError {
    fn from(err: std::io::Error) -> Self {
        InstallError::Io {
            message: err.to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl From<serde_json::Error> for InstallError {
    fn from(err: serde_json::Error) -> Self {
        InstallError::Json {
            message: err.to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl InstallError {
    /// Create an IO error with path context.
    pub fn io_with_path(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        InstallError::Io {
            message: err.to_string(),
            path: Some(path.into()),
            source: Some(err),
        }
    }

    /// Create a JSON error with path context.
    pub fn json_with_path(err: serde_json::Error, path: impl Into<PathBuf>) -> Self {
        InstallError::Json {
            message: err.to_string(),
            path: Some(path.into()),
            source: Some(err),
        }
    }

    /// Convert to a process exit code.
    ///
    /// - 2: configuration error (bad layer mode, unusable root)
    /// - 3: no layer search directory could be resolved
    /// - 4: filesystem or registry failure
    /// - 5: the copied descriptor could not be patched
    pub fn exit_code(&self) -> u8 {
        match self {
            InstallError::Config { .. } => 2,

            InstallError::Resolution { .. } => 3,

            InstallError::Io { .. }
            | InstallError::FileNotFound(_)
            | InstallError::NotADirectory(_)
            | InstallError::Registry { .. }
            | InstallError::UnsupportedPlatform(_) => 4,

            InstallError::Json { .. } | InstallError::InvalidDescriptor { .. } => 5,
        }
    }

    /// Check if this error was raised before anything was written.
    pub fn is_pre_install(&self) -> bool {
        matches!(
            self,
            InstallError::Config { .. } | InstallError::Resolution { .. }
        )
    }
}
