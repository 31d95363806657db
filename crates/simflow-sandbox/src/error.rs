//! Error types for sandbox operations.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while preparing a sandboxed run.
///
/// Script-level outcomes (non-zero exit, timeout, missing interpreter) are
/// not errors; they are reported through `ExecutionStatus`.
#[derive(Debug, Error)]
pub enum SandboxError {
    /// The working directory could not be created.
    #[error("Failed to create working directory {path}: {source}")]
    WorkDir {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The script file could not be written.
    #[error("Failed to write script {path}: {source}")]
    ScriptWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A run directory could not be allocated.
    #[error("Failed to create run directory under {root}: {source}")]
    RunDirectory {
        root: PathBuf,
        source: std::io::Error,
    },
}

/// Result type for sandbox operations.
pub type SandboxResult<T> = std::result::Result<T, SandboxError>;
