//! Error types for the pipeline.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use simflow_artifact::ArtifactError;
use simflow_llm::LlmError;
use simflow_sandbox::{SandboxError, TIMEOUT_MARKER};
use thiserror::Error;

use crate::state::SharedState;

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Coarse classification of a [`PipelineError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The structured spec failed schema validation.
    Validation,
    /// The text-transform service failed or returned unusable text.
    Service,
    /// The interpreter could not be started.
    SandboxLaunch,
    /// The script exceeded its wall-clock limit.
    SandboxTimeout,
    /// An animation was requested but could not be produced.
    Artifact,
    /// Anything else: missing state, I/O, wiring mistakes, panics.
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Service => "service",
            ErrorKind::SandboxLaunch => "sandbox launch",
            ErrorKind::SandboxTimeout => "sandbox timeout",
            ErrorKind::Artifact => "artifact",
            ErrorKind::Internal => "internal",
        };
        f.write_str(name)
    }
}

/// Errors a stage (or the graph itself) can fail with.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The structured spec is invalid.
    #[error("Invalid spec: {0}")]
    Validation(String),

    /// The text-transform call failed.
    #[error("Text transform failed: {0}")]
    Transform(#[from] LlmError),

    /// The service answered with text that cannot be used.
    #[error("Unusable service output: {0}")]
    MalformedOutput(String),

    /// The interpreter could not be launched.
    #[error("Interpreter '{program}' could not be launched (run dir {}): {message}", .run_dir.display())]
    SandboxLaunch {
        program: String,
        message: String,
        run_dir: PathBuf,
    },

    /// The script ran past its timeout and was killed. `stderr` ends with
    /// the timeout marker.
    #[error("{marker}: script ran past {timeout:?} and was killed (run dir {})", .run_dir.display(), marker = TIMEOUT_MARKER)]
    SandboxTimeout {
        timeout: Duration,
        stdout: String,
        stderr: String,
        run_dir: PathBuf,
    },

    /// Frame harvesting or animation composition failed. Frames stay in
    /// `run_dir` when it is known.
    #[error("Artifact error: {source}{}", in_run_dir(.run_dir.as_deref()))]
    Artifact {
        #[source]
        source: ArtifactError,
        run_dir: Option<PathBuf>,
    },

    /// The run directory could not be prepared.
    #[error("Sandbox setup failed: {0}")]
    Sandbox(#[from] SandboxError),

    /// A stage ran before the field it depends on was written.
    #[error("Missing state field '{0}'")]
    MissingField(&'static str),

    /// Two stages were registered under one name.
    #[error("Stage '{0}' is already registered")]
    DuplicateStage(String),

    /// Prompt template could not be read.
    #[error("Failed to read prompt template {path}: {source}")]
    Prompt {
        path: std::path::PathBuf,
        source: std::io::Error,
    },

    /// A stage panicked or a background task was lost.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PipelineError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::Validation(_) => ErrorKind::Validation,
            PipelineError::Transform(_) | PipelineError::MalformedOutput(_) => ErrorKind::Service,
            PipelineError::SandboxLaunch { .. } => ErrorKind::SandboxLaunch,
            PipelineError::SandboxTimeout { .. } => ErrorKind::SandboxTimeout,
            PipelineError::Artifact { .. } => ErrorKind::Artifact,
            PipelineError::Sandbox(_)
            | PipelineError::MissingField(_)
            | PipelineError::DuplicateStage(_)
            | PipelineError::Prompt { .. }
            | PipelineError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// The run directory the failure happened in, if it got that far.
    pub fn run_dir(&self) -> Option<&Path> {
        match self {
            PipelineError::SandboxLaunch { run_dir, .. }
            | PipelineError::SandboxTimeout { run_dir, .. } => Some(run_dir),
            PipelineError::Artifact { run_dir, .. } => run_dir.as_deref(),
            _ => None,
        }
    }

    /// Interpreter stderr captured before the failure.
    pub fn stderr(&self) -> Option<&str> {
        match self {
            PipelineError::SandboxLaunch { message, .. } => Some(message),
            PipelineError::SandboxTimeout { stderr, .. } => Some(stderr),
            _ => None,
        }
    }
}

impl From<ArtifactError> for PipelineError {
    fn from(source: ArtifactError) -> Self {
        PipelineError::Artifact {
            source,
            run_dir: None,
        }
    }
}

fn in_run_dir(run_dir: Option<&Path>) -> String {
    run_dir
        .map(|dir| format!(" (run dir {})", dir.display()))
        .unwrap_or_default()
}

/// Terminal failure of a run: which stage failed, why, and the state
/// accumulated before it.
#[derive(Debug, Error)]
#[error("Stage '{stage}' failed: {error}")]
pub struct StageFailure {
    /// Name of the failing stage.
    pub stage: String,
    /// The cause.
    #[source]
    pub error: PipelineError,
    /// State as it was when the failing stage started.
    pub state: SharedState,
}

impl StageFailure {
    /// Shorthand for `self.error.kind()`.
    pub fn kind(&self) -> ErrorKind {
        self.error.kind()
    }
}
