//! Error types for artifact handling.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while harvesting or composing frames.
#[derive(Debug, Error)]
pub enum ArtifactError {
    /// None of the given frames could be read as an image.
    #[error("No valid frames to compose ({skipped} unreadable)")]
    NoValidFrames { skipped: usize },

    /// The frame pattern could not be turned into a glob.
    #[error("Invalid frame pattern: {0}")]
    Pattern(String),

    /// Filesystem error.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The animation could not be encoded.
    #[error("Failed to encode animation {path}: {source}")]
    Encode {
        path: PathBuf,
        source: image::ImageError,
    },
}

/// Result type for artifact operations.
pub type Result<T> = std::result::Result<T, ArtifactError>;
