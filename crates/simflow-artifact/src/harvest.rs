//! Finding the frames a script left behind.

use std::path::{Path, PathBuf};

use crate::error::{ArtifactError, Result};

/// Naming convention for frame files: `<prefix>*.<extension>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramePattern {
    pub prefix: String,
    pub extension: String,
}

impl Default for FramePattern {
    fn default() -> Self {
        Self {
            prefix: "frame_".to_string(),
            extension: "png".to_string(),
        }
    }
}

impl FramePattern {
    pub fn new(prefix: impl Into<String>, extension: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            extension: extension.into(),
        }
    }

    /// Glob matching this pattern inside `dir`. Literal parts are escaped.
    pub fn glob_in(&self, dir: &Path) -> String {
        let file = format!(
            "{}*.{}",
            glob::Pattern::escape(&self.prefix),
            glob::Pattern::escape(self.extension.trim_start_matches('.'))
        );
        let dir = glob::Pattern::escape(&dir.to_string_lossy());
        if dir.is_empty() {
            file
        } else {
            format!("{}/{}", dir.trim_end_matches('/'), file)
        }
    }
}

/// Every file in `dir` matching `pattern`, sorted lexicographically by file
/// name (so `frame_10` sorts before `frame_2`).
///
/// A missing directory yields no frames.
pub fn harvest(dir: &Path, pattern: &FramePattern) -> Result<Vec<PathBuf>> {
    let glob_pattern = pattern.glob_in(dir);
    let entries =
        glob::glob(&glob_pattern).map_err(|e| ArtifactError::Pattern(format!("{glob_pattern}: {e}")))?;

    let mut frames: Vec<PathBuf> = entries
        .filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(e) => {
                tracing::warn!(error = %e, "Skipping unreadable directory entry");
                None
            }
        })
        .filter(|path| path.is_file())
        .collect();

    frames.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    tracing::debug!(dir = %dir.display(), count = frames.len(), "Harvested frames");
    Ok(frames)
}
