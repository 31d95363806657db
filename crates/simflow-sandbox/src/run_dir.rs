//! Per-run working directories.

use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::error::{SandboxError, SandboxResult};

/// A freshly created directory owned by exactly one run.
///
/// The leaf is named after a random identifier and is created with
/// `create_dir`, so an existing directory is never reused. Directories are
/// left on disk after the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunDirectory {
    id: String,
    path: PathBuf,
}

impl RunDirectory {
    /// Create a new run directory under `root`, creating `root` if needed.
    pub fn create(root: impl AsRef<Path>) -> SandboxResult<Self> {
        let root = root.as_ref();
        std::fs::create_dir_all(root).map_err(|source| SandboxError::RunDirectory {
            root: root.to_path_buf(),
            source,
        })?;

        let id = Uuid::new_v4().simple().to_string();
        let path = root.join(&id);
        std::fs::create_dir(&path).map_err(|source| SandboxError::RunDirectory {
            root: root.to_path_buf(),
            source,
        })?;

        tracing::debug!(run_id = %id, path = %path.display(), "Created run directory");
        Ok(Self { id, path })
    }

    /// The run identifier (the leaf directory name).
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Absolute or root-relative path of the directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Consume and return the path.
    pub fn into_path(self) -> PathBuf {
        self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_makes_root_and_leaf() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("test_runs");

        let run = RunDirectory::create(&root).unwrap();
        assert!(run.path().is_dir());
        assert_eq!(run.path().parent().unwrap(), root);
        assert_eq!(run.path().file_name().unwrap().to_str().unwrap(), run.id());
        assert_eq!(run.id().len(), 32);
    }

    #[test]
    fn test_directories_are_unique() {
        let tmp = tempfile::tempdir().unwrap();
        let a = RunDirectory::create(tmp.path()).unwrap();
        let b = RunDirectory::create(tmp.path()).unwrap();
        assert_ne!(a.id(), b.id());
        assert_ne!(a.path(), b.path());
    }

    #[test]
    fn test_root_is_a_file() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("occupied");
        std::fs::write(&file, "x").unwrap();

        let err = RunDirectory::create(&file).unwrap_err();
        assert!(matches!(err, SandboxError::RunDirectory { .. }));
    }
}
