//! Finding and layering config files.
//!
//! Layers, lowest precedence first:
//! 1. user: `config.toml` in [`xdg_config_dir`]
//! 2. project: `simflow.toml` in the working (or given) directory
//! 3. explicit: a file named on the command line
//!
//! A broken user or project file is skipped with a warning. A broken
//! explicit file is an error.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::{ConfigError, LlmConfig, Result, SimflowConfig};

const PROJECT_CONFIG_FILE: &str = "simflow.toml";
const USER_CONFIG_FILE: &str = "config.toml";
const APP_NAME: &str = "simflow";

/// Overrides the platform config directory.
const CONFIG_DIR_ENV: &str = "SIMFLOW_CONFIG_DIR";

const PLAINTEXT_KEY_WARNING: &str =
    "[llm].api_key is stored in plaintext; prefer the backend's environment variable";

/// Which layer a config file belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    User,
    Project,
    Explicit,
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Layer::User => "user",
            Layer::Project => "project",
            Layer::Explicit => "explicit",
        })
    }
}

/// One file that was looked at during discovery.
#[derive(Debug, Clone)]
pub struct ConfigSource {
    pub layer: Layer,
    pub path: PathBuf,
    /// False when the file was absent or unreadable.
    pub loaded: bool,
}

/// Merged configuration plus what went into it.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: SimflowConfig,
    /// Every candidate file, lowest precedence first.
    pub sources: Vec<ConfigSource>,
    pub warnings: Vec<String>,
}

impl LoadedConfig {
    fn empty() -> Self {
        Self {
            config: SimflowConfig::new(),
            sources: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Paths of the files that contributed to `config`.
    pub fn loaded_from(&self) -> Vec<&Path> {
        self.sources
            .iter()
            .filter(|s| s.loaded)
            .map(|s| s.path.as_path())
            .collect()
    }

    /// Merge an optional layer; absence is silent, breakage is a warning.
    fn discover(&mut self, layer: Layer, path: PathBuf) {
        let loaded = match path.is_file().then(|| load_config_file(&path)) {
            None => false,
            Some(Ok(parsed)) => {
                self.config.merge(parsed);
                true
            }
            Some(Err(e)) => {
                self.warnings
                    .push(format!("Ignoring {layer} config {}: {e}", path.display()));
                false
            }
        };
        self.sources.push(ConfigSource {
            layer,
            path,
            loaded,
        });
    }
}

/// Discover the user and project layers.
pub fn load_config(project_dir: Option<&Path>) -> Result<LoadedConfig> {
    load_config_with_options(project_dir, None, None)
}

/// Discover with every location under the caller's control.
///
/// `config_dir` replaces [`xdg_config_dir`]; `project_dir` replaces the
/// working directory; `explicit_file` is merged last and must load.
pub fn load_config_with_options(
    project_dir: Option<&Path>,
    config_dir: Option<&Path>,
    explicit_file: Option<&Path>,
) -> Result<LoadedConfig> {
    let mut loaded = LoadedConfig::empty();

    let user_file = config_dir
        .map(|dir| dir.join(USER_CONFIG_FILE))
        .or_else(xdg_config_path);
    if let Some(path) = user_file {
        loaded.discover(Layer::User, path);
    }

    let project_file = project_dir.map_or_else(
        || PathBuf::from(PROJECT_CONFIG_FILE),
        |dir| dir.join(PROJECT_CONFIG_FILE),
    );
    loaded.discover(Layer::Project, project_file);

    if let Some(path) = explicit_file {
        loaded.config.merge(load_config_file(path)?);
        loaded.sources.push(ConfigSource {
            layer: Layer::Explicit,
            path: path.to_path_buf(),
            loaded: true,
        });
    }

    if loaded
        .config
        .llm
        .as_ref()
        .is_some_and(LlmConfig::has_plaintext_api_key)
    {
        loaded.warnings.push(PLAINTEXT_KEY_WARNING.to_string());
    }

    Ok(loaded)
}

/// Parse a single file, no layering.
pub fn load_config_file(path: &Path) -> Result<SimflowConfig> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    SimflowConfig::from_toml(&text)
}

/// `config.toml` inside [`xdg_config_dir`].
pub fn xdg_config_path() -> Option<PathBuf> {
    xdg_config_dir().map(|dir| dir.join(USER_CONFIG_FILE))
}

/// `$SIMFLOW_CONFIG_DIR` when set, else `<platform config dir>/simflow`.
pub fn xdg_config_dir() -> Option<PathBuf> {
    match std::env::var_os(CONFIG_DIR_ENV) {
        Some(dir) if !dir.is_empty() => Some(PathBuf::from(dir)),
        _ => dirs::config_dir().map(|dir| dir.join(APP_NAME)),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    use crate::Backend;

    #[test]
    fn test_load_config_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
[llm]
backend = "openai"
model = "test-model"
"#,
        )
        .unwrap();

        let config = load_config_file(&path).unwrap();
        assert_eq!(config.llm.as_ref().unwrap().backend, Backend::Openai);
    }

    #[test]
    fn test_load_config_file_not_found() {
        let err = load_config_file(Path::new("/nonexistent/config.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::ReadFile { .. }));
    }

    #[test]
    fn test_load_config_invalid_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "this is not valid toml {{{{").unwrap();

        let err = load_config_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_config_no_files() {
        let dir = TempDir::new().unwrap();
        let empty_config_dir = TempDir::new().unwrap();
        let loaded =
            load_config_with_options(Some(dir.path()), Some(empty_config_dir.path()), None)
                .unwrap();
        assert!(loaded.config.llm.is_none());
        assert!(loaded.loaded_from().is_empty());
    }

    #[test]
    fn test_load_config_layered_merge() {
        let xdg_dir = TempDir::new().unwrap();
        let project_dir = TempDir::new().unwrap();

        fs::write(
            xdg_dir.path().join("config.toml"),
            r#"
[llm]
backend = "openai"
model = "base-model"

[runs]
root = "/srv/runs"
"#,
        )
        .unwrap();

        fs::write(
            project_dir.path().join("simflow.toml"),
            r#"
[llm]
backend = "ollama"
model = "project-model"
"#,
        )
        .unwrap();

        let loaded =
            load_config_with_options(Some(project_dir.path()), Some(xdg_dir.path()), None)
                .unwrap();
        let llm = loaded.config.llm();
        assert_eq!(llm.backend, Backend::Ollama);
        assert_eq!(llm.model, "project-model");
        assert_eq!(loaded.config.runs().root, PathBuf::from("/srv/runs"));
        assert_eq!(loaded.loaded_from().len(), 2);
        assert_eq!(loaded.sources[0].layer, Layer::User);
        assert_eq!(loaded.sources[1].layer, Layer::Project);
    }

    #[test]
    fn test_explicit_file_wins_and_must_exist() {
        let project_dir = TempDir::new().unwrap();
        let config_dir = TempDir::new().unwrap();
        let explicit = project_dir.path().join("custom.toml");
        fs::write(&explicit, "[sandbox]\ntimeout_secs = 7\n").unwrap();

        let loaded = load_config_with_options(
            Some(project_dir.path()),
            Some(config_dir.path()),
            Some(&explicit),
        )
        .unwrap();
        assert_eq!(loaded.config.sandbox().timeout_secs, 7);

        let missing = project_dir.path().join("missing.toml");
        let err = load_config_with_options(
            Some(project_dir.path()),
            Some(config_dir.path()),
            Some(&missing),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::ReadFile { .. }));
    }

    #[test]
    fn test_plaintext_key_warning() {
        let dir = TempDir::new().unwrap();
        let config_dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("simflow.toml"),
            r#"
[llm]
backend = "openai"
api_key = "sk-secret"
"#,
        )
        .unwrap();

        let loaded =
            load_config_with_options(Some(dir.path()), Some(config_dir.path()), None).unwrap();
        assert_eq!(loaded.warnings.len(), 1);
        assert!(loaded.warnings[0].contains("plaintext"));
    }

    #[test]
    fn test_malformed_config_warns_but_continues() {
        let dir = TempDir::new().unwrap();
        let config_dir = TempDir::new().unwrap();
        fs::write(dir.path().join("simflow.toml"), "not valid toml {{{{").unwrap();

        let loaded =
            load_config_with_options(Some(dir.path()), Some(config_dir.path()), None).unwrap();
        assert!(!loaded.warnings.is_empty());
        assert!(loaded.warnings[0].contains("Ignoring project config"));
    }
}
