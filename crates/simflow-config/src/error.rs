//! Errors raised while loading configuration.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// None of the backend's env vars is set and `[llm].api_key` is empty.
    #[error("no API key for the {backend} backend (set {env_var}, or api_key under [llm])")]
    ApiKeyNotFound { backend: String, env_var: String },
}
