//! Configuration system for simflow.
//!
//! Provides TOML-based configuration with:
//! - An `[llm]` section describing the text-transform backend
//! - `[sandbox]`, `[artifacts]`, `[runs]`, `[pipeline]` and `[prompts]` sections
//! - Config file layering (XDG user config + project-local overrides)
//! - API key resolution (env var → config file)

pub mod discovery;
pub mod error;
pub mod secrets;
pub mod types;

pub use discovery::{
    ConfigSource, Layer, LoadedConfig, load_config, load_config_file, load_config_with_options,
    xdg_config_dir, xdg_config_path,
};
pub use error::{ConfigError, Result};
pub use secrets::{ResolvedSecret, SecretSource, resolve_api_key};
pub use types::*;
