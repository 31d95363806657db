//! CLI command handlers.

pub mod check;
pub mod run;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use simflow_config::{SimflowConfig, load_config_with_options, resolve_api_key};
use simflow_llm::{OpenAiConfig, OpenAiTransform, SharedTransform};

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Output as JSON for scripting.
    pub json_output: bool,
    /// Verbose output enabled.
    pub verbose: bool,
    /// Explicit config file from `--config`.
    pub config_file: Option<PathBuf>,
}

impl Context {
    /// Discover and merge configuration, logging any load warnings.
    pub fn load_config(&self) -> Result<SimflowConfig> {
        let loaded = load_config_with_options(None, None, self.config_file.as_deref())
            .context("Failed to load configuration")?;

        for warning in &loaded.warnings {
            tracing::warn!("{warning}");
        }
        tracing::debug!(sources = ?loaded.loaded_from(), "Configuration loaded");
        Ok(loaded.config)
    }
}

/// Build the text-transform client described by `[llm]`.
pub fn build_transform(config: &SimflowConfig) -> Result<SharedTransform> {
    let llm = config.llm();

    let mut client_config = OpenAiConfig::new(llm.effective_base_url(), llm.model.clone())
        .with_name(llm.backend.name())
        .with_timeout(llm.timeout())
        .with_retries(llm.retry_max, llm.retry_backoff())
        .with_temperature(llm.temperature);

    if let Some(secret) = resolve_api_key(&llm)? {
        tracing::debug!(backend = llm.backend.name(), source = %secret.source, "Resolved API key");
        client_config = client_config.with_api_key(secret.value);
    }

    Ok(Arc::new(OpenAiTransform::new(client_config)?))
}
