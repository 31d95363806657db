//! API key resolution.
//!
//! Resolution order:
//! 1. Environment variable(s) for the backend
//! 2. Config file (with warning at load time)

use crate::{ConfigError, LlmConfig, Result};

/// Result of API key resolution with provenance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSecret {
    /// The secret value.
    pub value: String,
    /// Where the secret was found.
    pub source: SecretSource,
}

/// Where a secret was resolved from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretSource {
    /// Environment variable.
    EnvVar(String),
    /// Config file (plaintext, not recommended).
    ConfigFile,
}

impl std::fmt::Display for SecretSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SecretSource::EnvVar(var) => write!(f, "env var {}", var),
            SecretSource::ConfigFile => write!(f, "config file (plaintext)"),
        }
    }
}

/// Resolve the API key for an `[llm]` section.
///
/// Returns `Ok(None)` for backends that do not need a key and have none
/// configured.
pub fn resolve_api_key(llm: &LlmConfig) -> Result<Option<ResolvedSecret>> {
    resolve_with(llm, |var| std::env::var(var).ok())
}

fn resolve_with(
    llm: &LlmConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<Option<ResolvedSecret>> {
    for var in llm.backend.env_vars() {
        if let Some(value) = lookup(var)
            && !value.is_empty()
        {
            return Ok(Some(ResolvedSecret {
                value,
                source: SecretSource::EnvVar(var.to_string()),
            }));
        }
    }

    if let Some(ref value) = llm.api_key {
        return Ok(Some(ResolvedSecret {
            value: value.clone(),
            source: SecretSource::ConfigFile,
        }));
    }

    if llm.backend.requires_api_key() {
        return Err(ConfigError::ApiKeyNotFound {
            backend: llm.backend.name().to_string(),
            env_var: llm.backend.env_vars().join(" or "),
        });
    }

    Ok(None)
}
