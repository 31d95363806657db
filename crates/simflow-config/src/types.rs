//! Configuration types mapping to the TOML schema.
//!
//! Top-level config:
//! ```toml
//! [llm]          # text-transform backend
//! [sandbox]      # interpreter + timeout
//! [artifacts]    # frame discovery + animation output
//! [runs]         # where run directories are created
//! [pipeline]     # stage selection
//! [prompts]      # template overrides
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Top-level Config
// ─────────────────────────────────────────────────────────────────────────────

/// Root configuration structure.
///
/// All sections are optional so that partial configs (e.g., project-local
/// overrides) can be loaded and merged. Accessors return the section or its
/// defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimflowConfig {
    /// Text-transform backend configuration.
    pub llm: Option<LlmConfig>,

    /// Sandboxed interpreter configuration.
    pub sandbox: Option<SandboxSection>,

    /// Frame discovery and animation output.
    pub artifacts: Option<ArtifactsSection>,

    /// Run directory placement.
    pub runs: Option<RunsSection>,

    /// Stage selection.
    pub pipeline: Option<PipelineSection>,

    /// Prompt template overrides.
    pub prompts: Option<PromptsSection>,
}

impl SimflowConfig {
    /// Create an empty config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> crate::Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Merge another config on top of this one (other takes priority).
    pub fn merge(&mut self, other: SimflowConfig) {
        if other.llm.is_some() {
            self.llm = other.llm;
        }

        if other.sandbox.is_some() {
            self.sandbox = other.sandbox;
        }

        if other.artifacts.is_some() {
            self.artifacts = other.artifacts;
        }

        if other.runs.is_some() {
            self.runs = other.runs;
        }

        if other.pipeline.is_some() {
            self.pipeline = other.pipeline;
        }

        if other.prompts.is_some() {
            self.prompts = other.prompts;
        }
    }

    /// The `[llm]` section, or defaults.
    pub fn llm(&self) -> LlmConfig {
        self.llm.clone().unwrap_or_default()
    }

    /// The `[sandbox]` section, or defaults.
    pub fn sandbox(&self) -> SandboxSection {
        self.sandbox.clone().unwrap_or_default()
    }

    /// The `[artifacts]` section, or defaults.
    pub fn artifacts(&self) -> ArtifactsSection {
        self.artifacts.clone().unwrap_or_default()
    }

    /// The `[runs]` section, or defaults.
    pub fn runs(&self) -> RunsSection {
        self.runs.clone().unwrap_or_default()
    }

    /// The `[pipeline]` section, or defaults.
    pub fn pipeline(&self) -> PipelineSection {
        self.pipeline.clone().unwrap_or_default()
    }

    /// The `[prompts]` section, or defaults.
    pub fn prompts(&self) -> PromptsSection {
        self.prompts.clone().unwrap_or_default()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// LLM
// ─────────────────────────────────────────────────────────────────────────────

/// Text-transform backend configuration (the `[llm]` section).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Backend provider.
    pub backend: Backend,
    /// Model identifier.
    pub model: String,
    /// Custom API base URL (for proxies, custom endpoints).
    pub base_url: Option<String>,
    /// API key (prefer the env var; warns if set here).
    pub api_key: Option<String>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Maximum retry attempts for transient failures.
    pub retry_max: u32,
    /// Initial backoff delay between retries in milliseconds.
    pub retry_backoff_ms: u64,
    /// Sampling temperature.
    pub temperature: Option<f32>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Gemini,
            model: "gemini-2.0-flash".to_string(),
            base_url: None,
            api_key: None,
            timeout_secs: 300,
            retry_max: 2,
            retry_backoff_ms: 500,
            temperature: None,
        }
    }
}

impl LlmConfig {
    /// Returns true if an API key is stored directly in the config file.
    pub fn has_plaintext_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Base URL to use: the configured one or the backend's default.
    pub fn effective_base_url(&self) -> String {
        self.base_url
            .clone()
            .unwrap_or_else(|| self.backend.default_base_url().to_string())
    }

    /// Request timeout as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Retry backoff as a `Duration`.
    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

/// Supported text-transform backend providers.
///
/// All of them speak the OpenAI-compatible chat completions protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Gemini,
    Openai,
    Ollama,
    Custom,
}

impl Backend {
    /// Environment variables checked for this backend's API key, in order.
    pub fn env_vars(&self) -> &'static [&'static str] {
        match self {
            Backend::Gemini => &["GEMINI_API_KEY", "GOOGLE_API_KEY"],
            Backend::Openai => &["OPENAI_API_KEY"],
            Backend::Ollama => &[],
            Backend::Custom => &["SIMFLOW_API_KEY"],
        }
    }

    /// Whether requests to this backend need an API key.
    pub fn requires_api_key(&self) -> bool {
        !matches!(self, Backend::Ollama)
    }

    /// Default base URL for the backend's chat completions API.
    pub fn default_base_url(&self) -> &'static str {
        match self {
            Backend::Gemini => "https://generativelanguage.googleapis.com/v1beta/openai",
            Backend::Openai => "https://api.openai.com/v1",
            Backend::Ollama => "http://localhost:11434/v1",
            Backend::Custom => "http://localhost:8000/v1",
        }
    }

    /// Lowercase name, as written in config files.
    pub fn name(&self) -> &'static str {
        match self {
            Backend::Gemini => "gemini",
            Backend::Openai => "openai",
            Backend::Ollama => "ollama",
            Backend::Custom => "custom",
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Sandbox
// ─────────────────────────────────────────────────────────────────────────────

/// Sandboxed interpreter configuration (the `[sandbox]` section).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxSection {
    /// Interpreter binary.
    pub interpreter: String,
    /// Arguments passed to the interpreter.
    pub args: Vec<String>,
    /// Wall-clock limit per script, in seconds.
    pub timeout_secs: u64,
    /// How long to wait for output pipes after a forced kill, in milliseconds.
    pub kill_grace_ms: u64,
    /// Rendering toolkits to try, highest priority first.
    pub toolkits: Vec<String>,
    /// Toolkit used when none of `toolkits` is available.
    pub fallback_toolkit: String,
    /// Filename the generated script is saved under inside the run directory.
    pub script_file: String,
}

impl Default for SandboxSection {
    fn default() -> Self {
        Self {
            interpreter: "octave-cli".to_string(),
            args: vec!["--quiet".to_string()],
            timeout_secs: 300,
            kill_grace_ms: 2000,
            toolkits: vec!["qt".to_string(), "fltk".to_string()],
            fallback_toolkit: "gnuplot".to_string(),
            script_file: "script.m".to_string(),
        }
    }
}

impl SandboxSection {
    /// Script timeout as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Kill grace period as a `Duration`.
    pub fn kill_grace(&self) -> Duration {
        Duration::from_millis(self.kill_grace_ms)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Artifacts
// ─────────────────────────────────────────────────────────────────────────────

/// Frame discovery and animation output (the `[artifacts]` section).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactsSection {
    /// Literal filename prefix of frame images.
    pub frame_prefix: String,
    /// Frame image extension, without the dot.
    pub frame_extension: String,
    /// Display time per animation frame, in milliseconds.
    pub frame_delay_ms: u64,
    /// Filename of the composed animation inside the run directory.
    pub animation_file: String,
}

impl Default for ArtifactsSection {
    fn default() -> Self {
        Self {
            frame_prefix: "frame_".to_string(),
            frame_extension: "png".to_string(),
            frame_delay_ms: 100,
            animation_file: "output.gif".to_string(),
        }
    }
}

impl ArtifactsSection {
    /// Frame delay as a `Duration`.
    pub fn frame_delay(&self) -> Duration {
        Duration::from_millis(self.frame_delay_ms)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Runs / Pipeline / Prompts
// ─────────────────────────────────────────────────────────────────────────────

/// Run directory placement (the `[runs]` section).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunsSection {
    /// Parent directory of every run directory.
    pub root: PathBuf,
}

impl Default for RunsSection {
    fn default() -> Self {
        Self {
            root: PathBuf::from("test_runs"),
        }
    }
}

/// Stage selection (the `[pipeline]` section).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSection {
    /// Run the acknowledgement (`chat`) stage before interpretation.
    pub acknowledge: bool,
}

/// Prompt template overrides (the `[prompts]` section).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptsSection {
    /// Directory holding `<stage>_prompt.txt` overrides.
    pub dir: Option<PathBuf>,
}
