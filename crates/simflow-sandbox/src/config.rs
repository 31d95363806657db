//! Executor configuration.

use std::time::Duration;

use crate::bootstrap::Bootstrap;

/// Configuration for [`SandboxExecutor`](crate::SandboxExecutor).
///
/// The interpreter reads the preamble followed by the script from stdin, with
/// the run's working directory as its current directory.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Interpreter binary (looked up on `PATH`).
    pub program: String,

    /// Arguments passed to the interpreter.
    pub args: Vec<String>,

    /// Preamble prepended to every script.
    pub bootstrap: Bootstrap,

    /// Filename the script (without preamble) is saved under in the work dir.
    pub script_file: String,

    /// How long to wait for output pipes to drain after a forced kill.
    pub kill_grace: Duration,

    /// Environment variables to pass to the interpreter.
    pub env_vars: Vec<(String, String)>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            program: "octave-cli".to_string(),
            args: vec!["--quiet".to_string()],
            bootstrap: Bootstrap::default(),
            script_file: "script.m".to_string(),
            kill_grace: Duration::from_secs(2),
            env_vars: Vec::new(),
        }
    }
}

impl ExecutorConfig {
    /// Create a configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the interpreter binary and its arguments.
    pub fn with_interpreter(mut self, program: impl Into<String>, args: Vec<String>) -> Self {
        self.program = program.into();
        self.args = args;
        self
    }

    /// Set the bootstrap preamble.
    pub fn with_bootstrap(mut self, bootstrap: Bootstrap) -> Self {
        self.bootstrap = bootstrap;
        self
    }

    /// Set the script filename.
    pub fn with_script_file(mut self, name: impl Into<String>) -> Self {
        self.script_file = name.into();
        self
    }

    /// Set the post-kill grace period.
    pub fn with_kill_grace(mut self, grace: Duration) -> Self {
        self.kill_grace = grace;
        self
    }

    /// Add an environment variable.
    pub fn add_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_vars.push((key.into(), value.into()));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ExecutorConfig::default();
        assert_eq!(config.program, "octave-cli");
        assert_eq!(config.args, vec!["--quiet"]);
        assert_eq!(config.script_file, "script.m");
        assert_eq!(config.kill_grace, Duration::from_secs(2));
        assert!(config.env_vars.is_empty());
    }

    #[test]
    fn test_builder_chain() {
        let config = ExecutorConfig::new()
            .with_interpreter("sh", vec!["-s".to_string()])
            .with_script_file("run.sh")
            .with_kill_grace(Duration::from_millis(100))
            .add_env("GNUTERM", "dumb");

        assert_eq!(config.program, "sh");
        assert_eq!(config.args, vec!["-s"]);
        assert_eq!(config.script_file, "run.sh");
        assert_eq!(config.kill_grace, Duration::from_millis(100));
        assert_eq!(config.env_vars, vec![("GNUTERM".into(), "dumb".into())]);
    }
}
