//! The structured spec: a validated reading of the user's request.
//!
//! On the wire a spec is `{"task": ..., "want_animation": ..., "params": {...}}`
//! (`want_gif` is accepted for `want_animation`). Internally the task
//! discriminator selects a typed parameter record. Anything that does not
//! fit is a validation error; nothing is defaulted silently except the
//! documented parameter defaults.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{PipelineError, Result};

/// Validated description of what the generated script should do.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSpec", into = "RawSpec")]
pub struct StructuredSpec {
    pub task: Task,
    pub want_animation: bool,
}

/// The kind of computation requested, with its parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum Task {
    PlotSignal(PlotSignalParams),
    RunSimulation(RunSimulationParams),
}

impl Task {
    /// Wire discriminator.
    pub fn name(&self) -> &'static str {
        match self {
            Task::PlotSignal(_) => "plot_signal",
            Task::RunSimulation(_) => "run_simulation",
        }
    }
}

/// Parameters of `plot_signal`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotSignalParams {
    /// Signal frequency in Hz.
    #[serde(default = "default_one")]
    pub freq: f64,
    /// Signal duration in seconds.
    #[serde(default = "default_one")]
    pub duration: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amplitude: Option<f64>,
    /// Samples per second.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_rate: Option<f64>,
    /// Parameters with no dedicated field, passed through to codegen.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Parameters of `run_simulation`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSimulationParams {
    /// Model name, e.g. `"pendulum"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Number of integration steps.
    #[serde(default = "default_steps")]
    pub steps: u64,
    /// Step size.
    #[serde(default = "default_dt")]
    pub dt: f64,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

fn default_one() -> f64 {
    1.0
}

fn default_steps() -> u64 {
    100
}

fn default_dt() -> f64 {
    0.01
}

/// Wire form of a spec.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawSpec {
    task: String,
    #[serde(default, alias = "want_gif")]
    want_animation: bool,
    #[serde(default)]
    params: Map<String, Value>,
}

impl StructuredSpec {
    /// Parse and validate service output.
    ///
    /// Text that is not JSON is a service fault (`MalformedOutput`); JSON
    /// that does not describe a valid spec is a `Validation` error.
    pub fn parse(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text).map_err(|e| {
            PipelineError::MalformedOutput(format!("spec is not valid JSON ({e}): {text}"))
        })?;
        Self::from_value(value)
    }

    /// Validate an already-parsed JSON value.
    pub fn from_value(value: Value) -> Result<Self> {
        let raw: RawSpec = serde_json::from_value(value)
            .map_err(|e| PipelineError::Validation(e.to_string()))?;
        Self::try_from(raw)
    }

    /// Wire form as a JSON value.
    pub fn to_value(&self) -> Value {
        let raw = RawSpec::from(self.clone());
        serde_json::json!({
            "task": raw.task,
            "want_animation": raw.want_animation,
            "params": raw.params,
        })
    }

    /// Wire form as compact JSON text.
    pub fn to_json(&self) -> String {
        self.to_value().to_string()
    }

    fn validate(&self) -> Result<()> {
        match &self.task {
            Task::PlotSignal(p) => {
                positive("freq", p.freq)?;
                positive("duration", p.duration)?;
                if let Some(rate) = p.sample_rate {
                    positive("sample_rate", rate)?;
                }
                if let Some(amplitude) = p.amplitude
                    && !amplitude.is_finite()
                {
                    return Err(PipelineError::Validation(
                        "amplitude must be a finite number".to_string(),
                    ));
                }
            }
            Task::RunSimulation(p) => {
                if p.steps == 0 {
                    return Err(PipelineError::Validation(
                        "steps must be greater than zero".to_string(),
                    ));
                }
                positive("dt", p.dt)?;
            }
        }
        Ok(())
    }
}

fn positive(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(PipelineError::Validation(format!(
            "{name} must be a positive number, got {value}"
        )))
    }
}

impl TryFrom<RawSpec> for StructuredSpec {
    type Error = PipelineError;

    fn try_from(raw: RawSpec) -> Result<Self> {
        let params = Value::Object(raw.params);
        let invalid = |e: serde_json::Error| {
            PipelineError::Validation(format!("invalid params for '{}': {e}", raw.task))
        };

        let task = match raw.task.as_str() {
            "plot_signal" => Task::PlotSignal(serde_json::from_value(params).map_err(invalid)?),
            "run_simulation" => {
                Task::RunSimulation(serde_json::from_value(params).map_err(invalid)?)
            }
            other => {
                return Err(PipelineError::Validation(format!(
                    "unknown task '{other}' (expected 'plot_signal' or 'run_simulation')"
                )));
            }
        };

        let spec = StructuredSpec {
            task,
            want_animation: raw.want_animation,
        };
        spec.validate()?;
        Ok(spec)
    }
}

impl From<StructuredSpec> for RawSpec {
    fn from(spec: StructuredSpec) -> Self {
        let task = spec.task.name().to_string();
        let params = match spec.task {
            Task::PlotSignal(p) => serde_json::to_value(p),
            Task::RunSimulation(p) => serde_json::to_value(p),
        };
        let params = match params {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };
        RawSpec {
            task,
            want_animation: spec.want_animation,
            params,
        }
    }
}
