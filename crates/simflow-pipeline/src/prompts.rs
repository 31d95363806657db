//! Prompt templates for the stages that call the text-transform service.
//!
//! Built-in templates are used unless a prompt directory provides
//! `<stage>_prompt.txt` files. Placeholders follow
//! [`TransformRequest`](simflow_llm::TransformRequest): `{name}`, with `{{`
//! and `}}` for literal braces.

use std::path::Path;

use crate::error::{PipelineError, Result};

const CHAT_PROMPT: &str = "\
You are the front desk of a numerical simulation service. A user has asked for:

{user_input}

Reply with one or two friendly sentences confirming what you understood and \
that the simulation is being prepared. Do not write code.
";

const INTERPRETER_PROMPT: &str = "\
Turn the user's request into a JSON simulation spec.

The spec must be a single JSON object with these keys:
- \"task\": either \"plot_signal\" or \"run_simulation\"
- \"want_animation\": true if the user asks for an animation, GIF or video, otherwise false
- \"params\": an object of numeric or string parameters

For \"plot_signal\" use params \"freq\" (Hz), \"duration\" (seconds) and optionally \
\"amplitude\" and \"sample_rate\". For \"run_simulation\" use \"model\", \"steps\" and \"dt\", \
plus any model-specific values.

Example:
{{\"task\": \"plot_signal\", \"want_animation\": true, \"params\": {{\"freq\": 2, \"duration\": 3}}}}

Respond with the JSON object only.

User request:
{user_input}
";

const CODEGEN_PROMPT: &str = "\
Write a complete GNU Octave script for this simulation spec:

{spec}

Rules:
- Do not call graphics_toolkit or change figure visibility; that is already done.
- Do not use input(), pause() or anything else that waits for a user.
- If \"want_animation\" is true, save each animation frame with
  print(sprintf('frame_%03d.png', k), '-dpng') in the current directory.
- Otherwise save the final figure as frame_001.png.
- Print a short numeric summary of the results with disp or printf.

Respond with the script only.
";

const SUMMARISER_PROMPT: &str = "\
Summarise the outcome of a simulation run for the user, in a few sentences of Markdown.

The run context is given as JSON with the spec, the user's query, the script's \
stdout and stderr, the number of frames generated and whether an animation was produced:

{context}

Explain what was computed and mention any errors reported on stderr.
";

/// Templates for every service-backed stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompts {
    pub chat: String,
    pub interpreter: String,
    pub codegen: String,
    pub summariser: String,
}

impl Default for Prompts {
    fn default() -> Self {
        Self {
            chat: CHAT_PROMPT.to_string(),
            interpreter: INTERPRETER_PROMPT.to_string(),
            codegen: CODEGEN_PROMPT.to_string(),
            summariser: SUMMARISER_PROMPT.to_string(),
        }
    }
}

impl Prompts {
    /// Built-in templates, overridden by any `<stage>_prompt.txt` in `dir`.
    pub fn load(dir: Option<&Path>) -> Result<Self> {
        let mut prompts = Self::default();
        let Some(dir) = dir else {
            return Ok(prompts);
        };

        for (file, slot) in [
            ("chat_prompt.txt", &mut prompts.chat),
            ("interpreter_prompt.txt", &mut prompts.interpreter),
            ("codegen_prompt.txt", &mut prompts.codegen),
            ("summariser_prompt.txt", &mut prompts.summariser),
        ] {
            let path = dir.join(file);
            if !path.exists() {
                continue;
            }
            *slot = std::fs::read_to_string(&path)
                .map_err(|source| PipelineError::Prompt { path: path.clone(), source })?;
            tracing::debug!(path = %path.display(), "Loaded prompt override");
        }

        Ok(prompts)
    }
}
