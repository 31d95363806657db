//! Check command - report whether a run could start.

use anyhow::{Result, bail};
use clap::Args;
use simflow_config::resolve_api_key;
use simflow_sandbox::InterpreterStatus;

use super::Context;

/// Arguments for the check command.
#[derive(Args, Debug)]
pub struct CheckArgs {}

/// Run the check command.
pub async fn run(_args: CheckArgs, ctx: &Context) -> Result<()> {
    let config = ctx.load_config()?;
    let sandbox = config.sandbox();
    let llm = config.llm();

    let interpreter = InterpreterStatus::detect(&sandbox.interpreter);
    let key_source = match resolve_api_key(&llm) {
        Ok(Some(secret)) => secret.source.to_string(),
        Ok(None) => "not required".to_string(),
        Err(e) => {
            tracing::debug!(error = %e, "API key not resolved");
            format!("missing (set {})", llm.backend.env_vars().join(" or "))
        }
    };

    if ctx.json_output {
        let body = serde_json::json!({
            "interpreter": {
                "program": sandbox.interpreter,
                "available": interpreter.is_available(),
                "install_hint": interpreter.install_hint(),
            },
            "llm": {
                "backend": llm.backend.name(),
                "model": llm.model,
                "base_url": llm.effective_base_url(),
                "api_key": key_source,
            },
            "runs_root": config.runs().root,
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
    } else {
        println!("Interpreter: {interpreter}");
        println!(
            "Backend:     {} ({}, {})",
            llm.backend.name(),
            llm.model,
            llm.effective_base_url()
        );
        println!("API key:     {key_source}");
        if ctx.verbose {
            println!("Runs root:   {}", config.runs().root.display());
        }
    }

    if !interpreter.is_available() {
        bail!("interpreter '{}' is not available", sandbox.interpreter);
    }
    Ok(())
}
