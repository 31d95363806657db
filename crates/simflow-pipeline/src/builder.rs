//! Wiring the default pipeline from configuration.

use simflow_artifact::{ArtifactCollector, FramePattern};
use simflow_config::SimflowConfig;
use simflow_llm::SharedTransform;
use simflow_sandbox::{Bootstrap, ExecutorConfig, SandboxExecutor};

use crate::error::Result;
use crate::graph::StageGraph;
use crate::prompts::Prompts;
use crate::stages::{
    ChatStage, CodegenStage, ExecuteSettings, ExecuteStage, InterpretStage, SummariseStage,
};

/// Build `[chat] → interpret → codegen → execute → summarise`, loading
/// prompt overrides from `[prompts].dir`.
pub fn build_pipeline(config: &SimflowConfig, transform: SharedTransform) -> Result<StageGraph> {
    let prompts = Prompts::load(config.prompts().dir.as_deref())?;
    build_pipeline_with_prompts(config, transform, prompts)
}

/// Same as [`build_pipeline`] with explicit templates.
pub fn build_pipeline_with_prompts(
    config: &SimflowConfig,
    transform: SharedTransform,
    prompts: Prompts,
) -> Result<StageGraph> {
    let mut graph = StageGraph::new();

    if config.pipeline().acknowledge {
        graph.push(ChatStage::new(transform.clone(), prompts.chat))?;
    }
    graph.push(InterpretStage::new(transform.clone(), prompts.interpreter))?;
    graph.push(CodegenStage::new(transform.clone(), prompts.codegen))?;
    graph.push(ExecuteStage::new(
        SandboxExecutor::new(executor_config(config)),
        artifact_collector(config),
        execute_settings(config),
    ))?;
    graph.push(SummariseStage::new(transform, prompts.summariser))?;

    tracing::debug!(stages = ?graph.stage_names(), "Pipeline built");
    Ok(graph)
}

/// Executor settings from `[sandbox]`.
pub fn executor_config(config: &SimflowConfig) -> ExecutorConfig {
    let sandbox = config.sandbox();
    ExecutorConfig::new()
        .with_interpreter(sandbox.interpreter.clone(), sandbox.args.clone())
        .with_bootstrap(Bootstrap::new(
            sandbox.toolkits.clone(),
            sandbox.fallback_toolkit.clone(),
        ))
        .with_script_file(sandbox.script_file.clone())
        .with_kill_grace(sandbox.kill_grace())
}

fn artifact_collector(config: &SimflowConfig) -> ArtifactCollector {
    let artifacts = config.artifacts();
    ArtifactCollector::new(
        FramePattern::new(artifacts.frame_prefix.clone(), artifacts.frame_extension.clone()),
        artifacts.frame_delay(),
    )
}

fn execute_settings(config: &SimflowConfig) -> ExecuteSettings {
    ExecuteSettings {
        runs_root: config.runs().root,
        timeout: config.sandbox().timeout(),
        animation_file: config.artifacts().animation_file,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use simflow_config::{PipelineSection, SandboxSection};
    use simflow_llm::MockTransform;
    use std::sync::Arc;

    #[test]
    fn test_default_order() {
        let graph =
            build_pipeline(&SimflowConfig::default(), Arc::new(MockTransform::new(Vec::<&str>::new())))
                .unwrap();
        assert_eq!(
            graph.stage_names(),
            vec!["interpret", "codegen", "execute", "summarise"]
        );
    }

    #[test]
    fn test_acknowledge_adds_chat_first() {
        let config = SimflowConfig {
            pipeline: Some(PipelineSection { acknowledge: true }),
            ..Default::default()
        };
        let graph = build_pipeline(&config, Arc::new(MockTransform::new(Vec::<&str>::new()))).unwrap();
        assert_eq!(graph.stage_names()[0], "chat");
        assert_eq!(graph.len(), 5);
    }

    #[test]
    fn test_executor_config_from_section() {
        let config = SimflowConfig {
            sandbox: Some(SandboxSection {
                interpreter: "octave".into(),
                args: vec!["--no-gui".into()],
                kill_grace_ms: 50,
                toolkits: vec!["fltk".into()],
                ..Default::default()
            }),
            ..Default::default()
        };

        let executor = executor_config(&config);
        assert_eq!(executor.program, "octave");
        assert_eq!(executor.args, vec!["--no-gui"]);
        assert_eq!(executor.kill_grace, std::time::Duration::from_millis(50));
        assert_eq!(executor.bootstrap.toolkits, vec!["fltk"]);
        assert_eq!(executor.bootstrap.fallback, "gnuplot");
    }
}
