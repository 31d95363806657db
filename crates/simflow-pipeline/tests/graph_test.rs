//! Integration tests for StageGraph ordering, merging and failure handling.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures::StreamExt;
use simflow_pipeline::{
    ErrorKind, FnStage, PipelineError, SharedState, StageEvent, StageGraph, StateUpdate,
};

fn script_stage(name: &str, script: &'static str) -> FnStage {
    FnStage::new(name, move |_| async move {
        Ok::<_, PipelineError>(StateUpdate::new().with_script(script))
    })
}

#[tokio::test]
async fn test_events_follow_registration_order() {
    let mut graph = StageGraph::new();
    graph.register("first", script_stage("first", "a")).unwrap();
    graph.register("second", script_stage("second", "b")).unwrap();
    graph.register("third", script_stage("third", "c")).unwrap();

    let events: Vec<StageEvent> = graph.execute(SharedState::new("req")).collect().await;
    assert_eq!(events.len(), 4);

    let names: Vec<&str> = events
        .iter()
        .filter_map(|e| match e {
            StageEvent::Completed { stage, .. } => Some(stage.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(names, ["first", "second", "third"]);

    match events.last() {
        Some(StageEvent::Finished(state)) => assert_eq!(state.script.as_deref(), Some("c")),
        other => panic!("Expected Finished, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_each_stage_sees_previous_updates() {
    let mut graph = StageGraph::new();
    graph
        .register(
            "write",
            FnStage::new("write", |state: SharedState| async move {
                let script = format!("disp('{}')", state.request);
                Ok::<_, PipelineError>(StateUpdate::new().with_script(script))
            }),
        )
        .unwrap();
    graph
        .register(
            "read",
            FnStage::new("read", |state: SharedState| async move {
                let script = state.require_script()?.to_string();
                Ok::<_, PipelineError>(StateUpdate::new().with_summary(format!("ran {script}")))
            }),
        )
        .unwrap();

    let state = graph.run(SharedState::new("hi")).await.unwrap();
    assert_eq!(state.summary.as_deref(), Some("ran disp('hi')"));
}

#[tokio::test]
async fn test_empty_update_keeps_fields() {
    let mut graph = StageGraph::new();
    graph.register("write", script_stage("write", "x = 1;")).unwrap();
    graph
        .register(
            "noop",
            FnStage::new("noop", |_| async { Ok::<_, PipelineError>(StateUpdate::new()) }),
        )
        .unwrap();

    let state = graph.run(SharedState::new("req")).await.unwrap();
    assert_eq!(state.script.as_deref(), Some("x = 1;"));
    assert_eq!(state.request, "req");
}

#[tokio::test]
async fn test_failure_stops_the_run() {
    let later_calls = Arc::new(AtomicUsize::new(0));
    let counter = later_calls.clone();

    let mut graph = StageGraph::new();
    graph.register("write", script_stage("write", "x = 1;")).unwrap();
    graph
        .register(
            "validate",
            FnStage::new("validate", |_| async {
                Err::<StateUpdate, _>(PipelineError::Validation("unknown task 'x'".into()))
            }),
        )
        .unwrap();
    graph
        .register(
            "never",
            FnStage::new("never", move |_| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, PipelineError>(StateUpdate::new())
                }
            }),
        )
        .unwrap();

    let events: Vec<StageEvent> = graph.execute(SharedState::new("req")).collect().await;
    assert_eq!(events.len(), 2);
    assert!(matches!(&events[0], StageEvent::Completed { stage, .. } if stage == "write"));

    match &events[1] {
        StageEvent::Failed(failure) => {
            assert_eq!(failure.stage, "validate");
            assert_eq!(failure.kind(), ErrorKind::Validation);
            assert_eq!(failure.state.script.as_deref(), Some("x = 1;"));
        }
        other => panic!("Expected Failed, got: {other:?}"),
    }
    assert_eq!(later_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_panicking_stage_becomes_failure() {
    let mut graph = StageGraph::new();
    graph
        .register(
            "boom",
            FnStage::new("boom", |_| async {
                if true {
                    panic!("stage exploded");
                }
                Ok::<_, PipelineError>(StateUpdate::new())
            }),
        )
        .unwrap();

    let failure = graph.run(SharedState::new("req")).await.unwrap_err();
    assert_eq!(failure.stage, "boom");
    assert_eq!(failure.kind(), ErrorKind::Internal);
    assert!(failure.error.to_string().contains("stage exploded"));
}

#[tokio::test]
async fn test_duplicate_names_rejected() {
    let mut graph = StageGraph::new();
    graph.register("a", script_stage("a", "1")).unwrap();
    let err = graph.register("a", script_stage("a", "2")).unwrap_err();
    assert!(matches!(err, PipelineError::DuplicateStage(name) if name == "a"));
    assert_eq!(graph.len(), 1);
}

#[tokio::test]
async fn test_empty_graph_finishes_immediately() {
    let graph = StageGraph::new();
    let events: Vec<StageEvent> = graph.execute(SharedState::new("req")).collect().await;
    assert_eq!(events.len(), 1);
    assert!(matches!(&events[0], StageEvent::Finished(s) if s.request == "req"));
}

#[tokio::test]
async fn test_stream_is_lazy() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();

    let mut graph = StageGraph::new();
    graph
        .register(
            "count",
            FnStage::new("count", move |_| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, PipelineError>(StateUpdate::new())
                }
            }),
        )
        .unwrap();

    let stream = graph.execute(SharedState::new("req"));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    drop(stream);
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    graph.run(SharedState::new("req")).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}
