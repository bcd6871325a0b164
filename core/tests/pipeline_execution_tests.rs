// tests/pipeline_execution_tests.rs
mod common;

use checkout_core::{CheckoutError, ContextData, Pipeline, PipelineControl, PipelineResult};
use common::*;
use serial_test::serial;

#[derive(Clone, Debug, Default)]
struct StepLog {
  steps_executed: Vec<String>,
  stop_at: Option<&'static str>,
}

fn recording_pipeline(steps: &[(&str, bool)]) -> Pipeline<StepLog> {
  let mut pipeline = Pipeline::new("test_pipeline", steps);
  for (name, optional) in steps {
    if *optional {
      continue;
    }
    let step = name.to_string();
    pipeline.on(name, move |ctx: ContextData<StepLog>| {
      let step = step.clone();
      async move {
        let mut guard = ctx.write();
        guard.steps_executed.push(step.clone());
        if guard.stop_at == Some(step.as_str()) {
          return Ok(PipelineControl::Stop);
        }
        Ok(PipelineControl::Continue)
      }
    });
  }
  pipeline
}

#[tokio::test]
#[serial]
async fn test_pipeline_runs_steps_in_order() {
  setup_tracing();
  let pipeline = recording_pipeline(&[("step1", false), ("step2", false), ("step3", false)]);

  let ctx = ContextData::new(StepLog::default());
  let result = pipeline.run(ctx.clone()).await;

  assert_eq!(result.unwrap(), PipelineResult::Completed);
  assert_eq!(ctx.read().steps_executed, vec!["step1", "step2", "step3"]);
}

#[tokio::test]
#[serial]
async fn test_pipeline_stops_on_pipeline_control_stop() {
  setup_tracing();
  let pipeline = recording_pipeline(&[("stepA", false), ("stopStep", false), ("stepC", false)]);

  let ctx = ContextData::new(StepLog {
    stop_at: Some("stopStep"),
    ..Default::default()
  });
  let result = pipeline.run(ctx.clone()).await;

  assert_eq!(result.unwrap(), PipelineResult::Stopped);
  assert_eq!(ctx.read().steps_executed, vec!["stepA", "stopStep"]);
}

#[tokio::test]
#[serial]
async fn test_pipeline_propagates_handler_error() {
  setup_tracing();
  let mut pipeline = recording_pipeline(&[("good_step", false), ("another_step", false)]);
  pipeline.after("good_step", |_ctx: ContextData<StepLog>| async move {
    Err(CheckoutError::Internal("I am a bad hook!".to_string()))
  });

  let ctx = ContextData::new(StepLog::default());
  let result = pipeline.run(ctx.clone()).await;

  match result {
    Err(CheckoutError::Internal(msg)) => assert_eq!(msg, "I am a bad hook!"),
    other => panic!("expected the hook error, got {:?}", other),
  }
  assert_eq!(ctx.read().steps_executed, vec!["good_step"]);
}

#[tokio::test]
#[serial]
async fn test_optional_step_without_handlers_is_skipped() {
  setup_tracing();
  let pipeline = recording_pipeline(&[("first", false), ("maybe", true), ("last", false)]);

  let ctx = ContextData::new(StepLog::default());
  assert_eq!(pipeline.run(ctx.clone()).await.unwrap(), PipelineResult::Completed);
  assert_eq!(ctx.read().steps_executed, vec!["first", "last"]);
}

#[tokio::test]
#[serial]
async fn test_missing_handler_for_required_step_fails() {
  setup_tracing();
  let pipeline: Pipeline<StepLog> = Pipeline::new("bare", &[("unhandled", false)]);

  let result = pipeline.run(ContextData::new(StepLog::default())).await;
  assert!(matches!(result, Err(CheckoutError::HandlerMissing { step_name }) if step_name == "unhandled"));
}

#[test]
#[should_panic(expected = "step 'nope' is not declared")]
fn test_registering_handler_for_unknown_step_panics() {
  let mut pipeline: Pipeline<StepLog> = Pipeline::new("strict", &[("known", false)]);
  pipeline.on("nope", |_ctx: ContextData<StepLog>| async move { Ok(PipelineControl::Continue) });
}
