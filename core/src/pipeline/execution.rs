// core/src/pipeline/execution.rs

use crate::error::{CheckoutError, CheckoutResult};
use crate::pipeline::context_data::ContextData;
use crate::pipeline::control::{PipelineControl, PipelineResult};
use crate::pipeline::definition::{Handler, Pipeline};
use tracing::{event, span, Instrument, Level};

impl<T: 'static + Send + Sync> Pipeline<T> {
  /// Runs every step in order against `ctx_data`.
  ///
  /// The first handler error aborts the run and is returned unchanged; a
  /// `PipelineControl::Stop` ends it with `PipelineResult::Stopped`.
  pub async fn run(&self, ctx_data: ContextData<T>) -> CheckoutResult<PipelineResult> {
    let run_span = span!(Level::INFO, "pipeline_run", pipeline = %self.name, num_steps = self.steps.len());
    self.run_steps(ctx_data).instrument(run_span).await
  }

  async fn run_steps(&self, ctx_data: ContextData<T>) -> CheckoutResult<PipelineResult> {
    event!(Level::DEBUG, "Pipeline execution starting.");

    for (step_idx, step_def) in self.steps.iter().enumerate() {
      let step_name = step_def.name.as_str();
      let on_handlers = self.on.get(step_name).filter(|v| !v.is_empty());
      let after_handlers = self.after.get(step_name).filter(|v| !v.is_empty());

      if on_handlers.is_none() && after_handlers.is_none() {
        if step_def.optional {
          event!(Level::DEBUG, step = step_name, "Optional step has no handlers, skipping.");
          continue;
        }
        event!(Level::ERROR, step = step_name, "Non-optional step has no handlers.");
        return Err(CheckoutError::HandlerMissing {
          step_name: step_def.name.clone(),
        });
      }

      let step_span = span!(Level::INFO, "pipeline_step", step_name, step_index = step_idx);
      let control = async {
        for (phase, handlers) in [("on", on_handlers), ("after", after_handlers)] {
          let Some(handlers) = handlers else { continue };
          if run_phase(phase, handlers, &ctx_data).await? == PipelineControl::Stop {
            return Ok(PipelineControl::Stop);
          }
        }
        Ok::<_, CheckoutError>(PipelineControl::Continue)
      }
      .instrument(step_span)
      .await?;

      if control == PipelineControl::Stop {
        event!(Level::INFO, step = step_name, "Pipeline stopped by a handler.");
        return Ok(PipelineResult::Stopped);
      }
    }

    event!(Level::DEBUG, "Pipeline execution completed.");
    Ok(PipelineResult::Completed)
  }
}

async fn run_phase<T: 'static + Send + Sync>(
  phase: &'static str,
  handlers: &[Handler<T>],
  ctx_data: &ContextData<T>,
) -> CheckoutResult<PipelineControl> {
  for handler_fn in handlers {
    match handler_fn(ctx_data.clone()).await {
      Ok(PipelineControl::Continue) => {}
      Ok(PipelineControl::Stop) => return Ok(PipelineControl::Stop),
      Err(e) => {
        event!(Level::WARN, phase, error = %e, "Step handler failed.");
        return Err(e);
      }
    }
  }
  Ok(PipelineControl::Continue)
}
