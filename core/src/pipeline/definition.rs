// core/src/pipeline/definition.rs

use crate::error::CheckoutResult;
use crate::pipeline::context_data::ContextData;
use crate::pipeline::control::PipelineControl;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

/// A boxed async step handler.
///
/// Handlers receive their own clone of the run's `ContextData<T>` and must not
/// hold a lock guard across an `.await`.
pub type Handler<T> =
  Box<dyn Fn(ContextData<T>) -> Pin<Box<dyn Future<Output = CheckoutResult<PipelineControl>> + Send>> + Send + Sync>;

#[derive(Debug, Clone)]
pub struct StepDef {
  pub name: String,
  /// An optional step without handlers is skipped instead of failing the run.
  pub optional: bool,
}

/// Ordered, named steps over a shared context of type `T`.
pub struct Pipeline<T: 'static + Send + Sync> {
  pub(crate) name: String,
  pub(crate) steps: Vec<StepDef>,
  pub(crate) on: HashMap<String, Vec<Handler<T>>>,
  pub(crate) after: HashMap<String, Vec<Handler<T>>>,
}

impl<T: 'static + Send + Sync> Pipeline<T> {
  pub fn new(name: &str, step_defs: &[(&str, bool)]) -> Self {
    let steps = step_defs
      .iter()
      .map(|(step, optional)| StepDef {
        name: (*step).to_string(),
        optional: *optional,
      })
      .collect();

    Self {
      name: name.to_string(),
      steps,
      on: HashMap::new(),
      after: HashMap::new(),
    }
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn step_names(&self) -> Vec<&str> {
    self.steps.iter().map(|s| s.name.as_str()).collect()
  }

  // Wiring a handler to an undeclared step is a programming error, not a runtime condition.
  fn ensure_step_exists(&self, step_name: &str) {
    if !self.steps.iter().any(|s| s.name == step_name) {
      panic!(
        "pipeline '{}' setup error: step '{}' is not declared",
        self.name, step_name
      );
    }
  }

  /// Attaches the main handler(s) of a step. Handlers run in registration order.
  pub fn on<F>(&mut self, step_name: &str, handler_fn: impl Fn(ContextData<T>) -> F + Send + Sync + 'static)
  where
    F: Future<Output = CheckoutResult<PipelineControl>> + Send + 'static,
  {
    self.ensure_step_exists(step_name);
    let handler: Handler<T> = Box::new(move |ctx| Box::pin(handler_fn(ctx)));
    self.on.entry(step_name.to_string()).or_default().push(handler);
  }

  /// Attaches a hook that runs once the step's `on` handlers have all continued.
  pub fn after<F>(&mut self, step_name: &str, handler_fn: impl Fn(ContextData<T>) -> F + Send + Sync + 'static)
  where
    F: Future<Output = CheckoutResult<PipelineControl>> + Send + 'static,
  {
    self.ensure_step_exists(step_name);
    let handler: Handler<T> = Box::new(move |ctx| Box::pin(handler_fn(ctx)));
    self.after.entry(step_name.to_string()).or_default().push(handler);
  }
}
