// core/src/checkout/plan.rs

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckoutStep {
  Contact,
  Shipping,
  /// Choosing the licensed dealer that receives firearm items.
  Ffl,
  Payment,
}

impl CheckoutStep {
  pub fn as_str(&self) -> &'static str {
    match self {
      CheckoutStep::Contact => "contact",
      CheckoutStep::Shipping => "shipping",
      CheckoutStep::Ffl => "ffl",
      CheckoutStep::Payment => "payment",
    }
  }
}

impl fmt::Display for CheckoutStep {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// The steps a cart walks through before payment, with progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutPlan {
  steps: Vec<CheckoutStep>,
  current: CheckoutStep,
  completed: Vec<CheckoutStep>,
}

impl CheckoutPlan {
  /// `requires_ffl`: the cart holds items that must ship to a dealer.
  /// `has_shippable`: the cart holds items that ship to the customer.
  pub fn for_cart(requires_ffl: bool, has_shippable: bool) -> Self {
    use CheckoutStep::*;
    let steps = match (requires_ffl, has_shippable) {
      (true, false) => vec![Contact, Ffl, Payment],
      (true, true) => vec![Contact, Shipping, Ffl, Payment],
      (false, true) => vec![Contact, Shipping, Payment],
      (false, false) => vec![Contact, Payment],
    };
    Self {
      steps,
      current: Contact,
      completed: Vec::new(),
    }
  }

  pub fn steps(&self) -> &[CheckoutStep] {
    &self.steps
  }

  pub fn current(&self) -> CheckoutStep {
    self.current
  }

  pub fn includes(&self, step: CheckoutStep) -> bool {
    self.steps.contains(&step)
  }

  /// The step after `step`, or `None` for the last step and for steps not in the plan.
  pub fn next_step(&self, step: CheckoutStep) -> Option<CheckoutStep> {
    let idx = self.steps.iter().position(|s| *s == step)?;
    self.steps.get(idx + 1).copied()
  }

  pub fn mark_complete(&mut self, step: CheckoutStep) {
    if !self.completed.contains(&step) {
      self.completed.push(step);
    }
  }

  pub fn is_complete(&self, step: CheckoutStep) -> bool {
    self.completed.contains(&step)
  }

  /// Completes the current step and moves on. Stays put on the last step.
  pub fn advance(&mut self) -> Option<CheckoutStep> {
    let next = self.next_step(self.current)?;
    self.mark_complete(self.current);
    self.current = next;
    Some(next)
  }

  /// Jumps to `step` if the plan has it.
  pub fn go_to(&mut self, step: CheckoutStep) -> bool {
    if self.includes(step) {
      self.current = step;
      true
    } else {
      false
    }
  }
}
