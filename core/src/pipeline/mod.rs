// core/src/pipeline/mod.rs

//! A small ordered-step pipeline. Each named step carries async handlers that
//! share one lockable context; a handler may stop the run early or fail it.

pub mod context_data;
pub mod control;
pub mod definition;
pub mod execution;

pub use context_data::ContextData;
pub use control::{PipelineControl, PipelineResult};
pub use definition::{Handler, Pipeline, StepDef};
