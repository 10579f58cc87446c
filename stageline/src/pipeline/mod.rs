//! Pipeline assembly and execution.
//!
//! This module provides:
//! - The [`Transform`] processing node (fan-in, chaining, fan-out)
//! - The [`PipelineBuilder`] that wires declared stages into a chain
//! - The [`RunSummary`] reported by a run

mod builder;
mod element;
#[cfg(test)]
mod integration_tests;
mod summary;
mod transform;

pub use builder::{PipelineBuilder, IDENTITY_TRANSFORM};
pub use element::PipelineElement;
pub use summary::RunSummary;
pub use transform::{Input, Inputs, Transform, TransformHook};
