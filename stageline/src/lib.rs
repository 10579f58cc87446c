//! # Stageline
//!
//! Staged, pull-driven data pipelines.
//!
//! A pipeline is a linear chain built from three kinds of stage:
//!
//! - **Sources** pull values from somewhere until they run dry
//! - **Transforms** merge sources positionally (fan-in), or read from one
//!   upstream transform (chain), and broadcast each result to every sink
//!   (fan-out)
//! - **Sinks** push values somewhere
//!
//! Every stage has a one-shot lifecycle: its prepare hook runs lazily the
//! first time the stage is needed, and its finish hook runs exactly once
//! when the owning transform sees its inputs exhausted.
//!
//! ## Quick Start
//!
//! ```rust
//! use stageline::prelude::*;
//! use stageline::testing::{vec_source, CollectingSink};
//!
//! let gathered = CollectingSink::new();
//! let mut pipeline = PipelineBuilder::new("add-then-double")
//!     .add(vec_source("small", [1, 2, 3]))
//!     .add(vec_source("big", [10, 20, 30]))
//!     .add(Transform::from_fn("add_one", |inputs: Vec<Option<i64>>| {
//!         Ok(inputs.into_iter().map(|n| n.map(|n| n + 1)).collect())
//!     }))
//!     .add(Transform::from_fn("double", |inputs: Vec<Option<i64>>| {
//!         Ok(inputs.into_iter().map(|n| n.map(|n| n * 2)).collect())
//!     }))
//!     .add(gathered.sink("gather"))
//!     .build()?;
//!
//! pipeline.run()?;
//! assert_eq!(
//!     gathered.written(),
//!     vec![
//!         vec![Some(4), Some(22)],
//!         vec![Some(6), Some(42)],
//!         vec![Some(8), Some(62)],
//!     ]
//! );
//! # Ok::<(), stageline::errors::PipelineError>(())
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod config;
pub mod core;
pub mod errors;
pub mod observability;
pub mod pipeline;
pub mod stages;
pub mod testing;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::RunConfig;
    pub use crate::core::{HookPhase, StageRole, StageState};
    pub use crate::errors::{ConfigurationError, ErrorInfo, PipelineError, TopologyError};
    pub use crate::pipeline::{
        Input, Inputs, PipelineBuilder, PipelineElement, RunSummary, Transform,
    };
    pub use crate::stages::{Sink, Source, Stage};
}
