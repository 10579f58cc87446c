//! Error types for stageline.
//!
//! Topology and configuration errors are raised at the point of violation
//! (attach time and build time). Hook errors wrap whatever a caller-supplied
//! hook returned and propagate to the caller of `read`, `write`, `advance`
//! or `run` without any recovery.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use crate::core::HookPhase;

/// The main error type for stageline operations.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// An invalid input attachment on a transform.
    #[error("{0}")]
    Topology(#[from] TopologyError),

    /// The pipeline builder was asked to build an incomplete pipeline.
    #[error("{0}")]
    Configuration(#[from] ConfigurationError),

    /// A caller-supplied hook failed.
    #[error("{phase} hook failed in stage '{stage}': {source}")]
    Hook {
        /// The stage whose hook failed.
        stage: String,
        /// The hook that failed.
        phase: HookPhase,
        /// The error returned by the hook.
        #[source]
        source: anyhow::Error,
    },
}

impl PipelineError {
    /// Wraps a hook failure.
    #[must_use]
    pub fn hook(stage: impl Into<String>, phase: HookPhase, source: anyhow::Error) -> Self {
        Self::Hook {
            stage: stage.into(),
            phase,
            source,
        }
    }

    /// Returns the diagnostic info for this error.
    #[must_use]
    pub fn info(&self) -> ErrorInfo {
        match self {
            Self::Topology(err) => err.info(),
            Self::Configuration(err) => err.info(),
            Self::Hook { stage, phase, .. } => {
                ErrorInfo::new("HOOK-FAILED", format!("The {phase} hook of '{stage}' returned an error"))
                    .with_context_entry("stage", stage.as_str())
                    .with_context_entry("phase", phase.to_string())
            }
        }
    }

    /// Returns true for errors raised while wiring a pipeline.
    #[must_use]
    pub const fn is_wiring_error(&self) -> bool {
        matches!(self, Self::Topology(_) | Self::Configuration(_))
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = self.info().to_dict();
        map.insert("message".to_string(), serde_json::json!(self.to_string()));
        map
    }
}

/// Code, summary and hint describing an error.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ErrorInfo {
    /// Error code (e.g., "TOPOLOGY-MIXED").
    pub code: String,
    /// Short summary of the error.
    pub summary: String,
    /// Hint for fixing the error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fix_hint: Option<String>,
    /// Additional context key-value pairs.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub context: HashMap<String, String>,
}

impl ErrorInfo {
    /// Creates a new error info.
    #[must_use]
    pub fn new(code: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            summary: summary.into(),
            fix_hint: None,
            context: HashMap::new(),
        }
    }

    /// Sets the fix hint.
    #[must_use]
    pub fn with_fix_hint(mut self, hint: impl Into<String>) -> Self {
        self.fix_hint = Some(hint.into());
        self
    }

    /// Adds a single context entry.
    #[must_use]
    pub fn with_context_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Converts to a dictionary representation.
    ///
    /// Absent hints and empty context are left out.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(fields)) => fields.into_iter().collect(),
            _ => HashMap::new(),
        }
    }
}

/// Invalid input attachment on a transform.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TopologyError {
    /// The transform already reads from an upstream transform.
    #[error("Transform '{transform}' already reads from upstream transform '{upstream}'; cannot add more inputs after a chain is set")]
    ChainAlreadySet {
        /// The transform being attached to.
        transform: String,
        /// The transform already chained upstream.
        upstream: String,
    },

    /// A transform was offered as input after plain sources were attached.
    #[error("Transform '{transform}' already has plain sources; cannot mix a chain with plain sources")]
    MixedInputs {
        /// The transform being attached to.
        transform: String,
    },

    /// A transform with its own sinks was offered as an upstream chain.
    #[error("Transform '{upstream}' has sinks attached and cannot be chained into '{transform}'")]
    UpstreamHasOutputs {
        /// The transform being attached to.
        transform: String,
        /// The offending upstream transform.
        upstream: String,
    },
}

impl TopologyError {
    /// Returns the diagnostic info for this error.
    #[must_use]
    pub fn info(&self) -> ErrorInfo {
        match self {
            Self::ChainAlreadySet { transform, upstream } => {
                ErrorInfo::new("TOPOLOGY-CHAIN_SET", "Inputs are locked once a chain is set")
                    .with_fix_hint("Attach sources to the upstream transform instead.")
                    .with_context_entry("transform", transform.as_str())
                    .with_context_entry("upstream", upstream.as_str())
            }
            Self::MixedInputs { transform } => {
                ErrorInfo::new("TOPOLOGY-MIXED", "A chained transform must be the only input")
                    .with_fix_hint("Chain the transform before any source is attached, or attach the sources upstream.")
                    .with_context_entry("transform", transform.as_str())
            }
            Self::UpstreamHasOutputs { transform, upstream } => {
                ErrorInfo::new("TOPOLOGY-UPSTREAM_OUTPUTS", "An upstream transform cannot have sinks")
                    .with_fix_hint("Attach the sinks to the most downstream transform.")
                    .with_context_entry("transform", transform.as_str())
                    .with_context_entry("upstream", upstream.as_str())
            }
        }
    }
}

/// Incomplete pipeline declaration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// No source was declared.
    #[error("Pipeline '{pipeline}' needs at least one source")]
    MissingSource {
        /// The pipeline name.
        pipeline: String,
    },

    /// No sink was declared.
    #[error("Pipeline '{pipeline}' needs at least one sink")]
    MissingSink {
        /// The pipeline name.
        pipeline: String,
    },
}

impl ConfigurationError {
    /// Returns the diagnostic info for this error.
    #[must_use]
    pub fn info(&self) -> ErrorInfo {
        match self {
            Self::MissingSource { pipeline } => {
                ErrorInfo::new("CONFIG-NO_SOURCE", "Cannot build a pipeline without a source")
                    .with_fix_hint("Add at least one source before building.")
                    .with_context_entry("pipeline", pipeline.as_str())
            }
            Self::MissingSink { pipeline } => {
                ErrorInfo::new("CONFIG-NO_SINK", "Cannot build a pipeline without a sink")
                    .with_fix_hint("Add at least one sink before building.")
                    .with_context_entry("pipeline", pipeline.as_str())
            }
        }
    }
}
