//! Run configuration.

use serde::{Deserialize, Serialize};

/// Configuration for driving a pipeline with `run_with`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Maximum productive steps per run; `None` runs to exhaustion.
    pub max_steps: Option<u64>,
    /// Finish the pipeline and its sinks when the step limit is hit,
    /// instead of leaving it resumable.
    pub finish_on_limit: bool,
}

impl RunConfig {
    /// Creates a config that runs to exhaustion.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the step limit.
    #[must_use]
    pub const fn with_max_steps(mut self, max_steps: u64) -> Self {
        self.max_steps = Some(max_steps);
        self
    }

    /// Sets whether hitting the step limit finishes the pipeline.
    #[must_use]
    pub const fn with_finish_on_limit(mut self, finish: bool) -> Self {
        self.finish_on_limit = finish;
        self
    }

    /// Parses a config from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
