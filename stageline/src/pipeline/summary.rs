//! Report produced by driving a pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What a call to `run` or `run_with` did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Identifier of this run.
    pub run_id: Uuid,
    /// Name of the transform that was driven.
    pub pipeline: String,
    /// Productive steps performed during this run.
    pub steps: u64,
    /// Whether the pipeline was finished when the run returned.
    pub finished: bool,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// When the run returned.
    pub ended_at: DateTime<Utc>,
    /// Wall-clock duration in milliseconds.
    pub duration_ms: f64,
}

impl RunSummary {
    /// Serializes the summary to JSON.
    pub fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}
