//! Wall-clock timing for pipeline runs.

use std::time::Instant;

use chrono::{DateTime, Utc};

/// Start and end of a timed run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunTiming {
    /// When the timer was started.
    pub started_at: DateTime<Utc>,
    /// When the timer was stopped.
    pub ended_at: DateTime<Utc>,
    /// Monotonic duration in milliseconds.
    pub duration_ms: f64,
}

/// Times one run of a pipeline.
///
/// Timestamps come from the system clock, the duration from a monotonic one.
#[derive(Debug, Clone)]
pub struct RunTimer {
    pipeline: String,
    started_at: DateTime<Utc>,
    start: Instant,
}

impl RunTimer {
    /// Starts timing a run of `pipeline`.
    #[must_use]
    pub fn start(pipeline: impl Into<String>) -> Self {
        Self {
            pipeline: pipeline.into(),
            started_at: Utc::now(),
            start: Instant::now(),
        }
    }

    /// Returns the pipeline being timed.
    #[must_use]
    pub fn pipeline(&self) -> &str {
        &self.pipeline
    }

    /// Returns milliseconds elapsed so far.
    #[must_use]
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }

    /// Stops the timer.
    #[must_use]
    pub fn stop(self) -> RunTiming {
        RunTiming {
            started_at: self.started_at,
            ended_at: Utc::now(),
            duration_ms: self.elapsed_ms(),
        }
    }
}
