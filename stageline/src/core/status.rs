//! Stage role, hook phase and lifecycle state enums.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The role a stage plays in a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageRole {
    /// A pull producer that yields values until the end-of-data sentinel.
    Source,
    /// A fan-in/fan-out processing node.
    Transform,
    /// A push consumer of output tuples.
    Sink,
}

impl fmt::Display for StageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source => write!(f, "source"),
            Self::Transform => write!(f, "transform"),
            Self::Sink => write!(f, "sink"),
        }
    }
}

/// The hook being invoked when a stage does work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookPhase {
    /// Context construction, run at most once.
    Prepare,
    /// Pulling one value from a source.
    Read,
    /// Pushing one tuple into a sink.
    Write,
    /// Turning one input tuple into one output tuple.
    Transform,
    /// Teardown, run at most once.
    Finish,
}

impl fmt::Display for HookPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Prepare => write!(f, "prepare"),
            Self::Read => write!(f, "read"),
            Self::Write => write!(f, "write"),
            Self::Transform => write!(f, "transform"),
            Self::Finish => write!(f, "finish"),
        }
    }
}

/// Where a stage is in its one-way lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageState {
    /// Constructed, prepare hook not yet run.
    Pending,
    /// Context is available, finish hook not yet run.
    Prepared,
    /// Finish hook has run; further operations are no-ops.
    Finished,
}

impl Default for StageState {
    fn default() -> Self {
        Self::Pending
    }
}

impl fmt::Display for StageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Prepared => write!(f, "prepared"),
            Self::Finished => write!(f, "finished"),
        }
    }
}

impl StageState {
    /// Derives the state from the two lifecycle flags.
    #[must_use]
    pub const fn from_flags(prepared: bool, finished: bool) -> Self {
        if finished {
            Self::Finished
        } else if prepared {
            Self::Prepared
        } else {
            Self::Pending
        }
    }

    /// Returns true once the stage can do no more work.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished)
    }
}
