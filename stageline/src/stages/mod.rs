//! Sources, sinks and the lifecycle they share.
//!
//! A [`Stage`] owns a context of any type. [`Source`] and [`Sink`] erase that
//! type so stages with different contexts can sit in one pipeline.

mod lifecycle;
mod sink;
mod source;

pub use lifecycle::{FinishHook, PrepareHook, Stage};
pub use sink::{Sink, WriteHook};
pub use source::{ReadHook, Source};

use crate::core::StageState;
use crate::errors::PipelineError;

/// Context-independent view of a stage lifecycle.
pub(crate) trait Lifecycle: Send {
    fn name(&self) -> &str;

    fn is_prepared(&self) -> bool;

    fn is_finished(&self) -> bool;

    fn prepare(&mut self) -> Result<(), PipelineError>;

    fn finish(&mut self) -> Result<bool, PipelineError>;

    fn state(&self) -> StageState {
        StageState::from_flags(self.is_prepared(), self.is_finished())
    }
}

/// A stage paired with the hook that does its main work.
pub(crate) struct Hooked<C, H> {
    pub(crate) stage: Stage<C>,
    pub(crate) hook: H,
}

impl<C, H> Hooked<C, H> {
    pub(crate) const fn new(stage: Stage<C>, hook: H) -> Self {
        Self { stage, hook }
    }
}

impl<C, H> Lifecycle for Hooked<C, H>
where
    C: Send,
    H: Send,
{
    fn name(&self) -> &str {
        self.stage.name()
    }

    fn is_prepared(&self) -> bool {
        self.stage.is_prepared()
    }

    fn is_finished(&self) -> bool {
        self.stage.is_finished()
    }

    fn prepare(&mut self) -> Result<(), PipelineError> {
        self.stage.prepare().map(|_| ())
    }

    fn finish(&mut self) -> Result<bool, PipelineError> {
        self.stage.finish()
    }
}
