//! Push consumers.

use std::fmt::{self, Debug};

use tracing::trace;

use super::{Hooked, Lifecycle, Stage};
use crate::core::{HookPhase, StageState};
use crate::errors::PipelineError;

/// Hook consuming one output tuple with the sink context.
///
/// Positions with no value (an exhausted fan-in source) arrive as `None`.
pub type WriteHook<C, V> = Box<dyn FnMut(&mut C, &[Option<V>]) -> anyhow::Result<()> + Send>;

trait Writer<V>: Lifecycle {
    fn write(&mut self, values: &[Option<V>]) -> Result<(), PipelineError>;
}

impl<C: Send, V> Writer<V> for Hooked<C, WriteHook<C, V>> {
    fn write(&mut self, values: &[Option<V>]) -> Result<(), PipelineError> {
        if self.stage.is_finished() {
            return Ok(());
        }
        let hook = &mut self.hook;
        self.stage
            .invoke(HookPhase::Write, |context| hook(context, values))?;
        trace!(stage = %self.stage.name(), values = values.len(), "Sink wrote tuple");
        Ok(())
    }
}

/// A consumer of output tuples.
///
/// A sink never finishes itself: the transform that owns it calls
/// [`Sink::finish`] once its own inputs are exhausted. Writes after that
/// are dropped.
pub struct Sink<V> {
    inner: Box<dyn Writer<V>>,
}

impl<V: 'static> Sink<V> {
    /// Creates a sink from a stage and its write hook.
    pub fn new<C, F>(stage: Stage<C>, write: F) -> Self
    where
        C: Send + 'static,
        F: FnMut(&mut C, &[Option<V>]) -> anyhow::Result<()> + Send + 'static,
    {
        let write: WriteHook<C, V> = Box::new(write);
        Self {
            inner: Box::new(Hooked::new(stage, write)),
        }
    }

    /// Creates a context-free sink from a write function.
    pub fn from_fn<F>(name: impl Into<String>, mut write: F) -> Self
    where
        F: FnMut(&[Option<V>]) -> anyhow::Result<()> + Send + 'static,
    {
        Self::new(Stage::new(name), move |_: &mut (), values: &[Option<V>]| write(values))
    }

    /// Creates a sink that drops everything written to it.
    #[must_use]
    pub fn discard(name: impl Into<String>) -> Self {
        Self::new(Stage::new(name), |_: &mut (), _: &[Option<V>]| Ok(()))
    }
}

impl<V> Sink<V> {
    /// Writes one tuple, preparing the sink first if needed.
    pub fn write(&mut self, values: &[Option<V>]) -> Result<(), PipelineError> {
        self.inner.write(values)
    }

    /// Finishes the sink; returns false if it was already finished.
    pub fn finish(&mut self) -> Result<bool, PipelineError> {
        self.inner.finish()
    }

    /// Returns the sink name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.inner.name()
    }

    /// Returns true once the sink has been prepared.
    #[must_use]
    pub fn is_prepared(&self) -> bool {
        self.inner.is_prepared()
    }

    /// Returns true once the sink has been finished.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.inner.is_finished()
    }

    /// Returns the lifecycle state.
    #[must_use]
    pub fn state(&self) -> StageState {
        self.inner.state()
    }
}

impl<V> Debug for Sink<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sink")
            .field("name", &self.name())
            .field("state", &self.state())
            .finish()
    }
}
