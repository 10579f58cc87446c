//! Pull producers.

use std::fmt::{self, Debug};

use tracing::{debug, trace};

use super::{Hooked, Lifecycle, Stage};
use crate::core::{HookPhase, StageState};
use crate::errors::PipelineError;

/// Hook pulling one value from a source context; `None` signals end of data.
pub type ReadHook<C, V> = Box<dyn FnMut(&mut C) -> anyhow::Result<Option<V>> + Send>;

trait Reader<V>: Lifecycle {
    fn read(&mut self) -> Result<Option<V>, PipelineError>;
}

impl<C: Send, V> Reader<V> for Hooked<C, ReadHook<C, V>> {
    fn read(&mut self) -> Result<Option<V>, PipelineError> {
        if self.stage.is_finished() {
            return Ok(None);
        }
        let hook = &mut self.hook;
        let value = self.stage.invoke(HookPhase::Read, |context| hook(context))?;
        if value.is_none() {
            debug!(stage = %self.stage.name(), "Source exhausted");
            self.stage.finish()?;
        } else {
            trace!(stage = %self.stage.name(), "Source read value");
        }
        Ok(value)
    }
}

/// A lazy, finite, non-restartable producer of values.
///
/// The first read prepares the stage. The first `None` from the read hook
/// finishes it; every later read returns `None` without calling the hook.
///
/// ```
/// use stageline::stages::{Source, Stage};
///
/// let mut lines = Source::new(
///     Stage::with_prepare("lines", || Ok(vec!["b", "a"])),
///     |pending| Ok(pending.pop()),
/// );
///
/// assert_eq!(lines.drain().unwrap(), vec!["a", "b"]);
/// assert!(lines.is_finished());
/// ```
pub struct Source<V> {
    inner: Box<dyn Reader<V>>,
}

impl<V: 'static> Source<V> {
    /// Creates a source from a stage and its read hook.
    pub fn new<C, F>(stage: Stage<C>, read: F) -> Self
    where
        C: Send + 'static,
        F: FnMut(&mut C) -> anyhow::Result<Option<V>> + Send + 'static,
    {
        let read: ReadHook<C, V> = Box::new(read);
        Self {
            inner: Box::new(Hooked::new(stage, read)),
        }
    }

    /// Creates a context-free source from a read function.
    pub fn from_fn<F>(name: impl Into<String>, mut read: F) -> Self
    where
        F: FnMut() -> anyhow::Result<Option<V>> + Send + 'static,
    {
        Self::new(Stage::new(name), move |_: &mut ()| read())
    }
}

impl<V> Source<V> {
    /// Pulls the next value, or `None` once the source is exhausted.
    pub fn read(&mut self) -> Result<Option<V>, PipelineError> {
        self.inner.read()
    }

    /// Reads until the end-of-data sentinel and returns every value.
    pub fn drain(&mut self) -> Result<Vec<V>, PipelineError> {
        let mut values = Vec::new();
        while let Some(value) = self.read()? {
            values.push(value);
        }
        Ok(values)
    }

    /// Returns the source name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.inner.name()
    }

    /// Returns true once the source has been prepared.
    #[must_use]
    pub fn is_prepared(&self) -> bool {
        self.inner.is_prepared()
    }

    /// Returns true once the source is exhausted and finished.
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

impl<V> Debug for Source<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Source")
            .field("name", &self.name())
            .field("state", &self.state())
            .finish()
    }
}
