//! The one-shot prepare/finish lifecycle shared by every stage.

use std::fmt::{self, Debug};

use tracing::{debug, warn};

use crate::core::{HookPhase, StageState};
use crate::errors::PipelineError;

/// Hook producing the context of a stage.
pub type PrepareHook<C> = Box<dyn FnMut() -> anyhow::Result<C> + Send>;

/// Hook tearing a stage down; receives `None` if the stage was never prepared.
pub type FinishHook<C> = Box<dyn FnMut(Option<&mut C>) -> anyhow::Result<()> + Send>;

/// Lifecycle holder for one stage.
///
/// The prepare hook runs at most once, the first time the stage needs its
/// context, and never just to finish the stage. The finish hook runs at most
/// once, after which the stage is inert. Hooks are configured at construction and invoked through
/// [`Stage::prepare`] and [`Stage::finish`], which never configure anything.
///
/// ```
/// use stageline::stages::Stage;
///
/// let mut stage = Stage::with_prepare("counter", || Ok(0_u32))
///     .on_finish(|count| {
///         assert_eq!(count.copied(), Some(1));
///         Ok(())
///     });
///
/// *stage.prepare().unwrap() += 1;
/// assert!(stage.finish().unwrap());
/// assert!(!stage.finish().unwrap());
/// ```
pub struct Stage<C> {
    name: String,
    context: Option<C>,
    prepare_hook: PrepareHook<C>,
    finish_hook: Option<FinishHook<C>>,
    finished: bool,
}

impl Stage<()> {
    /// Creates a stage whose context is `()`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_prepare(name, || Ok(()))
    }
}

impl<C> Stage<C> {
    /// Creates a stage whose context is produced by `hook`.
    pub fn with_prepare<F>(name: impl Into<String>, hook: F) -> Self
    where
        F: FnMut() -> anyhow::Result<C> + Send + 'static,
    {
        Self {
            name: name.into(),
            context: None,
            prepare_hook: Box::new(hook),
            finish_hook: None,
            finished: false,
        }
    }

    /// Sets the finish hook.
    #[must_use]
    pub fn on_finish<F>(mut self, hook: F) -> Self
    where
        F: FnMut(Option<&mut C>) -> anyhow::Result<()> + Send + 'static,
    {
        self.finish_hook = Some(Box::new(hook));
        self
    }

    /// Returns the stage name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns true once the prepare hook has run.
    #[must_use]
    pub const fn is_prepared(&self) -> bool {
        self.context.is_some()
    }

    /// Returns true once the finish hook has run.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.finished
    }

    /// Returns the lifecycle state.
    #[must_use]
    pub const fn state(&self) -> StageState {
        StageState::from_flags(self.is_prepared(), self.finished)
    }

    /// Returns the context, if the stage has been prepared.
    #[must_use]
    pub const fn context(&self) -> Option<&C> {
        self.context.as_ref()
    }

    /// Returns the context, running the prepare hook first if needed.
    pub fn prepare(&mut self) -> Result<&mut C, PipelineError> {
        let context = match self.context.take() {
            Some(context) => context,
            None => {
                let context = (self.prepare_hook)()
                    .map_err(|source| hook_failed(&self.name, HookPhase::Prepare, source))?;
                debug!(stage = %self.name, "Stage prepared");
                context
            }
        };
        Ok(self.context.insert(context))
    }

    /// Runs the finish hook exactly once.
    ///
    /// Returns `Ok(false)` without touching the hook when the stage is
    /// already finished. A stage that was never prepared stays unprepared
    /// and its finish hook receives `None`.
    pub fn finish(&mut self) -> Result<bool, PipelineError> {
        if self.finished {
            return Ok(false);
        }
        if let Some(hook) = self.finish_hook.as_mut() {
            hook(self.context.as_mut())
                .map_err(|source| hook_failed(&self.name, HookPhase::Finish, source))?;
        }
        self.finished = true;
        debug!(stage = %self.name, "Stage finished");
        Ok(true)
    }

    /// Runs `call` with the prepared context, attributing any failure to
    /// this stage and `phase`.
    pub(crate) fn invoke<R>(
        &mut self,
        phase: HookPhase,
        call: impl FnOnce(&mut C) -> anyhow::Result<R>,
    ) -> Result<R, PipelineError> {
        let context = self.prepare()?;
        call(context).map_err(|source| hook_failed(&self.name, phase, source))
    }
}

fn hook_failed(stage: &str, phase: HookPhase, source: anyhow::Error) -> PipelineError {
    warn!(stage = %stage, phase = %phase, error = %source, "Hook failed");
    PipelineError::hook(stage, phase, source)
}

impl<C> Debug for Stage<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stage")
            .field("name", &self.name)
            .field("state", &self.state())
            .field("has_finish_hook", &self.finish_hook.is_some())
            .finish()
    }
}
