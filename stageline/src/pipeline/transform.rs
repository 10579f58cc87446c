//! The fan-in / transform / fan-out processing node.

use std::fmt::{self, Debug};

use tracing::{debug, info_span, trace};
use uuid::Uuid;

use super::RunSummary;
use crate::config::RunConfig;
use crate::core::{HookPhase, StageRole, StageState};
use crate::errors::{PipelineError, TopologyError};
use crate::observability::RunTimer;
use crate::stages::{Hooked, Lifecycle, Sink, Source, Stage};

/// Hook turning one positional input tuple into one output tuple.
///
/// Exhausted fan-in positions arrive as `None`. In chain mode the upstream
/// output tuple arrives exactly as it was produced, `None` positions
/// included.
pub type TransformHook<C, V> =
    Box<dyn FnMut(&mut C, Vec<Option<V>>) -> anyhow::Result<Vec<Option<V>>> + Send>;

trait Transformer<V>: Lifecycle {
    fn apply(&mut self, inputs: Vec<Option<V>>) -> Result<Vec<Option<V>>, PipelineError>;
}

impl<C: Send, V> Transformer<V> for Hooked<C, TransformHook<C, V>> {
    fn apply(&mut self, inputs: Vec<Option<V>>) -> Result<Vec<Option<V>>, PipelineError> {
        let hook = &mut self.hook;
        self.stage
            .invoke(HookPhase::Transform, |context| hook(context, inputs))
    }
}

/// Where a transform pulls its input tuples from.
///
/// The mode is fixed by the first attachment: plain sources lock in
/// [`Inputs::FanIn`], an upstream transform locks in [`Inputs::Chain`].
pub enum Inputs<V> {
    /// Sources read positionally, in attachment order.
    FanIn(Vec<Source<V>>),
    /// A single upstream transform whose output tuples become the inputs.
    Chain(Box<Transform<V>>),
}

impl<V> Default for Inputs<V> {
    fn default() -> Self {
        Self::FanIn(Vec::new())
    }
}

impl<V> Debug for Inputs<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FanIn(sources) => f.debug_tuple("FanIn").field(sources).finish(),
            Self::Chain(upstream) => f.debug_tuple("Chain").field(upstream).finish(),
        }
    }
}

/// Something a transform can read from.
#[derive(Debug)]
pub enum Input<V> {
    /// A plain source, appended to the fan-in list.
    Source(Source<V>),
    /// An upstream transform, which becomes the only input.
    Transform(Transform<V>),
}

impl<V> From<Source<V>> for Input<V> {
    fn from(source: Source<V>) -> Self {
        Self::Source(source)
    }
}

impl<V> From<Transform<V>> for Input<V> {
    fn from(transform: Transform<V>) -> Self {
        Self::Transform(transform)
    }
}

/// The unit of processing in a pipeline.
///
/// Each call to [`Transform::advance`] pulls one input tuple (one value per
/// fan-in source, or one output tuple from the upstream transform), hands it
/// to the transform hook and broadcasts the resulting tuple to every sink.
/// Once the inputs are exhausted the transform finishes itself and all of its
/// sinks, and every later call returns `None`.
///
/// ```
/// use stageline::pipeline::Transform;
/// use stageline::testing::{vec_source, CollectingSink};
///
/// let gathered = CollectingSink::new();
/// let mut double = Transform::from_fn("double", |inputs: Vec<Option<i32>>| {
///     Ok(inputs.into_iter().map(|n| n.map(|n| n * 2)).collect())
/// });
/// double.add_input(vec_source("numbers", [1, 2])).unwrap();
/// double.add_output(gathered.sink("gather"));
///
/// double.run().unwrap();
/// assert_eq!(gathered.written(), vec![vec![Some(2)], vec![Some(4)]]);
/// ```
pub struct Transform<V> {
    core: Box<dyn Transformer<V>>,
    inputs: Inputs<V>,
    outputs: Vec<Sink<V>>,
    steps: u64,
}

impl<V: 'static> Transform<V> {
    /// Creates a transform from a stage and its transform hook.
    pub fn new<C, F>(stage: Stage<C>, transform: F) -> Self
    where
        C: Send + 'static,
        F: FnMut(&mut C, Vec<Option<V>>) -> anyhow::Result<Vec<Option<V>>> + Send + 'static,
    {
        let transform: TransformHook<C, V> = Box::new(transform);
        Self {
            core: Box::new(Hooked::new(stage, transform)),
            inputs: Inputs::default(),
            outputs: Vec::new(),
            steps: 0,
        }
    }

    /// Creates a context-free transform from a function.
    pub fn from_fn<F>(name: impl Into<String>, mut transform: F) -> Self
    where
        F: FnMut(Vec<Option<V>>) -> anyhow::Result<Vec<Option<V>>> + Send + 'static,
    {
        Self::new(Stage::new(name), move |_: &mut (), inputs: Vec<Option<V>>| {
            transform(inputs)
        })
    }

    /// Creates a transform that passes its input tuple through unchanged.
    #[must_use]
    pub fn identity(name: impl Into<String>) -> Self {
        Self::from_fn(name, |inputs: Vec<Option<V>>| Ok(inputs))
    }
}

impl<V> Transform<V> {
    /// Attaches an input.
    ///
    /// Sources are appended in order and read positionally. A transform may
    /// be attached only as the very first input and only if it has no sinks
    /// of its own; it then becomes the sole upstream and no further input of
    /// any kind can be attached.
    pub fn add_input(&mut self, input: impl Into<Input<V>>) -> Result<&mut Self, PipelineError> {
        let input = input.into();
        self.check_input(&input)?;
        match input {
            Input::Source(source) => {
                debug!(transform = %self.name(), source = %source.name(), "Source attached");
                if let Inputs::FanIn(sources) = &mut self.inputs {
                    sources.push(source);
                }
            }
            Input::Transform(upstream) => {
                debug!(transform = %self.name(), upstream = %upstream.name(), "Upstream transform chained");
                self.inputs = Inputs::Chain(Box::new(upstream));
            }
        }
        Ok(self)
    }

    /// Checks that `input` could be attached, without attaching it.
    pub fn check_input(&self, input: &Input<V>) -> Result<(), TopologyError> {
        match input {
            Input::Source(_) => self.check_source(),
            Input::Transform(upstream) => self.check_upstream(upstream),
        }
    }

    fn check_source(&self) -> Result<(), TopologyError> {
        match &self.inputs {
            Inputs::Chain(upstream) => Err(self.chain_already_set(upstream)),
            Inputs::FanIn(_) => Ok(()),
        }
    }

    /// Checks that `upstream` could be chained in as the sole input.
    pub fn check_upstream(&self, upstream: &Self) -> Result<(), TopologyError> {
        match &self.inputs {
            Inputs::Chain(current) => Err(self.chain_already_set(current)),
            Inputs::FanIn(sources) if !sources.is_empty() => Err(TopologyError::MixedInputs {
                transform: self.name().to_string(),
            }),
            Inputs::FanIn(_) if upstream.has_outputs() => Err(TopologyError::UpstreamHasOutputs {
                transform: self.name().to_string(),
                upstream: upstream.name().to_string(),
            }),
            Inputs::FanIn(_) => Ok(()),
        }
    }

    fn chain_already_set(&self, upstream: &Self) -> TopologyError {
        TopologyError::ChainAlreadySet {
            transform: self.name().to_string(),
            upstream: upstream.name().to_string(),
        }
    }

    /// Attaches a sink; every output tuple is broadcast to all sinks in
    /// attachment order.
    pub fn add_output(&mut self, sink: Sink<V>) -> &mut Self {
        debug!(transform = %self.name(), sink = %sink.name(), "Sink attached");
        self.outputs.push(sink);
        self
    }

    /// Performs one step.
    ///
    /// Returns the output tuple, or `None` once the inputs are exhausted.
    /// The call that observes exhaustion finishes this transform and all of
    /// its sinks without invoking the transform hook.
    pub fn advance(&mut self) -> Result<Option<Vec<Option<V>>>, PipelineError> {
        if self.core.is_finished() {
            return Ok(None);
        }
        self.core.prepare()?;

        let (inputs, exhausted) = match &mut self.inputs {
            Inputs::Chain(upstream) => match upstream.advance()? {
                Some(values) => (values, false),
                None => (Vec::new(), true),
            },
            Inputs::FanIn(sources) => {
                let mut inputs = Vec::with_capacity(sources.len());
                for source in sources.iter_mut() {
                    inputs.push(source.read()?);
                }
                (inputs, sources.iter().all(Source::is_finished))
            }
        };

        if exhausted {
            debug!(transform = %self.name(), steps = self.steps, "Inputs exhausted");
            self.finish_now()?;
            return Ok(None);
        }

        let outputs = self.core.apply(inputs)?;
        for sink in &mut self.outputs {
            sink.write(&outputs)?;
        }
        self.steps += 1;
        trace!(transform = %self.name(), step = self.steps, outputs = outputs.len(), "Transform step");
        Ok(Some(outputs))
    }

    /// Calls [`Transform::advance`] until the transform is finished.
    pub fn run(&mut self) -> Result<RunSummary, PipelineError> {
        self.run_with(&RunConfig::default())
    }

    /// Drives the transform under `config`.
    ///
    /// With a step limit the transform may be left unfinished, in which case
    /// a later call resumes where this one stopped.
    pub fn run_with(&mut self, config: &RunConfig) -> Result<RunSummary, PipelineError> {
        let span = info_span!("pipeline.run", pipeline = %self.name());
        let _guard = span.enter();

        let run_id = Uuid::new_v4();
        let timer = RunTimer::start(self.name());
        let mut steps = 0_u64;

        while !self.is_finished() {
            if config.max_steps.is_some_and(|max| steps >= max) {
                debug!(transform = %self.name(), steps, "Step limit reached");
                if config.finish_on_limit {
                    self.finish_now()?;
                }
                break;
            }
            if self.advance()?.is_some() {
                steps += 1;
            }
        }

        let timing = timer.stop();
        let summary = RunSummary {
            run_id,
            pipeline: self.name().to_string(),
            steps,
            finished: self.is_finished(),
            started_at: timing.started_at,
            ended_at: timing.ended_at,
            duration_ms: timing.duration_ms,
        };
        debug!(steps = summary.steps, finished = summary.finished, "Run complete");
        Ok(summary)
    }

    /// Finishes this transform and every sink without reading more input.
    ///
    /// Returns false if the transform was already finished. Sinks are
    /// finished at most once either way.
    pub fn finish_now(&mut self) -> Result<bool, PipelineError> {
        let finished = self.core.finish()?;
        for sink in &mut self.outputs {
            sink.finish()?;
        }
        Ok(finished)
    }

    /// Returns the transform name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.core.name()
    }

    /// Returns the role of this stage.
    #[must_use]
    pub const fn role(&self) -> StageRole {
        StageRole::Transform
    }

    /// Returns true once the transform has been prepared.
    #[must_use]
    pub fn is_prepared(&self) -> bool {
        self.core.is_prepared()
    }

    /// Returns true once the transform has been finished.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.core.is_finished()
    }

    /// Returns the lifecycle state.
    #[must_use]
    pub fn state(&self) -> StageState {
        self.core.state()
    }

    /// Returns true if any sink is attached.
    #[must_use]
    pub fn has_outputs(&self) -> bool {
        !self.outputs.is_empty()
    }

    /// Returns the number of productive steps performed so far.
    #[must_use]
    pub const fn steps(&self) -> u64 {
        self.steps
    }

    /// Returns the inputs.
    #[must_use]
    pub const fn inputs(&self) -> &Inputs<V> {
        &self.inputs
    }

    /// Returns the fan-in sources; empty in chain mode.
    #[must_use]
    pub fn sources(&self) -> &[Source<V>] {
        match &self.inputs {
            Inputs::FanIn(sources) => sources.as_slice(),
            Inputs::Chain(_) => &[],
        }
    }

    /// Returns the upstream transform in chain mode.
    #[must_use]
    pub fn upstream(&self) -> Option<&Self> {
        match &self.inputs {
            Inputs::Chain(upstream) => Some(&**upstream),
            Inputs::FanIn(_) => None,
        }
    }

    /// Returns the sinks in attachment order.
    #[must_use]
    pub fn sinks(&self) -> &[Sink<V>] {
        &self.outputs
    }

    /// Returns the names of this transform and every transform upstream of
    /// it, most upstream first.
    #[must_use]
    pub fn chain_names(&self) -> Vec<&str> {
        let mut names = self.upstream().map_or_else(Vec::new, Self::chain_names);
        names.push(self.name());
        names
    }
}

impl<V> Debug for Transform<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transform")
            .field("name", &self.name())
            .field("state", &self.state())
            .field("inputs", &self.inputs)
            .field("outputs", &self.outputs)
            .field("steps", &self.steps)
            .finish()
    }
}
