//! Assembles declared stages into one linear runnable chain.

use tracing::debug;

use super::{PipelineElement, Transform};
use crate::errors::{ConfigurationError, PipelineError};
use crate::stages::{Sink, Source};

/// Name given to the pass-through transform synthesized when none is declared.
pub const IDENTITY_TRANSFORM: &str = "identity";

/// Collects sources, transforms and sinks in declaration order and wires
/// them into a linear pipeline.
///
/// Every source feeds the first declared transform, every transform feeds
/// the next one, and the last declared transform feeds every sink. The
/// last transform is returned by [`PipelineBuilder::build`] and drives the
/// whole chain.
///
/// ```
/// use stageline::pipeline::{PipelineBuilder, Transform};
/// use stageline::testing::{vec_source, CollectingSink};
///
/// let gathered = CollectingSink::new();
/// let mut pipeline = PipelineBuilder::new("doubler")
///     .add(vec_source("numbers", [1, 2, 3]))
///     .add(Transform::from_fn("double", |inputs: Vec<Option<i32>>| {
///         Ok(inputs.into_iter().map(|n| n.map(|n| n * 2)).collect())
///     }))
///     .add(gathered.sink("gather"))
///     .build()
///     .unwrap();
///
/// pipeline.run().unwrap();
/// assert_eq!(gathered.written(), vec![vec![Some(2)], vec![Some(4)], vec![Some(6)]]);
/// ```
#[derive(Debug)]
pub struct PipelineBuilder<V> {
    /// The pipeline name.
    name: String,
    /// Declared sources, in order.
    sources: Vec<Source<V>>,
    /// Declared transforms, in order.
    transforms: Vec<Transform<V>>,
    /// Declared sinks, in order.
    sinks: Vec<Sink<V>>,
}

impl<V: 'static> PipelineBuilder<V> {
    /// Creates an empty pipeline builder.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sources: Vec::new(),
            transforms: Vec::new(),
            sinks: Vec::new(),
        }
    }

    /// Declares a source, transform or sink.
    #[must_use]
    pub fn add(mut self, element: impl Into<PipelineElement<V>>) -> Self {
        self.push(element);
        self
    }

    /// Declares a source, transform or sink in place.
    pub fn push(&mut self, element: impl Into<PipelineElement<V>>) -> &mut Self {
        let element = element.into();
        debug!(pipeline = %self.name, role = %element.role(), stage = %element.name(), "Stage declared");
        match element {
            PipelineElement::Source(source) => self.sources.push(source),
            PipelineElement::Transform(transform) => self.transforms.push(transform),
            PipelineElement::Sink(sink) => self.sinks.push(sink),
        }
        self
    }

    /// Wires the declared stages and returns the most downstream transform.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if no source or no sink was declared,
    /// and a topology error if a declared transform cannot take its place in
    /// the chain (for example because sinks were attached to it by hand).
    pub fn build(self) -> Result<Transform<V>, PipelineError> {
        if self.sources.is_empty() {
            return Err(ConfigurationError::MissingSource { pipeline: self.name }.into());
        }
        if self.sinks.is_empty() {
            return Err(ConfigurationError::MissingSink { pipeline: self.name }.into());
        }

        // Links are checked from the last declared transform backwards, the
        // order in which each one is handed its upstream.
        for pair in self.transforms.windows(2).rev() {
            pair[1].check_upstream(&pair[0])?;
        }

        let mut transforms = self.transforms.into_iter();
        let mut head = transforms.next().unwrap_or_else(|| {
            debug!(pipeline = %self.name, "No transform declared, using identity");
            Transform::identity(IDENTITY_TRANSFORM)
        });
        for source in self.sources {
            head.add_input(source)?;
        }
        for mut next in transforms {
            next.add_input(head)?;
            head = next;
        }
        for sink in self.sinks {
            head.add_output(sink);
        }

        debug!(
            pipeline = %self.name,
            head = %head.name(),
            chain = ?head.chain_names(),
            "Pipeline built"
        );
        Ok(head)
    }

    /// Returns the pipeline name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the number of declared sources.
    #[must_use]
    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Returns the number of declared transforms.
    #[must_use]
    pub fn transform_count(&self) -> usize {
        self.transforms.len()
    }

    /// Returns the number of declared sinks.
    #[must_use]
    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }
}
