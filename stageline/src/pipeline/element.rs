//! The declared parts of a pipeline.

use crate::core::StageRole;
use crate::stages::{Sink, Source};

use super::Transform;

/// A stage declared on a [`super::PipelineBuilder`], tagged by role.
#[derive(Debug)]
pub enum PipelineElement<V> {
    /// A source, attached to the most upstream transform.
    Source(Source<V>),
    /// A transform, chained in declaration order.
    Transform(Transform<V>),
    /// A sink, attached to the most downstream transform.
    Sink(Sink<V>),
}

impl<V> PipelineElement<V> {
    /// Returns the role of the element.
    #[must_use]
    pub const fn role(&self) -> StageRole {
        match self {
            Self::Source(_) => StageRole::Source,
            Self::Transform(_) => StageRole::Transform,
            Self::Sink(_) => StageRole::Sink,
        }
    }

    /// Returns the name of the element.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Source(source) => source.name(),
            Self::Transform(transform) => transform.name(),
            Self::Sink(sink) => sink.name(),
        }
    }
}

impl<V> From<Source<V>> for PipelineElement<V> {
    fn from(source: Source<V>) -> Self {
        Self::Source(source)
    }
}

impl<V> From<Transform<V>> for PipelineElement<V> {
    fn from(transform: Transform<V>) -> Self {
        Self::Transform(transform)
    }
}

impl<V> From<Sink<V>> for PipelineElement<V> {
    fn from(sink: Sink<V>) -> Self {
        Self::Sink(sink)
    }
}
