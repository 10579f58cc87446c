//! Test fixtures for pipeline testing.

use std::collections::VecDeque;
use std::fmt::{self, Debug};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing_subscriber::EnvFilter;

use crate::stages::{Sink, Source, Stage};

/// Creates a source that yields `values` in order, then the sentinel.
///
/// The values become the source context when it is prepared.
pub fn vec_source<V>(name: impl Into<String>, values: impl IntoIterator<Item = V>) -> Source<V>
where
    V: Send + 'static,
{
    let mut pending = Some(values.into_iter().collect::<VecDeque<V>>());
    Source::new(
        Stage::with_prepare(name, move || Ok(pending.take().unwrap_or_default())),
        |queue: &mut VecDeque<V>| Ok(queue.pop_front()),
    )
}

/// Shared record of every tuple written to the sinks it hands out.
pub struct CollectingSink<V> {
    written: Arc<Mutex<Vec<Vec<Option<V>>>>>,
    finishes: Arc<Mutex<usize>>,
}

impl<V> Clone for CollectingSink<V> {
    fn clone(&self) -> Self {
        Self {
            written: Arc::clone(&self.written),
            finishes: Arc::clone(&self.finishes),
        }
    }
}

impl<V> Default for CollectingSink<V> {
    fn default() -> Self {
        Self {
            written: Arc::new(Mutex::new(Vec::new())),
            finishes: Arc::new(Mutex::new(0)),
        }
    }
}

impl<V: Debug> Debug for CollectingSink<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectingSink")
            .field("written", &*self.written.lock())
            .field("finishes", &*self.finishes.lock())
            .finish()
    }
}

impl<V: Clone + Send + 'static> CollectingSink<V> {
    /// Creates an empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a sink that appends every written tuple to this collector.
    #[must_use]
    pub fn sink(&self, name: impl Into<String>) -> Sink<V> {
        let written = Arc::clone(&self.written);
        let finishes = Arc::clone(&self.finishes);
        Sink::new(
            Stage::new(name).on_finish(move |_| {
                *finishes.lock() += 1;
                Ok(())
            }),
            move |(), values: &[Option<V>]| {
                written.lock().push(values.to_vec());
                Ok(())
            },
        )
    }

    /// Returns every tuple written so far.
    #[must_use]
    pub fn written(&self) -> Vec<Vec<Option<V>>> {
        self.written.lock().clone()
    }

    /// Returns how many times a sink from this collector was finished.
    #[must_use]
    pub fn finish_count(&self) -> usize {
        *self.finishes.lock()
    }
}

/// Ordered log of hook invocations, shared between clones.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl CallLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry.
    pub fn record(&self, entry: impl Into<String>) {
        self.entries.lock().push(entry.into());
    }

    /// Returns all entries in call order.
    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().clone()
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns true if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

/// Installs a subscriber that writes through the test harness.
///
/// Safe to call from every test; only the first call installs anything.
pub fn init_test_tracing() -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("stageline=debug"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init()
        .is_ok()
}
