//! Data sources: shared streams that feed rule units.
//!
//! A rule unit exposes its external data feeds as [`DataSource`]s. Anything
//! published through a source is stored and forwarded to every subscribed
//! [`DataProcessor`]. Late subscribers are replayed the values published
//! before they subscribed, so subscription order never loses data.

use std::fmt;
use std::sync::{Arc, RwLock};

use crate::error::Error;
use crate::Result;
use crate::value::Value;

/// Receives values published through a [`DataSource`].
pub trait DataProcessor: Send + Sync {
    /// Called once per published value.
    ///
    /// # Errors
    /// Returns an error if the value cannot be accepted downstream.
    fn insert(&self, value: Value) -> Result<()>;
}

#[derive(Default)]
struct SourceState {
    values: Vec<Value>,
    subscribers: Vec<Arc<dyn DataProcessor>>,
}

/// Shared, append-only data stream.
///
/// Cloning is O(1) and yields another handle to the same stream.
#[derive(Clone, Default)]
pub struct DataSource {
    state: Arc<RwLock<SourceState>>,
}

impl DataSource {
    /// Creates an empty data source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes a value to all current subscribers.
    ///
    /// # Errors
    /// Returns the first subscriber error; the value stays stored.
    pub fn append(&self, value: Value) -> Result<()> {
        let subscribers = {
            let mut state = self.state.write().map_err(|_| poisoned())?;
            state.values.push(value.clone());
            state.subscribers.clone()
        };
        for subscriber in subscribers {
            subscriber.insert(value.clone())?;
        }
        Ok(())
    }

    /// Registers a processor, replaying every value published so far.
    ///
    /// # Errors
    /// Returns the first error raised while replaying.
    pub fn subscribe(&self, processor: Arc<dyn DataProcessor>) -> Result<()> {
        let replay = {
            let mut state = self.state.write().map_err(|_| poisoned())?;
            state.subscribers.push(Arc::clone(&processor));
            state.values.clone()
        };
        for value in replay {
            processor.insert(value)?;
        }
        Ok(())
    }

    /// Returns the number of values published.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.read().map_or(0, |s| s.values.len())
    }

    /// Returns true if nothing has been published.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the number of subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.state.read().map_or(0, |s| s.subscribers.len())
    }

    /// Returns true if both refer to the same stream.
    #[must_use]
    pub fn same(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }

    /// Returns a key identifying this stream.
    #[must_use]
    pub fn identity(&self) -> usize {
        Arc::as_ptr(&self.state).cast::<()>() as usize
    }
}

fn poisoned() -> Error {
    Error::internal("data source lock poisoned")
}

impl fmt::Debug for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DataSource(values: {}, subscribers: {})",
            self.len(),
            self.subscriber_count()
        )
    }
}
