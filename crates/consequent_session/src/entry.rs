//! Entry points: named insertion points into working memory.

use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use consequent_foundation::{DataProcessor, Error, FactHandle, Result, Value};

/// A named entry point into a session's working memory.
///
/// Facts inserted through an entry point carry its partition in their handle.
/// Cloning yields another handle to the same entry point.
#[derive(Clone)]
pub struct EntryPoint {
    name: Arc<str>,
    partition: u32,
    memory: Arc<RwLock<crate::WorkingMemory>>,
}

impl EntryPoint {
    pub(crate) fn new(
        name: impl Into<Arc<str>>,
        partition: u32,
        memory: Arc<RwLock<crate::WorkingMemory>>,
    ) -> Self {
        Self {
            name: name.into(),
            partition,
            memory,
        }
    }

    /// Returns the entry point name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the partition stamped on handles inserted here.
    #[must_use]
    pub const fn partition(&self) -> u32 {
        self.partition
    }

    /// Inserts a fact.
    ///
    /// # Errors
    /// Returns an internal error if the working memory lock is poisoned.
    pub fn insert(&self, value: Value) -> Result<FactHandle> {
        Ok(self.write()?.insert(value, self.partition))
    }

    /// Returns the number of live facts inserted through this entry point.
    #[must_use]
    pub fn len(&self) -> usize {
        self.memory
            .read()
            .map_or(0, |wm| wm.partition(self.partition).count())
    }

    /// Returns true if no live fact was inserted through this entry point.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the live objects inserted through this entry point.
    ///
    /// # Errors
    /// Returns an internal error if the working memory lock is poisoned.
    pub fn objects(&self) -> Result<Vec<Value>> {
        Ok(self
            .read()?
            .partition(self.partition)
            .map(|(_, v)| v.clone())
            .collect())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, crate::WorkingMemory>> {
        self.memory.read().map_err(|_| poisoned())
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, crate::WorkingMemory>> {
        self.memory.write().map_err(|_| poisoned())
    }
}

pub(crate) fn poisoned() -> Error {
    Error::internal("working memory lock poisoned")
}

impl fmt::Debug for EntryPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntryPoint({}#{})", self.name, self.partition)
    }
}

/// Forwards values published by a data source into an entry point.
#[derive(Clone, Debug)]
pub struct EntryPointDataProcessor {
    entry_point: EntryPoint,
}

impl EntryPointDataProcessor {
    /// Creates a processor forwarding into `entry_point`.
    #[must_use]
    pub fn new(entry_point: EntryPoint) -> Self {
        Self { entry_point }
    }
}

impl DataProcessor for EntryPointDataProcessor {
    fn insert(&self, value: Value) -> Result<()> {
        self.entry_point.insert(value).map(|_| ())
    }
}
