//! Session state: working memory, entry points, and globals.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use consequent_foundation::{FactHandle, Result, Type, Value};
use tracing::debug;

use crate::entry::{EntryPoint, poisoned};
use crate::globals::{GlobalStore, GlobalTypes};
use crate::memory::WorkingMemory;

/// Configuration for a session.
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Name of the entry point used by [`Session::insert`].
    pub default_entry_point: String,
    /// Global declarations the store checks values against.
    pub globals: GlobalTypes,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_entry_point: "DEFAULT".to_string(),
            globals: GlobalTypes::new(),
        }
    }
}

impl SessionConfig {
    /// Builder method to rename the default entry point.
    #[must_use]
    pub fn with_default_entry_point(mut self, name: impl Into<String>) -> Self {
        self.default_entry_point = name.into();
        self
    }

    /// Builder method to declare a global.
    #[must_use]
    pub fn with_global(mut self, name: impl Into<String>, ty: Type) -> Self {
        self.globals.declare(name, ty);
        self
    }
}

/// A running rule session.
pub struct Session {
    memory: Arc<RwLock<WorkingMemory>>,
    entry_points: BTreeMap<String, EntryPoint>,
    default_entry_point: String,
    globals: GlobalStore,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Creates a session with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(SessionConfig::default())
    }

    /// Creates a session with the given configuration.
    #[must_use]
    pub fn with_config(config: SessionConfig) -> Self {
        let mut session = Self {
            memory: Arc::new(RwLock::new(WorkingMemory::new())),
            entry_points: BTreeMap::new(),
            default_entry_point: config.default_entry_point.clone(),
            globals: GlobalStore::with_types(config.globals),
        };
        session.entry_point(&config.default_entry_point);
        session
    }

    /// Gets an entry point by name, declaring it on first use.
    pub fn entry_point(&mut self, name: &str) -> EntryPoint {
        if let Some(existing) = self.entry_points.get(name) {
            return existing.clone();
        }
        let partition = u32::try_from(self.entry_points.len()).unwrap_or(u32::MAX);
        let entry = EntryPoint::new(name, partition, Arc::clone(&self.memory));
        debug!(entry_point = name, partition, "entry point declared");
        self.entry_points.insert(name.to_string(), entry.clone());
        entry
    }

    /// Gets an already declared entry point.
    #[must_use]
    pub fn find_entry_point(&self, name: &str) -> Option<&EntryPoint> {
        self.entry_points.get(name)
    }

    /// Returns the names of all declared entry points.
    pub fn entry_point_names(&self) -> impl Iterator<Item = &str> {
        self.entry_points.keys().map(String::as_str)
    }

    /// Returns the name of the default entry point.
    #[must_use]
    pub fn default_entry_point(&self) -> &str {
        &self.default_entry_point
    }

    /// Inserts a fact through the default entry point.
    ///
    /// # Errors
    /// Returns an internal error if the working memory lock is poisoned.
    pub fn insert(&mut self, value: Value) -> Result<FactHandle> {
        let name = self.default_entry_point.clone();
        self.entry_point(&name).insert(value)
    }

    /// Locks working memory for reading.
    ///
    /// # Errors
    /// Returns an internal error if the lock is poisoned.
    pub fn memory(&self) -> Result<RwLockReadGuard<'_, WorkingMemory>> {
        self.memory.read().map_err(|_| poisoned())
    }

    /// Locks working memory for writing.
    ///
    /// # Errors
    /// Returns an internal error if the lock is poisoned.
    pub fn memory_mut(&self) -> Result<RwLockWriteGuard<'_, WorkingMemory>> {
        self.memory.write().map_err(|_| poisoned())
    }

    /// Returns the global store.
    #[must_use]
    pub const fn globals(&self) -> &GlobalStore {
        &self.globals
    }

    /// Sets a global value.
    ///
    /// # Errors
    /// Returns `TypeMismatch` if the global is declared with another type.
    pub fn set_global(&mut self, name: impl Into<String>, value: Value) -> Result<()> {
        self.globals.set(name, value)
    }

    /// Gets a global value.
    #[must_use]
    pub fn get_global(&self, name: &str) -> Option<&Value> {
        self.globals.get(name)
    }
}
