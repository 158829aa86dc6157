//! Working memory: fact storage with handles and an identity index.
//!
//! Every inserted fact receives a [`FactHandle`]. Fact records are indexed by
//! instance identity, so [`WorkingMemory::handle_of`] answers "which handle
//! holds *this* object", not "which handle holds an equal object". Other
//! values are indexed by equality. When several live handles hold the same
//! key, the oldest one answers.
//!
//! Storage is persistent: cloning a `WorkingMemory` is O(1) and yields an
//! independent snapshot.

use consequent_foundation::{Error, FactHandle, Result, Value};
use im::{HashMap, OrdMap, OrdSet};
use tracing::trace;

/// Key of the identity index.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
enum IdentityKey {
    Instance(usize),
    Equal(Value),
}

impl IdentityKey {
    fn of(value: &Value) -> Self {
        match value {
            Value::Fact(fact) => Self::Instance(fact.identity()),
            Value::Source(source) => Self::Instance(source.identity()),
            other => Self::Equal(other.clone()),
        }
    }
}

/// Fact storage for one session.
#[derive(Clone, Debug, Default)]
pub struct WorkingMemory {
    next_id: u64,
    facts: OrdMap<FactHandle, Value>,
    identities: HashMap<IdentityKey, OrdSet<FactHandle>>,
}

impl WorkingMemory {
    /// Creates an empty working memory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a fact through the given entry point partition.
    pub fn insert(&mut self, value: Value, partition: u32) -> FactHandle {
        let handle = FactHandle::new(self.next_id, partition);
        self.next_id += 1;
        self.index(&value, handle);
        trace!(?handle, "fact inserted");
        self.facts.insert(handle, value);
        handle
    }

    /// Replaces the object behind a handle, keeping the handle.
    ///
    /// # Errors
    /// Returns `FactNotFound` if the handle is not live.
    pub fn update(&mut self, handle: FactHandle, value: Value) -> Result<()> {
        let Some(old) = self.facts.get(&handle).cloned() else {
            return Err(Error::fact_not_found(handle));
        };
        self.facts.insert(handle, value.clone());
        self.unindex(&old, handle);
        self.index(&value, handle);
        trace!(?handle, "fact updated");
        Ok(())
    }

    /// Removes a fact, returning its object.
    ///
    /// # Errors
    /// Returns `FactNotFound` if the handle is not live.
    pub fn retract(&mut self, handle: FactHandle) -> Result<Value> {
        let value = self
            .facts
            .remove(&handle)
            .ok_or_else(|| Error::fact_not_found(handle))?;
        self.unindex(&value, handle);
        trace!(?handle, "fact retracted");
        Ok(value)
    }

    fn index(&mut self, value: &Value, handle: FactHandle) {
        self.identities
            .entry(IdentityKey::of(value))
            .or_insert_with(OrdSet::new)
            .insert(handle);
    }

    fn unindex(&mut self, value: &Value, handle: FactHandle) {
        let key = IdentityKey::of(value);
        let emptied = self.identities.get_mut(&key).is_some_and(|handles| {
            handles.remove(&handle);
            handles.is_empty()
        });
        if emptied {
            self.identities.remove(&key);
        }
    }

    /// Returns true if the handle is live.
    #[must_use]
    pub fn contains(&self, handle: FactHandle) -> bool {
        self.facts.contains_key(&handle)
    }

    /// Gets the object behind a handle.
    #[must_use]
    pub fn get(&self, handle: FactHandle) -> Option<&Value> {
        self.facts.get(&handle)
    }

    /// Looks up the handle holding this exact object.
    #[must_use]
    pub fn handle_of(&self, value: &Value) -> Option<FactHandle> {
        self.identities
            .get(&IdentityKey::of(value))
            .and_then(|handles| handles.get_min().copied())
    }

    /// Returns the number of live facts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.facts.len()
    }

    /// Returns true if no facts are live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    /// Iterates over live facts in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (FactHandle, &Value)> {
        self.facts.iter().map(|(h, v)| (*h, v))
    }

    /// Iterates over facts inserted through one partition.
    pub fn partition(&self, partition: u32) -> impl Iterator<Item = (FactHandle, &Value)> {
        self.iter().filter(move |(h, _)| h.partition == partition)
    }
}
