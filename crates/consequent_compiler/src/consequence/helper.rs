//! The firing context passed to consequences and action bodies.
//!
//! A [`KnowledgeHelper`] borrows the match chain, working memory and global
//! store for the duration of one firing. Action bodies do not mutate working
//! memory directly; they request [`Effect`]s, which the caller applies once
//! the firing has returned.

use consequent_foundation::{FactHandle, Value};
use consequent_session::{GlobalStore, WorkingMemory};

use crate::chain::MatchChain;

/// A change to working memory requested by an action body.
#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    /// Insert a new fact.
    Insert {
        /// The fact object.
        value: Value,
        /// Entry point to insert through; the session default if `None`.
        entry_point: Option<String>,
    },

    /// Replace the object behind a handle.
    Update {
        /// The target fact.
        handle: FactHandle,
        /// The new object.
        value: Value,
    },

    /// Remove a fact.
    Retract {
        /// The target fact.
        handle: FactHandle,
    },
}

/// Context of a single firing.
#[derive(Debug)]
pub struct KnowledgeHelper<'a> {
    chain: &'a MatchChain,
    memory: &'a WorkingMemory,
    globals: &'a GlobalStore,
    effects: Vec<Effect>,
}

impl<'a> KnowledgeHelper<'a> {
    /// Creates a helper for one firing.
    #[must_use]
    pub fn new(chain: &'a MatchChain, memory: &'a WorkingMemory, globals: &'a GlobalStore) -> Self {
        Self {
            chain,
            memory,
            globals,
            effects: Vec::new(),
        }
    }

    /// Returns the match chain being fired.
    #[must_use]
    pub const fn chain(&self) -> &'a MatchChain {
        self.chain
    }

    /// Returns working memory as of the start of the firing.
    #[must_use]
    pub const fn memory(&self) -> &'a WorkingMemory {
        self.memory
    }

    /// Returns the session's globals.
    #[must_use]
    pub const fn globals(&self) -> &'a GlobalStore {
        self.globals
    }

    /// Requests insertion through the default entry point.
    pub fn insert(&mut self, value: impl Into<Value>) {
        self.effects.push(Effect::Insert {
            value: value.into(),
            entry_point: None,
        });
    }

    /// Requests insertion through a named entry point.
    pub fn insert_into(&mut self, entry_point: impl Into<String>, value: impl Into<Value>) {
        self.effects.push(Effect::Insert {
            value: value.into(),
            entry_point: Some(entry_point.into()),
        });
    }

    /// Requests an update.
    pub fn update(&mut self, handle: FactHandle, value: impl Into<Value>) {
        self.effects.push(Effect::Update {
            handle,
            value: value.into(),
        });
    }

    /// Requests a retraction.
    pub fn retract(&mut self, handle: FactHandle) {
        self.effects.push(Effect::Retract { handle });
    }

    /// Returns the effects requested so far.
    #[must_use]
    pub fn effects(&self) -> &[Effect] {
        &self.effects
    }

    /// Takes the requested effects, leaving none behind.
    pub fn take_effects(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.effects)
    }
}
