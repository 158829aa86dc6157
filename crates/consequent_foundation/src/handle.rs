//! Fact handles: the run-time identity of a fact in working memory.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Opaque identity of a fact inserted into working memory.
///
/// Handles are assigned by working memory on insertion and stay stable for the
/// lifetime of the fact, across updates.
///
/// # Layout
/// - `id`: 64-bit identifier, unique within one working memory
/// - `partition`: index of the entry point the fact was inserted through
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FactHandle {
    /// Identifier within working memory.
    pub id: u64,
    /// Entry point partition.
    pub partition: u32,
}

impl FactHandle {
    /// Creates a new handle.
    #[must_use]
    pub const fn new(id: u64, partition: u32) -> Self {
        Self { id, partition }
    }
}

impl fmt::Debug for FactHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FactHandle({}@{})", self.id, self.partition)
    }
}

impl fmt::Display for FactHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fact({})", self.id)
    }
}
