//! Match chains: the partial-match sequence handed over by a firing.
//!
//! A chain is stored root-first in a flat arena. Depth counts from the tip:
//! the most recently joined node is at depth 0, the root at depth `len - 1`.
//! Declarations name the depth of the node that produced them.

use std::fmt;

use consequent_foundation::{FactHandle, Value};

/// One node of a match chain.
#[derive(Clone, Debug, PartialEq)]
pub struct MatchNode {
    /// Handle of the matched fact.
    pub handle: FactHandle,
    /// The matched fact object.
    pub object: Value,
}

impl MatchNode {
    /// Creates a node.
    #[must_use]
    pub fn new(handle: FactHandle, object: impl Into<Value>) -> Self {
        Self {
            handle,
            object: object.into(),
        }
    }
}

/// Immutable chain of match nodes, root first.
#[derive(Clone, Default, PartialEq)]
pub struct MatchChain {
    nodes: Vec<MatchNode>,
}

impl MatchChain {
    /// Creates an empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a chain holding a single root node.
    #[must_use]
    pub fn root(node: MatchNode) -> Self {
        Self { nodes: vec![node] }
    }

    /// Returns a new chain with `node` joined at the tip.
    #[must_use]
    pub fn extend(&self, node: MatchNode) -> Self {
        let mut nodes = self.nodes.clone();
        nodes.push(node);
        Self { nodes }
    }

    /// Joins `node` at the tip in place.
    pub fn push(&mut self, node: MatchNode) {
        self.nodes.push(node);
    }

    /// Returns the number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the chain has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the depth of the root, or `None` for an empty chain.
    #[must_use]
    pub fn max_depth(&self) -> Option<usize> {
        self.nodes.len().checked_sub(1)
    }

    /// Returns the node at `depth` counted from the tip.
    #[must_use]
    pub fn node(&self, depth: usize) -> Option<&MatchNode> {
        let index = self.nodes.len().checked_sub(depth + 1)?;
        self.nodes.get(index)
    }

    /// Returns the tip node.
    #[must_use]
    pub fn tip(&self) -> Option<&MatchNode> {
        self.nodes.last()
    }

    /// Iterates over nodes from the root to the tip.
    pub fn iter(&self) -> impl Iterator<Item = &MatchNode> {
        self.nodes.iter()
    }

    /// Starts a cursor at the tip.
    #[must_use]
    pub fn cursor(&self) -> ChainCursor<'_> {
        ChainCursor {
            chain: self,
            depth: 0,
            visits: 0,
        }
    }
}

impl FromIterator<MatchNode> for MatchChain {
    /// Collects nodes given root first.
    fn from_iter<I: IntoIterator<Item = MatchNode>>(iter: I) -> Self {
        Self {
            nodes: iter.into_iter().collect(),
        }
    }
}

impl fmt::Debug for MatchChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MatchChain[")?;
        for (i, node) in self.nodes.iter().enumerate() {
            if i > 0 {
                write!(f, " <- ")?;
            }
            write!(f, "{:?}", node.handle)?;
        }
        write!(f, "]")
    }
}

/// A cursor that walks a chain from the tip towards the root, never back.
#[derive(Debug)]
pub struct ChainCursor<'a> {
    chain: &'a MatchChain,
    depth: usize,
    visits: usize,
}

impl<'a> ChainCursor<'a> {
    /// Ascends to `target` and returns the node there.
    ///
    /// Returns `None` if `target` is below the cursor's current depth or past
    /// the root; the cursor does not move in either case.
    pub fn ascend_to(&mut self, target: usize) -> Option<&'a MatchNode> {
        if target < self.depth {
            return None;
        }
        let node = self.chain.node(target)?;
        if self.visits == 0 {
            self.visits = target + 1;
        } else {
            self.visits += target - self.depth;
        }
        self.depth = target;
        Some(node)
    }

    /// Returns the number of distinct nodes the cursor has passed through.
    #[must_use]
    pub const fn visits(&self) -> usize {
        self.visits
    }

    /// Returns the depth the cursor currently sits at.
    #[must_use]
    pub const fn deepest(&self) -> usize {
        self.depth
    }
}
