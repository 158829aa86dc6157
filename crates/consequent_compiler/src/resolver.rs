//! Declaration resolution against a match chain.
//!
//! Resolution happens in two phases. [`DeclarationResolver::plan`] runs once
//! per rule at build time: it validates the declaration list against the
//! chain depth the pattern network promises and fixes the *resolution
//! order*, declarations sorted by origin depth so that the chain is walked
//! from the tip towards the root exactly once. [`DeclarationResolver::resolve`]
//! runs once per firing and produces one [`ResolvedSlot`] per declaration in
//! `original_index` order; the resolution order never leaks out.
//!
//! # Example
//!
//! ```
//! use consequent_compiler::{Declaration, DeclarationResolver, MatchChain, MatchNode};
//! use consequent_foundation::{FactHandle, Type, Value};
//! use consequent_session::WorkingMemory;
//!
//! let chain: MatchChain = (0..3)
//!     .map(|i| MatchNode::new(FactHandle::new(i, 0), Value::Int(i as i64)))
//!     .collect();
//! let decls = vec![
//!     Declaration::direct("$root", Type::Int, 2, 0),
//!     Declaration::direct("$tip", Type::Int, 0, 1),
//! ];
//! let plan = DeclarationResolver::plan(&decls, 2).unwrap();
//! let resolution = DeclarationResolver::resolve(&plan, &chain, &WorkingMemory::new()).unwrap();
//! assert_eq!(resolution.slots[0].value, Value::Int(0));
//! assert_eq!(resolution.slots[1].value, Value::Int(2));
//! assert_eq!(resolution.visits, 3);
//! ```

use consequent_foundation::{Error, ErrorContext, FactHandle, Result, Value};
use consequent_session::WorkingMemory;
use tracing::trace;

use crate::chain::{MatchChain, MatchNode};
use crate::declaration::Declaration;

/// The value and identity bound to one declaration for one firing.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedSlot {
    /// The bound value.
    pub value: Value,
    /// The identity of the bound fact, if it has one.
    pub handle: Option<FactHandle>,
}

impl ResolvedSlot {
    /// The slot of an indirect binding whose target is not in working memory.
    #[must_use]
    pub const fn absent() -> Self {
        Self {
            value: Value::Nil,
            handle: None,
        }
    }

    /// Returns the identity as a value: a handle or nil.
    #[must_use]
    pub fn identity(&self) -> Value {
        Value::from(self.handle)
    }
}

/// A validated declaration list with its resolution order.
#[derive(Clone, Debug)]
pub struct ResolutionPlan {
    declarations: Vec<Declaration>,
    order: Vec<usize>,
    chain_depth: usize,
}

impl ResolutionPlan {
    /// Returns the declarations in `original_index` order.
    #[must_use]
    pub fn declarations(&self) -> &[Declaration] {
        &self.declarations
    }

    /// Returns positions into [`declarations`](Self::declarations) in the
    /// order they are resolved.
    #[must_use]
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    /// Returns the root depth the plan was validated against.
    #[must_use]
    pub const fn chain_depth(&self) -> usize {
        self.chain_depth
    }

    /// Returns the number of declarations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    /// Returns true if the plan binds nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }
}

/// Output of one resolution.
#[derive(Clone, Debug, PartialEq)]
pub struct Resolution {
    /// One slot per declaration, in `original_index` order.
    pub slots: Vec<ResolvedSlot>,
    /// Number of chain nodes the traversal passed through.
    pub visits: usize,
    /// Deepest depth reached.
    pub deepest: usize,
}

/// Resolves declarations against match chains.
#[derive(Clone, Copy, Debug, Default)]
pub struct DeclarationResolver;

impl DeclarationResolver {
    /// Validates `declarations` against a chain whose root sits at
    /// `chain_depth` and computes the resolution order.
    ///
    /// # Errors
    /// - `DepthOutOfRange` if a declaration originates below the root
    /// - `InvalidDeclaration` if the original indices are not `0..n`
    pub fn plan(declarations: &[Declaration], chain_depth: usize) -> Result<ResolutionPlan> {
        let n = declarations.len();
        let mut by_index: Vec<Option<Declaration>> = vec![None; n];

        for decl in declarations {
            if decl.origin_depth() > chain_depth {
                return Err(Error::depth_out_of_range(
                    decl.name(),
                    decl.origin_depth(),
                    chain_depth,
                ));
            }
            let slot = by_index.get_mut(decl.original_index()).ok_or_else(|| {
                Error::invalid_declaration(format!(
                    "{} has index {} but only {n} declarations exist",
                    decl.name(),
                    decl.original_index()
                ))
            })?;
            if let Some(previous) = slot {
                return Err(Error::invalid_declaration(format!(
                    "{} and {} share index {}",
                    previous.name(),
                    decl.name(),
                    decl.original_index()
                )));
            }
            *slot = Some(decl.clone());
        }

        // Every index was filled exactly once above.
        let declarations: Vec<Declaration> = by_index.into_iter().flatten().collect();

        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by_key(|&i| (declarations[i].origin_depth(), i));

        Ok(ResolutionPlan {
            declarations,
            order,
            chain_depth,
        })
    }

    /// Resolves a plan against one match chain.
    ///
    /// Indirect declarations are looked up in `memory` on every call.
    ///
    /// # Errors
    /// - `DepthOutOfRange` if the chain is shorter than the plan requires
    /// - `TypeMismatch` if a bound value does not fit its declared type
    /// - any error raised by a field extractor
    pub fn resolve(
        plan: &ResolutionPlan,
        chain: &MatchChain,
        memory: &WorkingMemory,
    ) -> Result<Resolution> {
        let mut slots = vec![ResolvedSlot::absent(); plan.len()];
        let mut cursor = chain.cursor();

        for &i in &plan.order {
            let decl = &plan.declarations[i];
            let anchor = cursor.ascend_to(decl.origin_depth()).ok_or_else(|| {
                Error::depth_out_of_range(
                    decl.name(),
                    decl.origin_depth(),
                    chain.max_depth().unwrap_or_default(),
                )
            })?;
            let slot = if decl.is_indirect() {
                Self::resolve_indirect(decl, anchor, memory)
            } else {
                Self::resolve_direct(decl, anchor)
            }
            .map_err(|mut e| {
                let context = e.context.take().unwrap_or_else(ErrorContext::new);
                e.with_context(context.with_frame(format!("resolve {}", decl.name())))
            })?;
            trace!(
                declaration = decl.name(),
                depth = decl.origin_depth(),
                handle = ?slot.handle,
                "declaration resolved"
            );
            slots[i] = slot;
        }

        Ok(Resolution {
            slots,
            visits: cursor.visits(),
            deepest: cursor.deepest(),
        })
    }

    /// Plans against the given chain and resolves in one step.
    ///
    /// # Errors
    /// See [`plan`](Self::plan) and [`resolve`](Self::resolve).
    pub fn resolve_chain(
        chain: &MatchChain,
        declarations: &[Declaration],
        memory: &WorkingMemory,
    ) -> Result<Resolution> {
        let depth = chain.max_depth().unwrap_or_default();
        let plan = Self::plan(declarations, depth)?;
        Self::resolve(&plan, chain, memory)
    }

    fn resolve_direct(decl: &Declaration, anchor: &MatchNode) -> Result<ResolvedSlot> {
        check_type(decl, &anchor.object)?;
        Ok(ResolvedSlot {
            value: anchor.object.clone(),
            handle: Some(anchor.handle),
        })
    }

    fn resolve_indirect(
        decl: &Declaration,
        anchor: &MatchNode,
        memory: &WorkingMemory,
    ) -> Result<ResolvedSlot> {
        let value = decl.extractor().extract(&anchor.object, memory)?;
        match value {
            Value::Nil => Ok(ResolvedSlot::absent()),
            Value::Fact(_) | Value::Source(_) => {
                let Some(handle) = memory.handle_of(&value) else {
                    trace!(declaration = decl.name(), "indirect target absent");
                    return Ok(ResolvedSlot::absent());
                };
                check_type(decl, &value)?;
                Ok(ResolvedSlot {
                    value,
                    handle: Some(handle),
                })
            }
            other => {
                check_type(decl, &other)?;
                Ok(ResolvedSlot {
                    value: other,
                    handle: None,
                })
            }
        }
    }
}

fn check_type(decl: &Declaration, value: &Value) -> Result<()> {
    if value.conforms_to(decl.declared_type()) {
        Ok(())
    } else {
        Err(Error::type_mismatch(
            decl.declared_type().clone(),
            value.value_type(),
        ))
    }
}
