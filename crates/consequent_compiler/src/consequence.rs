//! Consequence compilation: from a rule's declarations and action body to a
//! directly callable unit.
//!
//! # Overview
//!
//! [`ConsequenceCompiler::compile`] validates a rule once at build time:
//! declaration depths and indices are checked by the resolver, globals must
//! be declared by the package, and the action body's declared signature must
//! match the [`ParameterLayout`]. The result is a [`CompiledConsequence`],
//! which holds no mutable state and can be fired from many threads at once.
//!
//! Firing calls [`ConsequenceUnit::evaluate`] with a [`KnowledgeHelper`]. The
//! unit resolves every declaration against the helper's match chain, reads
//! each global from the session store, and calls the action body with
//! `[value₁, identity₁, …, global₁, …]`.
//!
//! [`ConsequenceStub`] defers the build until the first firing.

mod action;
mod helper;
mod layout;
mod stub;

pub use action::{ActionBody, ActionFn};
pub use helper::{Effect, KnowledgeHelper};
pub use layout::{ParamSlot, ParameterLayout};
pub use stub::ConsequenceStub;

use consequent_foundation::{Error, ErrorContext, FactHandle, Result, Type, Value};
use consequent_session::{EntryPoint, GlobalTypes, Session};
use tracing::{debug, trace};

use crate::chain::MatchChain;
use crate::config::CompilerConfig;
use crate::declaration::Declaration;
use crate::naming::sanitize;
use crate::resolver::{DeclarationResolver, ResolutionPlan};

// =============================================================================
// Capability
// =============================================================================

/// The executable form of a rule's consequence.
pub trait ConsequenceUnit: Send + Sync {
    /// Returns the unit's build-time name.
    fn identify(&self) -> &str;

    /// Fires the consequence for the match chain held by `helper`.
    ///
    /// # Errors
    /// Resolution and global lookup failures, and whatever the action body
    /// returns.
    fn evaluate(&self, helper: &mut KnowledgeHelper<'_>) -> Result<()>;
}

// =============================================================================
// Rule descriptor
// =============================================================================

/// What the compiler needs to know about a rule besides its declarations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuleDescriptor {
    /// Rule name.
    pub name: String,
    /// Package; the compiler's default if empty.
    pub package: String,
    /// Root depth of the match chains this rule fires with. Defaults to the
    /// deepest declaration.
    pub chain_depth: Option<usize>,
    /// Globals the action body reads, in argument order.
    pub globals: Vec<String>,
}

impl RuleDescriptor {
    /// Creates a descriptor for the named rule.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            package: String::new(),
            chain_depth: None,
            globals: Vec::new(),
        }
    }

    /// Builder method to set the package.
    #[must_use]
    pub fn with_package(mut self, package: impl Into<String>) -> Self {
        self.package = package.into();
        self
    }

    /// Builder method to set the chain depth.
    #[must_use]
    pub const fn with_chain_depth(mut self, depth: usize) -> Self {
        self.chain_depth = Some(depth);
        self
    }

    /// Builder method to add a global.
    #[must_use]
    pub fn with_global(mut self, name: impl Into<String>) -> Self {
        self.globals.push(name.into());
        self
    }

    fn depth_for(&self, declarations: &[Declaration]) -> usize {
        self.chain_depth.unwrap_or_else(|| {
            declarations
                .iter()
                .map(Declaration::origin_depth)
                .max()
                .unwrap_or_default()
        })
    }
}

// =============================================================================
// Compiled consequence
// =============================================================================

/// A rule's consequence, validated and ready to fire.
#[derive(Clone, Debug)]
pub struct CompiledConsequence {
    name: String,
    rule: String,
    plan: ResolutionPlan,
    globals: Vec<(String, Type)>,
    layout: ParameterLayout,
    action: ActionBody,
}

impl CompiledConsequence {
    /// Returns the rule this unit fires for.
    #[must_use]
    pub fn rule(&self) -> &str {
        &self.rule
    }

    /// Returns the argument layout.
    #[must_use]
    pub const fn layout(&self) -> &ParameterLayout {
        &self.layout
    }

    /// Returns the resolution plan.
    #[must_use]
    pub const fn plan(&self) -> &ResolutionPlan {
        &self.plan
    }

    /// Returns the action body.
    #[must_use]
    pub const fn action(&self) -> &ActionBody {
        &self.action
    }

    /// Computes the action arguments for the firing held by `helper`.
    ///
    /// # Errors
    /// - `TypeMismatch` if a bound value or global does not fit its type
    /// - `MissingGlobal` if a global has no value in the session
    /// - `DepthOutOfRange` if the chain is shorter than planned
    pub fn arguments(&self, helper: &KnowledgeHelper<'_>) -> Result<Vec<Value>> {
        let resolution = DeclarationResolver::resolve(&self.plan, helper.chain(), helper.memory())?;

        let mut args = Vec::with_capacity(self.layout.len());
        for slot in resolution.slots {
            let identity = slot.identity();
            args.push(slot.value);
            args.push(identity);
        }

        for (name, ty) in &self.globals {
            let value = helper.globals().require(name)?;
            if !value.conforms_to(ty) {
                return Err(Error::type_mismatch(ty.clone(), value.value_type())
                    .with_context(ErrorContext::new().with_frame(format!("global {name}"))));
            }
            args.push(value.clone());
        }

        trace!(unit = %self.name, visits = resolution.visits, "arguments resolved");
        Ok(args)
    }

    fn locate(&self, mut error: Error) -> Error {
        let context = error
            .context
            .take()
            .unwrap_or_default()
            .with_rule(&self.rule)
            .with_artifact(&self.name);
        error.with_context(context)
    }
}

impl ConsequenceUnit for CompiledConsequence {
    fn identify(&self) -> &str {
        &self.name
    }

    fn evaluate(&self, helper: &mut KnowledgeHelper<'_>) -> Result<()> {
        let args = self.arguments(helper).map_err(|e| self.locate(e))?;
        trace!(unit = %self.name, args = args.len(), "invoking action body");
        self.action.invoke(helper, &args)
    }
}

// =============================================================================
// Compiler
// =============================================================================

/// Builds [`CompiledConsequence`]s.
#[derive(Clone, Debug, Default)]
pub struct ConsequenceCompiler {
    config: CompilerConfig,
}

impl ConsequenceCompiler {
    /// Creates a compiler.
    #[must_use]
    pub const fn new(config: CompilerConfig) -> Self {
        Self { config }
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Draws a fresh invoker name for `rule`.
    #[must_use]
    pub fn invoker_name(&self, rule: &RuleDescriptor) -> String {
        format!(
            "{}.Rule_{}_{}ConsequenceInvoker",
            self.config.package_or(&rule.package),
            sanitize(&rule.name),
            self.config.tokens.next_token()
        )
    }

    /// Compiles a rule's consequence under a fresh name.
    ///
    /// # Errors
    /// - `DepthOutOfRange` or `InvalidDeclaration` from planning
    /// - `UnresolvedGlobal` if the rule reads a global `globals` lacks
    /// - `SignatureMismatch` if the action's signature does not fit the layout
    pub fn compile(
        &self,
        rule: &RuleDescriptor,
        declarations: &[Declaration],
        globals: &GlobalTypes,
        action: ActionBody,
    ) -> Result<CompiledConsequence> {
        let name = self.invoker_name(rule);
        self.compile_named(name, rule, declarations, globals, action)
    }

    /// Compiles a rule's consequence under a name assigned earlier.
    ///
    /// # Errors
    /// See [`compile`](Self::compile).
    pub fn compile_named(
        &self,
        name: String,
        rule: &RuleDescriptor,
        declarations: &[Declaration],
        globals: &GlobalTypes,
        action: ActionBody,
    ) -> Result<CompiledConsequence> {
        let located = |e: Error| {
            let context = ErrorContext::new()
                .with_rule(&rule.name)
                .with_artifact(&name);
            e.with_context(context)
        };

        let plan = DeclarationResolver::plan(declarations, rule.depth_for(declarations))
            .map_err(located)?;

        let typed_globals = rule
            .globals
            .iter()
            .map(|g| {
                globals
                    .type_of(g)
                    .map(|ty| (g.clone(), ty.clone()))
                    .ok_or_else(|| Error::unresolved_global(g))
            })
            .collect::<Result<Vec<_>>>()
            .map_err(located)?;

        let layout = ParameterLayout::build(&plan, &typed_globals);
        if self.config.verify_signatures {
            layout.verify(action.signature()).map_err(located)?;
        }

        debug!(
            rule = %rule.name,
            unit = %name,
            declarations = plan.len(),
            globals = typed_globals.len(),
            "consequence compiled"
        );

        Ok(CompiledConsequence {
            name,
            rule: rule.name.clone(),
            plan,
            globals: typed_globals,
            layout,
            action,
        })
    }

    /// Returns a stub that compiles the consequence on first firing.
    #[must_use]
    pub fn stub(
        &self,
        rule: RuleDescriptor,
        declarations: Vec<Declaration>,
        globals: GlobalTypes,
        action: ActionBody,
    ) -> ConsequenceStub {
        let name = self.invoker_name(&rule);
        ConsequenceStub::new(name, self.clone(), rule, declarations, globals, action)
    }
}

// =============================================================================
// Firing against a session
// =============================================================================

/// Outcome of [`fire`].
#[derive(Clone, Debug, PartialEq)]
pub struct FiringReport {
    /// Name of the unit that fired.
    pub unit: String,
    /// Effects requested by the action body, in request order.
    pub effects: Vec<Effect>,
    /// Handles of the facts inserted by those effects.
    pub inserted: Vec<FactHandle>,
}

/// Fires `unit` for `chain` against a session and applies its effects.
///
/// The unit evaluates against a snapshot of working memory taken before the
/// firing, so the memory lock is not held while the action body runs. The
/// collected effects are then applied as one batch: either all of them take
/// effect or, on the first failing effect, none do.
///
/// # Errors
/// Evaluation errors unchanged, `FactNotFound` for updates or retractions of
/// dead handles, and `Internal` for poisoned locks.
pub fn fire(
    unit: &dyn ConsequenceUnit,
    chain: &MatchChain,
    session: &mut Session,
) -> Result<FiringReport> {
    let snapshot = session.memory()?.clone();
    let effects = {
        let mut helper = KnowledgeHelper::new(chain, &snapshot, session.globals());
        unit.evaluate(&mut helper)?;
        helper.take_effects()
    };
    drop(snapshot);

    let inserted = apply_effects(session, &effects)
        .map_err(|e| e.with_context(ErrorContext::new().with_artifact(unit.identify())))?;

    debug!(unit = unit.identify(), effects = effects.len(), "consequence fired");
    Ok(FiringReport {
        unit: unit.identify().to_string(),
        effects,
        inserted,
    })
}

fn apply_effects(session: &mut Session, effects: &[Effect]) -> Result<Vec<FactHandle>> {
    for effect in effects {
        if let Effect::Insert {
            entry_point: Some(name),
            ..
        } = effect
        {
            session.entry_point(name);
        }
    }

    let partition = |name: Option<&String>| {
        let name = name.map_or(session.default_entry_point(), String::as_str);
        session
            .find_entry_point(name)
            .map(EntryPoint::partition)
            .ok_or_else(|| Error::internal(format!("entry point {name} not declared")))
    };

    let mut memory = session.memory_mut()?;
    let mut staged = memory.clone();
    let mut inserted = Vec::new();
    for effect in effects {
        match effect {
            Effect::Insert { value, entry_point } => {
                inserted.push(staged.insert(value.clone(), partition(entry_point.as_ref())?));
            }
            Effect::Update { handle, value } => staged.update(*handle, value.clone())?,
            Effect::Retract { handle } => {
                staged.retract(*handle)?;
            }
        }
    }
    *memory = staged;
    Ok(inserted)
}
