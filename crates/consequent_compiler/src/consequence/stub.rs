//! Consequences compiled on first use.

use std::fmt;
use std::sync::{Mutex, OnceLock, PoisonError};

use consequent_foundation::Result;
use consequent_session::GlobalTypes;
use tracing::debug;

use super::{
    ActionBody, CompiledConsequence, ConsequenceCompiler, ConsequenceUnit, KnowledgeHelper,
    RuleDescriptor,
};
use crate::declaration::Declaration;

/// A consequence that is compiled the first time it fires.
///
/// The name is assigned when the stub is created, so [`identify`] is stable
/// before and after compilation. Concurrent first firings are serialized,
/// so a successful build happens exactly once; a failed build is not cached
/// and is attempted (and reported) again on the next firing.
///
/// [`identify`]: ConsequenceUnit::identify
pub struct ConsequenceStub {
    name: String,
    compiler: ConsequenceCompiler,
    rule: RuleDescriptor,
    declarations: Vec<Declaration>,
    globals: GlobalTypes,
    action: ActionBody,
    compiled: OnceLock<CompiledConsequence>,
    building: Mutex<()>,
}

impl ConsequenceStub {
    pub(crate) fn new(
        name: String,
        compiler: ConsequenceCompiler,
        rule: RuleDescriptor,
        declarations: Vec<Declaration>,
        globals: GlobalTypes,
        action: ActionBody,
    ) -> Self {
        Self {
            name,
            compiler,
            rule,
            declarations,
            globals,
            action,
            compiled: OnceLock::new(),
            building: Mutex::new(()),
        }
    }

    /// Returns true once the consequence has been compiled.
    #[must_use]
    pub fn is_compiled(&self) -> bool {
        self.compiled.get().is_some()
    }

    /// Returns the compiled unit, compiling it if needed.
    ///
    /// # Errors
    /// Any build error from [`ConsequenceCompiler::compile`].
    pub fn unit(&self) -> Result<&CompiledConsequence> {
        if let Some(unit) = self.compiled.get() {
            return Ok(unit);
        }
        let _building = self.building.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(unit) = self.compiled.get() {
            return Ok(unit);
        }
        let unit = self.compiler.compile_named(
            self.name.clone(),
            &self.rule,
            &self.declarations,
            &self.globals,
            self.action.clone(),
        )?;
        debug!(unit = %self.name, "stub compiled");
        Ok(self.compiled.get_or_init(|| unit))
    }
}

impl ConsequenceUnit for ConsequenceStub {
    fn identify(&self) -> &str {
        &self.name
    }

    fn evaluate(&self, helper: &mut KnowledgeHelper<'_>) -> Result<()> {
        self.unit()?.evaluate(helper)
    }
}

impl fmt::Debug for ConsequenceStub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsequenceStub")
            .field("name", &self.name)
            .field("compiled", &self.is_compiled())
            .finish_non_exhaustive()
    }
}
