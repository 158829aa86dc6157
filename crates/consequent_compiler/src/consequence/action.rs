//! Action bodies: the compiled right-hand side of a rule.

use std::fmt;
use std::sync::Arc;

use consequent_foundation::{Result, Type, Value};

use super::helper::KnowledgeHelper;

/// Signature of an action body callable.
///
/// Receives the firing context and the arguments laid out by the unit's
/// [`ParameterLayout`](super::ParameterLayout).
pub type ActionFn = dyn Fn(&mut KnowledgeHelper<'_>, &[Value]) -> Result<()> + Send + Sync;

/// A rule's action body together with the parameter types it declares.
#[derive(Clone)]
pub struct ActionBody {
    rule_class: String,
    method: String,
    signature: Vec<Type>,
    func: Arc<ActionFn>,
}

impl ActionBody {
    /// Creates an action body.
    pub fn new<F>(
        rule_class: impl Into<String>,
        method: impl Into<String>,
        signature: Vec<Type>,
        func: F,
    ) -> Self
    where
        F: Fn(&mut KnowledgeHelper<'_>, &[Value]) -> Result<()> + Send + Sync + 'static,
    {
        Self {
            rule_class: rule_class.into(),
            method: method.into(),
            signature,
            func: Arc::new(func),
        }
    }

    /// Returns the name of the rule class owning the body.
    #[must_use]
    pub fn rule_class(&self) -> &str {
        &self.rule_class
    }

    /// Returns the body's method name.
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Returns the declared parameter types, helper excluded.
    #[must_use]
    pub fn signature(&self) -> &[Type] {
        &self.signature
    }

    /// Calls the body. Its errors are returned unchanged.
    ///
    /// # Errors
    /// Whatever the body returns.
    pub fn invoke(&self, helper: &mut KnowledgeHelper<'_>, args: &[Value]) -> Result<()> {
        (self.func)(helper, args)
    }
}

impl fmt::Debug for ActionBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ActionBody({}::{}/{})",
            self.rule_class,
            self.method,
            self.signature.len()
        )
    }
}
