//! Parameter layouts of compiled consequences.

use std::fmt;

use consequent_foundation::{Error, Result, Type};

use crate::resolver::ResolutionPlan;

/// One argument position of an action body.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ParamSlot {
    /// The value bound to a declaration.
    Value {
        /// Declaration name.
        declaration: String,
        /// Declared type.
        ty: Type,
    },
    /// The fact handle bound to a declaration, or nil.
    Identity {
        /// Declaration name.
        declaration: String,
    },
    /// A session global.
    Global {
        /// Global name.
        name: String,
        /// Declared type.
        ty: Type,
    },
}

impl ParamSlot {
    /// Returns the type an action body must declare for this slot.
    #[must_use]
    pub fn ty(&self) -> Type {
        match self {
            Self::Value { ty, .. } | Self::Global { ty, .. } => ty.clone(),
            Self::Identity { .. } => Type::Handle,
        }
    }
}

impl fmt::Display for ParamSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value { declaration, ty } => write!(f, "{declaration}: {ty}"),
            Self::Identity { declaration } => write!(f, "{declaration}#handle"),
            Self::Global { name, ty } => write!(f, "global {name}: {ty}"),
        }
    }
}

/// Argument layout: a `(value, identity)` pair per declaration in
/// `original_index` order, then one slot per global.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ParameterLayout {
    slots: Vec<ParamSlot>,
    declarations: usize,
}

impl ParameterLayout {
    /// Builds the layout for a resolution plan and the rule's globals.
    #[must_use]
    pub fn build(plan: &ResolutionPlan, globals: &[(String, Type)]) -> Self {
        let mut slots = Vec::with_capacity(plan.len() * 2 + globals.len());
        for decl in plan.declarations() {
            slots.push(ParamSlot::Value {
                declaration: decl.name().to_string(),
                ty: decl.declared_type().clone(),
            });
            slots.push(ParamSlot::Identity {
                declaration: decl.name().to_string(),
            });
        }
        for (name, ty) in globals {
            slots.push(ParamSlot::Global {
                name: name.clone(),
                ty: ty.clone(),
            });
        }
        Self {
            slots,
            declarations: plan.len(),
        }
    }

    /// Returns the slots in argument order.
    #[must_use]
    pub fn slots(&self) -> &[ParamSlot] {
        &self.slots
    }

    /// Returns the number of arguments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns true if the action takes no arguments besides the helper.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Returns the number of declaration slot pairs.
    #[must_use]
    pub const fn declaration_count(&self) -> usize {
        self.declarations
    }

    /// Returns the number of global slots.
    #[must_use]
    pub fn global_count(&self) -> usize {
        self.slots.len() - self.declarations * 2
    }

    /// Returns the argument types in order.
    #[must_use]
    pub fn types(&self) -> Vec<Type> {
        self.slots.iter().map(ParamSlot::ty).collect()
    }

    /// Checks an action body's declared signature against this layout.
    ///
    /// # Errors
    /// Returns `SignatureMismatch` if the counts differ or any position
    /// declares a different type.
    pub fn verify(&self, signature: &[Type]) -> Result<()> {
        if signature.len() != self.slots.len() {
            return Err(Error::signature_mismatch(format!(
                "action declares {} parameters, layout has {}",
                signature.len(),
                self.slots.len()
            )));
        }
        for (position, (slot, declared)) in self.slots.iter().zip(signature).enumerate() {
            let expected = slot.ty();
            if &expected != declared {
                return Err(Error::signature_mismatch(format!(
                    "parameter {position} ({slot}) expects {expected}, action declares {declared}"
                )));
            }
        }
        Ok(())
    }
}
