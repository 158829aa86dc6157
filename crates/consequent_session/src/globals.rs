//! Session globals.
//!
//! [`GlobalTypes`] is the build-time view: the names and declared types of
//! the globals a package may reference. [`GlobalStore`] is the run-time view:
//! the values a session currently holds under those names.

use std::collections::BTreeMap;

use consequent_foundation::{Error, Result, Type, Value};
use tracing::debug;

/// Declared global names and their types.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GlobalTypes {
    types: BTreeMap<String, Type>,
}

impl GlobalTypes {
    /// Creates an empty declaration set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a global.
    pub fn declare(&mut self, name: impl Into<String>, ty: Type) {
        self.types.insert(name.into(), ty);
    }

    /// Builder form of [`GlobalTypes::declare`].
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, ty: Type) -> Self {
        self.declare(name, ty);
        self
    }

    /// Returns the declared type of a global.
    #[must_use]
    pub fn type_of(&self, name: &str) -> Option<&Type> {
        self.types.get(name)
    }

    /// Returns true if the global is declared.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Iterates over declarations in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Type)> {
        self.types.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Adds every declaration of `other`, replacing duplicates.
    pub fn extend(&mut self, other: &GlobalTypes) {
        for (name, ty) in other.iter() {
            self.declare(name, ty.clone());
        }
    }
}

/// Global values held by a session.
#[derive(Clone, Debug, Default)]
pub struct GlobalStore {
    types: GlobalTypes,
    values: BTreeMap<String, Value>,
}

impl GlobalStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that checks values against declared types.
    #[must_use]
    pub fn with_types(types: GlobalTypes) -> Self {
        Self {
            types,
            values: BTreeMap::new(),
        }
    }

    /// Declares a global type.
    pub fn declare(&mut self, name: impl Into<String>, ty: Type) {
        self.types.declare(name, ty);
    }

    /// Sets a global value.
    ///
    /// # Errors
    /// Returns `TypeMismatch` if the global is declared with a type the value
    /// does not fit.
    pub fn set(&mut self, name: impl Into<String>, value: Value) -> Result<()> {
        let name = name.into();
        self.check(&name, &value)?;
        debug!(global = %name, "global set");
        self.values.insert(name, value);
        Ok(())
    }

    /// Checks that `value` may be stored under `name`, without storing it.
    ///
    /// # Errors
    /// Returns `TypeMismatch` if the global is declared with a type the value
    /// does not fit.
    pub fn check(&self, name: &str, value: &Value) -> Result<()> {
        match self.types.type_of(name) {
            Some(ty) if !value.conforms_to(ty) => {
                Err(Error::type_mismatch(ty.clone(), value.value_type()))
            }
            _ => Ok(()),
        }
    }

    /// Gets a global value.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Gets a global value, failing if absent.
    ///
    /// # Errors
    /// Returns `MissingGlobal` if no value is set under `name`.
    pub fn require(&self, name: &str) -> Result<&Value> {
        self.get(name).ok_or_else(|| Error::missing_global(name))
    }

    /// Returns the declared types.
    #[must_use]
    pub const fn types(&self) -> &GlobalTypes {
        &self.types
    }

    /// Returns the number of globals with a value.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if no global has a value.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
