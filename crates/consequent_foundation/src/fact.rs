//! Fact records.
//!
//! A [`FactObject`] is the object a pattern binds: a named record of fields,
//! shared by reference. Two `FactObject`s compare equal when their type and
//! fields match; [`FactObject::same`] compares identity, which is what working
//! memory indexes facts by.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::collections::PMap;
use crate::types::Type;
use crate::value::Value;

#[derive(PartialEq, Eq, Hash)]
struct Record {
    type_name: Arc<str>,
    fields: PMap<Arc<str>, Value>,
}

/// Shared fact record.
///
/// Cloning is O(1) and preserves identity.
#[derive(Clone)]
pub struct FactObject(Arc<Record>);

impl FactObject {
    /// Creates a fact with no fields.
    #[must_use]
    pub fn new(type_name: impl Into<Arc<str>>) -> Self {
        Self(Arc::new(Record {
            type_name: type_name.into(),
            fields: PMap::new(),
        }))
    }

    /// Creates a fact with the given fields.
    pub fn with_fields<I, K>(type_name: impl Into<Arc<str>>, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<Arc<str>>,
    {
        Self(Arc::new(Record {
            type_name: type_name.into(),
            fields: fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }))
    }

    /// Returns the fact type name.
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.0.type_name
    }

    /// Returns the declared type of this fact.
    #[must_use]
    pub fn fact_type(&self) -> Type {
        Type::Fact(Arc::clone(&self.0.type_name))
    }

    /// Gets a field value.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.fields.get(field)
    }

    /// Returns a new fact (with a new identity) with the field set.
    #[must_use]
    pub fn set(&self, field: impl Into<Arc<str>>, value: Value) -> Self {
        Self(Arc::new(Record {
            type_name: Arc::clone(&self.0.type_name),
            fields: self.0.fields.insert(field.into(), value),
        }))
    }

    /// Iterates over the fields.
    pub fn fields(&self) -> impl Iterator<Item = (&Arc<str>, &Value)> {
        self.0.fields.iter()
    }

    /// Returns true if both refer to the same fact instance.
    #[must_use]
    pub fn same(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Returns a key identifying this fact instance.
    ///
    /// Only meaningful while the fact is alive.
    #[must_use]
    pub fn identity(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }
}

impl PartialEq for FactObject {
    fn eq(&self, other: &Self) -> bool {
        self.same(other) || self.0 == other.0
    }
}

impl Eq for FactObject {}

impl Hash for FactObject {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl fmt::Debug for FactObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.type_name)?;
        f.debug_map().entries(self.0.fields.iter()).finish()
    }
}

impl fmt::Display for FactObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.0.type_name)?;
        let mut fields: Vec<_> = self.0.fields.iter().collect();
        fields.sort_by(|a, b| a.0.cmp(b.0));
        for (i, (k, v)) in fields.into_iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{k}: {v}")?;
        }
        write!(f, ")")
    }
}
