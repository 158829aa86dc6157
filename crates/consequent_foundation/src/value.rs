//! Core value type for facts, bindings, and action parameters.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::collections::{PMap, PVec};
use crate::fact::FactObject;
use crate::handle::FactHandle;
use crate::source::DataSource;
use crate::types::Type;

/// Core value type.
///
/// Values are immutable and cheaply cloneable (O(1) for most variants).
#[derive(Clone)]
pub enum Value {
    /// The nil value (represents absence).
    Nil,
    /// Boolean value.
    Bool(bool),
    /// 64-bit signed integer.
    Int(i64),
    /// 64-bit floating point.
    Float(f64),
    /// String value.
    String(Arc<str>),
    /// Fact identity.
    Handle(FactHandle),
    /// Fact record.
    Fact(FactObject),
    /// Persistent vector.
    Vec(PVec<Value>),
    /// Persistent map.
    Map(PMap<Value, Value>),
    /// Data source stream.
    Source(DataSource),
}

impl Value {
    /// Returns the runtime type of this value.
    #[must_use]
    pub fn value_type(&self) -> Type {
        match self {
            Self::Nil => Type::Nil,
            Self::Bool(_) => Type::Bool,
            Self::Int(_) => Type::Int,
            Self::Float(_) => Type::Float,
            Self::String(_) => Type::String,
            Self::Handle(_) => Type::Handle,
            Self::Fact(fact) => fact.fact_type(),
            Self::Vec(_) => Type::vec(Type::Any),
            Self::Map(_) => Type::map(Type::Any, Type::Any),
            Self::Source(_) => Type::Source,
        }
    }

    /// Returns true if this value is nil.
    #[must_use]
    pub const fn is_nil(&self) -> bool {
        matches!(self, Self::Nil)
    }

    /// Returns true if a value of this runtime type fits `declared`.
    #[must_use]
    pub fn conforms_to(&self, declared: &Type) -> bool {
        declared.accepts(&self.value_type())
    }

    /// Attempts to extract an integer value.
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Attempts to extract a string reference.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Attempts to extract a fact handle.
    #[must_use]
    pub const fn as_handle(&self) -> Option<FactHandle> {
        match self {
            Self::Handle(h) => Some(*h),
            _ => None,
        }
    }

    /// Attempts to extract a fact record.
    #[must_use]
    pub const fn as_fact(&self) -> Option<&FactObject> {
        match self {
            Self::Fact(f) => Some(f),
            _ => None,
        }
    }

    /// Attempts to extract a data source.
    #[must_use]
    pub const fn as_source(&self) -> Option<&DataSource> {
        match self {
            Self::Source(s) => Some(s),
            _ => None,
        }
    }

    /// Attempts to extract a vector reference.
    #[must_use]
    pub const fn as_vec(&self) -> Option<&PVec<Value>> {
        match self {
            Self::Vec(v) => Some(v),
            _ => None,
        }
    }
}

// Implement PartialEq manually to handle float comparison
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Nil, Self::Nil) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Handle(a), Self::Handle(b)) => a == b,
            (Self::Fact(a), Self::Fact(b)) => a == b,
            (Self::Vec(a), Self::Vec(b)) => a == b,
            (Self::Map(a), Self::Map(b)) => a == b,
            (Self::Source(a), Self::Source(b)) => a.same(b),
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::Nil => {}
            Self::Bool(b) => b.hash(state),
            Self::Int(n) => n.hash(state),
            Self::Float(n) => n.to_bits().hash(state),
            Self::String(s) => s.hash(state),
            Self::Handle(h) => h.hash(state),
            Self::Fact(f) => f.hash(state),
            Self::Vec(v) => v.hash(state),
            Self::Map(m) => m.hash(state),
            Self::Source(s) => s.identity().hash(state),
        }
    }
}

impl PartialOrd for Value {
    #[allow(clippy::cast_precision_loss)]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Nil, Self::Nil) => Some(Ordering::Equal),
            (Self::Bool(a), Self::Bool(b)) => a.partial_cmp(b),
            (Self::Int(a), Self::Int(b)) => a.partial_cmp(b),
            (Self::Float(a), Self::Float(b)) => a.partial_cmp(b),
            (Self::Int(a), Self::Float(b)) => (*a as f64).partial_cmp(b),
            (Self::Float(a), Self::Int(b)) => a.partial_cmp(&(*b as f64)),
            (Self::String(a), Self::String(b)) => a.partial_cmp(b),
            (Self::Handle(a), Self::Handle(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nil => write!(f, "nil"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "{s:?}"),
            Self::Handle(h) => write!(f, "{h:?}"),
            Self::Fact(fact) => write!(f, "{fact:?}"),
            Self::Vec(v) => write!(f, "{v:?}"),
            Self::Map(m) => write!(f, "{m:?}"),
            Self::Source(s) => write!(f, "{s:?}"),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nil => write!(f, "nil"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "{s}"),
            Self::Handle(h) => write!(f, "{h}"),
            Self::Fact(fact) => write!(f, "{fact}"),
            Self::Vec(v) => {
                write!(f, "[")?;
                for (i, item) in v.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Self::Map(m) => {
                write!(f, "{{")?;
                for (i, (k, v)) in m.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k} {v}")?;
                }
                write!(f, "}}")
            }
            Self::Source(s) => write!(f, "<source of {}>", s.len()),
        }
    }
}

// Convenience From implementations

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Float(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.into())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s.into())
    }
}

impl From<FactHandle> for Value {
    fn from(h: FactHandle) -> Self {
        Self::Handle(h)
    }
}

impl From<Option<FactHandle>> for Value {
    fn from(h: Option<FactHandle>) -> Self {
        h.map_or(Self::Nil, Self::Handle)
    }
}

impl From<FactObject> for Value {
    fn from(f: FactObject) -> Self {
        Self::Fact(f)
    }
}

impl From<DataSource> for Value {
    fn from(s: DataSource) -> Self {
        Self::Source(s)
    }
}
