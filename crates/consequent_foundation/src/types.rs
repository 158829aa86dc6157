//! Declared types for bindings, globals, and action signatures.

use std::fmt;
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Type descriptor for declarations and parameter slots.
///
/// Used to check bound values before they reach an action body and to verify
/// that an action body's declared signature matches a compiled layout.
#[derive(Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Type {
    /// The nil type (only value: nil).
    Nil,
    /// Boolean type.
    Bool,
    /// 64-bit signed integer.
    Int,
    /// 64-bit floating point.
    Float,
    /// String type.
    String,
    /// Fact handle (identity slot) type.
    Handle,
    /// Fact record of the named fact type.
    Fact(Arc<str>),
    /// Homogeneous vector type.
    Vec(Box<Type>),
    /// Homogeneous map type.
    Map(Box<Type>, Box<Type>),
    /// Optional type (value or nil).
    Option(Box<Type>),
    /// Data source stream.
    Source,
    /// Any type (accepts any value).
    Any,
}

impl Type {
    /// Creates a fact type with the given name.
    #[must_use]
    pub fn fact(name: impl Into<Arc<str>>) -> Self {
        Self::Fact(name.into())
    }

    /// Creates a vector type with the given element type.
    #[must_use]
    pub fn vec(element: Type) -> Self {
        Self::Vec(Box::new(element))
    }

    /// Creates a map type with the given key and value types.
    #[must_use]
    pub fn map(key: Type, value: Type) -> Self {
        Self::Map(Box::new(key), Box::new(value))
    }

    /// Creates an optional type.
    #[must_use]
    pub fn option(inner: Type) -> Self {
        Self::Option(Box::new(inner))
    }

    /// Returns true if this type is `Any`.
    #[must_use]
    pub const fn is_any(&self) -> bool {
        matches!(self, Self::Any)
    }

    /// Returns true if this type can be nil.
    #[must_use]
    pub const fn is_nullable(&self) -> bool {
        matches!(self, Self::Nil | Self::Option(_) | Self::Any)
    }

    /// Checks if a value type is accepted by this type.
    ///
    /// - `Any` accepts all types
    /// - `Option(T)` accepts `Nil` and anything `T` accepts
    /// - `Float` accepts `Int` (numeric promotion)
    /// - Fact types match by name
    /// - Collection types check element types recursively; `Any` elements on
    ///   the actual side are accepted since runtime collections are untyped
    #[must_use]
    pub fn accepts(&self, value_type: &Type) -> bool {
        if self.is_any() {
            return true;
        }

        if let Self::Option(inner) = self {
            return matches!(value_type, Self::Nil) || inner.accepts(value_type);
        }

        match (self, value_type) {
            (Self::Nil, Self::Nil)
            | (Self::Bool, Self::Bool)
            | (Self::Int | Self::Float, Self::Int)
            | (Self::Float, Self::Float)
            | (Self::String, Self::String)
            | (Self::Handle, Self::Handle)
            | (Self::Source, Self::Source) => true,
            (Self::Fact(expected), Self::Fact(actual)) => expected == actual,
            (Self::Vec(expected), Self::Vec(actual)) => {
                actual.is_any() || expected.accepts(actual)
            }
            (Self::Map(ek, ev), Self::Map(ak, av)) => {
                (ak.is_any() && av.is_any()) || (ek.accepts(ak) && ev.accepts(av))
            }
            _ => false,
        }
    }
}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nil => write!(f, "nil"),
            Self::Bool => write!(f, "bool"),
            Self::Int => write!(f, "int"),
            Self::Float => write!(f, "float"),
            Self::String => write!(f, "string"),
            Self::Handle => write!(f, "handle"),
            Self::Fact(name) => write!(f, "{name}"),
            Self::Vec(t) => write!(f, "vec<{t:?}>"),
            Self::Map(k, v) => write!(f, "map<{k:?}, {v:?}>"),
            Self::Option(t) => write!(f, "option<{t:?}>"),
            Self::Source => write!(f, "source"),
            Self::Any => write!(f, "any"),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
