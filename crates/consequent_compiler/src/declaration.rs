//! Declarations: named bindings a rule's left-hand side makes available to
//! its action body.
//!
//! A direct declaration binds the whole fact matched at its origin depth. An
//! indirect declaration extracts a value from the fact at its origin depth;
//! when that value is itself a fact, its identity is looked up in working
//! memory at firing time.

use std::fmt;
use std::sync::Arc;

use consequent_foundation::{Error, Result, Type, Value};
use consequent_session::WorkingMemory;

/// Extracts a declaration's value from the fact it anchors on.
pub trait FieldExtractor: Send + Sync {
    /// Extracts the bound value from `object`.
    ///
    /// # Errors
    /// Implementations report extraction failures as errors; they are
    /// returned from `evaluate` unchanged.
    fn extract(&self, object: &Value, memory: &WorkingMemory) -> Result<Value>;

    /// Short description used in logs and `Debug` output.
    fn describe(&self) -> String;
}

/// Extractor returning the anchor object itself.
#[derive(Clone, Copy, Debug, Default)]
pub struct WholeObject;

impl FieldExtractor for WholeObject {
    fn extract(&self, object: &Value, _memory: &WorkingMemory) -> Result<Value> {
        Ok(object.clone())
    }

    fn describe(&self) -> String {
        "this".to_string()
    }
}

/// Extractor reading a named field of a fact record.
///
/// A missing field reads as nil.
#[derive(Clone, Debug)]
pub struct Field {
    name: Arc<str>,
}

impl Field {
    /// Creates an extractor for the named field.
    #[must_use]
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self { name: name.into() }
    }
}

impl FieldExtractor for Field {
    fn extract(&self, object: &Value, _memory: &WorkingMemory) -> Result<Value> {
        match object {
            Value::Fact(fact) => Ok(fact.get(&self.name).cloned().unwrap_or(Value::Nil)),
            Value::Map(map) => Ok(map
                .get(&Value::String(Arc::clone(&self.name)))
                .cloned()
                .unwrap_or(Value::Nil)),
            Value::Nil => Ok(Value::Nil),
            other => Err(Error::type_mismatch(
                Type::fact(format!("<record with {}>", self.name)),
                other.value_type(),
            )),
        }
    }

    fn describe(&self) -> String {
        format!(".{}", self.name)
    }
}

/// Extractor backed by a closure.
pub struct FnExtractor<F> {
    label: String,
    func: F,
}

impl<F> FnExtractor<F>
where
    F: Fn(&Value, &WorkingMemory) -> Result<Value> + Send + Sync,
{
    /// Wraps a closure.
    pub fn new(label: impl Into<String>, func: F) -> Self {
        Self {
            label: label.into(),
            func,
        }
    }
}

impl<F> FieldExtractor for FnExtractor<F>
where
    F: Fn(&Value, &WorkingMemory) -> Result<Value> + Send + Sync,
{
    fn extract(&self, object: &Value, memory: &WorkingMemory) -> Result<Value> {
        (self.func)(object, memory)
    }

    fn describe(&self) -> String {
        self.label.clone()
    }
}

/// A named binding produced by one pattern of a rule.
#[derive(Clone)]
pub struct Declaration {
    name: Arc<str>,
    declared_type: Type,
    origin_depth: usize,
    original_index: usize,
    indirect: bool,
    extractor: Arc<dyn FieldExtractor>,
}

impl Declaration {
    /// Creates a declaration bound to the whole fact at `origin_depth`.
    #[must_use]
    pub fn direct(
        name: impl Into<Arc<str>>,
        declared_type: Type,
        origin_depth: usize,
        original_index: usize,
    ) -> Self {
        Self {
            name: name.into(),
            declared_type,
            origin_depth,
            original_index,
            indirect: false,
            extractor: Arc::new(WholeObject),
        }
    }

    /// Creates a declaration whose value is extracted from the fact at
    /// `origin_depth` and whose identity is resolved through working memory.
    #[must_use]
    pub fn indirect(
        name: impl Into<Arc<str>>,
        declared_type: Type,
        origin_depth: usize,
        original_index: usize,
        extractor: Arc<dyn FieldExtractor>,
    ) -> Self {
        Self {
            name: name.into(),
            declared_type,
            origin_depth,
            original_index,
            indirect: true,
            extractor,
        }
    }

    /// Returns the binding name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the declared type.
    #[must_use]
    pub const fn declared_type(&self) -> &Type {
        &self.declared_type
    }

    /// Returns the depth of the anchor node, counted from the tip.
    #[must_use]
    pub const fn origin_depth(&self) -> usize {
        self.origin_depth
    }

    /// Returns the position of this binding in the action's parameter list.
    #[must_use]
    pub const fn original_index(&self) -> usize {
        self.original_index
    }

    /// Returns true for indirectly resolved bindings.
    #[must_use]
    pub const fn is_indirect(&self) -> bool {
        self.indirect
    }

    /// Returns the extractor.
    #[must_use]
    pub fn extractor(&self) -> &dyn FieldExtractor {
        self.extractor.as_ref()
    }
}

impl fmt::Debug for Declaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Declaration")
            .field("name", &self.name)
            .field("type", &self.declared_type)
            .field("depth", &self.origin_depth)
            .field("index", &self.original_index)
            .field("indirect", &self.indirect)
            .field("extractor", &self.extractor.describe())
            .finish()
    }
}
