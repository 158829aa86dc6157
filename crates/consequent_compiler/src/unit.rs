//! Rule units: descriptions, generated scaffolding, and run-time binding.
//!
//! A rule unit groups rules that share external data feeds and shared
//! variables. [`RuleUnitCompiler::compile_unit`] turns a
//! [`RuleUnitDescription`] into two artifacts: a [`UnitArtifact`] describing
//! the unit and a [`UnitInstanceArtifact`] whose `bind` method wires each
//! declared variable into a session. Both carry the same random token in
//! their names.
//!
//! Binding is available both as rendered source and as [`BindStatement`]s
//! executed directly by [`UnitArtifact::create_instance`].

mod compiler;

pub use compiler::RuleUnitCompiler;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use consequent_foundation::{DataSource, Error, Result, Type, Value};
use consequent_session::{EntryPointDataProcessor, GlobalStore, GlobalTypes, Session};
use tracing::debug;

use crate::template::{ClassDecl, Expr, Stmt, TypeRef, render};

// =============================================================================
// Description
// =============================================================================

/// A variable declared by a rule unit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnitVariable {
    /// Property name; also the entry point and global it binds to.
    pub name: String,
    /// Accessor on the unit data answering the variable's value.
    pub getter: String,
    /// Whether the variable is a data source feeding an entry point.
    pub data_source: bool,
    /// Declared type of the bound global.
    pub ty: Type,
}

impl UnitVariable {
    /// Declares a data-source variable read through `getter`.
    #[must_use]
    pub fn data_source(name: impl Into<String>, getter: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            getter: getter.into(),
            data_source: true,
            ty: Type::Source,
        }
    }

    /// Declares a plain field read through `getter`.
    #[must_use]
    pub fn field(name: impl Into<String>, getter: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            getter: getter.into(),
            data_source: false,
            ty,
        }
    }
}

/// Metadata of a rule unit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuleUnitDescription {
    /// Package of the unit and of its generated artifacts.
    pub package: String,
    /// Fully qualified name of the unit data type.
    pub unit_type: String,
    /// Simple name of the unit data type.
    pub simple_name: String,
    /// Name of the compiled rule model of the unit.
    pub model: String,
    /// Declared variables, in declaration order.
    pub variables: Vec<UnitVariable>,
}

impl RuleUnitDescription {
    /// Describes the unit `simple_name` in `package`.
    #[must_use]
    pub fn new(package: impl Into<String>, simple_name: impl Into<String>) -> Self {
        let package = package.into();
        let simple_name = simple_name.into();
        let unit_type = if package.is_empty() {
            simple_name.clone()
        } else {
            format!("{package}.{simple_name}")
        };
        Self {
            model: format!("{simple_name}Model"),
            package,
            unit_type,
            simple_name,
            variables: Vec::new(),
        }
    }

    /// Builder method to name the compiled rule model.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Builder method to add a variable.
    #[must_use]
    pub fn with_variable(mut self, variable: UnitVariable) -> Self {
        self.variables.push(variable);
        self
    }

    /// Returns the globals rules of this unit may reference.
    #[must_use]
    pub fn global_types(&self) -> GlobalTypes {
        self.variables
            .iter()
            .fold(GlobalTypes::new(), |types, v| types.with(&v.name, v.ty.clone()))
    }
}

// =============================================================================
// Unit data
// =============================================================================

/// Run-time data of a rule unit, read through accessors.
pub trait RuleUnitData: Send + Sync {
    /// Returns the value behind an accessor, or `None` if there is no such
    /// accessor.
    fn get(&self, getter: &str) -> Option<Value>;
}

/// Map-backed [`RuleUnitData`].
#[derive(Clone, Debug, Default)]
pub struct UnitData {
    values: BTreeMap<String, Value>,
}

impl UnitData {
    /// Creates empty unit data.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to answer `getter` with `value`.
    #[must_use]
    pub fn with(mut self, getter: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(getter.into(), value.into());
        self
    }
}

impl RuleUnitData for UnitData {
    fn get(&self, getter: &str) -> Option<Value> {
        self.values.get(getter).cloned()
    }
}

// =============================================================================
// Binding
// =============================================================================

/// One statement of an instance's `bind` method.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BindStatement {
    /// Forward everything the source publishes into an entry point.
    Subscribe {
        /// Accessor answering the data source.
        getter: String,
        /// Entry point receiving the values.
        entry_point: String,
    },
    /// Register the accessor's value as a session global.
    SetGlobal {
        /// Global name.
        name: String,
        /// Accessor answering the value.
        getter: String,
    },
}

impl BindStatement {
    /// Returns the statement as template AST.
    #[must_use]
    pub fn to_stmt(&self) -> Stmt {
        let accessor = |getter: &str| Expr::call(Expr::name("rule_unit"), getter, vec![]);
        match self {
            Self::Subscribe {
                getter,
                entry_point,
            } => Stmt::Expr(Expr::call(
                accessor(getter),
                "subscribe",
                vec![Expr::New {
                    ty: TypeRef::named("EntryPointDataProcessor"),
                    args: vec![Expr::call(
                        Expr::name("evaluator"),
                        "entry_point",
                        vec![Expr::Str(entry_point.clone())],
                    )],
                }],
            )),
            Self::SetGlobal { name, getter } => Stmt::Expr(Expr::call(
                Expr::name("evaluator"),
                "set_global",
                vec![Expr::Str(name.clone()), accessor(getter)],
            )),
        }
    }

    /// Executes the statement against a session.
    ///
    /// # Errors
    /// - `MissingAccessor` if `data` does not answer the getter
    /// - `TypeMismatch` if a subscribed value is not a data source, or a
    ///   global value does not fit its declared type
    pub fn execute(&self, data: &dyn RuleUnitData, session: &mut Session) -> Result<()> {
        self.prepare(data, session.globals())?.apply(session)
    }

    /// Reads and checks the statement's value without touching the session.
    fn prepare(&self, data: &dyn RuleUnitData, globals: &GlobalStore) -> Result<Binding<'_>> {
        match self {
            Self::Subscribe {
                getter,
                entry_point,
            } => {
                let value = data.get(getter).ok_or_else(|| Error::missing_accessor(getter))?;
                let source = value
                    .as_source()
                    .cloned()
                    .ok_or_else(|| Error::type_mismatch(Type::Source, value.value_type()))?;
                Ok(Binding::Subscribe {
                    source,
                    entry_point,
                })
            }
            Self::SetGlobal { name, getter } => {
                let value = data.get(getter).ok_or_else(|| Error::missing_accessor(getter))?;
                globals.check(name, &value)?;
                Ok(Binding::SetGlobal { name, value })
            }
        }
    }
}

/// A bind statement whose value has been read and checked.
enum Binding<'a> {
    Subscribe {
        source: DataSource,
        entry_point: &'a str,
    },
    SetGlobal {
        name: &'a str,
        value: Value,
    },
}

impl Binding<'_> {
    fn apply(self, session: &mut Session) -> Result<()> {
        match self {
            Self::Subscribe {
                source,
                entry_point,
            } => {
                let entry = session.entry_point(entry_point);
                source.subscribe(Arc::new(EntryPointDataProcessor::new(entry)))
            }
            Self::SetGlobal { name, value } => session.set_global(name, value),
        }
    }
}

impl fmt::Display for BindStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_stmt() {
            Stmt::Expr(e) | Stmt::Return(e) => write!(f, "{};", crate::template::render::expr(&e)),
        }
    }
}

// =============================================================================
// Artifacts
// =============================================================================

/// Names and location shared by both artifact kinds.
#[derive(Clone, Debug, PartialEq, Eq)]
struct ArtifactName {
    simple: String,
    qualified: String,
    path: String,
}

impl ArtifactName {
    fn new(package: &str, simple: String) -> Self {
        let (qualified, path) = if package.is_empty() {
            (simple.clone(), format!("{simple}.rs"))
        } else {
            (
                format!("{package}.{simple}"),
                format!("{}/{simple}.rs", package.replace('.', "/")),
            )
        };
        Self {
            simple,
            qualified,
            path,
        }
    }
}

/// The generated rule-unit instance class.
#[derive(Clone, Debug)]
pub struct UnitInstanceArtifact {
    name: ArtifactName,
    class: ClassDecl,
    bind: Vec<BindStatement>,
}

impl UnitInstanceArtifact {
    /// Returns the simple class name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name.simple
    }

    /// Returns the package-qualified class name.
    #[must_use]
    pub fn qualified_name(&self) -> &str {
        &self.name.qualified
    }

    /// Returns the artifact path, `<package path>/<class>.rs`.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.name.path
    }

    /// Returns the specialized class.
    #[must_use]
    pub const fn class(&self) -> &ClassDecl {
        &self.class
    }

    /// Returns the binding statements in declared variable order.
    #[must_use]
    pub fn bind_statements(&self) -> &[BindStatement] {
        &self.bind
    }

    /// Renders the class as source.
    #[must_use]
    pub fn source(&self) -> String {
        render(&self.class)
    }

    /// Executes every binding statement against `session`.
    ///
    /// Every accessor is read and checked before the first statement takes
    /// effect, so a unit whose data is incomplete leaves the session and its
    /// data sources untouched.
    ///
    /// # Errors
    /// The first failing statement's error.
    pub fn bind(&self, data: &dyn RuleUnitData, session: &mut Session) -> Result<()> {
        let bindings = self
            .bind
            .iter()
            .map(|statement| statement.prepare(data, session.globals()))
            .collect::<Result<Vec<_>>>()?;
        for binding in bindings {
            binding.apply(session)?;
        }
        debug!(instance = %self.name.simple, statements = self.bind.len(), "rule unit bound");
        Ok(())
    }
}

/// The generated rule-unit class.
#[derive(Clone, Debug)]
pub struct UnitArtifact {
    name: ArtifactName,
    unit_type: String,
    class: ClassDecl,
    instance: Arc<UnitInstanceArtifact>,
}

impl UnitArtifact {
    /// Returns the simple class name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name.simple
    }

    /// Returns the package-qualified class name.
    #[must_use]
    pub fn qualified_name(&self) -> &str {
        &self.name.qualified
    }

    /// Returns the artifact path, `<package path>/<class>.rs`.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.name.path
    }

    /// Returns the qualified name of the unit data type.
    #[must_use]
    pub fn unit_type(&self) -> &str {
        &self.unit_type
    }

    /// Returns the specialized class.
    #[must_use]
    pub const fn class(&self) -> &ClassDecl {
        &self.class
    }

    /// Returns the instance artifact generated alongside this one.
    #[must_use]
    pub fn instance_artifact(&self) -> &Arc<UnitInstanceArtifact> {
        &self.instance
    }

    /// Renders the class as source.
    #[must_use]
    pub fn source(&self) -> String {
        render(&self.class)
    }

    /// Creates an instance of the unit for a session, binding its variables.
    ///
    /// # Errors
    /// See [`UnitInstanceArtifact::bind`].
    pub fn create_instance(
        &self,
        data: Arc<dyn RuleUnitData>,
        session: &mut Session,
    ) -> Result<RuleUnitInstance> {
        self.instance.bind(data.as_ref(), session)?;
        Ok(RuleUnitInstance {
            artifact: Arc::clone(&self.instance),
            data,
        })
    }
}

/// A rule unit bound to a session.
#[derive(Clone)]
pub struct RuleUnitInstance {
    artifact: Arc<UnitInstanceArtifact>,
    data: Arc<dyn RuleUnitData>,
}

impl RuleUnitInstance {
    /// Returns the instance class name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.artifact.name()
    }

    /// Returns the artifact this instance was created from.
    #[must_use]
    pub const fn artifact(&self) -> &Arc<UnitInstanceArtifact> {
        &self.artifact
    }

    /// Returns the unit data.
    #[must_use]
    pub fn data(&self) -> &dyn RuleUnitData {
        self.data.as_ref()
    }
}

impl fmt::Debug for RuleUnitInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RuleUnitInstance({})", self.artifact.name())
    }
}
