//! Typed class templates for rule-unit scaffolding.
//!
//! A template is a small class AST ([`ClassDecl`]) whose type positions may
//! hold [`Placeholder`] slots instead of concrete names. A [`Specializer`]
//! fills the slots, optionally replaces a method body, and refuses to finish
//! while any slot is still unfilled, so a forgotten substitution is a build
//! error rather than a stray identifier in generated output.
//!
//! The two skeletons the rule-unit compiler needs ship with
//! [`TemplateRegistry::builtin`].
//!
//! # Example
//!
//! ```
//! use consequent_compiler::template::{Placeholder, Specializer, TemplateRegistry, RULE_UNIT_TEMPLATE};
//!
//! let registry = TemplateRegistry::builtin();
//! let skeleton = registry.get(RULE_UNIT_TEMPLATE).unwrap();
//! let class = Specializer::new(skeleton)
//!     .unwrap()
//!     .fill(Placeholder::ClassName, "AdultUnitRuleUnit7")
//!     .fill(Placeholder::RuleUnitClass, "AdultUnit")
//!     .fill(Placeholder::RuleUnitInstanceClass, "AdultUnitRuleUnitInstance7")
//!     .fill(Placeholder::RuleUnitModel, "AdultUnitModel")
//!     .finish()
//!     .unwrap();
//! assert_eq!(class.name().to_string(), "AdultUnitRuleUnit7");
//! assert!(class.placeholders().is_empty());
//! ```

pub(crate) mod render;

pub use render::{RenderConfig, render, render_with_config};

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use consequent_foundation::{Error, Result};

/// Name of the rule-unit descriptor skeleton.
pub const RULE_UNIT_TEMPLATE: &str = "RuleUnitTemplate";

/// Name of the rule-unit instance skeleton.
pub const RULE_UNIT_INSTANCE_TEMPLATE: &str = "RuleUnitInstanceTemplate";

/// Method of the instance skeleton that receives the binding statements.
pub const BIND_METHOD: &str = "bind";

// =============================================================================
// AST
// =============================================================================

/// A named slot in a template.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Placeholder {
    /// The generated class itself.
    ClassName,
    /// The user's rule-unit data type.
    RuleUnitClass,
    /// The generated instance class.
    RuleUnitInstanceClass,
    /// The compiled rule model of the unit.
    RuleUnitModel,
}

impl Placeholder {
    /// All placeholders.
    pub const ALL: [Self; 4] = [
        Self::ClassName,
        Self::RuleUnitClass,
        Self::RuleUnitInstanceClass,
        Self::RuleUnitModel,
    ];

    /// Returns the slot's marker as written in skeletons.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ClassName => "CLASS_NAME",
            Self::RuleUnitClass => "RULE_UNIT_CLASS",
            Self::RuleUnitInstanceClass => "RULE_UNIT_INSTANCE_CLASS",
            Self::RuleUnitModel => "RULE_UNIT_MODEL",
        }
    }
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A type position.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeRef {
    /// A concrete type name.
    Named(String),
    /// An unfilled slot.
    Slot(Placeholder),
    /// A generic type applied to arguments.
    Generic(String, Vec<TypeRef>),
}

impl TypeRef {
    /// Creates a concrete type reference.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    fn collect_slots(&self, out: &mut BTreeSet<Placeholder>) {
        match self {
            Self::Named(_) => {}
            Self::Slot(p) => {
                out.insert(*p);
            }
            Self::Generic(_, args) => args.iter().for_each(|a| a.collect_slots(out)),
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => f.write_str(name),
            Self::Slot(p) => write!(f, "{p}"),
            Self::Generic(name, args) => {
                write!(f, "{name}<")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(">")
            }
        }
    }
}

/// An expression in a method body.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Expr {
    /// A local name.
    Name(String),
    /// A string literal.
    Str(String),
    /// The receiver.
    SelfRef,
    /// A method call; a free function call if `target` is `None`.
    Call {
        /// Receiver expression.
        target: Option<Box<Expr>>,
        /// Method name.
        method: String,
        /// Arguments.
        args: Vec<Expr>,
    },
    /// Construction of a type through its `new` function.
    New {
        /// The constructed type.
        ty: TypeRef,
        /// Constructor arguments.
        args: Vec<Expr>,
    },
    /// A struct literal.
    Init {
        /// The initialized type.
        ty: TypeRef,
        /// Field initializers.
        fields: Vec<(String, Expr)>,
    },
}

impl Expr {
    /// Creates a name expression.
    #[must_use]
    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }

    /// Creates a method call on `target`.
    #[must_use]
    pub fn call(target: Expr, method: impl Into<String>, args: Vec<Expr>) -> Self {
        Self::Call {
            target: Some(Box::new(target)),
            method: method.into(),
            args,
        }
    }

    fn collect_slots(&self, out: &mut BTreeSet<Placeholder>) {
        match self {
            Self::Name(_) | Self::Str(_) | Self::SelfRef => {}
            Self::Call { target, args, .. } => {
                if let Some(t) = target {
                    t.collect_slots(out);
                }
                args.iter().for_each(|a| a.collect_slots(out));
            }
            Self::New { ty, args } => {
                ty.collect_slots(out);
                args.iter().for_each(|a| a.collect_slots(out));
            }
            Self::Init { ty, fields } => {
                ty.collect_slots(out);
                fields.iter().for_each(|(_, e)| e.collect_slots(out));
            }
        }
    }
}

/// A statement in a method body.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Stmt {
    /// An expression evaluated for its effect.
    Expr(Expr),
    /// The method's result.
    Return(Expr),
}

impl Stmt {
    fn collect_slots(&self, out: &mut BTreeSet<Placeholder>) {
        match self {
            Self::Expr(e) | Self::Return(e) => e.collect_slots(out),
        }
    }
}

/// A named, typed parameter or field.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Param {
    /// Name.
    pub name: String,
    /// Type.
    pub ty: TypeRef,
}

impl Param {
    /// Creates a parameter.
    #[must_use]
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// A method of a template class.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Method {
    /// Name.
    pub name: String,
    /// Whether the method takes `&self`.
    pub receiver: bool,
    /// Parameters after the receiver.
    pub params: Vec<Param>,
    /// Return type; unit if `None`.
    pub returns: Option<TypeRef>,
    /// Body.
    pub body: Vec<Stmt>,
}

impl Method {
    fn collect_slots(&self, out: &mut BTreeSet<Placeholder>) {
        self.params.iter().for_each(|p| p.ty.collect_slots(out));
        if let Some(r) = &self.returns {
            r.collect_slots(out);
        }
        self.body.iter().for_each(|s| s.collect_slots(out));
    }
}

/// A class template, or a class specialized from one.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ClassDecl {
    template: String,
    package: Option<String>,
    name: TypeRef,
    implements: Vec<TypeRef>,
    fields: Vec<Param>,
    constructor: Option<Method>,
    methods: Vec<Method>,
}

impl ClassDecl {
    /// Starts a template whose class name is the [`Placeholder::ClassName`] slot.
    #[must_use]
    pub fn template(name: impl Into<String>) -> Self {
        Self {
            template: name.into(),
            package: None,
            name: TypeRef::Slot(Placeholder::ClassName),
            implements: Vec::new(),
            fields: Vec::new(),
            constructor: None,
            methods: Vec::new(),
        }
    }

    /// Builder method to override the class name.
    #[must_use]
    pub fn with_name(mut self, name: TypeRef) -> Self {
        self.name = name;
        self
    }

    /// Builder method to add an implemented trait.
    #[must_use]
    pub fn implementing(mut self, ty: TypeRef) -> Self {
        self.implements.push(ty);
        self
    }

    /// Builder method to add a field.
    #[must_use]
    pub fn with_field(mut self, field: Param) -> Self {
        self.fields.push(field);
        self
    }

    /// Builder method to set the constructor.
    #[must_use]
    pub fn with_constructor(mut self, constructor: Method) -> Self {
        self.constructor = Some(constructor);
        self
    }

    /// Builder method to add a method.
    #[must_use]
    pub fn with_method(mut self, method: Method) -> Self {
        self.methods.push(method);
        self
    }

    /// Returns the name of the template this class came from.
    #[must_use]
    pub fn template_name(&self) -> &str {
        &self.template
    }

    /// Returns the package, once set.
    #[must_use]
    pub fn package(&self) -> Option<&str> {
        self.package.as_deref()
    }

    /// Returns the class name.
    #[must_use]
    pub const fn name(&self) -> &TypeRef {
        &self.name
    }

    /// Returns the implemented traits.
    #[must_use]
    pub fn implements(&self) -> &[TypeRef] {
        &self.implements
    }

    /// Returns the fields.
    #[must_use]
    pub fn fields(&self) -> &[Param] {
        &self.fields
    }

    /// Returns the constructor.
    #[must_use]
    pub const fn constructor(&self) -> Option<&Method> {
        self.constructor.as_ref()
    }

    /// Returns the methods.
    #[must_use]
    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    /// Finds a method by name.
    #[must_use]
    pub fn method(&self, name: &str) -> Option<&Method> {
        self.methods.iter().find(|m| m.name == name)
    }

    /// Returns every slot still present in the class.
    #[must_use]
    pub fn placeholders(&self) -> BTreeSet<Placeholder> {
        let mut out = BTreeSet::new();
        self.name.collect_slots(&mut out);
        self.implements.iter().for_each(|t| t.collect_slots(&mut out));
        self.fields.iter().for_each(|f| f.ty.collect_slots(&mut out));
        if let Some(c) = &self.constructor {
            c.collect_slots(&mut out);
        }
        self.methods.iter().for_each(|m| m.collect_slots(&mut out));
        out
    }
}

// =============================================================================
// Specialization
// =============================================================================

/// Fills a template's slots.
#[derive(Clone, Debug)]
pub struct Specializer {
    class: ClassDecl,
    fills: BTreeMap<Placeholder, String>,
}

impl Specializer {
    /// Starts specializing `template`.
    ///
    /// # Errors
    /// Returns `MalformedTemplate` if the class name is not the
    /// [`Placeholder::ClassName`] slot.
    pub fn new(template: &ClassDecl) -> Result<Self> {
        if template.name != TypeRef::Slot(Placeholder::ClassName) {
            return Err(Error::malformed_template(
                &template.template,
                format!("class name is {}, not {}", template.name, Placeholder::ClassName),
            ));
        }
        Ok(Self {
            class: template.clone(),
            fills: BTreeMap::new(),
        })
    }

    /// Fills a slot with a concrete name.
    #[must_use]
    pub fn fill(mut self, slot: Placeholder, name: impl Into<String>) -> Self {
        self.fills.insert(slot, name.into());
        self
    }

    /// Sets the package of the generated class.
    #[must_use]
    pub fn package(mut self, package: impl Into<String>) -> Self {
        self.class.package = Some(package.into());
        self
    }

    /// Replaces the body of the named method.
    ///
    /// # Errors
    /// Returns `MalformedTemplate` if the template has no such method.
    pub fn replace_body(mut self, method: &str, body: Vec<Stmt>) -> Result<Self> {
        let template = self.class.template.clone();
        let target = self
            .class
            .methods
            .iter_mut()
            .find(|m| m.name == method)
            .ok_or_else(|| Error::malformed_template(template, format!("no method {method}")))?;
        target.body = body;
        Ok(self)
    }

    /// Substitutes every slot and returns the specialized class.
    ///
    /// # Errors
    /// Returns `MissingPlaceholder` naming the first slot without a fill.
    pub fn finish(self) -> Result<ClassDecl> {
        let Self { class, fills } = self;
        let subst = Substitution {
            template: &class.template,
            fills: &fills,
        };
        Ok(ClassDecl {
            name: subst.ty(&class.name)?,
            implements: subst.types(&class.implements)?,
            fields: subst.params(&class.fields)?,
            constructor: class
                .constructor
                .as_ref()
                .map(|c| subst.method(c))
                .transpose()?,
            methods: class
                .methods
                .iter()
                .map(|m| subst.method(m))
                .collect::<Result<_>>()?,
            template: class.template.clone(),
            package: class.package.clone(),
        })
    }
}

struct Substitution<'a> {
    template: &'a str,
    fills: &'a BTreeMap<Placeholder, String>,
}

impl Substitution<'_> {
    fn ty(&self, ty: &TypeRef) -> Result<TypeRef> {
        match ty {
            TypeRef::Named(n) => Ok(TypeRef::Named(n.clone())),
            TypeRef::Slot(p) => self
                .fills
                .get(p)
                .map(|name| TypeRef::Named(name.clone()))
                .ok_or_else(|| Error::missing_placeholder(self.template, p.as_str())),
            TypeRef::Generic(n, args) => Ok(TypeRef::Generic(n.clone(), self.types(args)?)),
        }
    }

    fn types(&self, tys: &[TypeRef]) -> Result<Vec<TypeRef>> {
        tys.iter().map(|t| self.ty(t)).collect()
    }

    fn params(&self, params: &[Param]) -> Result<Vec<Param>> {
        params
            .iter()
            .map(|p| -> Result<Param> { Ok(Param::new(p.name.clone(), self.ty(&p.ty)?)) })
            .collect()
    }

    fn method(&self, m: &Method) -> Result<Method> {
        Ok(Method {
            name: m.name.clone(),
            receiver: m.receiver,
            params: self.params(&m.params)?,
            returns: m.returns.as_ref().map(|r| self.ty(r)).transpose()?,
            body: m.body.iter().map(|s| self.stmt(s)).collect::<Result<_>>()?,
        })
    }

    fn stmt(&self, s: &Stmt) -> Result<Stmt> {
        Ok(match s {
            Stmt::Expr(e) => Stmt::Expr(self.expr(e)?),
            Stmt::Return(e) => Stmt::Return(self.expr(e)?),
        })
    }

    fn exprs(&self, es: &[Expr]) -> Result<Vec<Expr>> {
        es.iter().map(|e| self.expr(e)).collect()
    }

    fn expr(&self, e: &Expr) -> Result<Expr> {
        Ok(match e {
            Expr::Name(_) | Expr::Str(_) | Expr::SelfRef => e.clone(),
            Expr::Call {
                target,
                method,
                args,
            } => Expr::Call {
                target: target
                    .as_ref()
                    .map(|t| self.expr(t).map(Box::new))
                    .transpose()?,
                method: method.clone(),
                args: self.exprs(args)?,
            },
            Expr::New { ty, args } => Expr::New {
                ty: self.ty(ty)?,
                args: self.exprs(args)?,
            },
            Expr::Init { ty, fields } => Expr::Init {
                ty: self.ty(ty)?,
                fields: fields
                    .iter()
                    .map(|(n, e)| -> Result<(String, Expr)> { Ok((n.clone(), self.expr(e)?)) })
                    .collect::<Result<_>>()?,
            },
        })
    }
}

// =============================================================================
// Registry
// =============================================================================

/// Named class templates.
#[derive(Clone, Debug, Default)]
pub struct TemplateRegistry {
    templates: BTreeMap<String, ClassDecl>,
}

impl TemplateRegistry {
    /// Creates a registry holding no templates.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates a registry holding the rule-unit skeletons.
    #[must_use]
    pub fn builtin() -> Self {
        Self::empty()
            .with(rule_unit_template())
            .with(rule_unit_instance_template())
    }

    /// Adds or replaces a template, keyed by its template name.
    pub fn insert(&mut self, template: ClassDecl) {
        self.templates.insert(template.template.clone(), template);
    }

    /// Builder form of [`TemplateRegistry::insert`].
    #[must_use]
    pub fn with(mut self, template: ClassDecl) -> Self {
        self.insert(template);
        self
    }

    /// Removes a template.
    pub fn remove(&mut self, name: &str) -> Option<ClassDecl> {
        self.templates.remove(name)
    }

    /// Gets a template by name.
    ///
    /// # Errors
    /// Returns `MissingTemplate` if no template has that name.
    pub fn get(&self, name: &str) -> Result<&ClassDecl> {
        self.templates
            .get(name)
            .ok_or_else(|| Error::missing_template(name))
    }

    /// Returns the template names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }
}

fn slot(p: Placeholder) -> TypeRef {
    TypeRef::Slot(p)
}

fn rule_unit_template() -> ClassDecl {
    ClassDecl::template(RULE_UNIT_TEMPLATE)
        .implementing(TypeRef::Generic(
            "RuleUnit".into(),
            vec![slot(Placeholder::RuleUnitClass)],
        ))
        .with_field(Param::new("units", TypeRef::named("RuleUnits")))
        .with_constructor(Method {
            name: "new".into(),
            receiver: false,
            params: vec![Param::new("units", TypeRef::named("RuleUnits"))],
            returns: Some(slot(Placeholder::ClassName)),
            body: vec![Stmt::Return(Expr::Init {
                ty: slot(Placeholder::ClassName),
                fields: vec![("units".into(), Expr::name("units"))],
            })],
        })
        .with_method(Method {
            name: "create_instance".into(),
            receiver: true,
            params: vec![
                Param::new("value", slot(Placeholder::RuleUnitClass)),
                Param::new("config", TypeRef::named("RuleConfig")),
            ],
            returns: Some(slot(Placeholder::RuleUnitInstanceClass)),
            body: vec![Stmt::Return(Expr::New {
                ty: slot(Placeholder::RuleUnitInstanceClass),
                args: vec![
                    Expr::name("value"),
                    Expr::call(
                        Expr::call(Expr::SelfRef, "units", vec![]),
                        "create_executor",
                        vec![
                            Expr::New {
                                ty: slot(Placeholder::RuleUnitModel),
                                args: vec![],
                            },
                            Expr::name("config"),
                        ],
                    ),
                ],
            })],
        })
}

fn rule_unit_instance_template() -> ClassDecl {
    ClassDecl::template(RULE_UNIT_INSTANCE_TEMPLATE)
        .implementing(TypeRef::Generic(
            "RuleUnitInstance".into(),
            vec![slot(Placeholder::RuleUnitClass)],
        ))
        .with_field(Param::new("value", slot(Placeholder::RuleUnitClass)))
        .with_field(Param::new("evaluator", TypeRef::named("RuleUnitExecutor")))
        .with_constructor(Method {
            name: "new".into(),
            receiver: false,
            params: vec![
                Param::new("value", slot(Placeholder::RuleUnitClass)),
                Param::new("evaluator", TypeRef::named("RuleUnitExecutor")),
            ],
            returns: Some(slot(Placeholder::ClassName)),
            body: vec![Stmt::Return(Expr::Init {
                ty: slot(Placeholder::ClassName),
                fields: vec![
                    ("value".into(), Expr::name("value")),
                    ("evaluator".into(), Expr::name("evaluator")),
                ],
            })],
        })
        .with_method(Method {
            name: BIND_METHOD.into(),
            receiver: true,
            params: vec![
                Param::new("evaluator", TypeRef::named("RuleUnitExecutor")),
                Param::new("rule_unit", slot(Placeholder::RuleUnitClass)),
            ],
            returns: None,
            body: Vec::new(),
        })
}
