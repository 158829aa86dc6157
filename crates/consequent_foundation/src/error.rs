//! Error types for consequent.
//!
//! Uses `thiserror` for ergonomic error definition with rich context.
//!
//! Errors fall into two groups. Structural build errors abort the compilation
//! of a single rule or rule unit and never affect artifacts produced for other
//! rules. Run-time errors surface from `evaluate` and are handed back to the
//! firing engine unchanged.

use std::fmt;

use thiserror::Error;

use crate::handle::FactHandle;
use crate::types::Type;

/// The main error type for consequent operations.
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional context about where the error occurred.
    pub context: Option<ErrorContext>,
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
        }
    }

    /// Adds context to this error.
    #[must_use]
    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Creates a type mismatch error.
    #[must_use]
    pub fn type_mismatch(expected: Type, actual: Type) -> Self {
        Self::new(ErrorKind::TypeMismatch { expected, actual })
    }

    /// Creates a missing global error (raised at call time).
    #[must_use]
    pub fn missing_global(name: impl Into<String>) -> Self {
        Self::new(ErrorKind::MissingGlobal(name.into()))
    }

    /// Creates an unresolved global error (raised at build time).
    #[must_use]
    pub fn unresolved_global(name: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnresolvedGlobal(name.into()))
    }

    /// Creates a missing template error.
    #[must_use]
    pub fn missing_template(name: impl Into<String>) -> Self {
        Self::new(ErrorKind::MissingTemplate(name.into()))
    }

    /// Creates a malformed template error.
    #[must_use]
    pub fn malformed_template(template: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(ErrorKind::MalformedTemplate {
            template: template.into(),
            reason: reason.into(),
        })
    }

    /// Creates a missing placeholder error.
    #[must_use]
    pub fn missing_placeholder(template: impl Into<String>, slot: impl Into<String>) -> Self {
        Self::new(ErrorKind::MissingPlaceholder {
            template: template.into(),
            slot: slot.into(),
        })
    }

    /// Creates a declaration depth error.
    #[must_use]
    pub fn depth_out_of_range(declaration: impl Into<String>, depth: usize, max: usize) -> Self {
        Self::new(ErrorKind::DepthOutOfRange {
            declaration: declaration.into(),
            depth,
            max,
        })
    }

    /// Creates a signature mismatch error.
    #[must_use]
    pub fn signature_mismatch(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::SignatureMismatch(message.into()))
    }

    /// Creates an invalid declaration error.
    #[must_use]
    pub fn invalid_declaration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidDeclaration(message.into()))
    }

    /// Creates a domain error raised by an action body.
    #[must_use]
    pub fn action(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Action(message.into()))
    }

    /// Creates a missing accessor error.
    #[must_use]
    pub fn missing_accessor(getter: impl Into<String>) -> Self {
        Self::new(ErrorKind::MissingAccessor(getter.into()))
    }

    /// Creates a fact not found error.
    #[must_use]
    pub fn fact_not_found(handle: FactHandle) -> Self {
        Self::new(ErrorKind::FactNotFound(handle))
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal(message.into()))
    }

    /// Returns true if this error aborts a build rather than a firing.
    #[must_use]
    pub const fn is_build_error(&self) -> bool {
        self.kind.is_build_error()
    }
}

/// Categorized error kinds.
#[derive(Debug, Error)]
pub enum ErrorKind {
    /// A bound value does not fit its declared type.
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        /// The declared type.
        expected: Type,
        /// The runtime type encountered.
        actual: Type,
    },

    /// A global was not present in the session's global store at call time.
    #[error("missing global: {0}")]
    MissingGlobal(String),

    /// A rule references a global that the package never declared.
    #[error("unresolved global: {0}")]
    UnresolvedGlobal(String),

    /// A template skeleton was not found.
    #[error("missing template: {0}")]
    MissingTemplate(String),

    /// A template skeleton lacks a structural element the compiler needs.
    #[error("malformed template {template}: {reason}")]
    MalformedTemplate {
        /// The template name.
        template: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A template slot was left unfilled during specialization.
    #[error("placeholder {slot} left unfilled in template {template}")]
    MissingPlaceholder {
        /// The template name.
        template: String,
        /// The unfilled slot.
        slot: String,
    },

    /// A declaration references a depth beyond the match chain.
    #[error("declaration {declaration} at depth {depth} exceeds match chain depth {max}")]
    DepthOutOfRange {
        /// The declaration name.
        declaration: String,
        /// Its origin depth.
        depth: usize,
        /// The deepest depth available.
        max: usize,
    },

    /// The action body signature does not match the parameter layout.
    #[error("signature mismatch: {0}")]
    SignatureMismatch(String),

    /// The declaration list is inconsistent.
    #[error("invalid declaration: {0}")]
    InvalidDeclaration(String),

    /// Domain error raised by an action body.
    #[error("action failed: {0}")]
    Action(String),

    /// Rule-unit data does not answer a declared accessor.
    #[error("rule unit has no accessor {0}")]
    MissingAccessor(String),

    /// A fact handle does not refer to a live fact.
    #[error("fact not found: {0:?}")]
    FactNotFound(FactHandle),

    /// Internal error (should not happen).
    #[error("internal error: {0}")]
    Internal(String),
}

impl ErrorKind {
    /// Returns true for structural build errors.
    #[must_use]
    pub const fn is_build_error(&self) -> bool {
        matches!(
            self,
            Self::UnresolvedGlobal(_)
                | Self::MissingTemplate(_)
                | Self::MalformedTemplate { .. }
                | Self::MissingPlaceholder { .. }
                | Self::DepthOutOfRange { .. }
                | Self::SignatureMismatch(_)
                | Self::InvalidDeclaration(_)
        )
    }
}

/// Context about where an error occurred.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// Rule or rule unit being compiled or fired.
    pub rule: Option<String>,
    /// Generated artifact name, once assigned.
    pub artifact: Option<String>,
    /// Stack of compilation phases or declarations.
    pub stack: Vec<String>,
}

impl ErrorContext {
    /// Creates a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the rule name.
    #[must_use]
    pub fn with_rule(mut self, rule: impl Into<String>) -> Self {
        self.rule = Some(rule.into());
        self
    }

    /// Sets the artifact name.
    #[must_use]
    pub fn with_artifact(mut self, artifact: impl Into<String>) -> Self {
        self.artifact = Some(artifact.into());
        self
    }

    /// Adds a stack frame.
    #[must_use]
    pub fn with_frame(mut self, frame: impl Into<String>) -> Self {
        self.stack.push(frame.into());
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(rule) = &self.rule {
            write!(f, "in rule {rule}")?;
        }
        if let Some(artifact) = &self.artifact {
            write!(f, " ({artifact})")?;
        }
        if !self.stack.is_empty() {
            writeln!(f)?;
            for frame in &self.stack {
                writeln!(f, "  in {frame}")?;
            }
        }
        Ok(())
    }
}
