//! Core values, types, fact handles, and errors for consequent.
//!
//! This crate provides:
//! - [`Value`] - The value type passed between facts, declarations, and action bodies
//! - [`FactHandle`] - Opaque fact identities assigned by working memory
//! - [`FactObject`] - Shared fact records with pointer identity
//! - [`Type`] - Declared types for bindings, globals, and action signatures
//! - [`DataSource`] - Shared append-only streams feeding rule units
//! - [`Error`] - Rich error types with context
//! - Persistent collections ([`PVec`], [`PMap`])

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod collections;
pub mod error;
pub mod fact;
pub mod handle;
pub mod source;
pub mod types;
pub mod value;

pub use collections::{PMap, PVec};
pub use error::{Error, ErrorContext, ErrorKind};
pub use fact::FactObject;
pub use handle::FactHandle;
pub use source::{DataProcessor, DataSource};
pub use types::Type;
pub use value::Value;

/// Result type alias using the consequent error type.
pub type Result<T> = std::result::Result<T, Error>;
