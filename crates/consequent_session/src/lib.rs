//! Working memory, entry points, and global bindings for consequent.
//!
//! This crate provides the run-time collaborators a compiled consequence
//! reads from and a rule-unit instance binds into:
//! - [`WorkingMemory`] - Fact storage with handles and an identity index
//! - [`EntryPoint`] - Named insertion points into working memory
//! - [`GlobalStore`] - Session-scoped globals with declared types
//! - [`Session`] - Ties the above together for one running rule base

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod entry;
pub mod globals;
pub mod memory;
pub mod session;

pub use entry::{EntryPoint, EntryPointDataProcessor};
pub use globals::{GlobalStore, GlobalTypes};
pub use memory::WorkingMemory;
pub use session::{Session, SessionConfig};
