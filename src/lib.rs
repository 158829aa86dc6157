//! Consequent - Match-to-action compiler for a production rule engine
//!
//! This crate re-exports all layers of the consequent system for convenient access.
//! For detailed documentation, see the individual layer crates.
//!
//! # Architecture
//!
//! ```text
//! Layer 2: consequent_compiler   - Declaration resolver, consequence compiler, rule-unit scaffolding
//! Layer 1: consequent_session    - Working memory, entry points, globals
//! Layer 0: consequent_foundation - Core types (Value, Type, FactHandle, Error)
//! ```

pub use consequent_compiler as compiler;
pub use consequent_foundation as foundation;
pub use consequent_session as session;
