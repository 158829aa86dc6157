//! Integration tests for Layer 2: Compiler
//!
//! Tests for declaration resolution, consequence compilation, templates,
//! and rule-unit generation.

mod consequences;
mod templates;
mod units;
