//! Integration tests for Layer 0: Foundation
//!
//! Tests for core types: Value, Type, FactObject, DataSource, and Error.

mod sources;
mod values;
