//! Integration tests across all layers
//!
//! Tests that compile consequences and rule units, then fire them against
//! live sessions.

mod firing;
