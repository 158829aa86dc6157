//! Integration tests for Layer 1: Session
//!
//! Tests for working memory, entry points, and globals.

mod entry_points;
mod globals;
