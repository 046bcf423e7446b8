//! Common utilities and data structures for Rill.
//!
//! This crate provides the foundational types used across the Rill
//! evaluator, currently source location tracking via `Span`.

mod span;

pub use span::{BytePos, Span};
