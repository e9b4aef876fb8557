//! Utility modules shared by the engine.
//!
//! - Error types
//! - Exact integer and rational helpers on constraint rows
//! - Rational matrices, Hermite normal form and unimodular transforms
//! - Symbol interning

pub mod arith;
pub mod errors;
pub mod intern;
pub mod matrix;

// Re-exports
pub use errors::*;
pub use intern::{Symbol, SymbolInterner};
