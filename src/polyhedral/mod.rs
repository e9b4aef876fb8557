//! Polyhedral data structures and operations.
//!
//! This module provides the constraint store and the passes that keep it
//! in canonical form:
//! - Spaces, affine expressions and constraints
//! - Pieces (`BasicSet`) and collections of pieces (`Set`)
//! - Gaussian reduction, normalization, div management and redundancy removal
//! - Set algebra on pieces

pub mod space;
pub mod expr;
pub mod constraint;
pub mod basic_set;
pub mod set;
pub mod gauss;
pub mod divs;
pub mod redundancy;
pub mod operations;

pub use space::{DimType, Space};
pub use expr::AffineExpr;
pub use constraint::{Constraint, ConstraintKind};
pub use basic_set::{BasicSet, Div, Flags};
pub use set::Set;
