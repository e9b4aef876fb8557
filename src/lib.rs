//! # polyengine - exact polyhedral constraint engine
//!
//! Sets of integer (or rational) points described by affine equalities
//! and inequalities over BigInt coefficients, possibly with existentially
//! quantified integer divisions:
//! - a constraint store with copy-on-write pieces and collections
//! - Gaussian reduction, normalization and div management
//! - LP-based redundancy removal and implicit equality detection
//! - convex hulls (facet wrapping, Fourier-Motzkin, unbounded inputs)
//! - integer linear optimization over a single piece
//!
//! ## Architecture
//!
//! ```text
//! Space/Row ─► BasicSet ─► simplify/finalize ─► Set ─► convex_hull
//!                  │                                    ▲
//!                  └──────────► lp::Tableau ◄───────────┤
//!                                   ▲                   │
//!                                   └──── ilp::minimize ┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use polyengine::prelude::*;
//! use polyengine::polyhedral::operations::box_set;
//!
//! let ctx = Context::new();
//! let set = Set::from_pieces(
//!     Space::set(2),
//!     vec![box_set(&[(0, 1), (0, 1)]), box_set(&[(1, 2), (0, 1)])],
//! )?;
//! let hull = convex_hull(&set, &ctx)?;
//! assert_eq!(hull.ineqs().len(), 4);
//! # Ok::<(), PolyError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod context;
pub mod hull;
pub mod ilp;
pub mod lp;
pub mod polyhedral;
pub mod utils;

pub mod prelude {
    //! Convenient re-exports of commonly used types and functions.

    pub use crate::context::{Context, HullStrategy, Options};
    pub use crate::hull::{bounded_simple_hull, convex_hull, simple_hull};
    pub use crate::ilp::{maximize, minimize, IlpResult};
    pub use crate::lp::{LpResult, Tableau};
    pub use crate::polyhedral::{
        AffineExpr, BasicSet, Constraint, ConstraintKind, DimType, Div, Set, Space,
    };
    pub use crate::utils::errors::*;
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
