//! Builder-level constraints over the dimensions of a space.
//!
//! A [`Constraint`] is `expr >= 0` or `expr = 0` over the parameters and
//! set dimensions only. Pieces store raw rows; this type is the typed way in
//! and out of that representation.

use crate::polyhedral::expr::AffineExpr;
use crate::utils::arith::{floor_div, gcd_slice, Row};
use crate::utils::errors::{PolyError, PolyResult};
use num_bigint::BigInt;
use num_traits::{One, Signed, Zero};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A linear constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constraint {
    /// Left-hand side, compared against zero
    pub expr: AffineExpr,
    /// Comparison
    pub kind: ConstraintKind,
}

/// Comparison of a constraint against zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConstraintKind {
    /// `expr >= 0`
    Inequality,
    /// `expr = 0`
    Equality,
}

impl Constraint {
    /// Constraint from its parts.
    pub fn new(expr: AffineExpr, kind: ConstraintKind) -> Self {
        Self { expr, kind }
    }

    /// `expr >= 0`
    pub fn ge_zero(expr: AffineExpr) -> Self {
        Self::new(expr, ConstraintKind::Inequality)
    }

    /// `expr = 0`
    pub fn eq_zero(expr: AffineExpr) -> Self {
        Self::new(expr, ConstraintKind::Equality)
    }

    /// `lhs >= rhs`
    pub fn ge(lhs: AffineExpr, rhs: AffineExpr) -> Self {
        Self::ge_zero(lhs - rhs)
    }

    /// `lhs <= rhs`
    pub fn le(lhs: AffineExpr, rhs: AffineExpr) -> Self {
        Self::ge_zero(rhs - lhs)
    }

    /// `lhs = rhs`
    pub fn eq(lhs: AffineExpr, rhs: AffineExpr) -> Self {
        Self::eq_zero(lhs - rhs)
    }

    /// `x_var >= lower`
    pub fn lower_bound(var: usize, lower: i64, n_var: usize) -> Self {
        let mut expr = AffineExpr::var(var, n_var);
        expr.constant = BigInt::from(-lower);
        Self::ge_zero(expr)
    }

    /// `x_var <= upper`
    pub fn upper_bound(var: usize, upper: i64, n_var: usize) -> Self {
        let mut expr = -AffineExpr::var(var, n_var);
        expr.constant = BigInt::from(upper);
        Self::ge_zero(expr)
    }

    /// Read a constraint back from a row without div columns.
    pub fn from_row(row: &[BigInt], kind: ConstraintKind) -> PolyResult<Self> {
        let Some((constant, coeffs)) = row.split_first() else {
            return Err(PolyError::invalid("empty constraint row"));
        };
        let expr = AffineExpr {
            constant: constant.clone(),
            coeffs: coeffs.to_vec(),
        };
        Ok(Self::new(expr, kind))
    }

    /// The row of the constraint in a piece with `n_div` divs.
    pub fn to_row(&self, n_div: usize) -> Row {
        self.expr.to_row(n_div)
    }

    /// `expr = 0`?
    pub fn is_equality(&self) -> bool {
        matches!(self.kind, ConstraintKind::Equality)
    }

    /// `expr >= 0`?
    pub fn is_inequality(&self) -> bool {
        matches!(self.kind, ConstraintKind::Inequality)
    }

    /// Whether the integer point satisfies the constraint.
    pub fn is_satisfied(&self, point: &[BigInt]) -> bool {
        let value = self.expr.evaluate(point);
        match self.kind {
            ConstraintKind::Inequality => !value.is_negative(),
            ConstraintKind::Equality => value.is_zero(),
        }
    }

    /// Integer tightening.
    ///
    /// An inequality is divided by the gcd `g` of its coefficients with the
    /// constant floored. An equality whose constant is not a multiple of
    /// `g` has no integer solution and yields `None`.
    pub fn tightened(&self) -> Option<Self> {
        let g = gcd_slice(&self.expr.coeffs);
        if g.is_zero() || g.is_one() {
            return Some(self.clone());
        }
        let coeffs = self.expr.coeffs.iter().map(|c| c / &g).collect();
        let constant = match self.kind {
            ConstraintKind::Inequality => floor_div(&self.expr.constant, &g),
            ConstraintKind::Equality => {
                if !(&self.expr.constant % &g).is_zero() {
                    return None;
                }
                &self.expr.constant / &g
            }
        };
        Some(Self::new(AffineExpr { constant, coeffs }, self.kind))
    }

    /// Number of space variables.
    pub fn n_var(&self) -> usize {
        self.expr.n_var()
    }

    /// Render with the given variable names.
    pub fn to_string_with_names(&self, names: &[String]) -> String {
        let expr_str = self.expr.to_string_with_names(names);
        match self.kind {
            ConstraintKind::Inequality => format!("{} >= 0", expr_str),
            ConstraintKind::Equality => format!("{} = 0", expr_str),
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = (0..self.n_var()).map(|i| format!("x{}", i)).collect();
        write!(f, "{}", self.to_string_with_names(&names))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::arith::row_from_i64;

    #[test]
    fn test_bounds() {
        let lo = Constraint::lower_bound(0, 0, 2);
        let hi = Constraint::upper_bound(0, 10, 2);
        assert!(lo.is_satisfied(&row_from_i64(&[0, 7])));
        assert!(!lo.is_satisfied(&row_from_i64(&[-1, 0])));
        assert!(hi.is_satisfied(&row_from_i64(&[10, 0])));
        assert!(!hi.is_satisfied(&row_from_i64(&[11, 0])));
    }

    #[test]
    fn test_row_conversion() {
        let c = Constraint::eq(AffineExpr::var(0, 2), AffineExpr::constant(5, 2));
        assert_eq!(c.to_row(1), row_from_i64(&[-5, 1, 0, 0]));
        let back = Constraint::from_row(&row_from_i64(&[-5, 1, 0]), ConstraintKind::Equality).unwrap();
        assert_eq!(back, c);
        assert!(Constraint::from_row(&[], ConstraintKind::Inequality).is_err());
    }

    #[test]
    fn test_tightened() {
        // 2x - 3 >= 0 tightens to x - 2 >= 0
        let c = Constraint::from_row(&row_from_i64(&[-3, 2]), ConstraintKind::Inequality).unwrap();
        let t = c.tightened().unwrap();
        assert_eq!(t.to_row(0), row_from_i64(&[-2, 1]));
        assert_eq!(t.to_string(), "x0 - 2 >= 0");
        // 2x = 3 has no integer solution
        let e = Constraint::from_row(&row_from_i64(&[-3, 2]), ConstraintKind::Equality).unwrap();
        assert!(e.tightened().is_none());
    }
}
