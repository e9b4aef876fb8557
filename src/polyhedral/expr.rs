//! Affine expressions used to build constraints.
//!
//! An affine expression is a linear combination of space variables plus a constant:
//! `aff(x) = c0 + c1*x1 + c2*x2 + ... + cn*xn`, where the variables are the
//! parameters, inputs and outputs of a space in that order.

use crate::utils::arith::Row;
use num_bigint::BigInt;
use num_traits::{One, Signed, Zero};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Neg, Sub};

/// An affine expression: constant + sum(coeff[i] * var[i])
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AffineExpr {
    /// Constant term
    pub constant: BigInt,
    /// Coefficients for each space variable
    pub coeffs: Vec<BigInt>,
}

impl AffineExpr {
    /// Create a zero expression.
    pub fn zero(n_var: usize) -> Self {
        Self {
            constant: BigInt::zero(),
            coeffs: vec![BigInt::zero(); n_var],
        }
    }

    /// Create a constant expression.
    pub fn constant(value: i64, n_var: usize) -> Self {
        let mut e = Self::zero(n_var);
        e.constant = BigInt::from(value);
        e
    }

    /// Create an expression for a single variable.
    pub fn var(idx: usize, n_var: usize) -> Self {
        let mut e = Self::zero(n_var);
        if idx < n_var {
            e.coeffs[idx] = BigInt::one();
        }
        e
    }

    /// Create an expression from machine integers: `constant + coeffs . x`.
    pub fn from_i64(constant: i64, coeffs: &[i64]) -> Self {
        Self {
            constant: BigInt::from(constant),
            coeffs: coeffs.iter().map(|&c| BigInt::from(c)).collect(),
        }
    }

    /// Check if this is a constant expression.
    pub fn is_constant(&self) -> bool {
        self.coeffs.iter().all(|c| c.is_zero())
    }

    /// Get the number of variables.
    pub fn n_var(&self) -> usize {
        self.coeffs.len()
    }

    /// Get coefficient for a variable.
    pub fn coeff(&self, idx: usize) -> BigInt {
        self.coeffs.get(idx).cloned().unwrap_or_default()
    }

    /// Set coefficient for a variable.
    pub fn set_coeff(&mut self, idx: usize, value: i64) {
        if idx < self.coeffs.len() {
            self.coeffs[idx] = BigInt::from(value);
        }
    }

    /// Evaluate the expression at an integer point.
    pub fn evaluate(&self, values: &[BigInt]) -> BigInt {
        let mut result = self.constant.clone();
        for (c, v) in self.coeffs.iter().zip(values) {
            result += c * v;
        }
        result
    }

    /// Scale the expression by a constant.
    pub fn scale(&self, factor: i64) -> Self {
        let f = BigInt::from(factor);
        Self {
            constant: &self.constant * &f,
            coeffs: self.coeffs.iter().map(|c| c * &f).collect(),
        }
    }

    /// The expression as a constraint row padded with `n_div` zero div columns.
    pub fn to_row(&self, n_div: usize) -> Row {
        let mut row = Vec::with_capacity(1 + self.coeffs.len() + n_div);
        row.push(self.constant.clone());
        row.extend(self.coeffs.iter().cloned());
        row.extend(std::iter::repeat(BigInt::zero()).take(n_div));
        row
    }

    /// Convert to string with given variable names.
    pub fn to_string_with_names(&self, names: &[String]) -> String {
        format_affine(&self.constant, &self.coeffs, names)
    }
}

/// Render `constant + coeffs . names` in the usual `2*i - j + 3` style.
pub(crate) fn format_affine(constant: &BigInt, coeffs: &[BigInt], names: &[String]) -> String {
    let mut out = String::new();
    for (i, c) in coeffs.iter().enumerate() {
        if c.is_zero() {
            continue;
        }
        let default_name = format!("x{}", i);
        let name = names.get(i).map(|s| s.as_str()).unwrap_or(&default_name);
        let mag = c.abs();
        if out.is_empty() {
            if c.is_negative() {
                out.push('-');
            }
        } else if c.is_negative() {
            out.push_str(" - ");
        } else {
            out.push_str(" + ");
        }
        if mag.is_one() {
            out.push_str(name);
        } else {
            out.push_str(&format!("{}*{}", mag, name));
        }
    }
    if out.is_empty() {
        return constant.to_string();
    }
    if constant.is_positive() {
        out.push_str(&format!(" + {}", constant));
    } else if constant.is_negative() {
        out.push_str(&format!(" - {}", constant.abs()));
    }
    out
}

impl Add for AffineExpr {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        assert_eq!(self.coeffs.len(), other.coeffs.len());
        Self {
            constant: self.constant + other.constant,
            coeffs: self.coeffs.iter().zip(&other.coeffs).map(|(a, b)| a + b).collect(),
        }
    }
}

impl Sub for AffineExpr {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        assert_eq!(self.coeffs.len(), other.coeffs.len());
        Self {
            constant: self.constant - other.constant,
            coeffs: self.coeffs.iter().zip(&other.coeffs).map(|(a, b)| a - b).collect(),
        }
    }
}

impl Neg for AffineExpr {
    type Output = Self;

    fn neg(self) -> Self {
        self.scale(-1)
    }
}

impl fmt::Display for AffineExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_string_with_names(&[]))
    }
}
