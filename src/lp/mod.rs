//! Linear programming oracle.
//!
//! A [`Tableau`] collects the rational relaxation of a system of rows and
//! answers optimization queries over it. Rows can be pushed and later
//! discarded again through [`Tableau::snapshot`] and [`Tableau::rollback`].

pub mod simplex;

use crate::context::Options;
use crate::polyhedral::basic_set::BasicSet;
use crate::utils::arith::{eval_rat, Row};
use crate::utils::errors::{PolyError, PolyResult};
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};
use simplex::{solve, SimplexOutcome};

/// Outcome of an LP query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LpResult {
    /// A finite optimum.
    Ok {
        /// Optimal value.
        value: BigRational,
        /// An optimal point.
        sample: Vec<BigRational>,
    },
    /// The system has no rational solution.
    Empty,
    /// The objective has no lower bound.
    Unbounded,
}

impl LpResult {
    /// The optimal value, if there is one.
    pub fn value(&self) -> Option<&BigRational> {
        match self {
            LpResult::Ok { value, .. } => Some(value),
            _ => None,
        }
    }
}

/// Saved row counts of a tableau.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    n_eq: usize,
    n_ineq: usize,
}

/// Rational relaxation of a system of equalities and inequalities over
/// `n_var` free variables.
#[derive(Debug, Clone)]
pub struct Tableau {
    n_var: usize,
    eqs: Vec<Row>,
    ineqs: Vec<Row>,
    max_pivots: usize,
}

impl Tableau {
    /// An unconstrained tableau.
    pub fn new(n_var: usize, options: &Options) -> Self {
        Self {
            n_var,
            eqs: Vec::new(),
            ineqs: Vec::new(),
            max_pivots: options.max_pivots,
        }
    }

    /// The relaxation of a piece over all of its variables, divs included.
    pub fn from_basic_set(bset: &BasicSet, options: &Options) -> Self {
        Self {
            n_var: bset.n_var(),
            eqs: bset.eqs().to_vec(),
            ineqs: bset.ineqs().to_vec(),
            max_pivots: options.max_pivots,
        }
    }

    /// Number of variables.
    pub fn n_var(&self) -> usize {
        self.n_var
    }

    /// Inequality rows currently in the tableau.
    pub fn ineqs(&self) -> &[Row] {
        &self.ineqs
    }

    fn check(&self, row: &[BigInt]) -> PolyResult<()> {
        if row.len() != 1 + self.n_var {
            return Err(PolyError::invalid(format!(
                "row of width {} in a tableau over {} variables",
                row.len(),
                self.n_var
            )));
        }
        Ok(())
    }

    /// Push the equality `row . (1, x) = 0`.
    pub fn add_equality(&mut self, row: Row) -> PolyResult<()> {
        self.check(&row)?;
        self.eqs.push(row);
        Ok(())
    }

    /// Push the inequality `row . (1, x) >= 0`.
    pub fn add_inequality(&mut self, row: Row) -> PolyResult<()> {
        self.check(&row)?;
        self.ineqs.push(row);
        Ok(())
    }

    /// Record the current state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            n_eq: self.eqs.len(),
            n_ineq: self.ineqs.len(),
        }
    }

    /// Drop every row pushed after `snap` was taken.
    pub fn rollback(&mut self, snap: Snapshot) {
        self.eqs.truncate(snap.n_eq);
        self.ineqs.truncate(snap.n_ineq);
    }

    /// Minimize `obj . (1, x)`.
    pub fn minimize(&self, obj: &[BigInt]) -> PolyResult<LpResult> {
        self.check(obj)?;
        let (outcome, _) = solve(self.n_var, &self.eqs, &self.ineqs, obj, self.max_pivots)?;
        Ok(match outcome {
            SimplexOutcome::Optimal { value, point } => LpResult::Ok {
                value,
                sample: point,
            },
            SimplexOutcome::Infeasible => LpResult::Empty,
            SimplexOutcome::Unbounded => LpResult::Unbounded,
        })
    }

    /// Maximize `obj . (1, x)`. An unbounded result means no upper bound.
    pub fn maximize(&self, obj: &[BigInt]) -> PolyResult<LpResult> {
        let neg: Row = obj.iter().map(|v| -v).collect();
        Ok(match self.minimize(&neg)? {
            LpResult::Ok { value, sample } => LpResult::Ok {
                value: -value,
                sample,
            },
            other => other,
        })
    }

    /// Any rational point of the system.
    pub fn sample(&self) -> PolyResult<Option<Vec<BigRational>>> {
        match self.minimize(&vec![BigInt::zero(); 1 + self.n_var])? {
            LpResult::Ok { sample, .. } => Ok(Some(sample)),
            _ => Ok(None),
        }
    }

    /// Whether the system has no rational solution.
    pub fn is_empty(&self) -> PolyResult<bool> {
        Ok(self.sample()?.is_none())
    }

    /// Indices of the inequalities that hold with equality on every point
    /// of the system, or `None` if the system is empty.
    pub fn implicit_equalities(&self) -> PolyResult<Option<Vec<usize>>> {
        let Some(first) = self.sample()? else {
            return Ok(None);
        };
        let mut slack = vec![false; self.ineqs.len()];
        let mark = |slack: &mut Vec<bool>, p: &[BigRational]| {
            for (k, r) in self.ineqs.iter().enumerate() {
                if eval_rat(r, p).is_positive() {
                    slack[k] = true;
                }
            }
        };
        mark(&mut slack, &first);
        let mut implicit = Vec::new();
        for k in 0..self.ineqs.len() {
            if slack[k] {
                continue;
            }
            match self.maximize(&self.ineqs[k])? {
                LpResult::Ok { value, sample } => {
                    if value.is_zero() {
                        implicit.push(k);
                    } else {
                        mark(&mut slack, &sample);
                    }
                }
                LpResult::Unbounded => slack[k] = true,
                LpResult::Empty => return Ok(None),
            }
        }
        Ok(Some(implicit))
    }

    /// Indices of inequalities implied by the equalities and the other
    /// inequalities that are kept. Rows are examined in order and only
    /// rows with `candidates[k]` set are tested; a redundant row is
    /// discarded before the next one is examined. On an empty system every
    /// candidate is reported.
    pub fn redundant_rows(&self, candidates: &[bool]) -> PolyResult<Vec<usize>> {
        let mut base = Tableau {
            n_var: self.n_var,
            eqs: self.eqs.clone(),
            ineqs: Vec::with_capacity(self.ineqs.len()),
            max_pivots: self.max_pivots,
        };
        let snap = base.snapshot();
        let mut removed = vec![false; self.ineqs.len()];
        let mut redundant = Vec::new();
        for k in 0..self.ineqs.len() {
            if !candidates.get(k).copied().unwrap_or(false) {
                continue;
            }
            for (j, r) in self.ineqs.iter().enumerate() {
                if j != k && !removed[j] {
                    base.ineqs.push(r.clone());
                }
            }
            let res = base.minimize(&self.ineqs[k]);
            base.rollback(snap);
            let is_redundant = match res? {
                LpResult::Ok { value, .. } => !value.is_negative(),
                LpResult::Empty => true,
                LpResult::Unbounded => false,
            };
            if is_redundant {
                removed[k] = true;
                redundant.push(k);
            }
        }
        Ok(redundant)
    }

    /// The tableau of the recession cone: every constant set to zero.
    pub fn recession_cone(&self) -> Tableau {
        let zero_const = |r: &Row| {
            let mut r = r.clone();
            r[0] = BigInt::zero();
            r
        };
        Tableau {
            n_var: self.n_var,
            eqs: self.eqs.iter().map(zero_const).collect(),
            ineqs: self.ineqs.iter().map(zero_const).collect(),
            max_pivots: self.max_pivots,
        }
    }

    /// Whether the system is bounded in every variable. An empty system
    /// is bounded.
    pub fn is_bounded(&self) -> PolyResult<bool> {
        if self.is_empty()? {
            return Ok(true);
        }
        let cone = self.recession_cone();
        for j in 0..self.n_var {
            for sign in [BigInt::one(), -BigInt::one()] {
                let mut obj = vec![BigInt::zero(); 1 + self.n_var];
                obj[1 + j] = sign;
                if cone.minimize(&obj)? == LpResult::Unbounded {
                    return Ok(false);
                }
            }
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::arith::{rat, row_from_i64};

    fn tab(n: usize, eqs: &[&[i64]], ineqs: &[&[i64]]) -> Tableau {
        let mut t = Tableau::new(n, &Options::default());
        for r in eqs {
            t.add_equality(row_from_i64(r)).unwrap();
        }
        for r in ineqs {
            t.add_inequality(row_from_i64(r)).unwrap();
        }
        t
    }

    #[test]
    fn test_minimize_and_maximize() {
        let t = tab(1, &[], &[&[0, 1], &[5, -1]]);
        assert_eq!(t.minimize(&row_from_i64(&[0, 1])).unwrap().value(), Some(&rat(0)));
        assert_eq!(t.maximize(&row_from_i64(&[0, 1])).unwrap().value(), Some(&rat(5)));
    }

    #[test]
    fn test_snapshot_rollback() {
        let mut t = tab(1, &[], &[&[0, 1]]);
        let snap = t.snapshot();
        t.add_inequality(row_from_i64(&[-1, -1])).unwrap();
        assert!(t.is_empty().unwrap());
        t.rollback(snap);
        assert!(!t.is_empty().unwrap());
    }

    #[test]
    fn test_implicit_equalities() {
        // x >= 0, -x >= 0, y >= 0
        let t = tab(2, &[], &[&[0, 1, 0], &[0, -1, 0], &[0, 0, 1]]);
        assert_eq!(t.implicit_equalities().unwrap(), Some(vec![0, 1]));
    }

    #[test]
    fn test_redundant_rows() {
        // x >= 0, x >= -1, x <= 5
        let t = tab(1, &[], &[&[0, 1], &[1, 1], &[5, -1]]);
        assert_eq!(t.redundant_rows(&[true, true, true]).unwrap(), vec![1]);
    }

    #[test]
    fn test_boundedness() {
        let square = tab(2, &[], &[&[0, 1, 0], &[1, -1, 0], &[0, 0, 1], &[1, 0, -1]]);
        assert!(square.is_bounded().unwrap());
        let quadrant = tab(2, &[], &[&[0, 1, 0], &[0, 0, 1]]);
        assert!(!quadrant.is_bounded().unwrap());
    }

    #[test]
    fn test_width_check() {
        let mut t = Tableau::new(2, &Options::default());
        assert!(t.add_inequality(row_from_i64(&[0, 1])).is_err());
    }
}
