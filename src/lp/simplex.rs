//! Dense two-phase primal simplex over exact rationals.
//!
//! Problems have the shape
//!
//! ```text
//! minimize   c0 + c . x
//! subject to r0 + r . x  = 0   for every equality row
//!            r0 + r . x >= 0   for every inequality row
//! ```
//!
//! with free variables `x`. Free variables are split as `x = p - q` with
//! `p, q >= 0`, inequalities receive a surplus column and rows without a
//! natural basic column receive an artificial one. Entering and leaving
//! columns follow Bland's rule, so the method terminates on degenerate
//! problems.

use crate::utils::arith::Row;
use crate::utils::errors::{PolyError, PolyResult};
use log::trace;
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};

/// Outcome of one simplex run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimplexOutcome {
    /// Finite optimum with an optimal vertex.
    Optimal {
        /// Objective value, constant included.
        value: BigRational,
        /// Optimal assignment of the free variables.
        point: Vec<BigRational>,
    },
    /// No feasible point.
    Infeasible,
    /// The objective decreases without bound.
    Unbounded,
}

/// Simplex statistics.
#[derive(Debug, Clone, Default)]
pub struct SimplexStats {
    /// Pivots performed in phase 1.
    pub phase1_pivots: usize,
    /// Pivots performed in phase 2.
    pub phase2_pivots: usize,
}

struct Solver {
    /// Constraint rows; the last entry of each row is the right-hand side.
    tableau: Vec<Vec<BigRational>>,
    basis: Vec<usize>,
    n_col: usize,
    first_artificial: usize,
    max_pivots: usize,
    pivots: usize,
}

impl Solver {
    fn rhs(&self, row: usize) -> &BigRational {
        &self.tableau[row][self.n_col]
    }

    fn pivot(&mut self, row: usize, col: usize) -> PolyResult<()> {
        self.pivots += 1;
        if self.pivots > self.max_pivots {
            return Err(PolyError::oracle(format!(
                "simplex exceeded {} pivots",
                self.max_pivots
            )));
        }
        let inv = BigRational::one() / &self.tableau[row][col];
        for v in self.tableau[row].iter_mut() {
            if !v.is_zero() {
                *v = &*v * &inv;
            }
        }
        let pivot_row = self.tableau[row].clone();
        for (i, r) in self.tableau.iter_mut().enumerate() {
            if i == row || r[col].is_zero() {
                continue;
            }
            let f = r[col].clone();
            for (v, p) in r.iter_mut().zip(&pivot_row) {
                if !p.is_zero() {
                    *v = &*v - &f * p;
                }
            }
        }
        self.basis[row] = col;
        Ok(())
    }

    /// Minimize `cost . columns` from the current basic feasible solution.
    /// Returns false if the objective is unbounded.
    fn optimize(&mut self, cost: &[BigRational], allowed: &[bool]) -> PolyResult<bool> {
        loop {
            let mut entering = None;
            for j in 0..self.n_col {
                if !allowed[j] || self.basis.contains(&j) {
                    continue;
                }
                let mut reduced = cost[j].clone();
                for (i, &b) in self.basis.iter().enumerate() {
                    if !cost[b].is_zero() && !self.tableau[i][j].is_zero() {
                        reduced -= &cost[b] * &self.tableau[i][j];
                    }
                }
                if reduced.is_negative() {
                    entering = Some(j);
                    break;
                }
            }
            let Some(col) = entering else {
                return Ok(true);
            };
            let mut leaving: Option<(usize, BigRational)> = None;
            for i in 0..self.tableau.len() {
                let a = &self.tableau[i][col];
                if !a.is_positive() {
                    continue;
                }
                let ratio = self.rhs(i) / a;
                let better = match &leaving {
                    None => true,
                    Some((li, best)) => {
                        ratio < *best || (ratio == *best && self.basis[i] < self.basis[*li])
                    }
                };
                if better {
                    leaving = Some((i, ratio));
                }
            }
            match leaving {
                Some((row, _)) => self.pivot(row, col)?,
                None => return Ok(false),
            }
        }
    }

    fn objective(&self, cost: &[BigRational]) -> BigRational {
        self.basis
            .iter()
            .enumerate()
            .fold(BigRational::zero(), |acc, (i, &b)| acc + &cost[b] * self.rhs(i))
    }

    /// Pivot basic artificials out; rows where that is impossible are
    /// linearly dependent and are removed.
    fn drive_out_artificials(&mut self) -> PolyResult<()> {
        let mut i = 0;
        while i < self.tableau.len() {
            if self.basis[i] < self.first_artificial {
                i += 1;
                continue;
            }
            match (0..self.first_artificial).find(|&j| !self.tableau[i][j].is_zero()) {
                Some(j) => {
                    self.pivot(i, j)?;
                    i += 1;
                }
                None => {
                    self.tableau.remove(i);
                    self.basis.remove(i);
                }
            }
        }
        Ok(())
    }
}

/// Solve `min obj . (1, x)` subject to the given rows over `n_var` free
/// variables.
pub fn solve(
    n_var: usize,
    eqs: &[Row],
    ineqs: &[Row],
    obj: &[BigInt],
    max_pivots: usize,
) -> PolyResult<(SimplexOutcome, SimplexStats)> {
    let n_ineq = ineqs.len();
    let n_row = eqs.len() + n_ineq;
    let first_slack = 2 * n_var;
    let first_artificial = first_slack + n_ineq;

    // Rows as (coefficients over p, q and slacks, rhs) with rhs >= 0 and a
    // note of whether the slack can start in the basis.
    let mut rows: Vec<(Vec<BigRational>, Option<usize>)> = Vec::with_capacity(n_row);
    for (k, r) in eqs.iter().map(|r| (None, r)).chain(ineqs.iter().enumerate().map(|(k, r)| (Some(k), r))) {
        let mut coeffs = vec![BigRational::zero(); first_artificial + 1];
        for j in 0..n_var {
            let a = &r[1 + j];
            if a.is_zero() {
                continue;
            }
            coeffs[j] = BigRational::from_integer(a.clone());
            coeffs[n_var + j] = BigRational::from_integer(-a);
        }
        if let Some(k) = k {
            coeffs[first_slack + k] = -BigRational::one();
        }
        coeffs[first_artificial] = BigRational::from_integer(-&r[0]);
        let negate = coeffs[first_artificial].is_negative()
            || (k.is_some() && coeffs[first_artificial].is_zero());
        if negate {
            for v in coeffs.iter_mut() {
                *v = -&*v;
            }
        }
        let natural = k.filter(|_| negate).map(|k| first_slack + k);
        rows.push((coeffs, natural));
    }

    let n_art = rows.iter().filter(|(_, nat)| nat.is_none()).count();
    let n_col = first_artificial + n_art;
    let mut tableau = Vec::with_capacity(n_row);
    let mut basis = Vec::with_capacity(n_row);
    let mut next_art = first_artificial;
    for (coeffs, natural) in rows {
        let rhs = coeffs[first_artificial].clone();
        let mut row = coeffs;
        row.truncate(first_artificial);
        row.resize(n_col, BigRational::zero());
        let b = match natural {
            Some(s) => s,
            None => {
                row[next_art] = BigRational::one();
                next_art += 1;
                next_art - 1
            }
        };
        row.push(rhs);
        tableau.push(row);
        basis.push(b);
    }

    let mut solver = Solver {
        tableau,
        basis,
        n_col,
        first_artificial,
        max_pivots,
        pivots: 0,
    };
    let mut stats = SimplexStats::default();

    if n_art > 0 {
        let mut cost = vec![BigRational::zero(); n_col];
        for c in cost.iter_mut().skip(first_artificial) {
            *c = BigRational::one();
        }
        let allowed = vec![true; n_col];
        solver.optimize(&cost, &allowed)?;
        stats.phase1_pivots = solver.pivots;
        if solver.objective(&cost).is_positive() {
            trace!("simplex: infeasible after {} pivots", solver.pivots);
            return Ok((SimplexOutcome::Infeasible, stats));
        }
        solver.drive_out_artificials()?;
    }

    let mut cost = vec![BigRational::zero(); n_col];
    for j in 0..n_var {
        let c = &obj[1 + j];
        if !c.is_zero() {
            cost[j] = BigRational::from_integer(c.clone());
            cost[n_var + j] = BigRational::from_integer(-c);
        }
    }
    let allowed: Vec<bool> = (0..n_col).map(|j| j < first_artificial).collect();
    let before = solver.pivots;
    let bounded = solver.optimize(&cost, &allowed)?;
    stats.phase2_pivots = solver.pivots - before;
    if !bounded {
        return Ok((SimplexOutcome::Unbounded, stats));
    }

    let mut values = vec![BigRational::zero(); n_col];
    for (i, &b) in solver.basis.iter().enumerate() {
        values[b] = solver.rhs(i).clone();
    }
    let point: Vec<BigRational> = (0..n_var).map(|j| &values[j] - &values[n_var + j]).collect();
    let value = solver.objective(&cost) + BigRational::from_integer(obj[0].clone());
    Ok((SimplexOutcome::Optimal { value, point }, stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::arith::{rat, row_from_i64};

    fn run(n: usize, eqs: &[&[i64]], ineqs: &[&[i64]], obj: &[i64]) -> SimplexOutcome {
        let eqs: Vec<Row> = eqs.iter().map(|r| row_from_i64(r)).collect();
        let ineqs: Vec<Row> = ineqs.iter().map(|r| row_from_i64(r)).collect();
        solve(n, &eqs, &ineqs, &row_from_i64(obj), 10_000).unwrap().0
    }

    #[test]
    fn test_box_minimum() {
        // 1 <= x <= 3, 2 <= y <= 5, minimize x + y
        let out = run(2, &[], &[&[-1, 1, 0], &[3, -1, 0], &[-2, 0, 1], &[5, 0, -1]], &[0, 1, 1]);
        match out {
            SimplexOutcome::Optimal { value, point } => {
                assert_eq!(value, rat(3));
                assert_eq!(point, vec![rat(1), rat(2)]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_free_variables_go_negative() {
        // x >= -4, minimize x
        let out = run(1, &[], &[&[4, 1]], &[0, 1]);
        assert_eq!(
            out,
            SimplexOutcome::Optimal {
                value: rat(-4),
                point: vec![rat(-4)]
            }
        );
    }

    #[test]
    fn test_infeasible() {
        let out = run(1, &[], &[&[-2, 1], &[1, -1]], &[0, 1]);
        assert_eq!(out, SimplexOutcome::Infeasible);
    }

    #[test]
    fn test_unbounded() {
        let out = run(2, &[], &[&[0, 1, 0]], &[0, 0, -1]);
        assert_eq!(out, SimplexOutcome::Unbounded);
    }

    #[test]
    fn test_equalities_and_rational_optimum() {
        // 2x = 1, minimize x + 1
        let out = run(1, &[&[-1, 2], &[-2, 4]], &[], &[1, 1]);
        match out {
            SimplexOutcome::Optimal { value, .. } => {
                assert_eq!(value, BigRational::new(BigInt::from(3), BigInt::from(2)));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_pivot_limit() {
        let eqs: Vec<Row> = vec![row_from_i64(&[-1, 1, 1])];
        let err = solve(2, &eqs, &[], &row_from_i64(&[0, 1, 0]), 0).unwrap_err();
        assert!(matches!(err, PolyError::OracleFailure(_)));
    }
}
