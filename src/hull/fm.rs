//! Hull of two pieces by Fourier-Motzkin elimination.
//!
//! The closure of the hull of `A` and `B` is the projection onto `x` of
//!
//! ```text
//! { (x, xa, l) : xa in l A, x - xa in (1 - l) B, 0 <= l <= 1 }
//! ```
//!
//! where `l A` is the homogenization of `A` scaled by `l`. The auxiliary
//! variables `xa` and `l` are eliminated one column at a time, pruning
//! redundant rows after every step.

use super::rational_piece;
use crate::context::Options;
use crate::polyhedral::basic_set::BasicSet;
use crate::utils::arith::{combine, eliminate_column, is_zero_slice, make_primitive, Row};
use crate::utils::errors::PolyResult;
use log::trace;
use num_bigint::BigInt;
use num_traits::{One, Signed, Zero};

/// Hull of two rational div-free pieces over `n` variables.
pub fn fm_pair(a: BasicSet, b: BasicSet, n: usize, options: &Options) -> PolyResult<BasicSet> {
    if a.is_marked_empty() {
        return Ok(b);
    }
    if b.is_marked_empty() {
        return Ok(a);
    }
    let lam = 2 * n + 1;
    let width = lam + 1;
    let from_a = |row: &Row| -> Row {
        let mut out = vec![BigInt::zero(); width];
        out[1 + n..lam].clone_from_slice(&row[1..]);
        out[lam] = row[0].clone();
        out
    };
    let from_b = |row: &Row| -> Row {
        let mut out = vec![BigInt::zero(); width];
        out[0] = row[0].clone();
        for (k, v) in row[1..].iter().enumerate() {
            out[1 + k] = v.clone();
            out[1 + n + k] = -v;
        }
        out[lam] = -&row[0];
        out
    };
    let mut eqs: Vec<Row> = a.eqs().iter().map(from_a).chain(b.eqs().iter().map(from_b)).collect();
    let mut ineqs: Vec<Row> = a
        .ineqs()
        .iter()
        .map(from_a)
        .chain(b.ineqs().iter().map(from_b))
        .collect();
    let mut nonneg = vec![BigInt::zero(); width];
    nonneg[lam] = BigInt::one();
    let mut at_most_one = vec![BigInt::zero(); width];
    at_most_one[0] = BigInt::one();
    at_most_one[lam] = -BigInt::one();
    ineqs.push(nonneg);
    ineqs.push(at_most_one);

    for col in (n + 1..=lam).rev() {
        eliminate_last(&mut eqs, &mut ineqs, col);
        let mut pruned = rational_piece(col - 1, eqs, ineqs)?;
        pruned.remove_redundancies(options)?;
        if pruned.is_marked_empty() {
            return Ok(pruned);
        }
        eqs = pruned.eqs().to_vec();
        ineqs = pruned.ineqs().to_vec();
        trace!("fm_pair: {} equalities, {} inequalities after column {}", eqs.len(), ineqs.len(), col);
    }
    let mut hull = rational_piece(n, eqs, ineqs)?;
    hull.remove_redundancies(options)?;
    Ok(hull)
}

/// Eliminate column `col`, the last one, and drop it from every row.
///
/// An equality involving the column is used as a pivot. Otherwise every
/// pair of inequalities with opposite signs in the column is combined.
pub(crate) fn eliminate_last(eqs: &mut Vec<Row>, ineqs: &mut Vec<Row>, col: usize) {
    if let Some(i) = eqs.iter().position(|e| !e[col].is_zero()) {
        let pivot = eqs.swap_remove(i);
        for row in eqs.iter_mut().chain(ineqs.iter_mut()) {
            eliminate_column(row, &pivot, col);
        }
    } else {
        let (pos, rest): (Vec<Row>, Vec<Row>) = std::mem::take(ineqs)
            .into_iter()
            .partition(|r| r[col].is_positive());
        let (neg, zero): (Vec<Row>, Vec<Row>) = rest.into_iter().partition(|r| r[col].is_negative());
        *ineqs = zero;
        for p in &pos {
            for q in &neg {
                let mut r = p.clone();
                combine(&mut r, &-&q[col], q, &p[col]);
                ineqs.push(r);
            }
        }
    }
    for row in eqs.iter_mut().chain(ineqs.iter_mut()) {
        row.truncate(col);
        make_primitive(row);
    }
    eqs.retain(|r| !is_zero_slice(r));
    ineqs.retain(|r| !(is_zero_slice(&r[1..]) && !r[0].is_negative()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::polyhedral::space::Space;
    use crate::utils::arith::{int, row_from_i64};

    fn rpiece(n: usize, eqs: &[&[i64]], ineqs: &[&[i64]]) -> BasicSet {
        BasicSet::from_i64(Space::set(n), eqs, ineqs).unwrap().into_rational()
    }

    #[test]
    fn test_eliminate_last_pairs() {
        // x - z >= 0, z - 1 >= 0, 3 - z >= 0
        let mut eqs = Vec::new();
        let mut ineqs = vec![
            row_from_i64(&[0, 1, -1]),
            row_from_i64(&[-1, 0, 1]),
            row_from_i64(&[3, 0, -1]),
        ];
        eliminate_last(&mut eqs, &mut ineqs, 2);
        // x - 1 >= 0 and the trivial 2 >= 0
        assert_eq!(ineqs, vec![row_from_i64(&[-1, 1])]);
    }

    #[test]
    fn test_eliminate_last_uses_equality() {
        let mut eqs = vec![row_from_i64(&[0, 2, -1])];
        let mut ineqs = vec![row_from_i64(&[4, 0, -1])];
        eliminate_last(&mut eqs, &mut ineqs, 2);
        assert!(eqs.is_empty());
        assert_eq!(ineqs, vec![row_from_i64(&[2, -1])]);
    }

    #[test]
    fn test_fm_pair_segments() {
        // [0, 1] and [3, 4] on a line
        let a = rpiece(1, &[], &[&[0, 1], &[1, -1]]);
        let b = rpiece(1, &[], &[&[-3, 1], &[4, -1]]);
        let hull = fm_pair(a, b, 1, &Options::default()).unwrap();
        let mut rows = hull.ineqs().to_vec();
        rows.sort();
        assert_eq!(rows, vec![row_from_i64(&[0, 1]), row_from_i64(&[4, -1])]);
    }

    #[test]
    fn test_fm_pair_point_and_ray() {
        // the origin and the ray { (x, 1) : x >= 0 }
        let a = rpiece(2, &[&[0, 1, 0], &[0, 0, 1]], &[]);
        let b = rpiece(2, &[&[-1, 0, 1]], &[&[0, 1, 0]]);
        let hull = fm_pair(a, b, 2, &Options::default()).unwrap();
        // the closure { 0 <= y <= 1, x >= 0 }
        for p in [[0, 0], [5, 1], [7, 0], [3, 1]] {
            assert!(hull.contains(&[int(p[0]), int(p[1])]).unwrap());
        }
        assert!(!hull.contains(&[int(-1), int(1)]).unwrap());
        assert!(!hull.contains(&[int(0), int(2)]).unwrap());
        assert_eq!(hull.ineqs().len(), 3);
    }
}
