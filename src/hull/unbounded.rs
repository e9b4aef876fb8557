//! Hulls of unbounded pieces.
//!
//! A lineality space shared by every piece is factored out first. What is
//! left is folded pairwise: a pair of pointed pieces is mapped to a pair
//! of polytopes by a projective change of coordinates along a direction
//! that is positive on every ray of both, hulled, and mapped back.

use super::{all_bounded, fm::fm_pair, integer_row, rational_piece, uset_convex_hull};
use crate::context::Options;
use crate::lp::{LpResult, Tableau};
use crate::polyhedral::basic_set::BasicSet;
use crate::polyhedral::space::Space;
use crate::utils::arith::{is_zero_slice, make_primitive, to_rational_row, Row};
use crate::utils::errors::{PolyError, PolyResult};
use crate::utils::matrix::{hermite_normal_form, unimodular_completion, RationalMatrix};
use log::{debug, trace};
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Zero};

/// Linear parts of every constraint of the pieces.
fn normals(pieces: &[BasicSet]) -> Vec<Row> {
    pieces
        .iter()
        .flat_map(|p| p.eqs().iter().chain(p.ineqs()))
        .map(|r| r[1..].to_vec())
        .collect()
}

/// Whether the piece contains a line.
fn has_lineality(piece: &BasicSet, n: usize) -> bool {
    RationalMatrix::from_int_rows(&normals(std::slice::from_ref(piece)), n).rank() < n
}

/// Hull of pieces sharing a nontrivial lineality space, computed in the
/// quotient by that space. `None` if the pieces have no common line.
pub(crate) fn hull_modulo_lineality(
    pieces: &[BasicSet],
    n: usize,
    options: &Options,
) -> PolyResult<Option<BasicSet>> {
    let all = normals(pieces);
    let basis = hermite_normal_form(&all, n);
    let r = basis.len();
    if r == n {
        return Ok(None);
    }
    debug!("hull_modulo_lineality: lineality space of dimension {}", n - r);
    if r == 0 {
        return Ok(Some(rational_piece(n, Vec::new(), Vec::new())?));
    }
    let quotient = RationalMatrix::from_int_rows(&basis, n);
    let project = |row: &Row| -> PolyResult<Row> {
        let alpha = quotient
            .solve_left(&to_rational_row(&row[1..]))
            .ok_or_else(|| PolyError::oracle("constraint normal outside the row space"))?;
        let mut out = Vec::with_capacity(1 + r);
        out.push(BigRational::from_integer(row[0].clone()));
        out.extend(alpha);
        Ok(integer_row(&out))
    };
    let mut reduced = Vec::with_capacity(pieces.len());
    for p in pieces {
        let eqs = p.eqs().iter().map(project).collect::<PolyResult<Vec<_>>>()?;
        let ineqs = p.ineqs().iter().map(project).collect::<PolyResult<Vec<_>>>()?;
        reduced.push(rational_piece(r, eqs, ineqs)?);
    }
    let hull = uset_convex_hull(reduced, r, options)?;
    if hull.is_marked_empty() {
        return Ok(Some(BasicSet::empty(Space::set(n)).into_rational()));
    }
    let lift = |row: &Row| -> Row {
        let mut out = vec![row[0].clone()];
        out.extend((0..n).map(|j| {
            row[1..]
                .iter()
                .zip(&basis)
                .fold(BigInt::zero(), |acc, (c, b)| acc + c * &b[j])
        }));
        make_primitive(&mut out);
        out
    };
    let mut out = rational_piece(
        n,
        hull.eqs().iter().map(lift).collect(),
        hull.ineqs().iter().map(lift).collect(),
    )?;
    out.remove_redundancies(options)?;
    Ok(Some(out))
}

/// Hull of two pieces of which at least one is unbounded.
pub(crate) fn hull_pair(a: BasicSet, b: BasicSet, n: usize, options: &Options) -> PolyResult<BasicSet> {
    let pair = [a, b];
    if all_bounded(&pair, options)? {
        return uset_convex_hull(Vec::from(pair), n, options);
    }
    let [a, b] = pair;
    if has_lineality(&a, n) || has_lineality(&b, n) {
        trace!("hull_pair: piece with lineality, eliminating");
        return fm_pair(a, b, n, options);
    }
    let Some(s) = valid_direction(&a, &b, n, options)? else {
        trace!("hull_pair: no valid direction, eliminating");
        return fm_pair(a, b, n, options);
    };
    let (u, v) = unimodular_completion(&s)?;
    let mapped = [homogeneous_map(&a, &v, n)?, homogeneous_map(&b, &v, n)?];
    if !all_bounded(&mapped, options)? {
        return fm_pair(a, b, n, options);
    }
    trace!("hull_pair: mapped along {:?}", s);
    let hull = uset_convex_hull(Vec::from(mapped), n, options)?;
    if hull.is_marked_empty() {
        return Ok(hull);
    }
    let pull = |row: &Row| -> Row {
        let mut out: Row = (0..=n)
            .map(|j| {
                row.iter()
                    .zip(&u)
                    .fold(BigInt::zero(), |acc, (c, ui)| acc + c * &ui[j])
            })
            .collect();
        make_primitive(&mut out);
        out
    };
    let mut ineqs: Vec<Row> = hull
        .ineqs()
        .iter()
        .map(pull)
        .filter(|r| !is_zero_slice(&r[1..]))
        .collect();
    ineqs.push(s);
    let mut out = rational_piece(n, hull.eqs().iter().map(pull).collect(), ineqs)?;
    out.remove_redundancies(options)?;
    Ok(out)
}

/// Rewrite the homogenization of `piece` in the coordinates `w = U z`,
/// where `v` is the inverse of `U`, and dehomogenize along `w_0`.
fn homogeneous_map(piece: &BasicSet, v: &[Row], n: usize) -> PolyResult<BasicSet> {
    let map = |row: &Row| -> Row {
        let mut out: Row = (0..=n)
            .map(|j| {
                row.iter()
                    .zip(v)
                    .fold(BigInt::zero(), |acc, (c, vi)| acc + c * &vi[j])
            })
            .collect();
        make_primitive(&mut out);
        out
    };
    let mut ineqs: Vec<Row> = piece.ineqs().iter().map(map).collect();
    ineqs.push(v[0].clone());
    rational_piece(n, piece.eqs().iter().map(map).collect(), ineqs)
}

/// A primitive integer row `s` over `(t, x)` that is positive on every
/// nonzero element of the homogenizations of both pieces: `s` is written
/// as a combination of the constraints of each cone with every inequality
/// multiplier at least one. `None` if no such row exists.
pub(crate) fn valid_direction(
    a: &BasicSet,
    b: &BasicSet,
    n: usize,
    options: &Options,
) -> PolyResult<Option<Row>> {
    let block = |p: &BasicSet| p.ineqs().len() + 1 + p.eqs().len();
    let n_var = (1 + n) + block(a) + block(b);
    let mut tab = Tableau::new(n_var, options);
    let mut obj = vec![BigInt::zero(); 1 + n_var];
    let mut offset = 1 + n;
    for p in [a, b] {
        let n_ineq = p.ineqs().len() + 1;
        for k in 0..n_ineq {
            let mut at_least_one = vec![BigInt::zero(); 1 + n_var];
            at_least_one[0] = -BigInt::one();
            at_least_one[1 + offset + k] = BigInt::one();
            tab.add_inequality(at_least_one)?;
            obj[1 + offset + k] = BigInt::one();
        }
        for j in 0..=n {
            let mut row = vec![BigInt::zero(); 1 + n_var];
            row[1 + j] = BigInt::one();
            for (k, r) in p.ineqs().iter().enumerate() {
                row[1 + offset + k] = -&r[j];
            }
            if j == 0 {
                row[1 + offset + p.ineqs().len()] = -BigInt::one();
            }
            for (k, e) in p.eqs().iter().enumerate() {
                row[1 + offset + n_ineq + k] = -&e[j];
            }
            tab.add_equality(row)?;
        }
        offset += block(p);
    }
    Ok(match tab.minimize(&obj)? {
        LpResult::Ok { sample, .. } => Some(integer_row(&sample[..=n])),
        LpResult::Empty | LpResult::Unbounded => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::arith::{dot, eval_int, int, row_from_i64};

    fn rpiece(n: usize, eqs: &[&[i64]], ineqs: &[&[i64]]) -> BasicSet {
        BasicSet::from_i64(Space::set(n), eqs, ineqs).unwrap().into_rational()
    }

    fn holds(hull: &BasicSet, p: &[i64]) -> bool {
        let p: Vec<BigInt> = p.iter().map(|&v| int(v)).collect();
        hull.contains(&p).unwrap()
    }

    #[test]
    fn test_valid_direction_is_positive_on_rays() {
        // x >= 0, y >= 0 and x >= 1, y >= 2
        let a = rpiece(2, &[], &[&[0, 1, 0], &[0, 0, 1]]);
        let b = rpiece(2, &[], &[&[-1, 1, 0], &[-2, 0, 1]]);
        let s = valid_direction(&a, &b, 2, &Options::default()).unwrap().unwrap();
        for ray in [[0, 1, 0], [0, 0, 1], [0, 1, 1]] {
            assert!(dot(&s, &row_from_i64(&ray)) > int(0));
        }
        // positive at the vertices too
        assert!(eval_int(&s, &[int(0), int(0)]) > int(0));
        assert!(eval_int(&s, &[int(1), int(2)]) > int(0));
    }

    #[test]
    fn test_valid_direction_needs_pointed_cones() {
        let strip = rpiece(2, &[], &[&[0, 0, 1], &[1, 0, -1]]);
        let quadrant = rpiece(2, &[], &[&[0, 1, 0], &[0, 0, 1]]);
        let s = valid_direction(&strip, &quadrant, 2, &Options::default()).unwrap();
        assert_eq!(s, None);
    }

    #[test]
    fn test_hull_pair_quadrants() {
        // x >= 0, y >= 0 and x >= 2, y >= -1
        let a = rpiece(2, &[], &[&[0, 1, 0], &[0, 0, 1]]);
        let b = rpiece(2, &[], &[&[-2, 1, 0], &[1, 0, 1]]);
        let hull = hull_pair(a, b, 2, &Options::default()).unwrap();
        assert!(holds(&hull, &[0, 0]));
        assert!(holds(&hull, &[2, -1]));
        assert!(holds(&hull, &[100, -1]));
        assert!(holds(&hull, &[0, 100]));
        assert!(!holds(&hull, &[-1, 5]));
        assert!(!holds(&hull, &[3, -2]));
        assert!(!holds(&hull, &[0, -1]));
        // x >= 0, y >= -1, x + 2y >= 0
        let mut rows = hull.ineqs().to_vec();
        rows.sort();
        let mut expected = vec![
            row_from_i64(&[0, 1, 0]),
            row_from_i64(&[1, 0, 1]),
            row_from_i64(&[0, 1, 2]),
        ];
        expected.sort();
        assert_eq!(rows, expected);
    }

    #[test]
    fn test_hull_pair_line_and_point() {
        // the line y = 0 and the point (0, 2): the closed strip 0 <= y <= 2
        let line = rpiece(2, &[&[0, 0, 1]], &[]);
        let point = rpiece(2, &[&[0, 1, 0], &[-2, 0, 1]], &[]);
        let hull = hull_pair(line, point, 2, &Options::default()).unwrap();
        assert!(holds(&hull, &[-50, 0]));
        assert!(holds(&hull, &[50, 2]));
        assert!(holds(&hull, &[7, 1]));
        assert!(!holds(&hull, &[0, 3]));
        assert!(!holds(&hull, &[0, -1]));
        assert_eq!(hull.ineqs().len(), 2);
    }

    #[test]
    fn test_common_lineality_is_factored_out() {
        // two parallel strips along x
        let a = rpiece(2, &[], &[&[0, 0, 1], &[1, 0, -1]]);
        let b = rpiece(2, &[], &[&[-4, 0, 1], &[5, 0, -1]]);
        let hull = hull_modulo_lineality(&[a, b], 2, &Options::default())
            .unwrap()
            .unwrap();
        let mut rows = hull.ineqs().to_vec();
        rows.sort();
        assert_eq!(rows, vec![row_from_i64(&[0, 0, 1]), row_from_i64(&[5, 0, -1])]);
    }

    #[test]
    fn test_pointed_pieces_have_no_common_lineality() {
        let a = rpiece(2, &[], &[&[0, 1, 0], &[0, 0, 1]]);
        let b = rpiece(2, &[], &[&[0, 1, 0], &[0, 0, 1], &[3, -1, -1]]);
        assert!(hull_modulo_lineality(&[a, b], 2, &Options::default())
            .unwrap()
            .is_none());
    }
}
