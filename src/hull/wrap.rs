//! Facet wrapping for bounded collections.
//!
//! Starting from a set of known facets of the hull, every facet is rotated
//! around each of its ridges until it touches the collection again. The
//! ridges of a facet are the facets of the hull of the intersections of the
//! pieces with that facet, computed recursively in one dimension less.

use super::{common_equalities, rational_piece, uset_convex_hull};
use crate::context::Options;
use crate::lp::{LpResult, Tableau};
use crate::polyhedral::basic_set::BasicSet;
use crate::polyhedral::redundancy::direction;
use crate::utils::arith::{make_primitive, Row};
use crate::utils::errors::{PolyError, PolyResult};
use crate::utils::matrix::RationalMatrix;
use log::{debug, trace};
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Zero};
use rustc_hash::{FxHashMap, FxHashSet};

/// Hull of bounded rational pieces over `n` variables whose union is not
/// contained in any hyperplane.
pub(crate) fn hull_wrap(mut pieces: Vec<BasicSet>, n: usize, options: &Options) -> PolyResult<BasicSet> {
    for p in pieces.iter_mut() {
        p.remove_redundancies(options)?;
    }
    pieces.retain(|p| !p.is_marked_empty());
    if pieces.len() == 1 {
        return Ok(pieces.remove(0));
    }
    let (mut facets, whole) = proto_hull(&pieces);
    if let Some(j) = whole {
        debug!("hull_wrap: piece {} contains the others", j);
        return Ok(pieces.remove(j));
    }
    if facets.is_empty() {
        facets.push(initial_facet_constraint(&pieces, n, options)?);
    }
    let mut known: FxHashSet<Row> = facets.iter().cloned().collect();
    let mut i = 0;
    while i < facets.len() {
        let f = facets[i].clone();
        for ridge in ridges(&pieces, &f, n, options)? {
            let Some(g) = wrap_facet(&pieces, &f, &ridge, n, options)? else {
                continue;
            };
            if known.insert(g.clone()) {
                trace!("hull_wrap: new facet {:?}", g);
                facets.push(g);
            }
        }
        i += 1;
    }
    debug!("hull_wrap: {} facets over {} variables", facets.len(), n);
    let mut hull = rational_piece(n, Vec::new(), facets)?;
    hull.remove_redundancies(options)?;
    Ok(hull)
}

/// Facets that can be read off the pieces directly: a normal direction
/// bounding every piece gives a valid constraint at the loosest of those
/// bounds, and that constraint is a facet when the piece attaining it is
/// full-dimensional. Also reports a piece all of whose constraints are
/// such facets; it contains the whole collection.
pub(crate) fn proto_hull(pieces: &[BasicSet]) -> (Vec<Row>, Option<usize>) {
    let tables: Vec<FxHashMap<Row, (BigRational, &Row)>> = pieces
        .iter()
        .map(|p| {
            let mut t: FxHashMap<Row, (BigRational, &Row)> = FxHashMap::default();
            for row in p.ineqs() {
                if let Some((dir, c)) = direction(row) {
                    t.entry(dir).or_insert((c, row));
                }
            }
            t
        })
        .collect();
    let mut facets = Vec::new();
    let mut facet_set: FxHashSet<Row> = FxHashSet::default();
    for row in pieces[0].ineqs() {
        let Some((dir, _)) = direction(row) else {
            continue;
        };
        let mut best: Option<(usize, &BigRational, &Row)> = None;
        let mut everywhere = true;
        for (j, t) in tables.iter().enumerate() {
            match t.get(&dir) {
                Some((c, r)) => {
                    if best.map_or(true, |(_, b, _)| c > b) {
                        best = Some((j, c, r));
                    }
                }
                None => {
                    everywhere = false;
                    break;
                }
            }
        }
        let Some((j, _, r)) = best.filter(|_| everywhere) else {
            continue;
        };
        if !pieces[j].eqs().is_empty() {
            continue;
        }
        let mut facet = r.clone();
        make_primitive(&mut facet);
        if facet_set.insert(facet.clone()) {
            facets.push(facet);
        }
    }
    let whole = pieces.iter().position(|p| {
        p.eqs().is_empty()
            && !p.ineqs().is_empty()
            && p.ineqs().iter().all(|r| {
                let mut r = r.clone();
                make_primitive(&mut r);
                facet_set.contains(&r)
            })
    });
    (facets, whole)
}

/// The intersections of the pieces with the hyperplane `f = 0`, with
/// their implicit equalities detected and empty ones dropped.
fn face_pieces(pieces: &[BasicSet], f: &Row, options: &Options) -> PolyResult<Vec<BasicSet>> {
    let mut face = Vec::with_capacity(pieces.len());
    for p in pieces {
        let mut q = p.clone();
        q.add_equality(f.clone())?;
        q.detect_equalities(options)?;
        if !q.is_marked_empty() {
            face.push(q);
        }
    }
    Ok(face)
}

/// The facets of the face cut out by the facet `f`.
fn ridges(pieces: &[BasicSet], f: &Row, n: usize, options: &Options) -> PolyResult<Vec<Row>> {
    let face = face_pieces(pieces, f, options)?;
    if face.is_empty() {
        return Ok(Vec::new());
    }
    let hull = uset_convex_hull(face, n, options)?;
    Ok(hull.ineqs().to_vec())
}

/// Rotate the valid constraint `f` around `r` (a constraint valid on the
/// face `f = 0`) until it touches the collection again.
///
/// Every piece is homogenized into a cone over `(s_i, x_i)`. Minimizing
/// `sum r(s_i, x_i)` subject to `sum f(s_i, x_i) = 1` yields the smallest
/// ratio `r / f` over the collection; if it is `num / den`, then
/// `den * r - num * f` is the adjacent constraint. `None` if the ratio has
/// no lower bound.
pub(crate) fn wrap_facet(
    pieces: &[BasicSet],
    f: &Row,
    r: &Row,
    n: usize,
    options: &Options,
) -> PolyResult<Option<Row>> {
    let block = 1 + n;
    let n_var = pieces.len() * block;
    let lift = |row: &Row, i: usize| -> Row {
        let mut out = vec![BigInt::zero(); 1 + n_var];
        for (k, v) in row.iter().enumerate() {
            out[1 + i * block + k] = v.clone();
        }
        out
    };
    let mut tab = Tableau::new(n_var, options);
    let mut norm = vec![BigInt::zero(); 1 + n_var];
    norm[0] = -BigInt::one();
    let mut obj = vec![BigInt::zero(); 1 + n_var];
    for (i, p) in pieces.iter().enumerate() {
        for e in p.eqs() {
            tab.add_equality(lift(e, i))?;
        }
        for row in p.ineqs() {
            tab.add_inequality(lift(row, i))?;
        }
        let mut s = vec![BigInt::zero(); 1 + n_var];
        s[1 + i * block] = BigInt::one();
        tab.add_inequality(s)?;
        for (k, v) in f.iter().enumerate() {
            norm[1 + i * block + k] += v;
        }
        for (k, v) in r.iter().enumerate() {
            obj[1 + i * block + k] += v;
        }
    }
    tab.add_equality(norm)?;
    Ok(match tab.minimize(&obj)? {
        LpResult::Ok { value, .. } => {
            let mut g: Row = r
                .iter()
                .zip(f)
                .map(|(rv, fv)| value.denom() * rv - value.numer() * fv)
                .collect();
            make_primitive(&mut g);
            Some(g)
        }
        LpResult::Empty | LpResult::Unbounded => None,
    })
}

/// A facet of the hull of bounded pieces whose union is not contained in
/// any hyperplane.
///
/// Starts from the lower bound on the first variable and, while the face
/// it cuts out is contained in more than one independent hyperplane,
/// wraps it around one of the extra equalities. The dimension of the face
/// grows with every step.
pub(crate) fn initial_facet_constraint(
    pieces: &[BasicSet],
    n: usize,
    options: &Options,
) -> PolyResult<Row> {
    let mut obj = vec![BigInt::zero(); 1 + n];
    obj[1] = BigInt::one();
    let mut lower: Option<BigRational> = None;
    for p in pieces {
        match Tableau::from_basic_set(p, options).minimize(&obj)? {
            LpResult::Ok { value, .. } => {
                if lower.as_ref().map_or(true, |l| value < *l) {
                    lower = Some(value);
                }
            }
            LpResult::Unbounded => {
                return Err(PolyError::oracle("wrapping an unbounded piece"));
            }
            LpResult::Empty => {}
        }
    }
    let v = lower.ok_or_else(|| PolyError::oracle("wrapping an empty collection"))?;
    let mut c = vec![BigInt::zero(); 1 + n];
    c[0] = -v.numer().clone();
    c[1] = v.denom().clone();
    for _ in 0..=n {
        let face = face_pieces(pieces, &c, options)?;
        let eqs = common_equalities(&face, n);
        let independent = eqs.iter().find(|e| {
            RationalMatrix::from_int_rows(&[c.clone(), (*e).clone()], 1 + n).rank() == 2
        });
        let Some(e) = independent else {
            return Ok(c);
        };
        trace!("initial_facet_constraint: wrapping {:?} around {:?}", c, e);
        c = wrap_facet(pieces, &c, e, n, options)?
            .ok_or_else(|| PolyError::oracle("wrapping around an equality of a bounded face"))?;
    }
    Err(PolyError::oracle("initial facet search did not converge"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::polyhedral::space::Space;
    use crate::utils::arith::row_from_i64;

    fn rpiece(n: usize, eqs: &[&[i64]], ineqs: &[&[i64]]) -> BasicSet {
        BasicSet::from_i64(Space::set(n), eqs, ineqs).unwrap().into_rational()
    }

    fn unit_square(dx: i64) -> BasicSet {
        rpiece(2, &[], &[&[-dx, 1, 0], &[dx + 1, -1, 0], &[0, 0, 1], &[1, 0, -1]])
    }

    #[test]
    fn test_proto_hull_shared_directions() {
        let (facets, whole) = proto_hull(&[unit_square(0), unit_square(1)]);
        // y >= 0, y <= 1, x >= 0, x <= 2
        assert_eq!(facets.len(), 4);
        assert!(facets.contains(&row_from_i64(&[2, -1, 0])));
        assert!(facets.contains(&row_from_i64(&[0, 1, 0])));
        assert_eq!(whole, None);
    }

    #[test]
    fn test_proto_hull_detects_containing_piece() {
        let big = rpiece(2, &[], &[&[0, 1, 0], &[4, -1, 0], &[0, 0, 1], &[4, 0, -1]]);
        let (_, whole) = proto_hull(&[unit_square(1), big]);
        assert_eq!(whole, Some(1));
    }

    #[test]
    fn test_wrap_facet_rotates_to_neighbor() {
        // triangle (0,0), (2,0), (0,2) split into two pieces
        let a = rpiece(2, &[], &[&[0, 1, 0], &[0, 0, 1], &[1, -1, -1]]);
        let b = rpiece(2, &[&[-2, 1, 0]], &[&[0, 0, 1], &[0, 0, -1]]);
        let c = rpiece(2, &[&[-2, 0, 1]], &[&[0, 1, 0], &[0, -1, 0]]);
        let pieces = vec![a, b, c];
        // rotate y >= 0 around the ridge x <= 2 of the face y = 0
        let g = wrap_facet(&pieces, &row_from_i64(&[0, 0, 1]), &row_from_i64(&[2, -1, 0]), 2, &Options::default())
            .unwrap()
            .unwrap();
        assert_eq!(g, row_from_i64(&[2, -1, -1]));
    }

    #[test]
    fn test_initial_facet_is_valid() {
        let pieces = vec![
            rpiece(2, &[&[0, 1, 0], &[0, 0, 1]], &[]),
            rpiece(2, &[&[-2, 1, 0], &[-1, 0, 1]], &[]),
            rpiece(2, &[&[-1, 1, 0], &[-3, 0, 1]], &[]),
        ];
        let c = initial_facet_constraint(&pieces, 2, &Options::default()).unwrap();
        let pts = [[0i64, 0], [2, 1], [1, 3]];
        let zero = pts
            .iter()
            .filter(|p| {
                let v = &c[0] + &c[1] * BigInt::from(p[0]) + &c[2] * BigInt::from(p[1]);
                assert!(v >= BigInt::zero());
                v.is_zero()
            })
            .count();
        assert_eq!(zero, 2);
    }

    #[test]
    fn test_hull_wrap_triangle() {
        let pieces = vec![
            rpiece(2, &[&[0, 1, 0], &[0, 0, 1]], &[]),
            rpiece(2, &[&[-2, 1, 0], &[0, 0, 1]], &[]),
            rpiece(2, &[&[0, 1, 0], &[-2, 0, 1]], &[]),
        ];
        let hull = hull_wrap(pieces, 2, &Options::default()).unwrap();
        let mut rows = hull.ineqs().to_vec();
        rows.sort();
        let mut expected = vec![
            row_from_i64(&[0, 1, 0]),
            row_from_i64(&[0, 0, 1]),
            row_from_i64(&[2, -1, -1]),
        ];
        expected.sort();
        assert_eq!(rows, expected);
    }
}
