//! Convex hull engine.
//!
//! The hull of a collection is computed on the rational relaxation of its
//! pieces after their divs have been aligned: parameters and divs become
//! plain variables, the hull is computed over those variables and the
//! result is placed back in the original space with the shared divs.
//!
//! The variable-level entry point is [`uset_convex_hull`]. It factors out
//! the affine hull shared by all pieces, handles one dimension directly and
//! otherwise dispatches on boundedness and on [`HullStrategy`]:
//! - bounded collections are wrapped ([`wrap`])
//! - a lineality space common to all pieces is projected out
//! - the remaining pieces are folded pairwise, each pair either turned
//!   into a pair of polytopes along a valid direction ([`unbounded`]) or
//!   combined by Fourier-Motzkin elimination ([`fm`])

pub mod fm;
pub mod simple;
pub mod unbounded;
pub mod wrap;

pub use simple::{bounded_simple_hull, simple_hull};

use crate::context::{Context, HullStrategy, Options};
use crate::lp::{LpResult, Tableau};
use crate::polyhedral::basic_set::BasicSet;
use crate::polyhedral::operations;
use crate::polyhedral::set::Set;
use crate::polyhedral::space::Space;
use crate::utils::arith::{make_primitive, rational_to_integer_row, to_rational_row, Row};
use crate::utils::errors::{PolyError, PolyResult};
use crate::utils::matrix::RationalMatrix;
use log::debug;
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Zero};

/// A collection lifted to plain variables, together with the piece whose
/// space and divs the result is placed back into.
pub(crate) struct Lifted {
    pub(crate) model: BasicSet,
    pub(crate) pieces: Vec<BasicSet>,
    rational: bool,
}

/// Drop empty pieces, align the divs of the rest and take the rational
/// relaxation of each over all of its variables. `None` if no piece has a
/// point.
pub(crate) fn lift(set: &Set, options: &Options) -> PolyResult<Option<Lifted>> {
    let mut set = set.clone();
    set.simplify();
    let mut kept = Vec::with_capacity(set.n_pieces());
    for p in set.pieces() {
        if !operations::is_empty(p, options)? {
            kept.push(BasicSet::clone(p));
        }
    }
    if kept.is_empty() {
        return Ok(None);
    }
    let aligned = Set::from_pieces(set.space().clone(), kept)?.align_divs()?;
    let rational = aligned.pieces().iter().all(|p| p.is_rational());
    let mut model = BasicSet::universe(set.space().clone());
    model.divs = aligned.pieces()[0].divs().to_vec();
    let pieces = aligned
        .into_pieces()
        .into_iter()
        .map(|p| p.underlying().into_rational())
        .collect();
    Ok(Some(Lifted {
        model,
        pieces,
        rational,
    }))
}

/// Place a hull over the lifted variables back into the space of the
/// collection.
pub(crate) fn lower(hull: BasicSet, lifted: &Lifted, options: &Options) -> PolyResult<BasicSet> {
    let mut out = hull.overlying(&lifted.model)?;
    out.flags.rational = lifted.rational;
    out.flags.clear_derived();
    out.finalize(options)?;
    Ok(out)
}

/// The smallest piece containing every piece of `set`.
///
/// Integer pieces are hulled through their rational relaxation, so the
/// result contains every integer point of the input and may contain more.
pub fn convex_hull(set: &Set, ctx: &Context) -> PolyResult<BasicSet> {
    let options = &ctx.options;
    let Some(lifted) = lift(set, options)? else {
        return Ok(BasicSet::empty(set.space().clone()));
    };
    debug!(
        "convex_hull: {} pieces over {} variables",
        lifted.pieces.len(),
        lifted.model.n_var()
    );
    let hull = uset_convex_hull(lifted.pieces.clone(), lifted.model.n_var(), options)?;
    lower(hull, &lifted, options)
}

/// A rational div-free piece over `n` variables.
pub(crate) fn rational_piece(n: usize, eqs: Vec<Row>, ineqs: Vec<Row>) -> PolyResult<BasicSet> {
    Ok(BasicSet::from_rows(Space::set(n), eqs, ineqs)?.into_rational())
}

/// Integer row proportional to a rational one, made primitive.
pub(crate) fn integer_row(v: &[BigRational]) -> Row {
    let mut row = rational_to_integer_row(v);
    make_primitive(&mut row);
    row
}

/// Whether every piece is bounded.
pub(crate) fn all_bounded(pieces: &[BasicSet], options: &Options) -> PolyResult<bool> {
    for p in pieces {
        if !Tableau::from_basic_set(p, options).is_bounded()? {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Convex hull of rational div-free pieces over `n` variables, as a
/// rational piece with no redundant inequalities.
pub fn uset_convex_hull(pieces: Vec<BasicSet>, n: usize, options: &Options) -> PolyResult<BasicSet> {
    let mut live = Vec::with_capacity(pieces.len());
    for mut p in pieces {
        p.flags.rational = true;
        p.detect_equalities(options)?;
        if !p.is_marked_empty() {
            live.push(p);
        }
    }
    if live.is_empty() {
        return Ok(BasicSet::empty(Space::set(n)).into_rational());
    }
    if n == 0 {
        return Ok(BasicSet::universe(Space::set(0)).into_rational());
    }
    if live.len() == 1 {
        let mut only = live.remove(0);
        only.remove_redundancies(options)?;
        return Ok(only);
    }
    let eqs = common_equalities(&live, n);
    if !eqs.is_empty() {
        debug!("uset_convex_hull: {} common equalities over {} variables", eqs.len(), n);
        return hull_in_affine_hull(live, n, eqs, options);
    }
    if n == 1 {
        return hull_1d(&live, options);
    }
    if options.hull_strategy == HullStrategy::FourierMotzkin {
        debug!("uset_convex_hull: pairwise elimination of {} pieces", live.len());
        return fold_pairs(live, n, options, fm::fm_pair);
    }
    if all_bounded(&live, options)? {
        debug!("uset_convex_hull: wrapping {} bounded pieces", live.len());
        return wrap::hull_wrap(live, n, options);
    }
    if let Some(hull) = unbounded::hull_modulo_lineality(&live, n, options)? {
        return Ok(hull);
    }
    fold_pairs(live, n, options, unbounded::hull_pair)
}

fn fold_pairs<F>(pieces: Vec<BasicSet>, n: usize, options: &Options, pair: F) -> PolyResult<BasicSet>
where
    F: Fn(BasicSet, BasicSet, usize, &Options) -> PolyResult<BasicSet>,
{
    let mut iter = pieces.into_iter();
    let Some(mut acc) = iter.next() else {
        return Ok(BasicSet::empty(Space::set(n)).into_rational());
    };
    for p in iter {
        acc = pair(acc, p, n, options)?;
    }
    acc.remove_redundancies(options)?;
    Ok(acc)
}

/// The affine equalities satisfied by every piece. Each piece must have
/// had its implicit equalities detected.
pub(crate) fn common_equalities(pieces: &[BasicSet], n: usize) -> Vec<Row> {
    let mut spanning: Vec<Vec<BigRational>> = Vec::new();
    for p in pieces {
        if p.eqs().is_empty() {
            return Vec::new();
        }
        spanning.extend(RationalMatrix::from_int_rows(p.eqs(), 1 + n).nullspace());
    }
    RationalMatrix::from_rows(spanning, 1 + n)
        .nullspace()
        .iter()
        .map(|v| integer_row(v))
        .collect()
}

/// A rational point of `{ x : eqs . (1, x) = 0 }`.
fn particular_solution(eqs: &[Row], n: usize) -> Option<Vec<BigRational>> {
    let aug: Vec<Vec<BigRational>> = eqs
        .iter()
        .map(|e| {
            let mut r = to_rational_row(&e[1..]);
            r.push(-BigRational::from_integer(e[0].clone()));
            r
        })
        .collect();
    let (r, pivots) = RationalMatrix::from_rows(aug, n + 1).rref();
    if pivots.last() == Some(&n) {
        return None;
    }
    let mut x0 = vec![BigRational::zero(); n];
    for (i, &p) in pivots.iter().enumerate() {
        x0[p] = r.rows()[i][n].clone();
    }
    Some(x0)
}

/// Hull of pieces that share the affine equalities `eqs`: parametrize the
/// common affine subspace as `x = x0 + T z`, hull in `z` and map back
/// through a left inverse of `T`.
fn hull_in_affine_hull(
    pieces: Vec<BasicSet>,
    n: usize,
    eqs: Vec<Row>,
    options: &Options,
) -> PolyResult<BasicSet> {
    let x0 = particular_solution(&eqs, n)
        .ok_or_else(|| PolyError::oracle("common equalities of nonempty pieces are inconsistent"))?;
    let linear: Vec<Row> = eqs.iter().map(|e| e[1..].to_vec()).collect();
    let dirs: Vec<Row> = RationalMatrix::from_int_rows(&linear, n)
        .nullspace()
        .iter()
        .map(|v| integer_row(v))
        .collect();
    let m = dirs.len();
    if m == 0 {
        return rational_piece(n, eqs, Vec::new());
    }
    let t_rows: Vec<Row> = (0..n)
        .map(|i| dirs.iter().map(|d| d[i].clone()).collect())
        .collect();
    let t = RationalMatrix::from_int_rows(&t_rows, m);
    let push = |row: &Row| -> Row {
        let a = to_rational_row(&row[1..]);
        let mut out = Vec::with_capacity(1 + m);
        let shift: BigRational = a.iter().zip(&x0).map(|(c, v)| c * v).sum();
        out.push(BigRational::from_integer(row[0].clone()) + shift);
        out.extend(dirs.iter().map(|d| {
            row[1..]
                .iter()
                .zip(d)
                .fold(BigInt::zero(), |acc, (c, v)| acc + c * v)
        }).map(BigRational::from_integer));
        integer_row(&out)
    };
    let reduced: Vec<BasicSet> = pieces
        .iter()
        .map(|p| {
            rational_piece(
                m,
                p.eqs().iter().map(push).collect(),
                p.ineqs().iter().map(push).collect(),
            )
        })
        .collect::<PolyResult<_>>()?;
    let hull = uset_convex_hull(reduced, m, options)?;
    if hull.is_marked_empty() {
        return Ok(BasicSet::empty(Space::set(n)).into_rational());
    }
    let left = t
        .left_inverse()
        .ok_or_else(|| PolyError::oracle("affine hull basis is not of full column rank"))?;
    let pull = |row: &Row| -> PolyResult<Row> {
        let b = left
            .left_mul_vec(&to_rational_row(&row[1..]))
            .ok_or_else(|| PolyError::oracle("dimension mismatch in affine hull pullback"))?;
        let shift: BigRational = b.iter().zip(&x0).map(|(c, v)| c * v).sum();
        let mut out = Vec::with_capacity(1 + n);
        out.push(BigRational::from_integer(row[0].clone()) - shift);
        out.extend(b);
        Ok(integer_row(&out))
    };
    let mut out_eqs = eqs;
    for row in hull.eqs() {
        out_eqs.push(pull(row)?);
    }
    let out_ineqs = hull.ineqs().iter().map(pull).collect::<PolyResult<Vec<_>>>()?;
    let mut out = rational_piece(n, out_eqs, out_ineqs)?;
    out.gauss();
    out.normalize_constraints();
    out.flags.no_redundant = true;
    out.flags.no_implicit = true;
    Ok(out)
}

/// Hull of pieces over a single variable: the interval spanned by their
/// minima and maxima.
fn hull_1d(pieces: &[BasicSet], options: &Options) -> PolyResult<BasicSet> {
    let x = vec![BigInt::zero(), BigInt::one()];
    let mut lower: Option<BigRational> = None;
    let mut upper: Option<BigRational> = None;
    let mut lower_unbounded = false;
    let mut upper_unbounded = false;
    for p in pieces {
        let tab = Tableau::from_basic_set(p, options);
        match tab.minimize(&x)? {
            LpResult::Ok { value, .. } => {
                if lower.as_ref().map_or(true, |l| value < *l) {
                    lower = Some(value);
                }
            }
            LpResult::Unbounded => lower_unbounded = true,
            LpResult::Empty => continue,
        }
        match tab.maximize(&x)? {
            LpResult::Ok { value, .. } => {
                if upper.as_ref().map_or(true, |u| value > *u) {
                    upper = Some(value);
                }
            }
            LpResult::Unbounded => upper_unbounded = true,
            LpResult::Empty => {}
        }
    }
    let bound = |v: &BigRational, sign: i64| -> Row {
        // sign * (x - v) >= 0
        let s = BigInt::from(sign);
        vec![-(&s * v.numer()), &s * v.denom()]
    };
    let lower = lower.filter(|_| !lower_unbounded);
    let upper = upper.filter(|_| !upper_unbounded);
    match (lower, upper) {
        (Some(l), Some(u)) if l == u => rational_piece(1, vec![bound(&l, 1)], Vec::new()),
        (l, u) => {
            let mut ineqs = Vec::new();
            if let Some(l) = l {
                ineqs.push(bound(&l, 1));
            }
            if let Some(u) = u {
                ineqs.push(bound(&u, -1));
            }
            let mut out = rational_piece(1, Vec::new(), ineqs)?;
            out.flags.no_redundant = true;
            out.flags.no_implicit = true;
            Ok(out)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::polyhedral::operations::box_set;
    use crate::utils::arith::{int, row_from_i64};

    fn rpiece(n: usize, eqs: &[&[i64]], ineqs: &[&[i64]]) -> BasicSet {
        BasicSet::from_i64(Space::set(n), eqs, ineqs).unwrap().into_rational()
    }

    fn contains_all(hull: &BasicSet, pts: &[&[i64]]) {
        for p in pts {
            let p: Vec<BigInt> = p.iter().map(|&v| int(v)).collect();
            assert!(hull.contains(&p).unwrap(), "{:?} not in {}", p, hull);
        }
    }

    #[test]
    fn test_two_boxes() {
        let set = Set::from_pieces(
            Space::set(2),
            vec![box_set(&[(0, 1), (0, 1)]), box_set(&[(1, 2), (0, 1)])],
        )
        .unwrap();
        let hull = convex_hull(&set, &Context::new()).unwrap();
        let expected = box_set(&[(0, 2), (0, 1)]);
        let opts = Options::default();
        assert!(operations::is_subset(&hull, &expected, &opts).unwrap());
        assert!(operations::is_subset(&expected, &hull, &opts).unwrap());
        assert_eq!(hull.ineqs().len(), 4);
        assert!(hull.eqs().is_empty());
    }

    #[test]
    fn test_two_points() {
        let p = |x: i64, y: i64| BasicSet::from_i64(Space::set(2), &[&[-x, 1, 0], &[-y, 0, 1]], &[]).unwrap();
        let set = Set::from_pieces(Space::set(2), vec![p(0, 0), p(2, 2)]).unwrap();
        let hull = convex_hull(&set, &Context::new()).unwrap();
        assert_eq!(hull.eqs().len(), 1);
        assert_eq!(hull.ineqs().len(), 2);
        contains_all(&hull, &[&[0, 0], &[1, 1], &[2, 2]]);
        assert!(!hull.contains(&[int(3), int(3)]).unwrap());
        assert!(!hull.contains(&[int(1), int(0)]).unwrap());
    }

    #[test]
    fn test_common_equalities() {
        let a = rpiece(3, &[&[0, 0, 0, 1]], &[&[0, 1, 0, 0]]);
        let b = rpiece(3, &[&[0, 0, 0, 1], &[-1, 0, 1, 0]], &[]);
        let eqs = common_equalities(&[a.clone(), b], 3);
        assert_eq!(eqs, vec![row_from_i64(&[0, 0, 0, 1])]);
        let c = rpiece(3, &[], &[&[0, 1, 0, 0]]);
        assert!(common_equalities(&[a, c], 3).is_empty());
    }

    #[test]
    fn test_hull_1d() {
        let opts = Options::default();
        let pieces = vec![rpiece(1, &[], &[&[-1, 2], &[3, -1]]), rpiece(1, &[&[-7, 1]], &[])];
        let hull = uset_convex_hull(pieces, 1, &opts).unwrap();
        // 1/2 <= x <= 7
        assert_eq!(hull.ineqs(), &[row_from_i64(&[-1, 2]), row_from_i64(&[7, -1])]);

        let pieces = vec![rpiece(1, &[], &[&[0, 1]]), rpiece(1, &[&[5, 1]], &[])];
        let hull = uset_convex_hull(pieces, 1, &opts).unwrap();
        assert_eq!(hull.ineqs(), &[row_from_i64(&[5, 1])]);
    }

    #[test]
    fn test_empty_pieces_are_ignored() {
        let set = Set::from_pieces(
            Space::set(1),
            vec![
                box_set(&[(0, 3)]),
                BasicSet::from_i64(Space::set(1), &[&[-1, 2]], &[]).unwrap(),
            ],
        )
        .unwrap();
        let hull = convex_hull(&set, &Context::new()).unwrap();
        assert_eq!(hull, box_set(&[(0, 3)]).simplified());
        let none = Set::empty(Space::set(2));
        assert!(convex_hull(&none, &Context::new()).unwrap().is_marked_empty());
    }

    #[test]
    fn test_strategies_agree() {
        let set = Set::from_pieces(
            Space::set(2),
            vec![box_set(&[(0, 2), (0, 0)]), box_set(&[(1, 1), (3, 3)])],
        )
        .unwrap();
        let opts = Options::default();
        let wrap = convex_hull(&set, &Context::new()).unwrap();
        let fm = convex_hull(&set, &Context::new().with_hull_strategy(HullStrategy::FourierMotzkin)).unwrap();
        assert!(operations::is_subset(&wrap, &fm, &opts).unwrap());
        assert!(operations::is_subset(&fm, &wrap, &opts).unwrap());
        contains_all(&wrap, &[&[0, 0], &[2, 0], &[1, 3], &[1, 1]]);
        assert!(!wrap.contains(&[int(0), int(1)]).unwrap());
    }
}
