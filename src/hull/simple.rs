//! Cheap over-approximations of the hull.

use super::{common_equalities, lift, lower, rational_piece};
use crate::context::{Context, Options};
use crate::lp::{LpResult, Tableau};
use crate::polyhedral::basic_set::BasicSet;
use crate::polyhedral::redundancy::direction;
use crate::polyhedral::set::Set;
use crate::utils::arith::{make_primitive, Row};
use crate::utils::errors::PolyResult;
use log::debug;
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::Zero;
use rustc_hash::FxHashSet;

/// Loosest value of `min obj` over the tableaus, `None` if the objective
/// is unbounded below on one of them.
fn loosest_minimum(tabs: &[Tableau], obj: &[BigInt]) -> PolyResult<Option<BigRational>> {
    let mut worst: Option<BigRational> = None;
    for tab in tabs {
        match tab.minimize(obj)? {
            LpResult::Ok { value, .. } => {
                if worst.as_ref().map_or(true, |w| value < *w) {
                    worst = Some(value);
                }
            }
            LpResult::Unbounded => return Ok(None),
            LpResult::Empty => {}
        }
    }
    Ok(worst)
}

/// `row . (1, x) - value >= 0` scaled to integers.
fn shifted(linear: &[BigInt], value: &BigRational) -> Row {
    let mut out = Vec::with_capacity(1 + linear.len());
    out.push(-value.numer().clone());
    out.extend(linear.iter().map(|c| c * value.denom()));
    make_primitive(&mut out);
    out
}

/// A piece containing every piece of `set`, built from the constraints of
/// the pieces themselves.
///
/// Every inequality of a piece, and both senses of every equality, is
/// loosened until it holds on every other piece; directions unbounded on
/// some piece are dropped. The affine equalities shared by all pieces are
/// kept. The result is sound but need not be tight.
pub fn simple_hull(set: &Set, ctx: &Context) -> PolyResult<BasicSet> {
    let options = &ctx.options;
    let Some(lifted) = lift(set, options)? else {
        return Ok(BasicSet::empty(set.space().clone()));
    };
    let n = lifted.model.n_var();
    let mut pieces = Vec::with_capacity(lifted.pieces.len());
    for p in &lifted.pieces {
        let mut p = p.clone();
        p.detect_equalities(options)?;
        if !p.is_marked_empty() {
            pieces.push(p);
        }
    }
    if pieces.is_empty() {
        return Ok(BasicSet::empty(set.space().clone()));
    }
    let tabs: Vec<Tableau> = pieces.iter().map(|p| Tableau::from_basic_set(p, options)).collect();
    let mut seen: FxHashSet<Row> = FxHashSet::default();
    let mut ineqs = Vec::new();
    for p in &pieces {
        let negated = p.eqs().iter().map(|e| e.iter().map(|v| -v).collect::<Row>());
        let candidates: Vec<Row> = p.ineqs().iter().cloned().chain(p.eqs().iter().cloned()).chain(negated).collect();
        for row in candidates {
            let Some((dir, _)) = direction(&row) else {
                continue;
            };
            if !seen.insert(dir) {
                continue;
            }
            let mut obj = row.clone();
            obj[0] = BigInt::zero();
            if let Some(min) = loosest_minimum(&tabs, &obj)? {
                ineqs.push(shifted(&row[1..], &min));
            }
        }
    }
    debug!("simple_hull: {} bounds over {} variables", ineqs.len(), n);
    let eqs = common_equalities(&pieces, n);
    let mut hull = rational_piece(n, eqs, ineqs)?;
    hull.remove_redundancies(options)?;
    lower(hull, &lifted, options)
}

/// The simple hull, intersected for every set dimension it leaves
/// unbounded with the bounds of that dimension over the pieces, where
/// those exist.
pub fn bounded_simple_hull(set: &Set, ctx: &Context) -> PolyResult<BasicSet> {
    let options = &ctx.options;
    let mut hull = simple_hull(set, ctx)?;
    if hull.is_marked_empty() {
        return Ok(hull);
    }
    let n_dim = set.space().total_dim();
    let mut added = 0;
    for col in 1..=n_dim {
        for sign in [1i64, -1] {
            let mut obj = vec![BigInt::zero(); hull.width()];
            obj[col] = BigInt::from(sign);
            let hull_tab = Tableau::from_basic_set(&hull, options);
            if !matches!(hull_tab.minimize(&obj)?, LpResult::Unbounded) {
                continue;
            }
            if let Some(min) = piece_minimum(set, col, sign, options)? {
                let linear = &obj[1..];
                hull.add_inequality(shifted(linear, &min))?;
                added += 1;
            }
        }
    }
    if added > 0 {
        debug!("bounded_simple_hull: added {} bounds", added);
        hull.finalize(options)?;
    }
    Ok(hull)
}

/// Loosest minimum of `sign * x_col` over the pieces of `set`.
fn piece_minimum(set: &Set, col: usize, sign: i64, options: &Options) -> PolyResult<Option<BigRational>> {
    let tabs: Vec<Tableau> = set
        .pieces()
        .iter()
        .filter(|p| !p.is_marked_empty())
        .map(|p| Tableau::from_basic_set(p, options))
        .collect();
    let mut worst: Option<BigRational> = None;
    for tab in &tabs {
        let mut obj = vec![BigInt::zero(); 1 + tab.n_var()];
        obj[col] = BigInt::from(sign);
        match tab.minimize(&obj)? {
            LpResult::Ok { value, .. } => {
                if worst.as_ref().map_or(true, |w| value < *w) {
                    worst = Some(value);
                }
            }
            LpResult::Unbounded => return Ok(None),
            LpResult::Empty => {}
        }
    }
    Ok(worst)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::polyhedral::operations::{box_set, is_subset};
    use crate::polyhedral::space::Space;
    use crate::utils::arith::int;

    fn pt(v: &[i64]) -> Vec<BigInt> {
        v.iter().map(|&x| int(x)).collect()
    }

    #[test]
    fn test_simple_hull_of_boxes_is_exact() {
        let set = Set::from_pieces(
            Space::set(2),
            vec![box_set(&[(0, 1), (0, 1)]), box_set(&[(1, 2), (0, 1)])],
        )
        .unwrap();
        let hull = simple_hull(&set, &Context::new()).unwrap();
        let expected = box_set(&[(0, 2), (0, 1)]);
        let opts = Options::default();
        assert!(is_subset(&hull, &expected, &opts).unwrap());
        assert!(is_subset(&expected, &hull, &opts).unwrap());
    }

    #[test]
    fn test_simple_hull_contains_every_piece() {
        // a triangle and a box: the simple hull is looser than the hull
        let tri = BasicSet::from_i64(Space::set(2), &[], &[&[0, 1, 0], &[0, 0, 1], &[2, -1, -1]]).unwrap();
        let set = Set::from_pieces(Space::set(2), vec![tri, box_set(&[(3, 4), (3, 4)])]).unwrap();
        let ctx = Context::new();
        let hull = simple_hull(&set, &ctx).unwrap();
        let opts = Options::default();
        for p in set.pieces() {
            assert!(is_subset(p, &hull, &opts).unwrap());
        }
        let exact = crate::hull::convex_hull(&set, &ctx).unwrap();
        assert!(is_subset(&exact, &hull, &opts).unwrap());
        assert!(hull.contains(&pt(&[0, 4])).unwrap());
        assert!(!exact.contains(&pt(&[0, 4])).unwrap());
    }

    #[test]
    fn test_simple_hull_drops_unbounded_directions() {
        // x >= 0, y = 0 and x <= 0, y = 1
        let a = BasicSet::from_i64(Space::set(2), &[&[0, 0, 1]], &[&[0, 1, 0]]).unwrap();
        let b = BasicSet::from_i64(Space::set(2), &[&[-1, 0, 1]], &[&[0, -1, 0]]).unwrap();
        let set = Set::from_pieces(Space::set(2), vec![a, b]).unwrap();
        let hull = simple_hull(&set, &Context::new()).unwrap();
        assert!(hull.contains(&pt(&[-100, 0])).unwrap());
        assert!(hull.contains(&pt(&[100, 1])).unwrap());
        assert!(!hull.contains(&pt(&[0, 2])).unwrap());
    }

    #[test]
    fn test_bounded_simple_hull() {
        // the unit box union the ray x >= 0, y = 5: x stays unbounded
        let unit = box_set(&[(0, 1), (0, 1)]);
        let ray = BasicSet::from_i64(Space::set(2), &[&[-5, 0, 1]], &[&[0, 1, 0]]).unwrap();
        let set = Set::from_pieces(Space::set(2), vec![unit, ray]).unwrap();
        let hull = bounded_simple_hull(&set, &Context::new()).unwrap();
        assert!(hull.contains(&pt(&[1000, 5])).unwrap());
        assert!(!hull.contains(&pt(&[0, 6])).unwrap());
        assert!(!hull.contains(&pt(&[-1, 0])).unwrap());
    }

    #[test]
    fn test_bounded_simple_hull_adds_projection_bounds() {
        // 0 <= x + z <= 1, 0 <= x - z <= 1 with y free, and the same with
        // y and z swapped: every slanted bound is unbounded on the other
        // piece, so the simple hull is the universe, yet 0 <= x <= 1
        let a = BasicSet::from_i64(
            Space::set(3),
            &[],
            &[&[0, 1, 0, 1], &[1, -1, 0, -1], &[0, 1, 0, -1], &[1, -1, 0, 1]],
        )
        .unwrap();
        let b = BasicSet::from_i64(
            Space::set(3),
            &[],
            &[&[0, 1, 1, 0], &[1, -1, -1, 0], &[0, 1, -1, 0], &[1, -1, 1, 0]],
        )
        .unwrap();
        let set = Set::from_pieces(Space::set(3), vec![a, b]).unwrap();
        let ctx = Context::new();
        let simple = simple_hull(&set, &ctx).unwrap();
        assert!(simple.contains(&pt(&[2, 0, 0])).unwrap());
        let hull = bounded_simple_hull(&set, &ctx).unwrap();
        assert!(hull.contains(&pt(&[1, 50, -50])).unwrap());
        assert!(!hull.contains(&pt(&[2, 0, 0])).unwrap());
        assert!(!hull.contains(&pt(&[-1, 0, 0])).unwrap());
        let opts = Options::default();
        for p in set.pieces() {
            assert!(is_subset(p, &hull, &opts).unwrap());
        }
    }
}
