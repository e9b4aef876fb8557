//! Property-based tests for the constraint engine.
//!
//! Small random pieces are checked against brute-force enumeration of their
//! integer points on a grid, or of rational points on a half-integer grid.

use num_bigint::BigInt;
use num_rational::BigRational;
use polyengine::polyhedral::operations::{box_set, is_subset};
use polyengine::prelude::*;
use proptest::prelude::*;

// ============================================================================
// Helper functions
// ============================================================================

const GRID: i64 = 4;

fn pt(v: &[i64]) -> Vec<BigInt> {
    v.iter().map(|&x| BigInt::from(x)).collect()
}

/// The grid box intersected with the given extra inequalities.
fn grid_piece(extra: &[[i64; 3]]) -> BasicSet {
    let mut bset = box_set(&[(-GRID, GRID), (-GRID, GRID)]);
    for r in extra {
        bset.add_inequality(pt(r)).unwrap();
    }
    bset
}

fn grid_points() -> impl Iterator<Item = [i64; 2]> {
    (-GRID..=GRID).flat_map(|x| (-GRID..=GRID).map(move |y| [x, y]))
}

fn holds(r: &[i64; 3], p: &[i64; 2]) -> bool {
    r[0] + r[1] * p[0] + r[2] * p[1] >= 0
}

fn arb_row() -> impl Strategy<Value = [i64; 3]> {
    (-6i64..=6, -3i64..=3, -3i64..=3).prop_map(|(c, a, b)| [c, a, b])
}

/// Points of the grid with half-integer coordinates.
fn half_grid_points() -> impl Iterator<Item = Vec<BigRational>> {
    let half = |v: i64| BigRational::new(BigInt::from(v), BigInt::from(2));
    (-2 * GRID..=2 * GRID).flat_map(move |x| (-2 * GRID..=2 * GRID).map(move |y| vec![half(x), half(y)]))
}

/// `a x + b y = r (mod m)`
type Congruence = (i64, i64, i64, i64);

fn arb_congruence() -> impl Strategy<Value = Congruence> {
    (2i64..=4, -3i64..=3, -3i64..=3, 0i64..4).prop_map(|(m, a, b, r)| (a, b, r % m, m))
}

fn congruent(c: &Congruence, p: &[i64; 2]) -> bool {
    let (a, b, r, m) = *c;
    (a * p[0] + b * p[1] - r).rem_euclid(m) == 0
}

/// Extra inequalities over the whole plane, each congruence through a fresh
/// div that occurs in one equality only.
fn plane_piece(extra: &[[i64; 3]], congruences: &[Congruence]) -> BasicSet {
    let mut bset = BasicSet::universe(Space::set(2));
    for _ in congruences {
        bset.alloc_div();
    }
    for r in extra {
        let mut row = pt(r);
        row.resize(bset.width(), BigInt::from(0));
        bset.add_inequality(row).unwrap();
    }
    for (i, &(a, b, r, m)) in congruences.iter().enumerate() {
        let mut row = pt(&[-r, a, b]);
        row.resize(bset.width(), BigInt::from(0));
        row[bset.div_col(i)] = BigInt::from(-m);
        bset.add_equality(row).unwrap();
    }
    bset
}

fn arb_box() -> impl Strategy<Value = [(i64, i64); 2]> {
    ((-3i64..=3, 0i64..=3), (-3i64..=3, 0i64..=3))
        .prop_map(|((x, w), (y, h))| [(x, x + w), (y, y + h)])
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_finalize_preserves_points(extra in prop::collection::vec(arb_row(), 0..4)) {
        let bset = grid_piece(&extra);
        let mut simplified = bset.clone();
        simplified.finalize(&Options::default()).unwrap();
        for p in grid_points() {
            let expected = extra.iter().all(|r| holds(r, &p));
            prop_assert_eq!(simplified.contains(&pt(&p)).unwrap(), expected);
        }
    }

    #[test]
    fn prop_minimum_matches_enumeration(
        extra in prop::collection::vec(arb_row(), 0..3),
        obj in (-3i64..=3, -3i64..=3),
    ) {
        let bset = grid_piece(&extra);
        let objective = pt(&[0, obj.0, obj.1]);
        let brute = grid_points()
            .filter(|p| extra.iter().all(|r| holds(r, p)))
            .map(|p| obj.0 * p[0] + obj.1 * p[1])
            .min();
        match minimize(&bset, &objective, &Options::default()).unwrap() {
            IlpResult::Ok { value, point } => {
                prop_assert_eq!(Some(value), brute.map(BigInt::from));
                prop_assert!(bset.contains(&point).unwrap());
            }
            IlpResult::Empty => prop_assert_eq!(brute, None),
            IlpResult::Unbounded => prop_assert!(false, "bounded piece reported unbounded"),
        }
    }

    #[test]
    fn prop_hull_contains_pieces(a in arb_box(), b in arb_box()) {
        let set = Set::from_pieces(Space::set(2), vec![box_set(&a), box_set(&b)]).unwrap();
        let ctx = Context::new();
        let hull = convex_hull(&set, &ctx).unwrap();
        for p in set.pieces() {
            prop_assert!(is_subset(p, &hull, &ctx.options).unwrap());
        }
        // the bounding box of the union contains the hull
        let bbox = box_set(&[
            (a[0].0.min(b[0].0), a[0].1.max(b[0].1)),
            (a[1].0.min(b[1].0), a[1].1.max(b[1].1)),
        ]);
        prop_assert!(is_subset(&hull, &bbox, &ctx.options).unwrap());
    }

    #[test]
    fn prop_hull_strategies_agree(a in arb_box(), b in arb_box()) {
        let set = Set::from_pieces(Space::set(2), vec![box_set(&a), box_set(&b)]).unwrap();
        let wrap = convex_hull(&set, &Context::new()).unwrap();
        let fm = convex_hull(&set, &Context::new().with_hull_strategy(HullStrategy::FourierMotzkin)).unwrap();
        let opts = Options::default();
        prop_assert!(is_subset(&wrap, &fm, &opts).unwrap());
        prop_assert!(is_subset(&fm, &wrap, &opts).unwrap());
    }

    #[test]
    fn prop_simple_hull_contains_hull(a in arb_box(), b in arb_box()) {
        let set = Set::from_pieces(Space::set(2), vec![box_set(&a), box_set(&b)]).unwrap();
        let ctx = Context::new();
        let hull = convex_hull(&set, &ctx).unwrap();
        let simple = simple_hull(&set, &ctx).unwrap();
        prop_assert!(is_subset(&hull, &simple, &ctx.options).unwrap());
    }

    #[test]
    fn prop_simplify_with_divs_is_idempotent(
        extra in prop::collection::vec(arb_row(), 0..3),
        congruences in prop::collection::vec(arb_congruence(), 1..3),
    ) {
        let bset = plane_piece(&extra, &congruences);
        let mut once = bset.clone();
        once.simplify();
        let mut twice = once.clone();
        twice.simplify();
        prop_assert_eq!(&twice, &once);
        let mut finalized = bset;
        finalized.finalize(&Options::default()).unwrap();
        for p in grid_points() {
            let expected = extra.iter().all(|r| holds(r, &p))
                && congruences.iter().all(|c| congruent(c, &p));
            prop_assert_eq!(once.contains(&pt(&p)).unwrap(), expected);
            prop_assert_eq!(finalized.contains(&pt(&p)).unwrap(), expected);
        }
    }

    #[test]
    fn prop_gauss_and_redundancy_keep_rational_points(
        extra in prop::collection::vec(arb_row(), 0..4),
        eq in prop::option::of(arb_row()),
    ) {
        let mut bset = grid_piece(&extra);
        if let Some(e) = &eq {
            bset.add_equality(pt(e)).unwrap();
        }
        let bset = bset.into_rational();
        let mut reduced = bset.clone();
        reduced.gauss();
        let mut pruned = bset.clone();
        pruned.remove_redundancies(&Options::default()).unwrap();
        for p in half_grid_points() {
            let expected = bset.contains_rational(&p).unwrap();
            prop_assert_eq!(reduced.contains_rational(&p).unwrap(), expected);
            prop_assert_eq!(pruned.contains_rational(&p).unwrap(), expected);
        }
        prop_assert!(pruned.ineqs().len() <= bset.ineqs().len());
        if !pruned.is_marked_empty() {
            let mut again = BasicSet::from_rows(
                Space::set(2),
                pruned.eqs().to_vec(),
                pruned.ineqs().to_vec(),
            )
            .unwrap()
            .into_rational();
            again.remove_redundancies(&Options::default()).unwrap();
            prop_assert_eq!(again.ineqs(), pruned.ineqs());
            prop_assert_eq!(again.eqs(), pruned.eqs());
        }
    }

    #[test]
    fn prop_minimum_on_unbounded_pieces(
        extra in prop::collection::vec(arb_row(), 0..3),
        congruence in prop::option::of(arb_congruence()),
        obj in (0i64..=3, 0i64..=3),
    ) {
        // x, y >= -GRID with a non-negative objective: bounded below only
        let mut rows = extra.clone();
        rows.push([GRID, 1, 0]);
        rows.push([GRID, 0, 1]);
        let congruences: Vec<Congruence> = congruence.into_iter().collect();
        let bset = plane_piece(&rows, &congruences);
        let mut objective = pt(&[0, obj.0, obj.1]);
        objective.resize(bset.width(), BigInt::from(0));
        let window = (-GRID..=3 * GRID).flat_map(|x| (-GRID..=3 * GRID).map(move |y| [x, y]));
        let brute = window
            .filter(|p| rows.iter().all(|r| holds(r, p)) && congruences.iter().all(|c| congruent(c, p)))
            .map(|p| obj.0 * p[0] + obj.1 * p[1])
            .min();
        match minimize(&bset, &objective, &Options::default()).unwrap() {
            IlpResult::Ok { value, point } => {
                prop_assert!(bset.contains(&point[..2]).unwrap());
                prop_assert!(value >= BigInt::from(-(obj.0 + obj.1) * GRID));
                if let Some(b) = brute {
                    prop_assert!(value <= BigInt::from(b));
                }
            }
            IlpResult::Empty => prop_assert_eq!(brute, None),
            IlpResult::Unbounded => prop_assert!(false, "objective is bounded below"),
        }
    }
}
