//! Integer sampling over a piece.
//!
//! Equalities are compressed away first, then a point is looked for with the
//! unit-box heuristic. Failing that, the directions in which the piece is
//! bounded are split from its recession cone by a unimodular change of
//! basis. A depth-first branch-and-bound over the LP relaxation samples the
//! bounded part, and the unit box finishes the unbounded part.

use crate::context::Options;
use crate::lp::{LpResult, Tableau};
use crate::polyhedral::basic_set::BasicSet;
use crate::utils::arith::{eval_int, Row};
use crate::utils::errors::{PolyError, PolyResult};
use crate::utils::matrix::{column_echelon, compress_equalities};
use log::trace;
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};

/// Whether the integer point satisfies every row of the piece.
fn satisfies(bset: &BasicSet, point: &[BigInt]) -> bool {
    point.len() == bset.n_var()
        && bset.eqs().iter().all(|r| eval_int(r, point).is_zero())
        && bset.ineqs().iter().all(|r| !eval_int(r, point).is_negative())
}

fn round_up(point: &[BigRational]) -> Vec<BigInt> {
    point.iter().map(|v| v.ceil().to_integer()).collect()
}

/// An integer point of the piece over all of its variables, divs included,
/// or `None` if it has none. The piece is treated as integer even if it is
/// flagged rational.
pub fn integer_sample(bset: &BasicSet, options: &Options) -> PolyResult<Option<Vec<BigInt>>> {
    if bset.is_marked_empty() {
        return Ok(None);
    }
    if let Some(cached) = bset.cached_sample() {
        if satisfies(bset, cached) {
            return Ok(Some(cached.to_vec()));
        }
    }
    let mut plain = bset.underlying();
    plain.flags.rational = false;
    plain.gauss();
    plain.normalize_constraints();
    if plain.is_marked_empty() {
        return Ok(None);
    }
    let n = plain.n_var();
    let Some(comp) = compress_equalities(plain.eqs(), n) else {
        return Ok(None);
    };
    let ineqs: Vec<Row> = plain.ineqs().iter().map(|r| comp.pull_row(r)).collect();
    let Some(z) = sample_inequalities(comp.n_free(), &ineqs, options)? else {
        return Ok(None);
    };
    Ok(Some(comp.push_point(&z)))
}

/// An integer point of `{ x : row . (1, x) >= 0 for every row }`.
pub(crate) fn sample_inequalities(
    n_var: usize,
    ineqs: &[Row],
    options: &Options,
) -> PolyResult<Option<Vec<BigInt>>> {
    if n_var == 0 {
        let feasible = ineqs.iter().all(|r| !r[0].is_negative());
        return Ok(feasible.then(Vec::new));
    }
    let mut tab = Tableau::new(n_var, options);
    for r in ineqs {
        tab.add_inequality(r.clone())?;
    }
    sample_tableau(&mut tab, options)
}

/// An integer point of an inequality-only tableau. Rows pushed while
/// branching are rolled back before returning.
pub(crate) fn sample_tableau(
    tab: &mut Tableau,
    options: &Options,
) -> PolyResult<Option<Vec<BigInt>>> {
    let Some(relaxed) = tab.sample()? else {
        return Ok(None);
    };
    if relaxed.iter().all(|v| v.is_integer()) {
        return Ok(Some(relaxed.iter().map(|v| v.to_integer()).collect()));
    }
    if let Some(p) = unit_box_point(tab, None, options)? {
        return Ok(Some(p));
    }
    let n = tab.n_var();
    let Some(implicit) = tab.recession_cone().implicit_equalities()? else {
        return Ok(None);
    };
    let flat: Vec<Row> = implicit.iter().map(|&k| tab.ineqs()[k][1..].to_vec()).collect();
    let (v, rank) = column_echelon(&flat, n);
    if rank == n {
        return branch_and_bound(tab, options);
    }
    trace!("sample_tableau: bounded in {} of {} directions", rank, n);
    sample_with_cone(tab, &v, rank, options)
}

/// Sample an unbounded inequality system in the coordinates `y` with
/// `x = V y`. The rows that only involve `y[..rank]` form a bounded system,
/// sampled on its own. With those coordinates fixed, the other rows have a
/// full-dimensional recession cone, so the unit box always finds a point.
fn sample_with_cone(
    tab: &Tableau,
    v: &[Row],
    rank: usize,
    options: &Options,
) -> PolyResult<Option<Vec<BigInt>>> {
    let n = tab.n_var();
    let transformed = tab.ineqs().iter().map(|r| {
        let mut t = vec![BigInt::zero(); 1 + n];
        t[0] = r[0].clone();
        for (a, vi) in r[1..].iter().zip(v) {
            if a.is_zero() {
                continue;
            }
            for (tj, vij) in t[1..].iter_mut().zip(vi) {
                *tj += a * vij;
            }
        }
        t
    });
    let (mut bounded, free): (Vec<Row>, Vec<Row>) =
        transformed.partition(|t| t[1 + rank..].iter().all(|c| c.is_zero()));
    for t in &mut bounded {
        t.truncate(1 + rank);
    }
    let Some(fixed) = sample_inequalities(rank, &bounded, options)? else {
        return Ok(None);
    };
    let mut rest = Tableau::new(n - rank, options);
    for t in &free {
        let constant = t[1..=rank]
            .iter()
            .zip(&fixed)
            .fold(t[0].clone(), |acc, (c, y)| acc + c * y);
        let mut row = Vec::with_capacity(1 + n - rank);
        row.push(constant);
        row.extend_from_slice(&t[1 + rank..]);
        rest.add_inequality(row)?;
    }
    let Some(along) = unit_box_point(&rest, None, options)? else {
        return Err(PolyError::oracle(
            "no integer point along the recession cone of a non-empty system",
        ));
    };
    let y: Vec<BigInt> = fixed.into_iter().chain(along).collect();
    Ok(Some(
        v.iter()
            .map(|vi| vi.iter().zip(&y).fold(BigInt::zero(), |acc, (c, yj)| acc + c * yj))
            .collect(),
    ))
}

/// Shrink every inequality so that a unit cube fits at each rational point
/// of the shrunk system, optimize over it and round the point up. The
/// result satisfies the original rows. `obj` is minimized when given.
pub(crate) fn unit_box_point(
    tab: &Tableau,
    obj: Option<&[BigInt]>,
    options: &Options,
) -> PolyResult<Option<Vec<BigInt>>> {
    let n = tab.n_var();
    let mut shrunk = Tableau::new(n, options);
    for r in tab.ineqs() {
        let mut row = r.clone();
        let slack: BigInt = r[1..].iter().filter(|v| v.is_negative()).sum();
        row[0] += slack;
        shrunk.add_inequality(row)?;
    }
    let zero = vec![BigInt::zero(); 1 + n];
    let res = shrunk.minimize(obj.unwrap_or(&zero))?;
    Ok(match res {
        LpResult::Ok { sample, .. } => Some(round_up(&sample)),
        LpResult::Empty | LpResult::Unbounded => None,
    })
}

fn branch_and_bound(tab: &mut Tableau, options: &Options) -> PolyResult<Option<Vec<BigInt>>> {
    let n = tab.n_var();
    let base = tab.snapshot();
    let mut stack: Vec<Vec<Row>> = vec![Vec::new()];
    let mut nodes = 0usize;
    let result = loop {
        let Some(cuts) = stack.pop() else {
            break None;
        };
        nodes += 1;
        if nodes > options.max_sample_nodes {
            tab.rollback(base);
            return Err(PolyError::oracle(format!(
                "integer sampling exceeded {} branch-and-bound nodes",
                options.max_sample_nodes
            )));
        }
        tab.rollback(base);
        for c in &cuts {
            tab.add_inequality(c.clone())?;
        }
        let Some(point) = tab.sample()? else {
            continue;
        };
        let Some(j) = point.iter().position(|v| !v.is_integer()) else {
            break Some(point.iter().map(|v| v.to_integer()).collect());
        };
        let lo = point[j].floor().to_integer();
        // x_j >= lo + 1
        let mut up = vec![BigInt::zero(); 1 + n];
        up[0] = -(&lo + BigInt::one());
        up[1 + j] = BigInt::one();
        // x_j <= lo
        let mut down = vec![BigInt::zero(); 1 + n];
        down[0] = lo;
        down[1 + j] = -BigInt::one();
        let mut up_cuts = cuts.clone();
        up_cuts.push(up);
        let mut down_cuts = cuts;
        down_cuts.push(down);
        stack.push(up_cuts);
        stack.push(down_cuts);
    };
    tab.rollback(base);
    trace!("branch_and_bound: {} nodes, found = {}", nodes, result.is_some());
    Ok(result)
}
