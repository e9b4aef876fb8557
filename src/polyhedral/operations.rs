//! Polyhedral operations on pieces: intersection, projection, emptiness,
//! boundedness and inclusion.

use crate::context::Options;
use crate::ilp::sample::integer_sample;
use crate::ilp::{minimize, IlpResult};
use crate::lp::Tableau;
use crate::polyhedral::basic_set::{BasicSet, Div};
use crate::polyhedral::space::{DimType, Space};
use crate::utils::arith::Row;
use crate::utils::errors::{PolyError, PolyResult};
use num_bigint::BigInt;
use num_traits::{Signed, Zero};

/// Rewrite a row under a column permutation: entry `j` moves to `perm[j]`.
fn permute_row(row: &[BigInt], perm: &[usize], width: usize) -> Row {
    let mut out = vec![BigInt::zero(); width];
    for (j, v) in row.iter().enumerate() {
        if !v.is_zero() {
            out[perm[j]] = v.clone();
        }
    }
    out
}

/// Intersection of two pieces of the same space. The divs of `b` are
/// placed after those of `a`.
pub fn intersect(a: &BasicSet, b: &BasicSet) -> PolyResult<BasicSet> {
    a.space().check_compatible(b.space())?;
    if a.is_marked_empty() {
        return Ok(a.clone());
    }
    if b.is_marked_empty() {
        return Ok(b.clone());
    }
    let n = a.space().total_dim();
    let width = a.width() + b.n_div();
    let mut out = a.clone();
    for row in out.eqs.iter_mut().chain(out.ineqs.iter_mut()) {
        row.resize(width, BigInt::zero());
    }
    for d in out.divs.iter_mut() {
        d.expr.resize(width, BigInt::zero());
    }
    let perm: Vec<usize> = (0..b.width())
        .map(|j| if j <= n { j } else { j + a.n_div() })
        .collect();
    out.eqs.extend(b.eqs.iter().map(|r| permute_row(r, &perm, width)));
    out.ineqs.extend(b.ineqs.iter().map(|r| permute_row(r, &perm, width)));
    out.divs.extend(b.divs.iter().map(|d| Div {
        denom: d.denom.clone(),
        expr: permute_row(&d.expr, &perm, width),
    }));
    out.flags.rational = a.is_rational() && b.is_rational();
    out.flags.clear_derived();
    out.sample = None;
    Ok(out)
}

/// Existentially quantify `n` dimensions of kind `ty` starting at `first`.
///
/// The projected dimensions become unknown divs placed before the existing
/// divs, so the result describes exactly the integer projection.
pub fn project_out(bset: &BasicSet, ty: DimType, first: usize, n: usize) -> PolyResult<BasicSet> {
    let space = bset.space();
    if first + n > space.dim(ty) {
        return Err(PolyError::invalid(format!(
            "cannot project out dimensions {}..{} of kind {:?} from {}",
            first,
            first + n,
            ty,
            space
        )));
    }
    let new_space = space.drop_dims(ty, n)?;
    if bset.is_marked_empty() {
        return Ok(BasicSet::empty(new_space));
    }
    let start = 1 + space.offset(ty) + first;
    let end = start + n;
    let total = 1 + space.total_dim();
    // Columns before the block stay, columns after the block shift left,
    // the block moves to the front of the divs.
    let perm: Vec<usize> = (0..bset.width())
        .map(|j| {
            if j < start {
                j
            } else if j < end {
                total - n + (j - start)
            } else if j < total {
                j - n
            } else {
                j
            }
        })
        .collect();
    let width = bset.width();
    let mut out = BasicSet::with_capacity(new_space, bset.eqs.len(), bset.ineqs.len());
    out.flags.rational = bset.is_rational();
    out.divs = (0..n).map(|_| Div::unknown(width)).collect();
    out.divs.extend(bset.divs.iter().map(|d| Div {
        denom: d.denom.clone(),
        expr: permute_row(&d.expr, &perm, width),
    }));
    out.eqs = bset.eqs.iter().map(|r| permute_row(r, &perm, width)).collect();
    out.ineqs = bset.ineqs.iter().map(|r| permute_row(r, &perm, width)).collect();
    out.simplify();
    Ok(out)
}

/// Whether the piece has no point: no rational point for rational pieces,
/// no integer point otherwise.
pub fn is_empty(bset: &BasicSet, options: &Options) -> PolyResult<bool> {
    if bset.is_marked_empty() {
        return Ok(true);
    }
    if bset.is_rational() {
        return Tableau::from_basic_set(bset, options).is_empty();
    }
    Ok(integer_sample(bset, options)?.is_none())
}

/// Whether the relaxation of the piece is bounded in every variable.
pub fn is_bounded(bset: &BasicSet, options: &Options) -> PolyResult<bool> {
    if bset.is_marked_empty() {
        return Ok(true);
    }
    Tableau::from_basic_set(bset, options).is_bounded()
}

/// Whether every integer point of `a` lies in the div-free piece `b`.
pub fn is_subset(a: &BasicSet, b: &BasicSet, options: &Options) -> PolyResult<bool> {
    a.space().check_compatible(b.space())?;
    if b.n_div() > 0 {
        return Err(PolyError::unsupported("inclusion in a piece with divs"));
    }
    if is_empty(a, options)? {
        return Ok(true);
    }
    if b.is_marked_empty() {
        return Ok(false);
    }
    let lift = |row: &Row| -> Row {
        let mut r = row.clone();
        r.resize(a.width(), BigInt::zero());
        r
    };
    let holds = |obj: Row| -> PolyResult<bool> {
        Ok(match minimize(a, &obj, options)? {
            IlpResult::Ok { value, .. } => !value.is_negative(),
            IlpResult::Empty => true,
            IlpResult::Unbounded => false,
        })
    };
    for row in &b.ineqs {
        if !holds(lift(row))? {
            return Ok(false);
        }
    }
    for row in &b.eqs {
        let r = lift(row);
        let neg: Row = r.iter().map(|v| -v).collect();
        if !holds(r)? || !holds(neg)? {
            return Ok(false);
        }
    }
    Ok(true)
}

/// An integer point of the piece over its space dimensions.
pub fn sample(bset: &BasicSet, options: &Options) -> PolyResult<Option<Vec<BigInt>>> {
    let n = bset.space().total_dim();
    Ok(integer_sample(bset, options)?.map(|mut p| {
        p.truncate(n);
        p
    }))
}

/// The box `lo_i <= x_i <= hi_i` in a set space.
pub fn box_set(bounds: &[(i64, i64)]) -> BasicSet {
    let n = bounds.len();
    let mut bset = BasicSet::universe(Space::set(n));
    for (i, &(lo, hi)) in bounds.iter().enumerate() {
        let mut lower = vec![BigInt::zero(); n + 1];
        lower[0] = BigInt::from(-lo);
        lower[1 + i] = BigInt::from(1);
        let mut upper = vec![BigInt::zero(); n + 1];
        upper[0] = BigInt::from(hi);
        upper[1 + i] = BigInt::from(-1);
        bset.ineqs.push(lower);
        bset.ineqs.push(upper);
    }
    bset.flags.clear_derived();
    bset
}
