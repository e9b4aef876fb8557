//! Integer linear optimization over a single piece.
//!
//! The optimizer works on the plain variables of a piece: divs are treated
//! as additional integer variables and the returned point covers all of
//! them. Equalities are compressed away through a unimodular change of
//! basis before the LP relaxation is consulted.

pub mod sample;

use crate::context::Options;
use crate::lp::{LpResult, Tableau};
use crate::polyhedral::basic_set::BasicSet;
use crate::utils::arith::{eval_int, Row};
use crate::utils::errors::{PolyError, PolyResult};
use crate::utils::matrix::compress_equalities;
use log::debug;
use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::Zero;
use sample::{sample_inequalities, sample_tableau, unit_box_point};
use serde::{Deserialize, Serialize};

/// Outcome of an integer optimization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IlpResult {
    /// An optimum.
    Ok {
        /// Optimal objective value.
        value: BigInt,
        /// An optimal point over all variables of the piece.
        point: Vec<BigInt>,
    },
    /// The piece has no integer point.
    Empty,
    /// The objective is unbounded on the integer points of the piece.
    Unbounded,
}

impl IlpResult {
    /// The optimal value, if there is one.
    pub fn value(&self) -> Option<&BigInt> {
        match self {
            IlpResult::Ok { value, .. } => Some(value),
            _ => None,
        }
    }
}

/// Minimize the affine objective `obj . (1, x)` over the integer points of
/// `bset`. `obj` has the width of the rows of `bset`.
pub fn minimize(bset: &BasicSet, obj: &[BigInt], options: &Options) -> PolyResult<IlpResult> {
    if obj.len() != bset.width() {
        return Err(PolyError::invalid(format!(
            "objective of width {} for a piece of width {}",
            obj.len(),
            bset.width()
        )));
    }
    if bset.space().n_param > 0 {
        return Err(PolyError::unsupported("integer optimization over a parametric piece"));
    }
    if bset.is_marked_empty() {
        return Ok(IlpResult::Empty);
    }
    let mut plain = bset.underlying();
    plain.flags.rational = false;
    plain.gauss();
    plain.normalize_constraints();
    if plain.is_marked_empty() {
        return Ok(IlpResult::Empty);
    }
    let n = plain.n_var();
    if plain.eqs().is_empty() {
        return minimize_inequalities(n, plain.ineqs(), obj, options);
    }
    let Some(comp) = compress_equalities(plain.eqs(), n) else {
        return Ok(IlpResult::Empty);
    };
    let ineqs: Vec<Row> = plain.ineqs().iter().map(|r| comp.pull_row(r)).collect();
    let pulled = comp.pull_row(obj);
    Ok(match minimize_inequalities(comp.n_free(), &ineqs, &pulled, options)? {
        IlpResult::Ok { value, point } => IlpResult::Ok {
            value,
            point: comp.push_point(&point),
        },
        other => other,
    })
}

/// Maximize the affine objective `obj . (1, x)` over the integer points of
/// `bset`.
pub fn maximize(bset: &BasicSet, obj: &[BigInt], options: &Options) -> PolyResult<IlpResult> {
    let neg: Row = obj.iter().map(|v| -v).collect();
    Ok(match minimize(bset, &neg, options)? {
        IlpResult::Ok { value, point } => IlpResult::Ok {
            value: -value,
            point,
        },
        other => other,
    })
}

fn minimize_inequalities(
    n: usize,
    ineqs: &[Row],
    obj: &[BigInt],
    options: &Options,
) -> PolyResult<IlpResult> {
    if n == 0 {
        return Ok(if ineqs.iter().all(|r| r[0] >= BigInt::zero()) {
            IlpResult::Ok {
                value: obj[0].clone(),
                point: Vec::new(),
            }
        } else {
            IlpResult::Empty
        });
    }
    let mut tab = Tableau::new(n, options);
    for r in ineqs {
        tab.add_inequality(r.clone())?;
    }
    let relaxed = match tab.minimize(obj)? {
        LpResult::Empty => return Ok(IlpResult::Empty),
        LpResult::Unbounded => {
            return Ok(match sample_inequalities(n, ineqs, options)? {
                Some(_) => IlpResult::Unbounded,
                None => IlpResult::Empty,
            });
        }
        LpResult::Ok { value, sample } => {
            if sample.iter().all(|v| v.is_integer()) {
                return Ok(IlpResult::Ok {
                    value: value.to_integer(),
                    point: sample.iter().map(|v| v.to_integer()).collect(),
                });
            }
            value
        }
    };
    let initial = match unit_box_point(&tab, Some(obj), options)? {
        Some(p) => Some(p),
        None => sample_tableau(&mut tab, options)?,
    };
    let Some(mut best) = initial else {
        return Ok(IlpResult::Empty);
    };
    let mut best_value = eval_int(obj, &best);
    let mut lower = relaxed.ceil().to_integer();
    let mut upper = &best_value - 1;
    debug!("ilp: relaxed optimum {}, initial value {}", relaxed, best_value);
    while lower <= upper {
        let mid = &lower + (&upper - &lower).div_floor(&BigInt::from(2));
        let snap = tab.snapshot();
        let mut at_least = obj.to_vec();
        at_least[0] -= &lower;
        let mut at_most: Row = obj.iter().map(|v| -v).collect();
        at_most[0] += &mid;
        tab.add_inequality(at_least)?;
        tab.add_inequality(at_most)?;
        let hit = sample_tableau(&mut tab, options);
        tab.rollback(snap);
        match hit? {
            Some(p) => {
                best_value = eval_int(obj, &p);
                best = p;
                upper = &best_value - 1;
                debug!("ilp: improved to {}, bracket [{}, {}]", best_value, lower, upper);
            }
            None => {
                lower = mid + 1;
            }
        }
    }
    Ok(IlpResult::Ok {
        value: best_value,
        point: best,
    })
}
