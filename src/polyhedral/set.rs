//! Collections of pieces.
//!
//! A [`Set`] is the union of its pieces, all living in one space. Pieces are
//! shared through `Rc`: cloning a set is cheap, and a piece is duplicated
//! only when one of the holders mutates it.

use crate::context::{Context, Options};
use crate::polyhedral::basic_set::{BasicSet, Div};
use crate::polyhedral::operations;
use crate::polyhedral::space::Space;
use crate::utils::arith::{last_nonzero, Row};
use crate::utils::errors::{PolyError, PolyResult};
use log::trace;
use num_bigint::BigInt;
use num_traits::Zero;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;

/// A finite union of pieces over one space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSet")]
pub struct Set {
    space: Space,
    pieces: Vec<Rc<BasicSet>>,
}

/// Serialized shape of a [`Set`]; every piece must live in the set's space.
#[derive(Deserialize)]
struct RawSet {
    space: Space,
    pieces: Vec<BasicSet>,
}

impl TryFrom<RawSet> for Set {
    type Error = PolyError;

    fn try_from(raw: RawSet) -> PolyResult<Self> {
        let mut set = Self::empty(raw.space);
        for piece in raw.pieces {
            set.add_piece(piece)?;
        }
        Ok(set)
    }
}

/// Where a div of a piece ends up after alignment.
#[derive(Debug, Clone, Copy)]
enum Slot {
    Common(usize),
    Extra(usize),
}

impl Set {
    /// The empty set: no pieces.
    pub fn empty(space: Space) -> Self {
        Self {
            space,
            pieces: Vec::new(),
        }
    }

    /// The set containing every point of the space.
    pub fn universe(space: Space) -> Self {
        let piece = BasicSet::universe(space.clone());
        Self {
            space,
            pieces: vec![Rc::new(piece)],
        }
    }

    /// A set with a single piece.
    pub fn from_basic_set(bset: BasicSet) -> Self {
        Self {
            space: bset.space().clone(),
            pieces: vec![Rc::new(bset)],
        }
    }

    /// A set from a list of pieces, all in `space`.
    pub fn from_pieces(space: Space, pieces: Vec<BasicSet>) -> PolyResult<Self> {
        let mut set = Self::empty(space);
        for p in pieces {
            set.add_piece(p)?;
        }
        Ok(set)
    }

    /// Append a piece. A piece that is known to be empty is skipped.
    pub fn add_piece(&mut self, bset: BasicSet) -> PolyResult<()> {
        self.space.check_compatible(bset.space())?;
        if !bset.is_marked_empty() {
            self.pieces.push(Rc::new(bset));
        }
        Ok(())
    }

    /// The space of the set.
    pub fn space(&self) -> &Space {
        &self.space
    }

    /// The pieces, shared.
    pub fn pieces(&self) -> &[Rc<BasicSet>] {
        &self.pieces
    }

    /// Number of pieces.
    pub fn n_pieces(&self) -> usize {
        self.pieces.len()
    }

    /// Exclusive access to piece `i`, duplicating it if it is shared.
    pub fn piece_mut(&mut self, i: usize) -> Option<&mut BasicSet> {
        self.pieces.get_mut(i).map(Rc::make_mut)
    }

    /// Take the pieces out, duplicating only those still shared elsewhere.
    pub fn into_pieces(self) -> Vec<BasicSet> {
        self.pieces.into_iter().map(Rc::unwrap_or_clone).collect()
    }

    /// Union of two sets of the same space.
    pub fn union(&self, other: &Set) -> PolyResult<Set> {
        self.space.check_compatible(&other.space)?;
        let mut out = self.clone();
        out.pieces.extend(other.pieces.iter().cloned());
        Ok(out)
    }

    /// Intersection of two sets of the same space, piece by piece.
    pub fn intersect(&self, other: &Set) -> PolyResult<Set> {
        self.space.check_compatible(&other.space)?;
        let mut out = Set::empty(self.space.clone());
        for a in &self.pieces {
            for b in &other.pieces {
                let mut p = operations::intersect(a, b)?;
                p.simplify();
                out.add_piece(p)?;
            }
        }
        Ok(out)
    }

    /// Simplify every piece and drop the ones found empty.
    pub fn simplify(&mut self) {
        for p in self.pieces.iter_mut() {
            Rc::make_mut(p).simplify();
        }
        self.pieces.retain(|p| !p.is_marked_empty());
    }

    /// Finalize every piece and drop the ones found empty.
    pub fn finalize(&mut self, options: &Options) -> PolyResult<()> {
        for p in self.pieces.iter_mut() {
            Rc::make_mut(p).finalize(options)?;
        }
        self.pieces.retain(|p| !p.is_marked_empty());
        Ok(())
    }

    /// Whether no piece has a point.
    pub fn is_empty(&self, options: &Options) -> PolyResult<bool> {
        for p in &self.pieces {
            if !operations::is_empty(p, options)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Whether the integer point lies in some piece.
    pub fn contains(&self, point: &[BigInt]) -> PolyResult<bool> {
        for p in &self.pieces {
            if p.contains(point)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Give every piece the same div layout.
    ///
    /// Known divs with the same definition are shared: the result has one
    /// column per distinct definition and each piece gets the definitions
    /// it lacked together with their defining inequalities. Unknown divs,
    /// and divs defined in terms of them, cannot be matched; each of those
    /// gets a column of its own that is unconstrained in the other pieces.
    pub fn align_divs(&self) -> PolyResult<Set> {
        if self.pieces.iter().all(|p| p.n_div() == 0) {
            return Ok(self.clone());
        }
        let n = self.space.total_dim();
        let mut common: Vec<(BigInt, Row)> = Vec::new();
        let mut index: FxHashMap<(BigInt, Row), usize> = FxHashMap::default();
        let mut slots: Vec<Vec<Slot>> = Vec::with_capacity(self.pieces.len());
        let mut n_extra = Vec::with_capacity(self.pieces.len());
        for p in &self.pieces {
            let mut map: Vec<Slot> = Vec::with_capacity(p.n_div());
            let mut extras = 0;
            for div in p.divs() {
                let translated = if div.is_known() {
                    translate_div(&div.expr, n, &map)
                } else {
                    None
                };
                let slot = match translated {
                    Some(expr) => {
                        let key = (div.denom.clone(), expr);
                        let k = *index.entry(key.clone()).or_insert_with(|| {
                            common.push(key);
                            common.len() - 1
                        });
                        Slot::Common(k)
                    }
                    None => {
                        extras += 1;
                        Slot::Extra(extras - 1)
                    }
                };
                map.push(slot);
            }
            slots.push(map);
            n_extra.push(extras);
        }
        let n_common = common.len();
        let total_extra: usize = n_extra.iter().sum();
        let width = 1 + n + n_common + total_extra;
        let mut divs: Vec<Div> = common
            .into_iter()
            .map(|(denom, mut expr)| {
                expr.resize(width, BigInt::zero());
                Div { denom, expr }
            })
            .collect();
        divs.extend((0..total_extra).map(|_| Div::unknown(width)));
        trace!(
            "align_divs: {} pieces, {} shared divs, {} private divs",
            self.pieces.len(),
            n_common,
            total_extra
        );

        let mut out = Set::empty(self.space.clone());
        let mut extra_offset = 0;
        for (pi, (p, map)) in self.pieces.iter().zip(&slots).enumerate() {
            let col = |j: usize| -> usize {
                if j <= n {
                    return j;
                }
                match map[j - 1 - n] {
                    Slot::Common(k) => 1 + n + k,
                    Slot::Extra(e) => 1 + n + n_common + extra_offset + e,
                }
            };
            let remap = |row: &Row| -> Row {
                let mut r = vec![BigInt::zero(); width];
                for (j, v) in row.iter().enumerate() {
                    if !v.is_zero() {
                        r[col(j)] += v;
                    }
                }
                r
            };
            let mut aligned = BasicSet::with_capacity(self.space.clone(), p.eqs().len(), p.ineqs().len());
            aligned.flags.rational = p.is_rational();
            aligned.eqs = p.eqs().iter().map(remap).collect();
            aligned.ineqs = p.ineqs().iter().map(remap).collect();
            aligned.divs = divs.clone();
            for k in 0..n_common {
                if !map.iter().any(|s| matches!(s, Slot::Common(c) if *c == k)) {
                    aligned.add_div_constraints(k)?;
                }
            }
            extra_offset += n_extra[pi];
            out.pieces.push(Rc::new(aligned));
        }
        Ok(out)
    }

    /// Convex hull of the set, see [`crate::hull::convex_hull`].
    pub fn convex_hull(&self, ctx: &Context) -> PolyResult<BasicSet> {
        crate::hull::convex_hull(self, ctx)
    }

    /// Simple hull of the set, see [`crate::hull::simple_hull`].
    pub fn simple_hull(&self, ctx: &Context) -> PolyResult<BasicSet> {
        crate::hull::simple_hull(self, ctx)
    }
}

/// Rewrite a div expression of a piece into the shared layout, with
/// trailing zeros stripped. `None` if it refers to a div without a shared
/// column.
fn translate_div(expr: &[BigInt], n: usize, map: &[Slot]) -> Option<Row> {
    let mut out = expr[..1 + n].to_vec();
    for (i, slot) in map.iter().enumerate() {
        let v = &expr[1 + n + i];
        if v.is_zero() {
            continue;
        }
        let Slot::Common(k) = *slot else {
            return None;
        };
        if out.len() <= 1 + n + k {
            out.resize(2 + n + k, BigInt::zero());
        }
        out[1 + n + k] += v;
    }
    let keep = last_nonzero(&out).map_or(1 + n, |j| (j + 1).max(1 + n));
    out.truncate(keep);
    Some(out)
}

impl From<BasicSet> for Set {
    fn from(bset: BasicSet) -> Self {
        Set::from_basic_set(bset)
    }
}

impl fmt::Display for Set {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.pieces.is_empty() {
            return write!(f, "{{ }}");
        }
        let parts: Vec<String> = self.pieces.iter().map(|p| p.to_string()).collect();
        write!(f, "{}", parts.join(" or "))
    }
}
