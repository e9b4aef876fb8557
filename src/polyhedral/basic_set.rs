//! The constraint store of a single polyhedral piece.
//!
//! A [`BasicSet`] is a conjunction of integer equalities `row . (1, x) = 0`,
//! inequalities `row . (1, x) >= 0` and existentially quantified integer
//! divisions. Every row has `1 + total_dim + n_div` entries: the constant,
//! then parameters, inputs, outputs and divs.
//!
//! Integer points of a piece are the assignments of the space variables for
//! which some integer assignment of the divs satisfies all rows. A known div
//! definition `floor(e / m)` is always accompanied by (or implied by) the
//! rows `e - m*d >= 0` and `-e + m*d + m - 1 >= 0`.

use crate::context::Options;
use crate::ilp::sample::integer_sample;
use crate::polyhedral::constraint::{Constraint, ConstraintKind};
use crate::polyhedral::expr::format_affine;
use crate::polyhedral::space::Space;
use crate::utils::arith::{eval_int, eval_rat, lcm_denominators, Row};
use crate::utils::errors::{PolyError, PolyResult};
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An existentially quantified integer division `floor(expr . (1, x) / denom)`.
///
/// A zero denominator means the div has no known definition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Div {
    /// Denominator; zero for an unknown div.
    pub denom: BigInt,
    /// Numerator row, of the same width as the constraint rows.
    pub expr: Row,
}

impl Div {
    /// An unknown div over rows of the given width.
    pub fn unknown(width: usize) -> Self {
        Self {
            denom: BigInt::zero(),
            expr: vec![BigInt::zero(); width],
        }
    }

    /// Whether the div has a known definition.
    pub fn is_known(&self) -> bool {
        !self.denom.is_zero()
    }
}

/// Derived facts about a piece.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flags {
    /// The piece is known to be empty.
    pub empty: bool,
    /// Variables range over the rationals; no integer tightening applies.
    pub rational: bool,
    /// Constraints have been normalized.
    pub normalized: bool,
    /// No inequality is implied by the others.
    pub no_redundant: bool,
    /// No inequality is an implicit equality.
    pub no_implicit: bool,
}

impl Flags {
    /// Forget the facts that a mutation may invalidate.
    pub fn clear_derived(&mut self) {
        self.normalized = false;
        self.no_redundant = false;
        self.no_implicit = false;
    }
}

/// A single polyhedral piece.
///
/// Deserialization goes through [`RawBasicSet`], so rows and div
/// definitions are checked against the space and derived flags are
/// recomputed rather than trusted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawBasicSet")]
pub struct BasicSet {
    pub(crate) space: Space,
    pub(crate) eqs: Vec<Row>,
    pub(crate) ineqs: Vec<Row>,
    pub(crate) divs: Vec<Div>,
    pub(crate) flags: Flags,
    #[serde(skip)]
    pub(crate) sample: Option<Vec<BigInt>>,
}

/// Serialized shape of a [`BasicSet`].
#[derive(Deserialize)]
struct RawBasicSet {
    space: Space,
    eqs: Vec<Row>,
    ineqs: Vec<Row>,
    #[serde(default)]
    divs: Vec<Div>,
    #[serde(default)]
    flags: Flags,
}

impl TryFrom<RawBasicSet> for BasicSet {
    type Error = PolyError;

    fn try_from(raw: RawBasicSet) -> PolyResult<Self> {
        let mut bset = Self::with_capacity(raw.space, raw.eqs.len(), raw.ineqs.len());
        bset.flags.rational = raw.flags.rational;
        let n_div = raw.divs.len();
        for _ in 0..n_div {
            bset.alloc_div();
        }
        for (pos, div) in raw.divs.into_iter().enumerate() {
            bset.check_div(pos, &div)?;
            bset.divs[pos] = div;
        }
        for row in raw.eqs {
            bset.add_equality(row)?;
        }
        for row in raw.ineqs {
            bset.add_inequality(row)?;
        }
        Ok(bset)
    }
}

impl PartialEq for BasicSet {
    fn eq(&self, other: &Self) -> bool {
        self.space == other.space
            && self.eqs == other.eqs
            && self.ineqs == other.ineqs
            && self.divs == other.divs
    }
}

impl Eq for BasicSet {}

impl BasicSet {
    /// A universe piece with room for the given number of rows.
    pub fn with_capacity(space: Space, n_eq: usize, n_ineq: usize) -> Self {
        Self {
            space,
            eqs: Vec::with_capacity(n_eq),
            ineqs: Vec::with_capacity(n_ineq),
            divs: Vec::new(),
            flags: Flags::default(),
            sample: None,
        }
    }

    /// The piece containing every point of the space.
    pub fn universe(space: Space) -> Self {
        let mut bset = Self::with_capacity(space, 0, 0);
        bset.flags.no_redundant = true;
        bset.flags.no_implicit = true;
        bset
    }

    /// The empty piece.
    pub fn empty(space: Space) -> Self {
        let mut bset = Self::with_capacity(space, 1, 0);
        bset.set_to_empty();
        bset
    }

    /// Build a div-free piece from constraint rows.
    pub fn from_rows(space: Space, eqs: Vec<Row>, ineqs: Vec<Row>) -> PolyResult<Self> {
        let mut bset = Self::with_capacity(space, eqs.len(), ineqs.len());
        for row in eqs {
            bset.add_equality(row)?;
        }
        for row in ineqs {
            bset.add_inequality(row)?;
        }
        Ok(bset)
    }

    /// Build a div-free piece from rows of machine integers.
    pub fn from_i64(space: Space, eqs: &[&[i64]], ineqs: &[&[i64]]) -> PolyResult<Self> {
        let conv = |rows: &[&[i64]]| -> Vec<Row> {
            rows.iter()
                .map(|r| r.iter().map(|&v| BigInt::from(v)).collect())
                .collect()
        };
        Self::from_rows(space, conv(eqs), conv(ineqs))
    }

    /// Mark the piece as ranging over the rationals.
    pub fn into_rational(mut self) -> Self {
        self.flags.rational = true;
        self.flags.clear_derived();
        self
    }

    /// The space of the piece.
    pub fn space(&self) -> &Space {
        &self.space
    }

    /// Equality rows.
    pub fn eqs(&self) -> &[Row] {
        &self.eqs
    }

    /// Inequality rows.
    pub fn ineqs(&self) -> &[Row] {
        &self.ineqs
    }

    /// Div definitions.
    pub fn divs(&self) -> &[Div] {
        &self.divs
    }

    /// Derived facts.
    pub fn flags(&self) -> &Flags {
        &self.flags
    }

    /// Cached integer point, if one is known.
    pub fn cached_sample(&self) -> Option<&[BigInt]> {
        self.sample.as_deref()
    }

    /// Number of divs.
    pub fn n_div(&self) -> usize {
        self.divs.len()
    }

    /// Number of variables: space dimensions plus divs.
    pub fn n_var(&self) -> usize {
        self.space.total_dim() + self.divs.len()
    }

    /// Row width: the constant column plus every variable.
    pub fn width(&self) -> usize {
        1 + self.n_var()
    }

    /// Column of div `i` in a row.
    pub fn div_col(&self, i: usize) -> usize {
        1 + self.space.total_dim() + i
    }

    /// Whether the piece ranges over the rationals.
    pub fn is_rational(&self) -> bool {
        self.flags.rational
    }

    /// Whether the piece has been marked empty.
    pub fn is_marked_empty(&self) -> bool {
        self.flags.empty
    }

    fn check_width(&self, row: &[BigInt]) -> PolyResult<()> {
        if row.len() != self.width() {
            return Err(PolyError::invalid(format!(
                "row of width {} in a piece of width {}",
                row.len(),
                self.width()
            )));
        }
        Ok(())
    }

    /// A known div may only refer to the variables and the divs before it.
    fn check_div(&self, pos: usize, div: &Div) -> PolyResult<()> {
        self.check_width(&div.expr)?;
        if div.denom.is_negative() {
            return Err(PolyError::invalid("div denominator must be non-negative"));
        }
        let col = self.div_col(pos);
        let forward = div.expr[col..].iter().any(|v| !v.is_zero());
        if forward && div.is_known() {
            return Err(PolyError::invalid(format!(
                "div {} refers to itself or a later div",
                pos
            )));
        }
        if !div.is_known() && div.expr.iter().any(|v| !v.is_zero()) {
            return Err(PolyError::invalid(format!("unknown div {} has a definition", pos)));
        }
        Ok(())
    }

    fn touch(&mut self) {
        self.flags.clear_derived();
    }

    /// Append a zero equality row and return its index.
    pub fn alloc_equality(&mut self) -> usize {
        self.touch();
        self.sample = None;
        self.eqs.push(vec![BigInt::zero(); self.width()]);
        self.eqs.len() - 1
    }

    /// Append a zero inequality row and return its index.
    pub fn alloc_inequality(&mut self) -> usize {
        self.touch();
        self.sample = None;
        self.ineqs.push(vec![BigInt::zero(); self.width()]);
        self.ineqs.len() - 1
    }

    /// Remove equality `i`.
    pub fn free_equality(&mut self, i: usize) -> PolyResult<Row> {
        if i >= self.eqs.len() {
            return Err(PolyError::invalid(format!("no equality {}", i)));
        }
        self.touch();
        Ok(self.eqs.remove(i))
    }

    /// Remove inequality `i`.
    pub fn free_inequality(&mut self, i: usize) -> PolyResult<Row> {
        if i >= self.ineqs.len() {
            return Err(PolyError::invalid(format!("no inequality {}", i)));
        }
        self.touch();
        Ok(self.ineqs.remove(i))
    }

    /// Add the equality `row . (1, x) = 0`.
    pub fn add_equality(&mut self, row: Row) -> PolyResult<()> {
        self.check_width(&row)?;
        self.touch();
        self.sample = None;
        self.eqs.push(row);
        Ok(())
    }

    /// Add the inequality `row . (1, x) >= 0`.
    pub fn add_inequality(&mut self, row: Row) -> PolyResult<()> {
        self.check_width(&row)?;
        self.touch();
        self.sample = None;
        self.ineqs.push(row);
        Ok(())
    }

    /// Add a constraint built over the space variables.
    pub fn add_constraint(&mut self, c: &Constraint) -> PolyResult<()> {
        if c.n_var() != self.space.total_dim() {
            return Err(PolyError::invalid(format!(
                "constraint over {} variables in space {}",
                c.n_var(),
                self.space
            )));
        }
        let row = c.expr.to_row(self.n_div());
        match c.kind {
            ConstraintKind::Equality => self.add_equality(row),
            ConstraintKind::Inequality => self.add_inequality(row),
        }
    }

    /// Builder form of [`BasicSet::add_constraint`].
    pub fn with_constraint(mut self, c: Constraint) -> PolyResult<Self> {
        self.add_constraint(&c)?;
        Ok(self)
    }

    /// Reserve room for more rows without changing any dimension.
    pub fn extend(&mut self, n_eq: usize, n_ineq: usize, n_div: usize) {
        self.eqs.reserve(n_eq);
        self.ineqs.reserve(n_ineq);
        self.divs.reserve(n_div);
    }

    fn push_zero_column(&mut self) {
        for row in self.eqs.iter_mut().chain(self.ineqs.iter_mut()) {
            row.push(BigInt::zero());
        }
        for div in &mut self.divs {
            div.expr.push(BigInt::zero());
        }
        self.sample = None;
    }

    /// Append an unknown div and return its index.
    pub fn alloc_div(&mut self) -> usize {
        self.touch();
        self.push_zero_column();
        let width = self.width() + 1;
        self.divs.push(Div::unknown(width));
        self.divs.len() - 1
    }

    /// Append the div `floor(expr / denom)` together with its defining
    /// inequalities. `expr` has the width of the rows before the div is
    /// added, so it can only refer to earlier divs.
    pub fn add_div(&mut self, denom: BigInt, mut expr: Row) -> PolyResult<usize> {
        self.check_width(&expr)?;
        if denom.is_negative() {
            return Err(PolyError::invalid("div denominator must be non-negative"));
        }
        if denom.is_zero() {
            return Ok(self.alloc_div());
        }
        let pos = self.alloc_div();
        expr.push(BigInt::zero());
        self.divs[pos].denom = denom;
        self.divs[pos].expr = expr;
        self.add_div_constraints(pos)?;
        Ok(pos)
    }

    /// Add `e - m*d >= 0` and `-e + m*d + m - 1 >= 0` for the known div `pos`.
    pub fn add_div_constraints(&mut self, pos: usize) -> PolyResult<()> {
        let div = self
            .divs
            .get(pos)
            .ok_or_else(|| PolyError::invalid(format!("no div {}", pos)))?;
        if !div.is_known() {
            return Ok(());
        }
        let col = self.div_col(pos);
        let mut lower = div.expr.clone();
        lower[col] -= &div.denom;
        let mut upper: Row = lower.iter().map(|v| -v).collect();
        upper[0] += &div.denom - BigInt::one();
        self.add_inequality(lower)?;
        self.add_inequality(upper)
    }

    /// Whether any constraint or div definition refers to div `pos`.
    pub fn div_is_used(&self, pos: usize) -> bool {
        let col = self.div_col(pos);
        self.eqs.iter().chain(self.ineqs.iter()).any(|r| !r[col].is_zero())
            || self.divs.iter().any(|d| !d.expr[col].is_zero())
    }

    /// Remove div `pos`, which must not be referenced anywhere.
    pub fn drop_div(&mut self, pos: usize) -> PolyResult<()> {
        if pos >= self.divs.len() {
            return Err(PolyError::invalid(format!("no div {}", pos)));
        }
        if self.div_is_used(pos) {
            return Err(PolyError::invalid(format!("div {} is still referenced", pos)));
        }
        self.remove_div_column(pos);
        Ok(())
    }

    /// Remove the column of div `pos` unconditionally.
    pub(crate) fn remove_div_column(&mut self, pos: usize) {
        let col = self.div_col(pos);
        self.touch();
        self.sample = None;
        self.divs.remove(pos);
        for row in self.eqs.iter_mut().chain(self.ineqs.iter_mut()) {
            row.remove(col);
        }
        for div in &mut self.divs {
            div.expr.remove(col);
        }
    }

    /// Replace every constraint by the contradiction `1 = 0`.
    pub fn set_to_empty(&mut self) {
        if self.flags.empty && self.divs.is_empty() && self.ineqs.is_empty() && self.eqs.len() == 1 {
            return;
        }
        self.divs.clear();
        self.ineqs.clear();
        self.eqs.clear();
        let mut row = vec![BigInt::zero(); self.width()];
        row[0] = BigInt::one();
        self.eqs.push(row);
        self.sample = None;
        self.flags.empty = true;
        self.flags.normalized = true;
        self.flags.no_redundant = true;
        self.flags.no_implicit = true;
    }

    /// The same rows in a plain set space with one dimension per variable.
    pub fn underlying(&self) -> BasicSet {
        BasicSet {
            space: self.space.underlying(self.n_div()),
            eqs: self.eqs.clone(),
            ineqs: self.ineqs.clone(),
            divs: Vec::new(),
            flags: Flags {
                empty: self.flags.empty,
                rational: self.flags.rational,
                ..Flags::default()
            },
            sample: self.sample.clone(),
        }
    }

    /// Reinterpret a plain piece over the variables of `model` in the space
    /// of `model`, with the divs of `model`. The defining inequalities of
    /// the known divs are added.
    pub fn overlying(self, model: &BasicSet) -> PolyResult<BasicSet> {
        if self.space.total_dim() != model.n_var() {
            return Err(PolyError::invalid(format!(
                "piece over {} variables cannot overlie a model over {}",
                self.space.total_dim(),
                model.n_var()
            )));
        }
        if self.flags.empty {
            let mut empty = BasicSet::empty(model.space.clone());
            empty.flags.rational = self.flags.rational;
            return Ok(empty);
        }
        let mut out = BasicSet {
            space: model.space.clone(),
            eqs: self.eqs,
            ineqs: self.ineqs,
            divs: model.divs.clone(),
            flags: Flags {
                rational: self.flags.rational,
                ..Flags::default()
            },
            sample: None,
        };
        for pos in 0..out.divs.len() {
            out.add_div_constraints(pos)?;
        }
        Ok(out)
    }

    /// Whether the integer point (over the space variables) lies in the piece.
    pub fn contains(&self, point: &[BigInt]) -> PolyResult<bool> {
        self.check_point_len(point.len())?;
        if self.flags.empty {
            return Ok(false);
        }
        if self.divs.is_empty() {
            let sat = self.eqs.iter().all(|r| eval_int(r, point).is_zero())
                && self.ineqs.iter().all(|r| !eval_int(r, point).is_negative());
            return Ok(sat);
        }
        let fixed = self.fix_space_point(|row| {
            let mut v = row[0].clone();
            for (c, x) in row[1..].iter().zip(point) {
                v += c * x;
            }
            vec![v]
        });
        self.has_integer_divs(fixed)
    }

    /// Whether the rational point (over the space variables) lies in the
    /// piece. With divs, some integer div assignment must exist.
    pub fn contains_rational(&self, point: &[BigRational]) -> PolyResult<bool> {
        self.check_point_len(point.len())?;
        if self.flags.empty {
            return Ok(false);
        }
        if self.divs.is_empty() {
            let sat = self.eqs.iter().all(|r| eval_rat(r, point).is_zero())
                && self.ineqs.iter().all(|r| !eval_rat(r, point).is_negative());
            return Ok(sat);
        }
        let fixed = self.fix_space_point(|row| {
            let mut v = BigRational::from_integer(row[0].clone());
            for (c, x) in row[1..].iter().zip(point) {
                v += BigRational::from_integer(c.clone()) * x;
            }
            let l = lcm_denominators(&[v.clone()]);
            vec![(v * BigRational::from_integer(l.clone())).to_integer(), l]
        });
        self.has_integer_divs(fixed)
    }

    fn check_point_len(&self, len: usize) -> PolyResult<()> {
        if len != self.space.total_dim() {
            return Err(PolyError::invalid(format!(
                "point of dimension {} for space {}",
                len, self.space
            )));
        }
        Ok(())
    }

    /// Substitute the space part of every row. `subst` returns the new
    /// constant and optionally a positive scale for the div coefficients.
    fn fix_space_point<F>(&self, subst: F) -> BasicSet
    where
        F: Fn(&[BigInt]) -> Vec<BigInt>,
    {
        let n = self.space.total_dim();
        let map = |row: &Row| -> Row {
            let parts = subst(&row[..1 + n]);
            let mut out = vec![parts[0].clone()];
            match parts.get(1) {
                Some(scale) => out.extend(row[1 + n..].iter().map(|c| c * scale)),
                None => out.extend(row[1 + n..].iter().cloned()),
            }
            out
        };
        BasicSet {
            space: Space::set(self.n_div()),
            eqs: self.eqs.iter().map(map).collect(),
            ineqs: self.ineqs.iter().map(map).collect(),
            divs: Vec::new(),
            flags: Flags::default(),
            sample: None,
        }
    }

    fn has_integer_divs(&self, fixed: BasicSet) -> PolyResult<bool> {
        Ok(integer_sample(&fixed, &Options::default())?.is_some())
    }

    /// Variable names used for display: parameters, inputs, outputs, divs.
    pub fn var_names(&self) -> Vec<String> {
        let s = &self.space;
        let mut names = Vec::with_capacity(self.n_var());
        names.extend((0..s.n_param).map(|i| format!("p{}", i)));
        names.extend((0..s.n_in).map(|i| format!("i{}", i)));
        names.extend((0..s.n_out).map(|i| format!("x{}", i)));
        names.extend((0..self.n_div()).map(|i| format!("e{}", i)));
        names
    }
}

impl fmt::Display for BasicSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = self.var_names();
        let s = &self.space;
        let params = &names[..s.n_param];
        let ins = &names[s.n_param..s.n_param + s.n_in];
        let outs = &names[s.n_param + s.n_in..s.total_dim()];
        if !params.is_empty() {
            write!(f, "[{}] -> ", params.join(", "))?;
        }
        write!(f, "{{ ")?;
        if s.is_map() {
            write!(f, "[{}] -> ", ins.join(", "))?;
        }
        write!(f, "[{}]", outs.join(", "))?;
        let mut parts = Vec::new();
        for r in &self.eqs {
            parts.push(format!("{} = 0", format_affine(&r[0], &r[1..], &names)));
        }
        for r in &self.ineqs {
            parts.push(format!("{} >= 0", format_affine(&r[0], &r[1..], &names)));
        }
        if !self.divs.is_empty() {
            let defs: Vec<String> = self
                .divs
                .iter()
                .enumerate()
                .map(|(i, d)| {
                    if d.is_known() {
                        format!(
                            "e{} = floor(({})/{})",
                            i,
                            format_affine(&d.expr[0], &d.expr[1..], &names),
                            d.denom
                        )
                    } else {
                        format!("e{}", i)
                    }
                })
                .collect();
            write!(f, " : exists ({}", defs.join(", "))?;
            if !parts.is_empty() {
                write!(f, " : {}", parts.join(" and "))?;
            }
            write!(f, ")")?;
        } else if !parts.is_empty() {
            write!(f, " : {}", parts.join(" and "))?;
        }
        write!(f, " }}")
    }
}
