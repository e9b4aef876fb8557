//! Div management: elimination, merging and canonical forms of the
//! existentially quantified integer divisions of a piece.

use crate::context::Options;
use crate::lp::{LpResult, Tableau};
use crate::polyhedral::basic_set::{BasicSet, Div};
use crate::utils::arith::{
    floor_div, last_nonzero, lcm_denominators, make_primitive, rational_to_integer_row, Row,
};
use crate::utils::errors::PolyResult;
use crate::utils::matrix::{compress_equalities, hermite_normal_form, Compression, RationalMatrix};
use log::{debug, trace};
use num_bigint::BigInt;
use num_integer::Integer;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};
use rustc_hash::FxHashMap;
use std::collections::hash_map::Entry;

/// Upper bound on rounds of [`BasicSet::simplify`].
const MAX_SIMPLIFY_ROUNDS: usize = 32;

impl BasicSet {
    fn div_in_eqs(&self, col: usize) -> bool {
        self.eqs.iter().any(|r| !r[col].is_zero())
    }

    fn div_in_other_defs(&self, pos: usize, col: usize) -> bool {
        self.divs
            .iter()
            .enumerate()
            .any(|(i, d)| i != pos && !d.expr[col].is_zero())
    }

    /// Drop every equality whose pivot (last nonzero variable) is a div
    /// with a unit coefficient, together with that div. Assumes the
    /// equalities are in the form left by [`BasicSet::gauss`].
    pub fn eliminate_divs_eq(&mut self) -> bool {
        if self.flags.empty {
            return false;
        }
        let mut changed = false;
        'restart: loop {
            let first_div_col = self.div_col(0);
            for k in 0..self.eqs.len() {
                let Some(col) = last_nonzero(&self.eqs[k]) else {
                    continue;
                };
                if col < first_div_col || !self.eqs[k][col].abs().is_one() {
                    continue;
                }
                let pos = col - first_div_col;
                let used_elsewhere = self
                    .eqs
                    .iter()
                    .enumerate()
                    .any(|(j, r)| j != k && !r[col].is_zero())
                    || self.ineqs.iter().any(|r| !r[col].is_zero())
                    || self.div_in_other_defs(pos, col);
                if used_elsewhere {
                    continue;
                }
                trace!("eliminate_divs_eq: dropping div {}", pos);
                self.eqs.remove(k);
                self.remove_div_column(pos);
                changed = true;
                continue 'restart;
            }
            break;
        }
        changed
    }

    /// Remove, by Fourier-Motzkin elimination, every div that occurs in no
    /// equality and no other div definition and only with coefficients
    /// `1` and `-1` in the inequalities.
    pub fn eliminate_divs_ineq(&mut self) -> bool {
        if self.flags.empty {
            return false;
        }
        let mut changed = false;
        let mut pos = self.n_div();
        while pos > 0 {
            pos -= 1;
            let col = self.div_col(pos);
            if self.div_in_eqs(col) || self.div_in_other_defs(pos, col) {
                continue;
            }
            if self.ineqs.iter().any(|r| r[col].abs() > BigInt::one()) {
                continue;
            }
            let (with, without): (Vec<Row>, Vec<Row>) =
                self.ineqs.drain(..).partition(|r| !r[col].is_zero());
            let (lower, upper): (Vec<Row>, Vec<Row>) =
                with.into_iter().partition(|r| r[col].is_positive());
            self.ineqs = without;
            for l in &lower {
                for u in &upper {
                    let row: Row = l.iter().zip(u).map(|(a, b)| a + b).collect();
                    self.ineqs.push(row);
                }
            }
            trace!(
                "eliminate_divs_ineq: div {} with {} lower and {} upper bounds",
                pos,
                lower.len(),
                upper.len()
            );
            self.remove_div_column(pos);
            changed = true;
        }
        changed
    }

    /// Merge divs with identical known definitions.
    pub fn remove_duplicate_divs(&mut self) -> bool {
        if self.flags.empty || self.n_div() < 2 {
            return false;
        }
        let mut seen: FxHashMap<(BigInt, Row), usize> = FxHashMap::default();
        let mut ties = Vec::new();
        for (i, d) in self.divs.iter().enumerate() {
            if !d.is_known() {
                continue;
            }
            match seen.entry((d.denom.clone(), d.expr.clone())) {
                Entry::Occupied(e) => ties.push((*e.get(), i)),
                Entry::Vacant(e) => {
                    e.insert(i);
                }
            }
        }
        if ties.is_empty() {
            return false;
        }
        for (first, dup) in ties {
            let mut row = vec![BigInt::zero(); self.width()];
            row[self.div_col(dup)] = BigInt::one();
            row[self.div_col(first)] = -BigInt::one();
            self.eqs.push(row);
        }
        self.flags.clear_derived();
        self.gauss();
        self.eliminate_divs_eq();
        true
    }

    /// Merge a div `x` that ranges over `m` consecutive values into a div
    /// `y` that only ever occurs as `x + m*y`.
    ///
    /// If `x` has exactly one lower bound `x + f >= 0` and one upper bound
    /// `-x - f + m - 1 >= 0`, neither involving `y`, and every other row
    /// has `coef_y = m * coef_x`, then `z = x + m*y` ranges over all
    /// integers and replaces both divs.
    pub fn coalesce_divs(&mut self) -> bool {
        if self.flags.empty || self.n_div() < 2 {
            return false;
        }
        let mut changed = false;
        'restart: loop {
            for x in 0..self.n_div() {
                let xc = self.div_col(x);
                let bounds: Vec<usize> = (0..self.ineqs.len())
                    .filter(|&k| self.ineqs[k][xc].abs().is_one())
                    .collect();
                for y in 0..self.n_div() {
                    if y == x {
                        continue;
                    }
                    if let Some(m) = self.coalesce_pair(x, y, &bounds) {
                        debug!("coalesce_divs: merging div {} into div {} (m = {})", x, y, m);
                        self.apply_coalesce(x, y, &bounds);
                        changed = true;
                        continue 'restart;
                    }
                }
            }
            break;
        }
        changed
    }

    /// The range `m` if divs `x` and `y` can be coalesced.
    fn coalesce_pair(&self, x: usize, y: usize, bounds: &[usize]) -> Option<BigInt> {
        let xc = self.div_col(x);
        let yc = self.div_col(y);
        for (i, d) in self.divs.iter().enumerate() {
            if i != x && i != y && (!d.expr[xc].is_zero() || !d.expr[yc].is_zero()) {
                return None;
            }
        }
        let pair: Vec<usize> = bounds
            .iter()
            .copied()
            .filter(|&k| self.ineqs[k][yc].is_zero())
            .collect();
        if pair.len() != 2 {
            return None;
        }
        let (lo, up) = if self.ineqs[pair[0]][xc].is_positive() {
            (&self.ineqs[pair[0]], &self.ineqs[pair[1]])
        } else {
            (&self.ineqs[pair[1]], &self.ineqs[pair[0]])
        };
        if !lo[xc].is_positive() || !up[xc].is_negative() {
            return None;
        }
        if lo[1..].iter().zip(&up[1..]).any(|(a, b)| !(a + b).is_zero()) {
            return None;
        }
        let m = &lo[0] + &up[0] + BigInt::one();
        if !m.is_positive() {
            return None;
        }
        let ratio_ok = |r: &Row| {
            if r[xc].is_zero() && r[yc].is_zero() {
                return true;
            }
            !r[xc].is_zero() && r[yc] == &m * &r[xc]
        };
        let others_ok = self.eqs.iter().all(ratio_ok)
            && self
                .ineqs
                .iter()
                .enumerate()
                .filter(|(k, _)| !pair.contains(k))
                .all(|(_, r)| ratio_ok(r));
        if others_ok {
            Some(m)
        } else {
            None
        }
    }

    fn apply_coalesce(&mut self, x: usize, y: usize, bounds: &[usize]) {
        let xc = self.div_col(x);
        let yc = self.div_col(y);
        let mut pair: Vec<usize> = bounds
            .iter()
            .copied()
            .filter(|&k| self.ineqs[k][yc].is_zero())
            .collect();
        pair.sort_unstable_by(|a, b| b.cmp(a));
        for k in pair {
            self.ineqs.remove(k);
        }
        for r in self.eqs.iter_mut().chain(self.ineqs.iter_mut()) {
            if !r[xc].is_zero() {
                r[yc] = r[xc].clone();
                r[xc] = BigInt::zero();
            }
        }
        let width = self.width();
        self.divs[y] = Div::unknown(width);
        self.divs[x] = Div::unknown(width);
        self.remove_div_column(x);
    }

    /// Drop a div that occurs in exactly two inequalities, with opposite
    /// coefficients `a` and `-a`, when the rest of the piece guarantees
    /// that the gap between the bounds always contains a multiple of `a`.
    pub fn drop_redundant_divs(&mut self, options: &Options) -> PolyResult<bool> {
        if self.flags.empty || self.flags.rational {
            return Ok(false);
        }
        let mut changed = false;
        let mut pos = self.n_div();
        while pos > 0 {
            pos -= 1;
            let col = self.div_col(pos);
            if self.div_in_eqs(col) || self.div_in_other_defs(pos, col) {
                continue;
            }
            let rows: Vec<usize> = (0..self.ineqs.len())
                .filter(|&k| !self.ineqs[k][col].is_zero())
                .collect();
            if rows.is_empty() {
                self.remove_div_column(pos);
                changed = true;
                continue;
            }
            if rows.len() != 2 {
                continue;
            }
            let (r0, r1) = (&self.ineqs[rows[0]], &self.ineqs[rows[1]]);
            if !(&r0[col] + &r1[col]).is_zero() {
                continue;
            }
            let a = r0[col].abs();
            let mut gap: Row = r0.iter().zip(r1.iter()).map(|(u, v)| u + v).collect();
            gap[col] = BigInt::zero();
            let mut rest = self.clone();
            rest.ineqs.remove(rows[1]);
            rest.ineqs.remove(rows[0]);
            let tab = Tableau::from_basic_set(&rest, options);
            match tab.minimize(&gap)? {
                LpResult::Empty => {
                    self.set_to_empty();
                    return Ok(true);
                }
                LpResult::Ok { value, .. } => {
                    if value >= BigRational::from_integer(&a - BigInt::one()) {
                        trace!("drop_redundant_divs: dropping div {}", pos);
                        self.ineqs.remove(rows[1]);
                        self.ineqs.remove(rows[0]);
                        self.remove_div_column(pos);
                        changed = true;
                    }
                }
                LpResult::Unbounded => {}
            }
        }
        Ok(changed)
    }

    /// Positions of the divs that occur in some equality but in no
    /// inequality and no other div definition.
    fn equality_only_divs(&self) -> Vec<usize> {
        (0..self.n_div())
            .filter(|&pos| {
                let col = self.div_col(pos);
                self.div_in_eqs(col)
                    && !self.ineqs.iter().any(|r| !r[col].is_zero())
                    && !self.div_in_other_defs(pos, col)
            })
            .collect()
    }

    /// Replace equalities until the `dcols` block of the equalities using
    /// those columns has full row rank. Each replacement is a rational
    /// combination of the users with a zero `dcols` block, which takes the
    /// place of one of the combined rows.
    fn separate_pure_equalities(&mut self, dcols: &[usize]) {
        loop {
            let users: Vec<usize> = (0..self.eqs.len())
                .filter(|&k| dcols.iter().any(|&c| !self.eqs[k][c].is_zero()))
                .collect();
            let block: Vec<Row> = dcols
                .iter()
                .map(|&c| users.iter().map(|&k| self.eqs[k][c].clone()).collect())
                .collect();
            let ns = RationalMatrix::from_int_rows(&block, users.len()).nullspace();
            let Some(lambda) = ns.first() else {
                return;
            };
            let lambda = rational_to_integer_row(lambda);
            let Some(i) = lambda.iter().position(|v| !v.is_zero()) else {
                return;
            };
            let mut row = vec![BigInt::zero(); self.width()];
            for (l, &k) in lambda.iter().zip(&users) {
                if l.is_zero() {
                    continue;
                }
                for (acc, v) in row.iter_mut().zip(&self.eqs[k]) {
                    *acc += l * v;
                }
            }
            make_primitive(&mut row);
            trace!("normalize_divs: equality {} has no div part", users[i]);
            self.eqs[users[i]] = row;
        }
    }

    /// Bring the divs that occur only in equalities into canonical form.
    ///
    /// Such divs only require the remaining variables `v` of those
    /// equalities to lie in an integer lattice coset `v0 + L`. The coset is
    /// read off a compression of the equalities, `L` is brought into
    /// Hermite normal form `H` and `v0` is reduced modulo `H`. Every
    /// column `w` of `H^-1` with a fractional entry gives the congruence
    /// `a . v = b (mod d)` with `d` the lcm of the denominators of `w` and
    /// `a = d*w`, reduced modulo `d`. Each congruence becomes the equality
    /// `b - a . v + d*e = 0` over a fresh div `e = floor((a . v - b) / d)`,
    /// replacing the old divs and equalities. Pieces with the same coset
    /// get identical rows and divs.
    pub fn normalize_divs(&mut self) -> bool {
        if self.flags.empty || self.flags.rational {
            return false;
        }
        let dpos = self.equality_only_divs();
        if dpos.is_empty() {
            return false;
        }
        let dcols: Vec<usize> = dpos.iter().map(|&p| self.div_col(p)).collect();
        let mut work = self.clone();
        work.separate_pure_equalities(&dcols);
        let users: Vec<usize> = (0..work.eqs.len())
            .filter(|&k| dcols.iter().any(|&c| !work.eqs[k][c].is_zero()))
            .collect();
        let jcols: Vec<usize> = (1..work.width())
            .filter(|c| !dcols.contains(c) && users.iter().any(|&k| !work.eqs[k][*c].is_zero()))
            .collect();
        let system: Vec<Row> = users
            .iter()
            .map(|&k| {
                let r = &work.eqs[k];
                std::iter::once(r[0].clone())
                    .chain(jcols.iter().chain(&dcols).map(|&c| r[c].clone()))
                    .collect()
            })
            .collect();
        let Some(comp) = compress_equalities(&system, jcols.len() + dcols.len()) else {
            debug!("normalize_divs: no integer solution");
            self.set_to_empty();
            return true;
        };
        let Some(congruences) = lattice_congruences(&comp, jcols.len()) else {
            return false;
        };

        let mut users_desc = users;
        users_desc.sort_unstable_by(|a, b| b.cmp(a));
        for k in users_desc {
            work.eqs.remove(k);
        }
        for &pos in dpos.iter().rev() {
            work.remove_div_column(pos);
        }
        let shifted: Vec<usize> = jcols
            .iter()
            .map(|&c| c - dcols.iter().filter(|&&d| d < c).count())
            .collect();
        for (d, a, b) in congruences {
            let pos = work.alloc_div();
            let col = work.div_col(pos);
            let mut expr = vec![BigInt::zero(); work.width()];
            expr[0] = -&b;
            for (&c, v) in shifted.iter().zip(&a) {
                expr[c] = v.clone();
            }
            let mut row: Row = expr.iter().map(|v| -v).collect();
            row[col] = d.clone();
            work.eqs.push(row);
            work.divs[pos] = Div { denom: d, expr };
        }
        work.gauss();
        if work == *self {
            return false;
        }
        trace!(
            "normalize_divs: {} divs in equalities become {}",
            dpos.len(),
            work.n_div() + dpos.len() - self.n_div()
        );
        *self = work;
        self.flags.clear_derived();
        self.sample = None;
        true
    }

    /// Run the non-LP simplifications to a fixpoint.
    pub fn simplify(&mut self) {
        for round in 0..MAX_SIMPLIFY_ROUNDS {
            if self.flags.empty {
                return;
            }
            let before = self.clone();
            self.normalize_constraints();
            self.gauss();
            self.eliminate_divs_eq();
            self.eliminate_divs_ineq();
            self.remove_duplicate_constraints();
            self.remove_duplicate_divs();
            self.coalesce_divs();
            self.normalize_divs();
            if *self == before {
                trace!("simplify: fixpoint after {} rounds", round + 1);
                break;
            }
        }
        if !self.flags.empty {
            self.flags.normalized = true;
        }
    }

    /// Simplify, then drop redundant divs and redundant constraints.
    pub fn finalize(&mut self, options: &Options) -> PolyResult<()> {
        self.simplify();
        if self.drop_redundant_divs(options)? {
            self.simplify();
        }
        self.remove_redundancies(options)?;
        Ok(())
    }

    /// Simplified copy of the piece.
    pub fn simplified(&self) -> BasicSet {
        let mut out = self.clone();
        out.simplify();
        out
    }
}

/// The congruences `(d, a, b)`, meaning `a . v = b (mod d)`, that cut the
/// lattice coset spanned by the first `m` coordinates of a compression out
/// of `Z^m`. `None` if the coset does not have full rank.
fn lattice_congruences(comp: &Compression, m: usize) -> Option<Vec<(BigInt, Row, BigInt)>> {
    if m == 0 {
        return Some(Vec::new());
    }
    let gens: Vec<Row> = (0..comp.n_free())
        .map(|k| (0..m).map(|i| comp.basis[i][k].clone()).collect())
        .collect();
    let h = hermite_normal_form(&gens, m);
    if h.len() < m {
        return None;
    }
    let mut v0 = comp.offset[..m].to_vec();
    for r in 0..m {
        let q = floor_div(&v0[r], &h[r][r]);
        if q.is_zero() {
            continue;
        }
        for c in r..m {
            v0[c] -= &q * &h[r][c];
        }
    }
    let inv = RationalMatrix::from_int_rows(&h, m).inverse()?;
    let mut out = Vec::new();
    for j in 0..m {
        let w: Vec<BigRational> = (0..m)
            .map(|i| inv.get(i, j).cloned().unwrap_or_else(BigRational::zero))
            .collect();
        if w.iter().all(|x| x.is_integer()) {
            continue;
        }
        let d = lcm_denominators(&w);
        let a: Row = rational_to_integer_row(&w).iter().map(|x| x.mod_floor(&d)).collect();
        let b = a
            .iter()
            .zip(&v0)
            .fold(BigInt::zero(), |acc, (x, y)| acc + x * y)
            .mod_floor(&d);
        out.push((d, a, b));
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use crate::context::Options;
    use crate::polyhedral::basic_set::BasicSet;
    use crate::polyhedral::space::Space;
    use crate::utils::arith::{int, row_from_i64};

    fn pt(v: i64) -> Vec<num_bigint::BigInt> {
        vec![int(v)]
    }

    #[test]
    fn test_eliminate_divs_eq() {
        // x = e0 + 1 with e0 unknown is the universe
        let mut bset = BasicSet::universe(Space::set(1));
        bset.alloc_div();
        bset.add_equality(row_from_i64(&[-1, 1, -1])).unwrap();
        bset.gauss();
        assert!(bset.eliminate_divs_eq());
        assert_eq!(bset.n_div(), 0);
        assert!(bset.eqs().is_empty());
    }

    #[test]
    fn test_eliminate_divs_ineq() {
        // exists e: x <= e <= y becomes x <= y
        let mut bset = BasicSet::universe(Space::set(2));
        bset.alloc_div();
        bset.add_inequality(row_from_i64(&[0, -1, 0, 1])).unwrap();
        bset.add_inequality(row_from_i64(&[0, 0, 1, -1])).unwrap();
        assert!(bset.eliminate_divs_ineq());
        assert_eq!(bset.n_div(), 0);
        assert_eq!(bset.ineqs(), &[row_from_i64(&[0, -1, 1])]);
    }

    #[test]
    fn test_remove_duplicate_divs() {
        let mut bset = BasicSet::universe(Space::set(1));
        bset.add_div(int(2), row_from_i64(&[0, 1])).unwrap();
        bset.add_div(int(2), row_from_i64(&[0, 1, 0])).unwrap();
        assert!(bset.remove_duplicate_divs());
        assert_eq!(bset.n_div(), 1);
    }

    #[test]
    fn test_coalesce_divs() {
        // t = x + 3y with 0 <= x <= 2 is every integer t
        let mut bset = BasicSet::universe(Space::set(1));
        bset.alloc_div();
        bset.alloc_div();
        bset.add_equality(row_from_i64(&[0, 1, -1, -3])).unwrap();
        bset.add_inequality(row_from_i64(&[0, 0, 1, 0])).unwrap();
        bset.add_inequality(row_from_i64(&[2, 0, -1, 0])).unwrap();
        assert!(bset.coalesce_divs());
        assert_eq!(bset.n_div(), 1);
        assert!(bset.ineqs().is_empty());
        bset.simplify();
        assert_eq!(bset.n_div(), 0);
        assert!(bset.eqs().is_empty());
    }

    #[test]
    fn test_drop_redundant_divs() {
        // e0 = floor(x / 2) used nowhere else
        let mut bset = BasicSet::from_i64(Space::set(1), &[], &[&[0, 1]]).unwrap();
        bset.add_div(int(2), row_from_i64(&[0, 1])).unwrap();
        assert!(bset.drop_redundant_divs(&Options::default()).unwrap());
        assert_eq!(bset.n_div(), 0);
        assert_eq!(bset.ineqs().len(), 1);
    }

    #[test]
    fn test_normalize_divs_canonical() {
        // x = 2e and x = 2e + 4 give the same canonical piece
        let build = |c: i64| {
            let mut bset = BasicSet::universe(Space::set(1));
            bset.alloc_div();
            bset.add_equality(row_from_i64(&[c, 1, -2])).unwrap();
            bset.simplify();
            bset
        };
        let a = build(0);
        let b = build(-4);
        assert_eq!(a, b);
        assert_eq!(a.eqs(), &[row_from_i64(&[0, -1, 2])]);
        assert!(a.contains(&pt(4)).unwrap());
        assert!(!a.contains(&pt(3)).unwrap());
    }

    fn with_div_equalities(n: usize, n_div: usize, eqs: &[&[i64]]) -> BasicSet {
        let mut bset = BasicSet::universe(Space::set(n));
        for _ in 0..n_div {
            bset.alloc_div();
        }
        for e in eqs {
            bset.add_equality(row_from_i64(e)).unwrap();
        }
        bset.simplify();
        bset
    }

    #[test]
    fn test_normalize_divs_equal_lattices() {
        // x + y = 3e, x - y = 3f  and  x + y = 3e, 2x = 3f  both say 3 | x, 3 | y
        let a = with_div_equalities(2, 2, &[&[0, 1, 1, -3, 0], &[0, 1, -1, 0, -3]]);
        let b = with_div_equalities(2, 2, &[&[0, 1, 1, -3, 0], &[0, 2, 0, 0, -3]]);
        assert_eq!(a, b);
        assert_eq!(a.n_div(), 2);
        for x in -3..=3 {
            for y in -3..=3 {
                let p = row_from_i64(&[x, y]);
                assert_eq!(a.contains(&p).unwrap(), x % 3 == 0 && y % 3 == 0);
            }
        }
    }

    #[test]
    fn test_normalize_divs_nested_multiples() {
        // x = 2p, p = 2q  is  x = 4e
        let a = with_div_equalities(1, 2, &[&[0, 1, -2, 0], &[0, 0, 1, -2]]);
        let b = with_div_equalities(1, 1, &[&[0, 1, -4]]);
        assert_eq!(a, b);
        assert_eq!(a.divs()[0].denom, int(4));
        let again = {
            let mut c = a.clone();
            c.simplify();
            c
        };
        assert_eq!(again, a);
    }

    #[test]
    fn test_normalize_divs_offset_coset() {
        // x + 2y = 6e + 1 has no even-x solutions and fixes x + 2y mod 6
        let a = with_div_equalities(2, 1, &[&[-1, 1, 2, -6]]);
        let b = with_div_equalities(2, 1, &[&[-7, 1, 2, 6]]);
        assert_eq!(a, b);
        assert!(a.contains(&row_from_i64(&[1, 0])).unwrap());
        assert!(a.contains(&row_from_i64(&[3, -1])).unwrap());
        assert!(!a.contains(&row_from_i64(&[2, 0])).unwrap());
    }

    #[test]
    fn test_normalize_divs_infeasible() {
        // 2x = 4e + 1 has no integer solution
        let a = with_div_equalities(1, 1, &[&[-1, 2, -4]]);
        assert!(a.is_marked_empty());
    }

    #[test]
    fn test_simplify_keeps_required_div() {
        // x even, 0 <= x <= 4
        let mut bset = BasicSet::from_i64(Space::set(1), &[], &[&[0, 1], &[4, -1]]).unwrap();
        let d = bset.alloc_div();
        let mut row = vec![int(0); bset.width()];
        row[1] = int(1);
        row[bset.div_col(d)] = int(-2);
        bset.add_equality(row).unwrap();
        bset.finalize(&Options::default()).unwrap();
        assert_eq!(bset.n_div(), 1);
        for x in 0..=4 {
            assert_eq!(bset.contains(&pt(x)).unwrap(), x % 2 == 0);
        }
        assert!(!bset.contains(&pt(6)).unwrap());
    }

    #[test]
    fn test_simplify_idempotent() {
        let mut bset = BasicSet::from_i64(
            Space::set(2),
            &[&[-2, 2, 2]],
            &[&[0, 1, 0], &[1, 1, 0], &[6, -2, 0]],
        )
        .unwrap();
        bset.simplify();
        let again = bset.simplified();
        assert_eq!(bset, again);
    }
}
