//! Removal of duplicate, redundant and implicit-equality constraints.

use crate::context::Options;
use crate::lp::Tableau;
use crate::polyhedral::basic_set::{BasicSet, Div};
use crate::utils::arith::{gcd_slice, Row};
use crate::utils::errors::PolyResult;
use log::trace;
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{Signed, Zero};
use rustc_hash::FxHashMap;
use std::collections::hash_map::Entry;

/// Normal direction of an inequality and its constant in units of that
/// direction, or `None` for a constant row.
pub(crate) fn direction(row: &[BigInt]) -> Option<(Row, BigRational)> {
    let g = gcd_slice(&row[1..]);
    if g.is_zero() {
        return None;
    }
    let dir = row[1..].iter().map(|v| v / &g).collect();
    Some((dir, BigRational::new(row[0].clone(), g)))
}

impl BasicSet {
    /// Hash the inequalities by normal direction: among parallel rows keep
    /// the tightest, turn an opposite pair that pins the direction into an
    /// equality and mark the piece empty for a contradictory pair.
    pub fn remove_duplicate_constraints(&mut self) -> bool {
        if self.flags.empty || self.ineqs.is_empty() {
            return false;
        }
        let mut changed = false;
        let mut kept: Vec<(Row, BigRational)> = Vec::with_capacity(self.ineqs.len());
        let mut rows: Vec<Row> = Vec::with_capacity(self.ineqs.len());
        let mut index: FxHashMap<Row, usize> = FxHashMap::default();
        for row in std::mem::take(&mut self.ineqs) {
            let Some((dir, c)) = direction(&row) else {
                if row[0].is_negative() {
                    self.set_to_empty();
                    return true;
                }
                changed = true;
                continue;
            };
            match index.entry(dir.clone()) {
                Entry::Occupied(e) => {
                    let i = *e.get();
                    if c < kept[i].1 {
                        kept[i].1 = c;
                        rows[i] = row;
                    }
                    changed = true;
                }
                Entry::Vacant(e) => {
                    e.insert(rows.len());
                    kept.push((dir, c));
                    rows.push(row);
                }
            }
        }
        let mut drop = vec![false; rows.len()];
        let mut new_eqs = Vec::new();
        for i in 0..rows.len() {
            if drop[i] {
                continue;
            }
            let neg: Row = kept[i].0.iter().map(|v| -v).collect();
            let Some(&j) = index.get(&neg) else {
                continue;
            };
            if j <= i || drop[j] {
                continue;
            }
            let sum = &kept[i].1 + &kept[j].1;
            if sum.is_negative() {
                self.set_to_empty();
                return true;
            }
            if sum.is_zero() {
                trace!("remove_duplicate_constraints: implicit equality from rows {} and {}", i, j);
                drop[i] = true;
                drop[j] = true;
                new_eqs.push(rows[i].clone());
            }
        }
        self.ineqs = rows
            .into_iter()
            .zip(drop)
            .filter_map(|(r, d)| if d { None } else { Some(r) })
            .collect();
        if !new_eqs.is_empty() {
            self.eqs.extend(new_eqs);
            changed = true;
        }
        if changed {
            self.flags.clear_derived();
        }
        changed
    }

    /// Whether inequality `k` bounds some variable in a direction no other
    /// row bounds it in, which makes it irredundant.
    fn has_lonely_bound(&self, k: usize) -> bool {
        let row = &self.ineqs[k];
        (1..row.len()).any(|col| {
            let s = row[col].signum();
            !s.is_zero()
                && self.eqs.iter().all(|e| e[col].is_zero())
                && self
                    .ineqs
                    .iter()
                    .enumerate()
                    .all(|(j, r)| j == k || r[col].signum() != s)
        })
    }

    /// Remove every inequality implied by the rest of the piece over the
    /// rationals. The piece is first reduced by its equalities; an empty
    /// relaxation marks the piece empty.
    pub fn remove_redundancies(&mut self, options: &Options) -> PolyResult<()> {
        if self.flags.empty || self.flags.no_redundant {
            return Ok(());
        }
        self.gauss();
        if self.flags.empty {
            return Ok(());
        }
        if self.ineqs.is_empty() {
            self.flags.no_redundant = true;
            return Ok(());
        }
        let tab = Tableau::from_basic_set(self, options);
        if tab.is_empty()? {
            self.set_to_empty();
            return Ok(());
        }
        let candidates: Vec<bool> = (0..self.ineqs.len())
            .map(|k| !self.has_lonely_bound(k))
            .collect();
        let redundant = tab.redundant_rows(&candidates)?;
        if !redundant.is_empty() {
            trace!("remove_redundancies: dropping {} rows", redundant.len());
            for &k in redundant.iter().rev() {
                self.ineqs.remove(k);
            }
            self.flags.clear_derived();
        }
        self.flags.no_redundant = true;
        Ok(())
    }

    /// Turn every inequality that holds with equality on the whole
    /// relaxation into an equality.
    pub fn detect_equalities(&mut self, options: &Options) -> PolyResult<()> {
        if self.flags.empty || self.flags.no_implicit {
            return Ok(());
        }
        let tab = Tableau::from_basic_set(self, options);
        let Some(implicit) = tab.implicit_equalities()? else {
            self.set_to_empty();
            return Ok(());
        };
        if !implicit.is_empty() {
            for &k in implicit.iter().rev() {
                let row = self.ineqs.remove(k);
                self.eqs.push(row);
            }
            self.flags.clear_derived();
            self.gauss();
            self.normalize_constraints();
        }
        self.flags.no_implicit = true;
        Ok(())
    }

    /// The smallest affine subspace containing the relaxation of the piece.
    pub fn affine_hull(&self, options: &Options) -> PolyResult<BasicSet> {
        let mut hull = self.clone();
        hull.detect_equalities(options)?;
        if hull.flags.empty {
            return Ok(hull);
        }
        hull.ineqs.clear();
        let width = hull.width();
        for div in hull.divs.iter_mut() {
            *div = Div::unknown(width);
        }
        hull.flags.clear_derived();
        hull.sample = None;
        hull.simplify();
        Ok(hull)
    }
}

#[cfg(test)]
mod tests {
    use crate::context::Options;
    use crate::polyhedral::basic_set::BasicSet;
    use crate::polyhedral::space::Space;
    use crate::utils::arith::row_from_i64;

    #[test]
    fn test_duplicates_keep_tightest() {
        // x >= 0, x >= -1, 2x >= -4, x <= 5
        let mut bset =
            BasicSet::from_i64(Space::set(1), &[], &[&[0, 1], &[1, 1], &[4, 2], &[5, -1]]).unwrap();
        assert!(bset.remove_duplicate_constraints());
        assert_eq!(bset.ineqs(), &[row_from_i64(&[0, 1]), row_from_i64(&[5, -1])]);
    }

    #[test]
    fn test_opposite_pair_becomes_equality() {
        let mut bset =
            BasicSet::from_i64(Space::set(2), &[], &[&[-3, 1, 1], &[3, -1, -1], &[0, 1, 0]]).unwrap();
        bset.remove_duplicate_constraints();
        assert_eq!(bset.eqs(), &[row_from_i64(&[-3, 1, 1])]);
        assert_eq!(bset.ineqs(), &[row_from_i64(&[0, 1, 0])]);
    }

    #[test]
    fn test_contradictory_pair() {
        let mut bset = BasicSet::from_i64(Space::set(1), &[], &[&[-3, 1], &[2, -1]]).unwrap();
        bset.remove_duplicate_constraints();
        assert!(bset.is_marked_empty());
    }

    #[test]
    fn test_remove_redundancies() {
        // x >= 0, y >= 0, x + y <= 4, x + y <= 10, x <= 7
        let mut bset = BasicSet::from_i64(
            Space::set(2),
            &[],
            &[&[0, 1, 0], &[0, 0, 1], &[4, -1, -1], &[10, -1, -1], &[7, -1, 0]],
        )
        .unwrap();
        bset.remove_redundancies(&Options::default()).unwrap();
        assert_eq!(bset.ineqs().len(), 3);
        assert!(bset.flags().no_redundant);
        let before = bset.ineqs().to_vec();
        bset.flags.no_redundant = false;
        bset.remove_redundancies(&Options::default()).unwrap();
        assert_eq!(bset.ineqs(), before.as_slice());
    }

    #[test]
    fn test_remove_redundancies_detects_empty() {
        let mut bset = BasicSet::from_i64(Space::set(2), &[], &[&[-1, 1, 1], &[0, -1, 0], &[0, 0, -1]])
            .unwrap();
        bset.remove_redundancies(&Options::default()).unwrap();
        assert!(bset.is_marked_empty());
    }

    #[test]
    fn test_detect_equalities() {
        // x >= y, y >= x, 0 <= x <= 3
        let mut bset = BasicSet::from_i64(
            Space::set(2),
            &[],
            &[&[0, 1, -1], &[0, -1, 1], &[0, 1, 0], &[3, -1, 0]],
        )
        .unwrap();
        bset.detect_equalities(&Options::default()).unwrap();
        assert_eq!(bset.eqs().len(), 1);
        assert_eq!(bset.ineqs().len(), 2);

        let hull = bset.affine_hull(&Options::default()).unwrap();
        assert_eq!(hull.eqs().len(), 1);
        assert!(hull.ineqs().is_empty());
    }
}
