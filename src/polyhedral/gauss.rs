//! Gaussian reduction and constraint normalization of a piece.

use crate::polyhedral::basic_set::BasicSet;
use crate::utils::arith::{eliminate_column, floor_div, gcd_slice, make_primitive, negate};
use log::trace;
use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{One, Signed, Zero};

impl BasicSet {
    /// Eliminate variables through the equalities.
    ///
    /// Columns are visited from the last variable down. The first
    /// unprocessed equality with a nonzero entry in the column becomes the
    /// pivot for that column: its sign is made positive and the column is
    /// removed from every other equality, inequality and div definition.
    /// Since pivots are taken on the highest remaining variable, an unknown
    /// div that becomes a pivot can take its definition from the equality
    /// without referring to a later div.
    pub fn gauss(&mut self) {
        if self.flags.empty {
            return;
        }
        let width = self.width();
        let first_div_col = self.div_col(0);
        let mut done = 0;
        let mut changed = false;
        for col in (1..width).rev() {
            if done == self.eqs.len() {
                break;
            }
            let Some(k) = (done..self.eqs.len()).find(|&k| !self.eqs[k][col].is_zero()) else {
                continue;
            };
            self.eqs.swap(done, k);
            if self.eqs[done][col].is_negative() {
                negate(&mut self.eqs[done]);
            }
            let pivot = self.eqs[done].clone();
            for (k, row) in self.eqs.iter_mut().enumerate() {
                if k != done && !row[col].is_zero() {
                    eliminate_column(row, &pivot, col);
                    make_primitive(row);
                    changed = true;
                }
            }
            for row in self.ineqs.iter_mut() {
                if !row[col].is_zero() {
                    eliminate_column(row, &pivot, col);
                    make_primitive(row);
                    changed = true;
                }
            }
            for div in self.divs.iter_mut() {
                if !div.is_known() || div.expr[col].is_zero() {
                    continue;
                }
                let m = eliminate_column(&mut div.expr, &pivot, col);
                div.denom *= m;
                let mut g = gcd_slice(&div.expr);
                g = g.gcd(&div.denom);
                if g > BigInt::one() {
                    div.denom = &div.denom / &g;
                    for v in div.expr.iter_mut() {
                        *v = &*v / &g;
                    }
                }
                changed = true;
            }
            if col >= first_div_col {
                let d = col - first_div_col;
                if !self.divs[d].is_known() {
                    let mut expr: Vec<BigInt> = pivot.iter().map(|v| -v).collect();
                    expr[col] = BigInt::zero();
                    self.divs[d].denom = pivot[col].clone();
                    self.divs[d].expr = expr;
                    trace!("gauss: div {} defined by an equality", d);
                    changed = true;
                }
            }
            done += 1;
        }
        for k in done..self.eqs.len() {
            if !self.eqs[k][0].is_zero() {
                self.set_to_empty();
                return;
            }
        }
        if done < self.eqs.len() {
            self.eqs.truncate(done);
            changed = true;
        }
        if changed {
            self.flags.clear_derived();
            self.sample = None;
        }
    }

    /// Divide every row by the gcd of its coefficients.
    ///
    /// On integer pieces the constant of an inequality is then rounded
    /// down and an equality whose constant is not a multiple of the gcd
    /// makes the piece empty. On rational pieces rows are only divided by
    /// the gcd of all of their entries.
    pub fn normalize_constraints(&mut self) {
        if self.flags.empty {
            return;
        }
        let rational = self.flags.rational;
        let mut k = 0;
        while k < self.eqs.len() {
            let row = &mut self.eqs[k];
            let g = gcd_slice(&row[1..]);
            if g.is_zero() {
                if !row[0].is_zero() {
                    self.set_to_empty();
                    return;
                }
                self.eqs.remove(k);
                continue;
            }
            if rational {
                make_primitive(row);
            } else if !g.is_one() {
                if !row[0].is_multiple_of(&g) {
                    self.set_to_empty();
                    return;
                }
                for v in row.iter_mut() {
                    *v = &*v / &g;
                }
            }
            k += 1;
        }
        let mut k = 0;
        while k < self.ineqs.len() {
            let row = &mut self.ineqs[k];
            let g = gcd_slice(&row[1..]);
            if g.is_zero() {
                if row[0].is_negative() {
                    self.set_to_empty();
                    return;
                }
                self.ineqs.remove(k);
                continue;
            }
            if rational {
                make_primitive(row);
            } else if !g.is_one() {
                row[0] = floor_div(&row[0], &g);
                for v in row[1..].iter_mut() {
                    *v = &*v / &g;
                }
            }
            k += 1;
        }
        for div in self.divs.iter_mut().filter(|d| d.is_known()) {
            let g = gcd_slice(&div.expr).gcd(&div.denom);
            if g > BigInt::one() {
                div.denom = &div.denom / &g;
                for v in div.expr.iter_mut() {
                    *v = &*v / &g;
                }
            }
        }
        self.flags.normalized = true;
    }
}

#[cfg(test)]
mod tests {
    use crate::polyhedral::basic_set::BasicSet;
    use crate::polyhedral::space::Space;
    use crate::utils::arith::{int, row_from_i64};

    #[test]
    fn test_gauss_eliminates_highest_variable() {
        // x + y = 2, y >= 0, x - y >= -4
        let mut bset =
            BasicSet::from_i64(Space::set(2), &[&[-2, 1, 1]], &[&[0, 0, 1], &[4, 1, -1]]).unwrap();
        bset.gauss();
        assert_eq!(bset.eqs(), &[row_from_i64(&[-2, 1, 1])]);
        // y = 2 - x substituted: 2 - x >= 0 and 2x + 2 >= 0 made primitive
        assert_eq!(bset.ineqs(), &[row_from_i64(&[2, -1, 0]), row_from_i64(&[1, 1, 0])]);
    }

    #[test]
    fn test_gauss_detects_contradiction() {
        let mut bset =
            BasicSet::from_i64(Space::set(1), &[&[-1, 1], &[-2, 1]], &[]).unwrap();
        bset.gauss();
        assert!(bset.is_marked_empty());
    }

    #[test]
    fn test_gauss_drops_dependent_equalities() {
        let mut bset =
            BasicSet::from_i64(Space::set(2), &[&[-1, 1, 1], &[-2, 2, 2]], &[]).unwrap();
        bset.gauss();
        assert_eq!(bset.eqs().len(), 1);
        assert!(!bset.is_marked_empty());
    }

    #[test]
    fn test_gauss_defines_unknown_div() {
        // x = 3 * e0 with e0 unknown
        let mut bset = BasicSet::universe(Space::set(1));
        bset.alloc_div();
        bset.add_equality(row_from_i64(&[0, 1, -3])).unwrap();
        bset.gauss();
        let div = &bset.divs()[0];
        assert_eq!(div.denom, int(3));
        assert_eq!(div.expr, row_from_i64(&[0, 1, 0]));
    }

    #[test]
    fn test_normalize_tightens_inequalities() {
        // 2x - 3 >= 0 becomes x - 2 >= 0
        let mut bset = BasicSet::from_i64(Space::set(1), &[], &[&[-3, 2]]).unwrap();
        bset.normalize_constraints();
        assert_eq!(bset.ineqs(), &[row_from_i64(&[-2, 1])]);
    }

    #[test]
    fn test_normalize_rational_keeps_bounds() {
        let mut bset = BasicSet::from_i64(Space::set(1), &[], &[&[-3, 2]])
            .unwrap()
            .into_rational();
        bset.normalize_constraints();
        assert_eq!(bset.ineqs(), &[row_from_i64(&[-3, 2])]);
    }

    #[test]
    fn test_normalize_equalities() {
        let mut bset = BasicSet::from_i64(Space::set(2), &[&[1, 2, 4]], &[]).unwrap();
        bset.normalize_constraints();
        assert!(bset.is_marked_empty());

        let mut bset = BasicSet::from_i64(Space::set(2), &[&[0, 0, 0]], &[&[-1, 0, 0]]).unwrap();
        bset.normalize_constraints();
        assert!(bset.is_marked_empty());

        let mut bset = BasicSet::from_i64(Space::set(2), &[&[0, 0, 0]], &[&[2, 0, 0]]).unwrap();
        bset.normalize_constraints();
        assert!(bset.eqs().is_empty() && bset.ineqs().is_empty());
    }
}
