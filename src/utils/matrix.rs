//! Matrix operations for changes of basis.
//!
//! Rational matrices are used where only the rational hull matters
//! (affine-hull factoring, lineality projection); integer unimodular
//! operations are used where the integer lattice must be preserved
//! (equality compression for the ILP optimizer, homogenization along a
//! valid direction).

use crate::utils::arith::{extended_gcd, gcd_slice, Row};
use crate::utils::errors::{PolyError, PolyResult};
use num_bigint::BigInt;
use num_integer::Integer;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};
use std::fmt;

/// A matrix with rational entries, used for exact arithmetic in polyhedral operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RationalMatrix {
    data: Vec<Vec<BigRational>>,
    rows: usize,
    cols: usize,
}

impl RationalMatrix {
    /// Create a new matrix with the given dimensions, initialized to zero.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            data: vec![vec![BigRational::zero(); cols]; rows],
            rows,
            cols,
        }
    }

    /// Create an identity matrix.
    pub fn identity(n: usize) -> Self {
        let mut mat = Self::zeros(n, n);
        for i in 0..n {
            mat.data[i][i] = BigRational::one();
        }
        mat
    }

    /// Create a matrix from rational rows. All rows must have `cols` entries.
    pub fn from_rows(data: Vec<Vec<BigRational>>, cols: usize) -> Self {
        let rows = data.len();
        debug_assert!(data.iter().all(|r| r.len() == cols));
        Self { data, rows, cols }
    }

    /// Create a matrix from integer rows.
    pub fn from_int_rows(data: &[Row], cols: usize) -> Self {
        let data = data
            .iter()
            .map(|row| row.iter().map(|x| BigRational::from_integer(x.clone())).collect())
            .collect();
        Self::from_rows(data, cols)
    }

    /// Get the number of rows.
    pub fn nrows(&self) -> usize {
        self.rows
    }

    /// Get the number of columns.
    pub fn ncols(&self) -> usize {
        self.cols
    }

    /// Get an element.
    pub fn get(&self, row: usize, col: usize) -> Option<&BigRational> {
        self.data.get(row)?.get(col)
    }

    /// Set an element.
    pub fn set(&mut self, row: usize, col: usize, value: BigRational) {
        if row < self.rows && col < self.cols {
            self.data[row][col] = value;
        }
    }

    /// Get a row.
    pub fn row(&self, row: usize) -> Option<&Vec<BigRational>> {
        self.data.get(row)
    }

    /// All rows.
    pub fn rows(&self) -> &[Vec<BigRational>] {
        &self.data
    }

    /// Transpose the matrix.
    pub fn transpose(&self) -> Self {
        let mut result = Self::zeros(self.cols, self.rows);
        for i in 0..self.rows {
            for j in 0..self.cols {
                result.data[j][i] = self.data[i][j].clone();
            }
        }
        result
    }

    /// Matrix multiplication.
    pub fn mul(&self, other: &Self) -> Option<Self> {
        if self.cols != other.rows {
            return None;
        }
        let mut result = Self::zeros(self.rows, other.cols);
        for i in 0..self.rows {
            for k in 0..self.cols {
                if self.data[i][k].is_zero() {
                    continue;
                }
                for j in 0..other.cols {
                    let prod = &self.data[i][k] * &other.data[k][j];
                    result.data[i][j] = &result.data[i][j] + prod;
                }
            }
        }
        Some(result)
    }

    /// Row vector times matrix: `v * self`.
    pub fn left_mul_vec(&self, v: &[BigRational]) -> Option<Vec<BigRational>> {
        if self.rows != v.len() {
            return None;
        }
        let mut result = vec![BigRational::zero(); self.cols];
        for (k, vk) in v.iter().enumerate() {
            if vk.is_zero() {
                continue;
            }
            for j in 0..self.cols {
                result[j] = &result[j] + vk * &self.data[k][j];
            }
        }
        Some(result)
    }

    /// Reduced row echelon form; returns the matrix and its pivot columns.
    pub fn rref(&self) -> (Self, Vec<usize>) {
        let mut m = self.clone();
        let mut pivots = Vec::new();
        let mut r = 0;
        for c in 0..m.cols {
            if r == m.rows {
                break;
            }
            let Some(p) = (r..m.rows).find(|&i| !m.data[i][c].is_zero()) else {
                continue;
            };
            m.data.swap(r, p);
            let pivot = m.data[r][c].clone();
            for j in 0..m.cols {
                m.data[r][j] = &m.data[r][j] / &pivot;
            }
            for i in 0..m.rows {
                if i != r && !m.data[i][c].is_zero() {
                    let factor = m.data[i][c].clone();
                    for j in 0..m.cols {
                        let delta = &factor * &m.data[r][j];
                        m.data[i][j] = &m.data[i][j] - delta;
                    }
                }
            }
            pivots.push(c);
            r += 1;
        }
        (m, pivots)
    }

    /// Rank of the matrix.
    pub fn rank(&self) -> usize {
        self.rref().1.len()
    }

    /// A basis of `{ v : self * v = 0 }`, one vector per free column.
    pub fn nullspace(&self) -> Vec<Vec<BigRational>> {
        let (r, pivots) = self.rref();
        let mut basis = Vec::new();
        for f in (0..self.cols).filter(|c| !pivots.contains(c)) {
            let mut v = vec![BigRational::zero(); self.cols];
            v[f] = BigRational::one();
            for (i, &p) in pivots.iter().enumerate() {
                v[p] = -r.data[i][f].clone();
            }
            basis.push(v);
        }
        basis
    }

    /// Compute the determinant (for square matrices).
    pub fn determinant(&self) -> Option<BigRational> {
        if self.rows != self.cols {
            return None;
        }
        let mut det = BigRational::one();
        let mut lu = self.clone();
        for k in 0..self.rows {
            let Some(p) = (k..self.rows).find(|&i| !lu.data[i][k].is_zero()) else {
                return Some(BigRational::zero());
            };
            if p != k {
                lu.data.swap(k, p);
                det = -det;
            }
            det = det * lu.data[k][k].clone();
            for i in (k + 1)..self.rows {
                let factor = &lu.data[i][k] / &lu.data[k][k];
                for j in k..self.cols {
                    let delta = &factor * &lu.data[k][j];
                    lu.data[i][j] = &lu.data[i][j] - delta;
                }
            }
        }
        Some(det)
    }

    /// Check if the matrix is unimodular (integral with determinant ±1).
    pub fn is_unimodular(&self) -> bool {
        self.is_integer()
            && self
                .determinant()
                .map(|d| d.abs().is_one())
                .unwrap_or(false)
    }

    /// Compute the inverse (for square matrices with non-zero determinant).
    pub fn inverse(&self) -> Option<Self> {
        if self.rows != self.cols {
            return None;
        }
        let n = self.rows;
        if n == 0 {
            return Some(Self::zeros(0, 0));
        }
        let mut aug = Self::zeros(n, 2 * n);
        for i in 0..n {
            for j in 0..n {
                aug.data[i][j] = self.data[i][j].clone();
            }
            aug.data[i][n + i] = BigRational::one();
        }
        let (r, pivots) = aug.rref();
        if pivots.len() < n || pivots[n - 1] != n - 1 {
            return None;
        }
        let mut inv = Self::zeros(n, n);
        for i in 0..n {
            for j in 0..n {
                inv.data[i][j] = r.data[i][n + j].clone();
            }
        }
        Some(inv)
    }

    /// A left inverse `L` with `L * self = I`, for a matrix of full column rank.
    pub fn left_inverse(&self) -> Option<Self> {
        let t = self.transpose();
        let gram = t.mul(self)?;
        gram.inverse()?.mul(&t)
    }

    /// Coefficients `alpha` with `alpha * self = target`, if they exist.
    /// `self` must have full row rank.
    pub fn solve_left(&self, target: &[BigRational]) -> Option<Vec<BigRational>> {
        if target.len() != self.cols {
            return None;
        }
        // alpha = (target * N^T) * (N N^T)^-1
        let tn: Vec<BigRational> = self
            .data
            .iter()
            .map(|row| {
                row.iter()
                    .zip(target)
                    .fold(BigRational::zero(), |acc, (a, b)| acc + a * b)
            })
            .collect();
        let gram = self.mul(&self.transpose())?;
        let alpha = gram.inverse()?.left_mul_vec(&tn)?;
        let back = self.left_mul_vec(&alpha)?;
        if back.as_slice() == target {
            Some(alpha)
        } else {
            None
        }
    }

    /// Check if all entries are integers.
    pub fn is_integer(&self) -> bool {
        self.data.iter().all(|row| row.iter().all(|r| r.is_integer()))
    }

    /// Convert to integer matrix if possible.
    pub fn to_integer_matrix(&self) -> Option<Vec<Row>> {
        if !self.is_integer() {
            return None;
        }
        Some(
            self.data
                .iter()
                .map(|row| row.iter().map(|r| r.to_integer()).collect())
                .collect(),
        )
    }
}

impl fmt::Display for RationalMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[")?;
        for row in &self.data {
            write!(f, "  [")?;
            for (j, val) in row.iter().enumerate() {
                if j > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", val)?;
            }
            writeln!(f, "]")?;
        }
        write!(f, "]")
    }
}

/// Apply the unimodular column operation that clears `m[row][j]` into
/// `m[row][start]`, mirrored into `v`.
fn clear_entry(m: &mut [Row], v: &mut [Row], row: usize, start: usize, j: usize) {
    let a = m[row][start].clone();
    let b = m[row][j].clone();
    let (g, x, y) = extended_gcd(&a, &b);
    let bg = -(&b / &g);
    let ag = &a / &g;
    for mat in [m, v] {
        for r in mat.iter_mut() {
            let s = &x * &r[start] + &y * &r[j];
            let t = &bg * &r[start] + &ag * &r[j];
            r[start] = s;
            r[j] = t;
        }
    }
}

/// Reduce row `row` of `m` on columns `start..` to a single non-negative
/// entry in column `start`, using unimodular column operations that are
/// mirrored into `v`.
fn reduce_row_columns(m: &mut [Row], v: &mut [Row], row: usize, start: usize) {
    let ncols = m[row].len();
    for j in (start + 1)..ncols {
        if !m[row][j].is_zero() {
            clear_entry(m, v, row, start, j);
        }
    }
    if m[row][start].is_negative() {
        for mat in [m, v] {
            for r in mat.iter_mut() {
                r[start] = -&r[start];
            }
        }
    }
}

fn identity_rows(n: usize) -> Vec<Row> {
    (0..n)
        .map(|i| {
            let mut r = vec![BigInt::zero(); n];
            r[i] = BigInt::one();
            r
        })
        .collect()
}

/// Compute the row-style Hermite Normal Form (HNF) of an integer matrix
/// and return its nonzero rows. They form a basis of the lattice (and of the
/// rational row space) spanned by the input rows.
pub fn hermite_normal_form(rows: &[Row], ncols: usize) -> Vec<Row> {
    let mut h: Vec<Row> = rows.to_vec();
    let mut r = 0;
    for c in 0..ncols {
        if r == h.len() {
            break;
        }
        for i in (r + 1)..h.len() {
            if h[i][c].is_zero() {
                continue;
            }
            let a = h[r][c].clone();
            let b = h[i][c].clone();
            let (g, x, y) = extended_gcd(&a, &b);
            let bg = -(&b / &g);
            let ag = &a / &g;
            for k in 0..ncols {
                let s = &x * &h[r][k] + &y * &h[i][k];
                let t = &bg * &h[r][k] + &ag * &h[i][k];
                h[r][k] = s;
                h[i][k] = t;
            }
        }
        if h[r][c].is_zero() {
            continue;
        }
        if h[r][c].is_negative() {
            for k in 0..ncols {
                h[r][k] = -&h[r][k];
            }
        }
        for i in 0..r {
            let q = h[i][c].div_floor(&h[r][c]);
            if q.is_zero() {
                continue;
            }
            for k in 0..ncols {
                let delta = &q * &h[r][k];
                h[i][k] = &h[i][k] - delta;
            }
        }
        r += 1;
    }
    h.truncate(r);
    h
}

/// Complete the primitive integer vector `s` to a unimodular matrix `U`
/// whose first row is `s`. Returns `(U, U^-1)`.
pub fn unimodular_completion(s: &[BigInt]) -> PolyResult<(Vec<Row>, Vec<Row>)> {
    if !gcd_slice(s).is_one() {
        return Err(PolyError::invalid("unimodular completion needs a primitive vector"));
    }
    let n = s.len();
    let mut m = vec![s.to_vec()];
    let mut v = identity_rows(n);
    reduce_row_columns(&mut m, &mut v, 0, 0);
    let inv = RationalMatrix::from_int_rows(&v, n)
        .inverse()
        .and_then(|u| u.to_integer_matrix())
        .ok_or_else(|| PolyError::oracle("column reduction produced a singular transform"))?;
    Ok((inv, v))
}

/// Bring the rows of `m` into column echelon form with unimodular column
/// operations mirrored into `v`. Returns the pivot column of each row;
/// pivots are `0, 1, ...` in row order and every column after the last
/// pivot ends up zero.
fn echelon_columns(m: &mut [Row], v: &mut [Row], n: usize) -> Vec<Option<usize>> {
    let mut piv = 0;
    let mut pivot_of = vec![None; m.len()];
    for i in 0..m.len() {
        if piv == n {
            break;
        }
        reduce_row_columns(m, v, i, piv);
        if !m[i][piv].is_zero() {
            pivot_of[i] = Some(piv);
            piv += 1;
        }
    }
    pivot_of
}

/// A unimodular `V` (one row per variable) such that `rows * V` is zero
/// from column `rank` on, together with that rank. `rows` are linear
/// forms over `n` variables without a constant column.
pub fn column_echelon(rows: &[Row], n: usize) -> (Vec<Row>, usize) {
    let mut m = rows.to_vec();
    let mut v = identity_rows(n);
    let rank = echelon_columns(&mut m, &mut v, n).iter().flatten().count();
    (v, rank)
}

/// Parametrization `x = offset + basis * z` of the integer solutions of a
/// system of equalities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Compression {
    /// A particular integer solution.
    pub offset: Vec<BigInt>,
    /// One row per original variable, one column per free parameter.
    pub basis: Vec<Row>,
}

impl Compression {
    /// Number of free parameters.
    pub fn n_free(&self) -> usize {
        self.basis.first().map(|r| r.len()).unwrap_or(0)
    }

    /// Rewrite an affine row over `x` into a row over `z`.
    pub fn pull_row(&self, row: &[BigInt]) -> Row {
        let k = self.n_free();
        let mut out = vec![BigInt::zero(); 1 + k];
        out[0] = row[0].clone();
        for (i, c) in row[1..].iter().enumerate() {
            if c.is_zero() {
                continue;
            }
            out[0] += c * &self.offset[i];
            for j in 0..k {
                out[1 + j] += c * &self.basis[i][j];
            }
        }
        out
    }

    /// Map a point in `z` back to `x`.
    pub fn push_point(&self, z: &[BigInt]) -> Vec<BigInt> {
        self.offset
            .iter()
            .zip(&self.basis)
            .map(|(o, b)| b.iter().zip(z).fold(o.clone(), |acc, (c, v)| acc + c * v))
            .collect()
    }
}

/// Compress the integer solutions of `eqs` (rows `[c, a1..an]` meaning
/// `c + a.x = 0`) through a unimodular change of basis.
/// Returns `None` if the equalities have no integer solution.
pub fn compress_equalities(eqs: &[Row], n: usize) -> Option<Compression> {
    let mut m: Vec<Row> = eqs.iter().map(|e| e[1..].to_vec()).collect();
    let mut v = identity_rows(n);
    let pivot_of = echelon_columns(&mut m, &mut v, n);
    let piv = pivot_of.iter().flatten().count();
    let mut y = vec![BigInt::zero(); n];
    for i in 0..eqs.len() {
        let mut rhs = -&eqs[i][0];
        let upto = pivot_of[i].unwrap_or(piv);
        for j in 0..upto {
            rhs -= &m[i][j] * &y[j];
        }
        match pivot_of[i] {
            Some(p) => {
                let (q, r) = rhs.div_rem(&m[i][p]);
                if !r.is_zero() {
                    return None;
                }
                y[p] = q;
            }
            None => {
                if !rhs.is_zero() {
                    return None;
                }
            }
        }
    }
    let offset = (0..n)
        .map(|i| (0..piv).fold(BigInt::zero(), |acc, j| acc + &v[i][j] * &y[j]))
        .collect();
    let basis = (0..n).map(|i| v[i][piv..].to_vec()).collect();
    Some(Compression { offset, basis })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::arith::{int, rat, row_from_i64};

    #[test]
    fn test_matrix_multiply() {
        let a = RationalMatrix::from_int_rows(&[row_from_i64(&[1, 2]), row_from_i64(&[3, 4])], 2);
        let b = RationalMatrix::from_int_rows(&[row_from_i64(&[5, 6]), row_from_i64(&[7, 8])], 2);
        let c = a.mul(&b).unwrap();
        assert_eq!(c.get(0, 0), Some(&rat(19)));
        assert_eq!(c.get(0, 1), Some(&rat(22)));
        assert_eq!(c.get(1, 0), Some(&rat(43)));
        assert_eq!(c.get(1, 1), Some(&rat(50)));
    }

    #[test]
    fn test_determinant_and_inverse() {
        let m = RationalMatrix::from_int_rows(&[row_from_i64(&[1, 2]), row_from_i64(&[3, 4])], 2);
        assert_eq!(m.determinant(), Some(rat(-2)));
        let inv = m.inverse().unwrap();
        assert_eq!(m.mul(&inv).unwrap(), RationalMatrix::identity(2));
    }

    #[test]
    fn test_nullspace() {
        let m = RationalMatrix::from_int_rows(&[row_from_i64(&[1, -1, 0])], 3);
        let ns = m.nullspace();
        assert_eq!(ns.len(), 2);
        for v in &ns {
            let dot = v[0].clone() - v[1].clone();
            assert!(dot.is_zero());
        }
    }

    #[test]
    fn test_left_inverse() {
        let t = RationalMatrix::from_int_rows(&[row_from_i64(&[1]), row_from_i64(&[1])], 1);
        let l = t.left_inverse().unwrap();
        assert_eq!(l.mul(&t).unwrap(), RationalMatrix::identity(1));
    }

    #[test]
    fn test_solve_left() {
        let n = RationalMatrix::from_int_rows(&[row_from_i64(&[1, 1, 0]), row_from_i64(&[0, 0, 1])], 3);
        let alpha = n.solve_left(&[rat(2), rat(2), rat(-1)]).unwrap();
        assert_eq!(alpha, vec![rat(2), rat(-1)]);
        assert!(n.solve_left(&[rat(1), rat(0), rat(0)]).is_none());
    }

    #[test]
    fn test_hermite_normal_form() {
        let h = hermite_normal_form(&[row_from_i64(&[2, 4]), row_from_i64(&[3, 6])], 2);
        assert_eq!(h, vec![row_from_i64(&[1, 2])]);
    }

    #[test]
    fn test_unimodular_completion() {
        let s = row_from_i64(&[2, 3, 5]);
        let (u, v) = unimodular_completion(&s).unwrap();
        assert_eq!(u[0], s);
        let um = RationalMatrix::from_int_rows(&u, 3);
        assert!(um.is_unimodular());
        let prod = um.mul(&RationalMatrix::from_int_rows(&v, 3)).unwrap();
        assert_eq!(prod, RationalMatrix::identity(3));
    }

    #[test]
    fn test_unimodular_completion_rejects_non_primitive() {
        assert!(unimodular_completion(&row_from_i64(&[2, 4])).is_err());
    }

    #[test]
    fn test_column_echelon() {
        // 3x - 3y and 6y - 6x span one direction
        let rows = [row_from_i64(&[3, -3]), row_from_i64(&[-6, 6])];
        let (v, rank) = column_echelon(&rows, 2);
        assert_eq!(rank, 1);
        let vm = RationalMatrix::from_int_rows(&v, 2);
        assert!(vm.is_unimodular());
        for r in &rows {
            let tail: BigInt = (0..2).map(|i| &r[i] * &v[i][1]).sum();
            assert!(tail.is_zero());
        }
    }

    #[test]
    fn test_compress_equalities() {
        // x - 2y = 1
        let c = compress_equalities(&[row_from_i64(&[-1, 1, -2])], 2).unwrap();
        assert_eq!(c.n_free(), 1);
        for z in -3..=3 {
            let p = c.push_point(&[int(z)]);
            assert_eq!(&p[0] - int(2) * &p[1], int(1));
        }
        // 2x = 1 has no integer solution
        assert!(compress_equalities(&[row_from_i64(&[-1, 2])], 1).is_none());
    }
}
