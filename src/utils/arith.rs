//! Exact integer and rational helpers on constraint rows.
//!
//! A row is a `Vec<BigInt>` whose entry 0 is the constant term; the row
//! `[c, a1, .., an]` denotes the affine function `c + a1*x1 + .. + an*xn`.

use num_bigint::BigInt;
use num_integer::Integer;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};

/// A constraint or div row over exact integers.
pub type Row = Vec<BigInt>;

/// Shorthand for building a `BigInt`.
pub fn int(v: i64) -> BigInt {
    BigInt::from(v)
}

/// Shorthand for building an integral `BigRational`.
pub fn rat(v: i64) -> BigRational {
    BigRational::from_integer(BigInt::from(v))
}

/// Build a row from machine integers.
pub fn row_from_i64(v: &[i64]) -> Row {
    v.iter().map(|&x| BigInt::from(x)).collect()
}

/// Non-negative gcd of all entries (zero for an all-zero slice).
pub fn gcd_slice(v: &[BigInt]) -> BigInt {
    let mut g = BigInt::zero();
    for x in v {
        if x.is_zero() {
            continue;
        }
        g = g.gcd(x);
        if g.is_one() {
            break;
        }
    }
    g
}

/// Floor division (rounds toward negative infinity).
pub fn floor_div(a: &BigInt, b: &BigInt) -> BigInt {
    a.div_floor(b)
}

/// Ceiling division (rounds toward positive infinity).
pub fn ceil_div(a: &BigInt, b: &BigInt) -> BigInt {
    -((-a).div_floor(b))
}

/// Extended Euclidean algorithm: returns (gcd, x, y) such that ax + by = gcd,
/// with gcd non-negative.
pub fn extended_gcd(a: &BigInt, b: &BigInt) -> (BigInt, BigInt, BigInt) {
    let (mut old_r, mut r) = (a.clone(), b.clone());
    let (mut old_s, mut s) = (BigInt::one(), BigInt::zero());
    let (mut old_t, mut t) = (BigInt::zero(), BigInt::one());
    while !r.is_zero() {
        let q = old_r.div_floor(&r);
        let next_r = &old_r - &q * &r;
        old_r = std::mem::replace(&mut r, next_r);
        let next_s = &old_s - &q * &s;
        old_s = std::mem::replace(&mut s, next_s);
        let next_t = &old_t - &q * &t;
        old_t = std::mem::replace(&mut t, next_t);
    }
    if old_r.is_negative() {
        (-old_r, -old_s, -old_t)
    } else {
        (old_r, old_s, old_t)
    }
}

/// Least common multiple of the denominators of a rational slice.
pub fn lcm_denominators(v: &[BigRational]) -> BigInt {
    v.iter().fold(BigInt::one(), |acc, x| acc.lcm(x.denom()))
}

/// Scale a rational row by the (positive) lcm of its denominators.
pub fn rational_to_integer_row(v: &[BigRational]) -> Row {
    let l = lcm_denominators(v);
    v.iter()
        .map(|x| (x * BigRational::from_integer(l.clone())).to_integer())
        .collect()
}

/// Lift an integer row to rationals.
pub fn to_rational_row(v: &[BigInt]) -> Vec<BigRational> {
    v.iter().map(|x| BigRational::from_integer(x.clone())).collect()
}

/// Divide every entry by the gcd of all entries.
pub fn make_primitive(v: &mut [BigInt]) {
    let g = gcd_slice(v);
    if g > BigInt::one() {
        for x in v.iter_mut() {
            *x = &*x / &g;
        }
    }
}

/// Whether all entries are zero.
pub fn is_zero_slice(v: &[BigInt]) -> bool {
    v.iter().all(|x| x.is_zero())
}

/// Negate every entry in place.
pub fn negate(v: &mut [BigInt]) {
    for x in v.iter_mut() {
        *x = -&*x;
    }
}

/// Index of the last nonzero entry.
pub fn last_nonzero(v: &[BigInt]) -> Option<usize> {
    v.iter().rposition(|x| !x.is_zero())
}

/// Plain dot product.
pub fn dot(a: &[BigInt], b: &[BigInt]) -> BigInt {
    a.iter().zip(b).fold(BigInt::zero(), |acc, (x, y)| acc + x * y)
}

/// Value of the affine function `row` at an integer point.
pub fn eval_int(row: &[BigInt], point: &[BigInt]) -> BigInt {
    let mut v = row[0].clone();
    for (c, x) in row[1..].iter().zip(point) {
        if !c.is_zero() {
            v += c * x;
        }
    }
    v
}

/// Value of the affine function `row` at a rational point.
pub fn eval_rat(row: &[BigInt], point: &[BigRational]) -> BigRational {
    let mut v = BigRational::from_integer(row[0].clone());
    for (c, x) in row[1..].iter().zip(point) {
        if !c.is_zero() {
            v = v + BigRational::from_integer(c.clone()) * x;
        }
    }
    v
}

/// `target := a * target + b * other` for every entry.
pub fn combine(target: &mut [BigInt], a: &BigInt, other: &[BigInt], b: &BigInt) {
    for (t, o) in target.iter_mut().zip(other) {
        *t = a * &*t + b * o;
    }
}

/// Eliminate column `col` from `target` using `pivot` (which must be nonzero
/// there). The multiplier applied to `target` is positive, so the sense of an
/// inequality is preserved. Returns that multiplier.
pub fn eliminate_column(target: &mut [BigInt], pivot: &[BigInt], col: usize) -> BigInt {
    if target[col].is_zero() {
        return BigInt::one();
    }
    let p = &pivot[col];
    let t = &target[col];
    let g = p.gcd(t);
    let mut a = p / &g;
    let mut b = t / &g;
    if a.is_negative() {
        a = -a;
        b = -b;
    }
    let minus_b = -b;
    combine(target, &a, pivot, &minus_b);
    a
}

/// Whether a rational slice is integral.
pub fn all_integral(v: &[BigRational]) -> bool {
    v.iter().all(|x| x.is_integer())
}
