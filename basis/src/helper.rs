#![allow(non_snake_case)]
use libm::erf;
use nalgebra::Vector3;
use rayon::prelude::*;

/// sqrt(pi) / 2
pub const SQRT_PI_OVER_2: f64 = 0.886226925452758014;

// Below this argument the Boys function is summed as a series, above it the
// erf value is recursed upwards.
const BOYS_SERIES_LIMIT: f64 = 45.0;

/// (n)!! with the convention (-1)!! = 0!! = 1.
pub fn double_factorial(n: i32) -> f64 {
    let mut acc = 1.0;
    let mut k = n;
    while k > 1 {
        acc *= k as f64;
        k -= 2;
    }
    acc
}

// Simpson's rule integration
pub fn simpson_integration<F>(f: F, a: f64, b: f64, n: usize) -> f64
where
    F: Fn(f64) -> f64,
{
    let n = if n % 2 == 0 { n } else { n + 1 };
    let h = (b - a) / n as f64;

    let mut sum = f(a) + f(b);
    for i in 1..n {
        let x = a + i as f64 * h;
        sum += simpson_weight(i, n) * f(x);
    }
    sum * h / 3.0
}

fn simpson_weight(i: usize, n: usize) -> f64 {
    if i == 0 || i == n {
        1.0
    } else if i % 2 == 1 {
        4.0
    } else {
        2.0
    }
}

/// Parallel Simpson's rule over the box [a.x,b.x] x [a.y,b.y] x [a.z,b.z].
///
/// `n` subdivisions per axis, rounded up to the next even number.
pub fn simpson_integration_3d<F>(f: F, a: Vector3<f64>, b: Vector3<f64>, n: usize) -> f64
where
    F: Fn(f64, f64, f64) -> f64 + Sync,
{
    let n = if n % 2 == 0 { n } else { n + 1 };
    let h = (b - a) / n as f64;

    let sum: f64 = (0..=n)
        .into_par_iter()
        .map(|i| {
            let x = a.x + i as f64 * h.x;
            let wx = simpson_weight(i, n);
            let mut plane = 0.0;
            for j in 0..=n {
                let y = a.y + j as f64 * h.y;
                let wy = simpson_weight(j, n);
                for k in 0..=n {
                    let z = a.z + k as f64 * h.z;
                    plane += wx * wy * simpson_weight(k, n) * f(x, y, z);
                }
            }
            plane
        })
        .sum();

    sum * (h.x * h.y * h.z) / 27.0
}

/// Boys function values F_0(x) ..= F_mmax(x), written to `out[..=mmax]`.
///
/// For small and moderate `x` the highest order is summed from the
/// all-positive series
/// F_m(x) = exp(-x) * sum_k (2x)^k / ((2m+1)(2m+3)...(2m+2k+1))
/// and the lower orders follow by the (stable) downward recursion.
/// For large `x` F_0 comes from erf and the upward recursion is stable
/// because m < x.
pub fn boys_values(mmax: usize, x: f64, out: &mut [f64]) {
    assert!(out.len() > mmax, "output buffer too small for F_0..F_{}", mmax);
    debug_assert!(x >= 0.0, "Boys function argument must be nonnegative");

    let emx = (-x).exp();
    if x < BOYS_SERIES_LIMIT.max(mmax as f64 + 10.0) {
        let two_m = 2.0 * mmax as f64;
        let mut term = 1.0 / (two_m + 1.0);
        let mut sum = term;
        let mut k = 1.0;
        loop {
            term *= 2.0 * x / (two_m + 2.0 * k + 1.0);
            sum += term;
            if term <= sum * 1e-17 {
                break;
            }
            k += 1.0;
        }
        out[mmax] = emx * sum;
        for m in (0..mmax).rev() {
            out[m] = (2.0 * x * out[m + 1] + emx) / (2 * m + 1) as f64;
        }
    } else {
        let sx = x.sqrt();
        out[0] = SQRT_PI_OVER_2 * erf(sx) / sx;
        for m in 0..mmax {
            out[m + 1] = ((2 * m + 1) as f64 * out[m] - emx) / (2.0 * x);
        }
    }
}

/// Single Boys function value F_n(x).
pub fn boys_function(n: i32, x: f64) -> f64 {
    assert!(n >= 0, "n must be nonnegative");
    assert!(x >= 0.0, "x must be nonnegative");
    let n = n as usize;
    let mut vals = vec![0.0; n + 1];
    boys_values(n, x, &mut vals);
    vals[n]
}
