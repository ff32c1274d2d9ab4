//! Rys quadrature roots and weights.
//!
//! Convention at every call site: `roots[r]` is the Rys parameter
//! u = t²/(1 − t²) and `weights[r]` the matching weight, so that for a
//! polynomial p of degree < 2·nroots
//!
//! ∫₀¹ p(t²) exp(−x t²) dt = Σ_r weights[r] · p(u_r / (1 + u_r)).
//!
//! In particular Σ_r weights[r] = F₀(x).

mod quadrature;

pub use quadrature::RysQuadrature;

use crate::error::GradError;
use basis::helper::SQRT_PI_OVER_2;
use libm::erf;

/// Largest root count any kernel variant asks for.
pub const MAX_ROOTS: usize = 9;

/// Below this argument the one-root formula switches to its x → 0 limit.
pub const SMALL_X: f64 = 3e-7;

/// Root solver chosen once per integral class.
#[derive(Debug, Clone)]
pub enum RootSolver {
    /// One root, closed form from F₀ and F₁.
    Closed1,
    /// Two or more roots, from the discretised Rys weight function.
    Quadrature(RysQuadrature),
}

impl RootSolver {
    pub fn new(nroots: usize) -> Result<Self, GradError> {
        match nroots {
            0 => Err(GradError::TooManyRoots { nroots, max: MAX_ROOTS }),
            1 => Ok(RootSolver::Closed1),
            n if n <= MAX_ROOTS => Ok(RootSolver::Quadrature(RysQuadrature::new(n))),
            n => Err(GradError::TooManyRoots { nroots: n, max: MAX_ROOTS }),
        }
    }

    pub fn nroots(&self) -> usize {
        match self {
            RootSolver::Closed1 => 1,
            RootSolver::Quadrature(q) => q.nroots(),
        }
    }

    /// Fills `roots[..nroots]` and `weights[..nroots]` for argument `x >= 0`.
    #[inline]
    pub fn solve(&self, x: f64, roots: &mut [f64], weights: &mut [f64]) {
        debug_assert!(x >= 0.0, "negative Rys argument {x}");
        match self {
            RootSolver::Closed1 => rys_root1(x, roots, weights),
            RootSolver::Quadrature(q) => q.solve(x, roots, weights),
        }
    }
}

/// One-root quadrature: u = F₁/(F₀ − F₁), w = F₀.
pub fn rys_root1(x: f64, roots: &mut [f64], weights: &mut [f64]) {
    if x < SMALL_X {
        roots[0] = 0.5;
        weights[0] = 1.0;
        return;
    }
    let tt = x.sqrt();
    let fmt0 = SQRT_PI_OVER_2 * erf(tt) / tt;
    let e = (-x).exp();
    let b = 0.5 / x * (fmt0 - e);
    roots[0] = b / (fmt0 - b);
    weights[0] = fmt0;
}

#[cfg(test)]
mod tests {
    use super::*;
    use basis::helper::boys_values;

    // Σ_r w_r s_r^m for s = u/(1+u)
    fn moment(roots: &[f64], weights: &[f64], m: usize) -> f64 {
        roots
            .iter()
            .zip(weights)
            .map(|(&u, &w)| w * (u / (1.0 + u)).powi(m as i32))
            .sum()
    }

    fn max_moment_error(solver: &RootSolver, x: f64) -> f64 {
        let n = solver.nroots();
        let mut roots = [0.0; MAX_ROOTS];
        let mut weights = [0.0; MAX_ROOTS];
        solver.solve(x, &mut roots, &mut weights);
        let mut fm = [0.0; 2 * MAX_ROOTS];
        boys_values(2 * n - 1, x, &mut fm);
        (0..2 * n)
            .map(|m| ((moment(&roots[..n], &weights[..n], m) - fm[m]) / fm[m]).abs())
            .fold(0.0, f64::max)
    }

    fn x_grid() -> Vec<f64> {
        let mut xs = vec![0.0, 1e-6, 1e-5, 1e-4, 1e-3, 0.01, 0.1];
        xs.extend((1..=100).map(|k| 0.5 * k as f64));
        xs
    }

    // F0 − e^{−x} in the one-root closed form cancels to ≈ 2x/3 just above
    // SMALL_X; about 1.2e-10 at x = 1e-6, shrinking as 1/x.
    fn tolerance(nroots: usize, x: f64) -> f64 {
        if nroots == 1 && x > 0.0 {
            (1e-15 / x).max(1e-10)
        } else {
            1e-10
        }
    }

    #[test]
    fn test_one_root_just_above_threshold() {
        let solver = RootSolver::Closed1;
        for &x in &[SMALL_X * 1.5, 1e-6, 1e-5, 1e-4] {
            let err = max_moment_error(&solver, x);
            assert!(err < 1e-15 / x, "x = {}: relative moment error {:e}", x, err);
        }
        assert!(max_moment_error(&solver, 1e-4) < 1e-10);
    }

    #[test]
    fn test_quadrature_reproduces_boys_moments() {
        for n in 1..=MAX_ROOTS {
            let solver = RootSolver::new(n).unwrap();
            for &x in &x_grid() {
                let err = max_moment_error(&solver, x);
                let tol = tolerance(n, x);
                assert!(err < tol, "nroots = {}, x = {}: relative moment error {:e} (tol {:e})", n, x, err, tol);
            }
        }
    }

    #[test]
    fn test_one_root_small_x_branch() {
        let mut r = [0.0];
        let mut w = [0.0];
        rys_root1(0.0, &mut r, &mut w);
        assert_eq!((r[0], w[0]), (0.5, 1.0));
        rys_root1(SMALL_X * 0.999, &mut r, &mut w);
        assert_eq!((r[0], w[0]), (0.5, 1.0));

        // the limit is first-order accurate: F0(x) = 1 - x/3 + ...
        let mut fm = [0.0; 2];
        for &x in &[1e-9, 1e-8, 2.9e-7] {
            rys_root1(x, &mut r, &mut w);
            boys_values(1, x, &mut fm);
            assert!((w[0] - fm[0]).abs() <= x);
            assert!((r[0] / (1.0 + r[0]) * w[0] - fm[1]).abs() <= x);
        }
    }

    #[test]
    fn test_one_root_continuity_at_threshold() {
        let (mut r_lo, mut w_lo) = ([0.0], [0.0]);
        let (mut r_hi, mut w_hi) = ([0.0], [0.0]);
        rys_root1(SMALL_X * (1.0 - 1e-9), &mut r_lo, &mut w_lo);
        rys_root1(SMALL_X * (1.0 + 1e-9), &mut r_hi, &mut w_hi);
        assert!((r_lo[0] - r_hi[0]).abs() < 1e-6, "roots {} vs {}", r_lo[0], r_hi[0]);
        assert!((w_lo[0] - w_hi[0]).abs() < 1e-6, "weights {} vs {}", w_lo[0], w_hi[0]);
    }

    #[test]
    fn test_closed_form_agrees_with_general_solver() {
        let general = RysQuadrature::new(1);
        for &x in &[1e-3, 0.7, 5.0, 23.0, 49.0] {
            let (mut r1, mut w1) = ([0.0], [0.0]);
            let (mut r2, mut w2) = ([0.0], [0.0]);
            rys_root1(x, &mut r1, &mut w1);
            general.solve(x, &mut r2, &mut w2);
            assert!(((r1[0] - r2[0]) / r1[0]).abs() < 1e-10);
            assert!(((w1[0] - w2[0]) / w1[0]).abs() < 1e-12);
        }
    }

    #[test]
    fn test_roots_sorted_and_positive() {
        let solver = RootSolver::new(6).unwrap();
        let mut roots = [0.0; MAX_ROOTS];
        let mut weights = [0.0; MAX_ROOTS];
        for &x in &[0.0, 3.0, 40.0, 500.0] {
            solver.solve(x, &mut roots, &mut weights);
            for r in 0..6 {
                assert!(roots[r] > 0.0 && weights[r] > 0.0);
                if r > 0 {
                    assert!(roots[r] > roots[r - 1]);
                }
            }
        }
    }

    #[test]
    fn test_root_count_limits() {
        assert!(matches!(RootSolver::new(1), Ok(RootSolver::Closed1)));
        assert_eq!(RootSolver::new(9).unwrap().nroots(), 9);
        assert_eq!(
            RootSolver::new(10).unwrap_err(),
            GradError::TooManyRoots { nroots: 10, max: MAX_ROOTS }
        );
    }
}
