use super::MAX_ROOTS;
use nalgebra::{SMatrix, SymmetricEigen};
use std::f64::consts::PI;

// Points of the Gauss–Legendre rule that discretises the Rys weight function.
const NLEGENDRE: usize = 128;

// Jacobi matrix at full capacity; rows past `nroots` are decoupled and carry
// eigenvalues above 1, outside the support [0, 1] of the measure.
type Jacobi = SMatrix<f64, MAX_ROOTS, MAX_ROOTS>;

/// General Rys root solver.
///
/// The weight exp(−x t²) on t ∈ [0, T] is discretised with a fixed
/// Gauss–Legendre rule; the recurrence coefficients of the orthogonal
/// polynomials in s = t² follow from the Stieltjes procedure and the Jacobi
/// matrix eigenpairs give nodes and weights (Golub–Welsch). T is cut below 1
/// once exp(−x T²) is negligible, which keeps the discretisation resolved for
/// large x.
#[derive(Debug, Clone)]
pub struct RysQuadrature {
    nroots: usize,
    // τ² and weights of the Legendre rule on [0, 1]
    nodes: Vec<f64>,
    weights: Vec<f64>,
}

impl RysQuadrature {
    pub fn new(nroots: usize) -> Self {
        assert!(
            (1..=MAX_ROOTS).contains(&nroots),
            "root count {} outside 1..={}",
            nroots,
            MAX_ROOTS
        );
        let (tau, weights) = gauss_legendre(NLEGENDRE);
        RysQuadrature {
            nroots,
            nodes: tau.iter().map(|t| t * t).collect(),
            weights,
        }
    }

    pub fn nroots(&self) -> usize {
        self.nroots
    }

    fn cutoff_sq(&self, x: f64) -> f64 {
        if x > 0.0 {
            ((46.0 + 4.0 * self.nroots as f64) / x).min(1.0)
        } else {
            1.0
        }
    }

    pub fn solve(&self, x: f64, roots: &mut [f64], weights: &mut [f64]) {
        let n = self.nroots;
        let tsq = self.cutoff_sq(x);
        let t = tsq.sqrt();

        let mut w = [0.0; NLEGENDRE];
        for (k, wk) in w.iter_mut().enumerate() {
            *wk = t * self.weights[k] * (-x * tsq * self.nodes[k]).exp();
        }

        let mut alpha = [0.0; MAX_ROOTS];
        let mut beta = [0.0; MAX_ROOTS];
        self.stieltjes(&w, &mut alpha, &mut beta);

        let mut jacobi = Jacobi::zeros();
        for k in 0..MAX_ROOTS {
            if k < n {
                jacobi[(k, k)] = alpha[k];
                if k > 0 {
                    let off = beta[k].sqrt();
                    jacobi[(k, k - 1)] = off;
                    jacobi[(k - 1, k)] = off;
                }
            } else {
                jacobi[(k, k)] = 2.0 + k as f64;
            }
        }
        let eig = SymmetricEigen::new(jacobi);

        let mut pairs = [(0.0, 0.0); MAX_ROOTS];
        for (r, pair) in pairs.iter_mut().enumerate() {
            let v0 = eig.eigenvectors[(0, r)];
            *pair = (eig.eigenvalues[r], beta[0] * v0 * v0);
        }
        pairs.sort_unstable_by(|a, b| a.0.total_cmp(&b.0));

        for (r, &(lambda, weight)) in pairs[..n].iter().enumerate() {
            let s = tsq * lambda;
            roots[r] = s / (1.0 - s);
            weights[r] = weight;
        }
    }

    // Recurrence coefficients of the monic polynomials orthogonal under the
    // discrete measure `w` at the scaled nodes; beta[0] is the total mass.
    fn stieltjes(&self, w: &[f64; NLEGENDRE], alpha: &mut [f64; MAX_ROOTS], beta: &mut [f64; MAX_ROOTS]) {
        let mut p_prev = [0.0; NLEGENDRE];
        let mut p_cur = [1.0; NLEGENDRE];
        let mut norm_prev = 1.0;

        for k in 0..self.nroots {
            let mut norm = 0.0;
            let mut first = 0.0;
            for i in 0..NLEGENDRE {
                let wp = w[i] * p_cur[i] * p_cur[i];
                norm += wp;
                first += self.nodes[i] * wp;
            }
            alpha[k] = first / norm;
            beta[k] = if k == 0 { norm } else { norm / norm_prev };
            norm_prev = norm;

            if k + 1 == self.nroots {
                break;
            }
            let b = if k == 0 { 0.0 } else { beta[k] };
            for i in 0..NLEGENDRE {
                let next = (self.nodes[i] - alpha[k]) * p_cur[i] - b * p_prev[i];
                p_prev[i] = p_cur[i];
                p_cur[i] = next;
            }
        }
    }
}

/// Gauss–Legendre nodes and weights mapped to [0, 1], by Newton iteration on P_n.
pub(crate) fn gauss_legendre(n: usize) -> (Vec<f64>, Vec<f64>) {
    let mut nodes = vec![0.0; n];
    let mut weights = vec![0.0; n];
    let nf = n as f64;

    for i in 0..(n + 1) / 2 {
        let mut z = (PI * (i as f64 + 0.75) / (nf + 0.5)).cos();
        let mut dp = 1.0;
        for _ in 0..100 {
            let mut p0 = 1.0;
            let mut p1 = z;
            for j in 2..=n {
                let jf = j as f64;
                let p2 = ((2.0 * jf - 1.0) * z * p1 - (jf - 1.0) * p0) / jf;
                p0 = p1;
                p1 = p2;
            }
            dp = nf * (z * p1 - p0) / (z * z - 1.0);
            let dz = p1 / dp;
            z -= dz;
            if dz.abs() < 1e-15 {
                break;
            }
        }
        let w = 2.0 / ((1.0 - z * z) * dp * dp);
        // z in (0, 1): mirror pair (−z, z) on [−1, 1] maps to (1 ∓ z)/2
        nodes[i] = 0.5 * (1.0 - z);
        nodes[n - 1 - i] = 0.5 * (1.0 + z);
        weights[i] = 0.5 * w;
        weights[n - 1 - i] = 0.5 * w;
    }

    (nodes, weights)
}

#[cfg(test)]
mod tests {
    use super::*;
    use basis::helper::boys_values;

    #[test]
    fn test_gauss_legendre_exactness() {
        let (nodes, weights) = gauss_legendre(NLEGENDRE);
        assert!((weights.iter().sum::<f64>() - 1.0).abs() < 1e-14);
        for d in [1, 7, 40, 101, 255] {
            let integral: f64 = nodes.iter().zip(&weights).map(|(t, w)| w * t.powi(d)).sum();
            let exact = 1.0 / (d + 1) as f64;
            assert!(((integral - exact) / exact).abs() < 1e-12, "degree {}: {}", d, integral);
        }
        assert!(nodes.windows(2).all(|p| p[0] < p[1]));
    }

    #[test]
    fn test_padding_stays_out_of_the_roots() {
        for n in 2..MAX_ROOTS {
            let quad = RysQuadrature::new(n);
            let mut roots = [-1.0; MAX_ROOTS];
            let mut weights = [-1.0; MAX_ROOTS];
            quad.solve(2.5, &mut roots, &mut weights);
            let mut f0 = [0.0; 1];
            boys_values(0, 2.5, &mut f0);
            // only the first n slots are written
            assert!(roots[n..].iter().all(|&u| u == -1.0));
            assert!(roots[..n].iter().all(|&u| u > 0.0 && u.is_finite()));
            assert!((weights[..n].iter().sum::<f64>() - f0[0]).abs() < 1e-12);
        }
    }

    #[test]
    fn test_large_argument_moments() {
        for n in [2, 4, 9] {
            let quad = RysQuadrature::new(n);
            for &x in &[120.0, 500.0, 3000.0] {
                let mut roots = [0.0; MAX_ROOTS];
                let mut weights = [0.0; MAX_ROOTS];
                quad.solve(x, &mut roots, &mut weights);
                let mut fm = [0.0; 2 * MAX_ROOTS];
                boys_values(2 * n - 1, x, &mut fm);
                for (m, f) in fm.iter().enumerate().take(2 * n) {
                    let moment: f64 = roots[..n]
                        .iter()
                        .zip(&weights[..n])
                        .map(|(&u, &w)| w * (u / (1.0 + u)).powi(m as i32))
                        .sum();
                    assert!(
                        ((moment - f) / f).abs() < 1e-10,
                        "n = {}, x = {}, m = {}: {} vs {}",
                        n,
                        x,
                        m,
                        moment,
                        f
                    );
                }
            }
        }
    }
}
