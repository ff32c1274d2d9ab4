//! Density weights per function quadruple and their contraction with g.

use crate::accumulate::TaskScratch;
use crate::recursion::GLayout;
use nalgebra::DMatrix;

/// First AO index of each shell of a quartet.
pub type AoOffsets = [usize; 4];

/// Coulomb/exchange weights of ∂i (`wi`) and ∂j (`wj`), one per entry of `layout.funcs`.
pub fn gradient_weights(layout: &GLayout, dm: &DMatrix<f64>, ao: AoOffsets, wi: &mut [f64], wj: &mut [f64]) {
    for (n, f) in layout.funcs.iter().enumerate() {
        let [i, j, k, l] = [0, 1, 2, 3].map(|c| ao[c] + f.idx[c]);
        wi[n] = 2.0 * dm[(k, l)] * dm[(i, j)] - 0.5 * (dm[(i, k)] * dm[(j, l)] + dm[(i, l)] * dm[(j, k)]);
        wj[n] = 2.0 * dm[(k, l)] * dm[(i, j)] - 0.5 * (dm[(j, k)] * dm[(i, l)] + dm[(j, l)] * dm[(i, k)]);
    }
}

/// Weights of the two-electron energy ½ΣD_ij D_kl (ij|kl) − ¼ΣD_ik D_jl (ij|kl) with a
/// closed-shell density.
pub fn energy_weights(layout: &GLayout, dm: &DMatrix<f64>, ao: AoOffsets, w: &mut [f64]) {
    for (n, f) in layout.funcs.iter().enumerate() {
        let [i, j, k, l] = [0, 1, 2, 3].map(|c| ao[c] + f.idx[c]);
        w[n] = 0.5 * dm[(i, j)] * dm[(k, l)] - 0.125 * (dm[(i, k)] * dm[(j, l)] + dm[(i, l)] * dm[(j, k)]);
    }
}

// 2a·g(l+1) − l·g(l−1) at `pos`, for a 2-D integral with exponent l along the
// differentiated center.
#[inline]
fn deriv(g: &[f64], pos: usize, stride: usize, l: usize, two_a: f64) -> f64 {
    let up = two_a * g[pos + stride];
    if l > 0 {
        up - l as f64 * g[pos - stride]
    } else {
        up
    }
}

/// Adds the weighted ∂i and ∂j integrals of one primitive quartet to `scratch`.
///
/// `ai` and `aj` are the primitive exponents of the bra shells; `g` must hold
/// the derivative layout (ceilings raised by one).
pub fn contract_gradient(layout: &GLayout, g: &[f64], ai: f64, aj: f64, wi: &[f64], wj: &[f64], scratch: &mut TaskScratch) {
    let (two_ai, two_aj) = (2.0 * ai, 2.0 * aj);
    let mut acc = [0.0; 6];
    for r in 0..layout.nroots {
        let base = [layout.block(0, r), layout.block(1, r), layout.block(2, r)];
        for (n, f) in layout.funcs.iter().enumerate() {
            let pos = [base[0] + f.off[0], base[1] + f.off[1], base[2] + f.off[2]];
            let (gx, gy, gz) = (g[pos[0]], g[pos[1]], g[pos[2]]);

            let dix = deriv(g, pos[0], layout.di, f.i[0], two_ai);
            let diy = deriv(g, pos[1], layout.di, f.i[1], two_ai);
            let diz = deriv(g, pos[2], layout.di, f.i[2], two_ai);
            acc[0] += wi[n] * dix * gy * gz;
            acc[1] += wi[n] * gx * diy * gz;
            acc[2] += wi[n] * gx * gy * diz;

            let djx = deriv(g, pos[0], layout.dj, f.j[0], two_aj);
            let djy = deriv(g, pos[1], layout.dj, f.j[1], two_aj);
            let djz = deriv(g, pos[2], layout.dj, f.j[2], two_aj);
            acc[3] += wj[n] * djx * gy * gz;
            acc[4] += wj[n] * gx * djy * gz;
            acc[5] += wj[n] * gx * gy * djz;
        }
    }
    for axis in 0..3 {
        scratch.add_i(axis, acc[axis]);
        scratch.add_j(axis, acc[3 + axis]);
    }
}

/// Σ w·(ij|kl) over the function quadruples of one primitive quartet.
pub fn contract_energy(layout: &GLayout, g: &[f64], w: &[f64]) -> f64 {
    let mut e = 0.0;
    for r in 0..layout.nroots {
        let base = [layout.block(0, r), layout.block(1, r), layout.block(2, r)];
        for (n, f) in layout.funcs.iter().enumerate() {
            e += w[n] * g[base[0] + f.off[0]] * g[base[1] + f.off[1]] * g[base[2] + f.off[2]];
        }
    }
    e
}
