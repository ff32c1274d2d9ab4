//! Rys recursion: 2-D integrals g[axis][root][i][j][k][l] for one primitive quartet.
//!
//! The vertical recursion builds V(n, m) with all angular momentum on the base
//! centers of bra and ket; the horizontal recursion then shifts it onto the
//! other center of each pair. The z axis carries the quadrature weight and the
//! quartet prefactor, so a Cartesian integral is Σ_r gx·gy·gz.

use crate::pair_cache::PrimitivePair;
use crate::rys::{RootSolver, MAX_ROOTS};
use basis::gto::cart_components;
use nalgebra::Vector3;

/// Indices of one Cartesian function quadruple and its per-axis offsets into g.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FuncQuartet {
    /// Function indices (fi, fj, fk, fl) within their shells.
    pub idx: [usize; 4],
    /// Cartesian exponents of the i and j functions.
    pub i: [usize; 3],
    pub j: [usize; 3],
    pub off: [usize; 3],
}

/// Shape of the g array for one integral class.
#[derive(Debug, Clone)]
pub struct GLayout {
    pub l: [usize; 4],
    pub nroots: usize,
    pub ibase: bool,
    pub kbase: bool,
    pub i_ceil: usize,
    pub j_ceil: usize,
    /// Highest bra order of the vertical recursion.
    pub nmax: usize,
    /// Highest ket order of the vertical recursion.
    pub mmax: usize,
    pub nk: usize,
    pub nl: usize,
    pub dk: usize,
    pub dj: usize,
    pub di: usize,
    /// Elements per (axis, root) block.
    pub g_size: usize,
    pub funcs: Vec<FuncQuartet>,
}

impl GLayout {
    /// `extra` raises the bra ceilings by that many orders (1 for first derivatives).
    pub fn new(l: [usize; 4], extra: usize, nroots: usize) -> Self {
        let [li, lj, lk, ll] = l;
        let i_ceil = li + extra;
        let j_ceil = lj + extra;
        let (ni, nj, nk, nl) = (i_ceil + 1, j_ceil + 1, lk + 1, ll + 1);
        let dk = nl;
        let dj = nk * dk;
        let di = nj * dj;

        let mut layout = GLayout {
            l,
            nroots,
            ibase: li >= lj,
            kbase: lk >= ll,
            i_ceil,
            j_ceil,
            nmax: li + lj + extra,
            mmax: lk + ll,
            nk,
            nl,
            dk,
            dj,
            di,
            g_size: ni * di,
            funcs: Vec::new(),
        };

        let (ci, cj, ck, cl) = (
            cart_components(li),
            cart_components(lj),
            cart_components(lk),
            cart_components(ll),
        );
        let mut funcs = Vec::with_capacity(ci.len() * cj.len() * ck.len() * cl.len());
        for (fl, lc) in cl.iter().enumerate() {
            for (fk, kc) in ck.iter().enumerate() {
                for (fj, jc) in cj.iter().enumerate() {
                    for (fi, ic) in ci.iter().enumerate() {
                        let off = [0, 1, 2].map(|x| layout.offset(ic[x], jc[x], kc[x], lc[x]));
                        funcs.push(FuncQuartet {
                            idx: [fi, fj, fk, fl],
                            i: *ic,
                            j: *jc,
                            off,
                        });
                    }
                }
            }
        }
        layout.funcs = funcs;
        layout
    }

    #[inline]
    pub fn offset(&self, i: usize, j: usize, k: usize, l: usize) -> usize {
        i * self.di + j * self.dj + k * self.dk + l
    }

    /// Start of the (axis, root) block.
    #[inline]
    pub fn block(&self, axis: usize, root: usize) -> usize {
        (axis * self.nroots + root) * self.g_size
    }

    pub fn total_size(&self) -> usize {
        3 * self.nroots * self.g_size
    }
}

/// Base center of a shell pair and its displacement from the other center.
#[derive(Debug, Clone, Copy)]
pub struct PairGeometry {
    pub base: Vector3<f64>,
    pub rab: Vector3<f64>,
}

impl PairGeometry {
    pub fn new(ri: Vector3<f64>, rj: Vector3<f64>, first_is_base: bool) -> Self {
        if first_is_base {
            PairGeometry { base: ri, rab: ri - rj }
        } else {
            PairGeometry { base: rj, rab: rj - ri }
        }
    }
}

/// Bra and ket primitive pairs of one quadrature evaluation.
#[derive(Debug, Clone, Copy)]
pub struct PrimQuartet {
    pub aij: f64,
    pub akl: f64,
    pub p: Vector3<f64>,
    pub q: Vector3<f64>,
    /// common factor × e_ij × e_kl
    pub fac: f64,
}

impl PrimQuartet {
    pub fn new(bra: &PrimitivePair, ket: &PrimitivePair, common_fac: f64) -> Self {
        PrimQuartet {
            aij: bra.a,
            akl: ket.a,
            p: bra.center,
            q: ket.center,
            fac: common_fac * bra.e * ket.e,
        }
    }

    /// Reduced exponent aij·akl/(aij + akl).
    pub fn a0(&self) -> f64 {
        self.aij * self.akl / (self.aij + self.akl)
    }

    /// Argument of the Boys function.
    pub fn x(&self) -> f64 {
        self.a0() * (self.p - self.q).norm_squared()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct VrrCoeffs {
    pub c00: f64,
    pub c0p: f64,
    pub b00: f64,
    pub b10: f64,
    pub b01: f64,
}

/// Scratch owned by one worker.
#[derive(Debug, Clone)]
pub struct RecursionWork {
    pub roots: [f64; MAX_ROOTS],
    pub weights: [f64; MAX_ROOTS],
    vrr: Vec<f64>,
    kl: Vec<f64>,
    roll: Vec<f64>,
}

impl RecursionWork {
    pub fn new(layout: &GLayout) -> Self {
        RecursionWork {
            roots: [0.0; MAX_ROOTS],
            weights: [0.0; MAX_ROOTS],
            vrr: vec![0.0; (layout.nmax + 1) * (layout.mmax + 1)],
            kl: vec![0.0; (layout.nmax + 1) * layout.nk * layout.nl],
            roll: vec![0.0; layout.nmax.max(layout.mmax) + 1],
        }
    }
}

/// Fills `g` (length `layout.total_size()`) for one primitive quartet.
pub fn fill_g(
    layout: &GLayout,
    solver: &RootSolver,
    pq: &PrimQuartet,
    bra: &PairGeometry,
    ket: &PairGeometry,
    work: &mut RecursionWork,
    g: &mut [f64],
) {
    let (aij, akl) = (pq.aij, pq.akl);
    let a0 = pq.a0();
    let fac1 = (a0 / (aij * akl).powi(3)).sqrt() * pq.fac;
    let rpq = pq.p - pq.q;
    solver.solve(pq.x(), &mut work.roots, &mut work.weights);

    for r in 0..layout.nroots {
        let u2 = a0 * work.roots[r];
        let tmp4 = 0.5 / (u2 * (aij + akl) + aij * akl);
        let b00 = u2 * tmp4;
        let b10 = b00 + tmp4 * akl;
        let b01 = b00 + tmp4 * aij;
        for axis in 0..3 {
            let coeffs = VrrCoeffs {
                c00: (pq.p[axis] - bra.base[axis]) - 2.0 * b00 * akl * rpq[axis],
                c0p: (pq.q[axis] - ket.base[axis]) + 2.0 * b00 * aij * rpq[axis],
                b00,
                b10,
                b01,
            };
            let seed = if axis == 2 { work.weights[r] * fac1 } else { 1.0 };
            vertical(layout.nmax, layout.mmax, seed, &coeffs, &mut work.vrr);

            let start = layout.block(axis, r);
            transfer(
                layout,
                bra.rab[axis],
                ket.rab[axis],
                &work.vrr,
                &mut work.kl,
                &mut work.roll,
                &mut g[start..start + layout.g_size],
            );
        }
    }
}

/// V(n, m) for n <= nmax, m <= mmax, stored at `n * (mmax + 1) + m`.
pub fn vertical(nmax: usize, mmax: usize, seed: f64, c: &VrrCoeffs, v: &mut [f64]) {
    let dm = mmax + 1;
    v[0] = seed;
    if nmax > 0 {
        v[dm] = c.c00 * seed;
    }
    for n in 1..nmax {
        v[(n + 1) * dm] = c.c00 * v[n * dm] + n as f64 * c.b10 * v[(n - 1) * dm];
    }
    for m in 0..mmax {
        for n in 0..=nmax {
            let mut val = c.c0p * v[n * dm + m];
            if m > 0 {
                val += m as f64 * c.b01 * v[n * dm + m - 1];
            }
            if n > 0 {
                val += n as f64 * c.b00 * v[(n - 1) * dm + m];
            }
            v[n * dm + m + 1] = val;
        }
    }
}

fn transfer(
    layout: &GLayout,
    rab_bra: f64,
    rab_ket: f64,
    v: &[f64],
    kl: &mut [f64],
    roll: &mut [f64],
    g: &mut [f64],
) {
    let (nk, nl) = (layout.nk, layout.nl);
    let dm = layout.mmax + 1;
    let [_, _, lk, ll] = layout.l;

    let (ka, kb) = if layout.kbase { (lk, ll) } else { (ll, lk) };
    for n in 0..=layout.nmax {
        roll[..dm].copy_from_slice(&v[n * dm..(n + 1) * dm]);
        hrr(roll, layout.mmax, ka, kb, rab_ket, |a, b, val| {
            let (k, l) = if layout.kbase { (a, b) } else { (b, a) };
            kl[(n * nk + k) * nl + l] = val;
        });
    }

    let (ia, ib) = if layout.ibase {
        (layout.i_ceil, layout.j_ceil)
    } else {
        (layout.j_ceil, layout.i_ceil)
    };
    for k in 0..nk {
        for l in 0..nl {
            for n in 0..=layout.nmax {
                roll[n] = kl[(n * nk + k) * nl + l];
            }
            hrr(roll, layout.nmax, ia, ib, rab_bra, |a, b, val| {
                let (i, j) = if layout.ibase { (a, b) } else { (b, a) };
                g[layout.offset(i, j, k, l)] = val;
            });
        }
    }
}

// I(a, b) = I(a + 1, b − 1) + rab·I(a, b − 1), in place over a; emits every
// (a <= amax, b <= bmax) with a + b <= top.
fn hrr(roll: &mut [f64], top: usize, amax: usize, bmax: usize, rab: f64, mut emit: impl FnMut(usize, usize, f64)) {
    for (a, &val) in roll.iter().enumerate().take(amax.min(top) + 1) {
        emit(a, 0, val);
    }
    for b in 1..=bmax {
        for a in 0..=top - b {
            roll[a] = roll[a + 1] + rab * roll[a];
        }
        for (a, &val) in roll.iter().enumerate().take(amax.min(top - b) + 1) {
            emit(a, b, val);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use basis::helper::boys_values;
    use std::f64::consts::PI;

    fn common_fac() -> f64 {
        2.0 * PI.powf(2.5)
    }

    fn prim_pair(ai: f64, aj: f64, ra: Vector3<f64>, rb: Vector3<f64>) -> PrimitivePair {
        let a = ai + aj;
        PrimitivePair {
            a,
            center: (ra * ai + rb * aj) / a,
            e: (-ai * aj / a * (ra - rb).norm_squared()).exp(),
            ai,
            aj,
        }
    }

    // Unnormalised primitive integral (ij|kl) for Cartesian exponents `comps`.
    fn primitive_eri(exps: [f64; 4], centers: [Vector3<f64>; 4], comps: [[usize; 3]; 4]) -> f64 {
        let l = comps.map(|c| c[0] + c[1] + c[2]);
        let nroots = l.iter().sum::<usize>() / 2 + 1;
        let layout = GLayout::new(l, 0, nroots);
        let solver = RootSolver::new(nroots).unwrap();
        let bra_pp = prim_pair(exps[0], exps[1], centers[0], centers[1]);
        let ket_pp = prim_pair(exps[2], exps[3], centers[2], centers[3]);
        let pq = PrimQuartet::new(&bra_pp, &ket_pp, common_fac());
        let bra = PairGeometry::new(centers[0], centers[1], layout.ibase);
        let ket = PairGeometry::new(centers[2], centers[3], layout.kbase);
        let mut work = RecursionWork::new(&layout);
        let mut g = vec![0.0; layout.total_size()];
        fill_g(&layout, &solver, &pq, &bra, &ket, &mut work, &mut g);

        let off: Vec<usize> = (0..3)
            .map(|x| layout.offset(comps[0][x], comps[1][x], comps[2][x], comps[3][x]))
            .collect();
        (0..nroots)
            .map(|r| (0..3).map(|x| g[layout.block(x, r) + off[x]]).product::<f64>())
            .sum()
    }

    fn centers() -> [Vector3<f64>; 4] {
        [
            Vector3::new(0.1, -0.3, 0.2),
            Vector3::new(0.9, 0.4, -0.5),
            Vector3::new(-0.7, 0.2, 1.1),
            Vector3::new(0.3, 1.0, 0.6),
        ]
    }

    const EXPS: [f64; 4] = [0.9, 1.3, 0.5, 2.1];
    const S: [usize; 3] = [0, 0, 0];
    const PX: [usize; 3] = [1, 0, 0];
    const PY: [usize; 3] = [0, 1, 0];
    const DXX: [usize; 3] = [2, 0, 0];

    #[test]
    fn test_ssss_closed_form() {
        let c = centers();
        let (p, q) = (EXPS[0] + EXPS[1], EXPS[2] + EXPS[3]);
        let kab = (-EXPS[0] * EXPS[1] / p * (c[0] - c[1]).norm_squared()).exp();
        let kcd = (-EXPS[2] * EXPS[3] / q * (c[2] - c[3]).norm_squared()).exp();
        let pc = (c[0] * EXPS[0] + c[1] * EXPS[1]) / p;
        let qc = (c[2] * EXPS[2] + c[3] * EXPS[3]) / q;
        let t = p * q / (p + q) * (pc - qc).norm_squared();
        let mut f = [0.0];
        boys_values(0, t, &mut f);
        let expected = 2.0 * PI.powf(2.5) / (p * q * (p + q).sqrt()) * kab * kcd * f[0];

        assert_relative_eq!(primitive_eri(EXPS, c, [S; 4]), expected, max_relative = 1e-12);
    }

    // ∂/∂A_x of a primitive with lx = l is 2a·(l+1 component) − l·(l−1 component)
    fn fd_center(comps: [[usize; 3]; 4], center: usize, axis: usize) -> f64 {
        let h = 1e-5;
        let mut plus = centers();
        let mut minus = centers();
        plus[center][axis] += h;
        minus[center][axis] -= h;
        (primitive_eri(EXPS, plus, comps) - primitive_eri(EXPS, minus, comps)) / (2.0 * h)
    }

    #[test]
    fn test_p_functions_on_each_center() {
        let c = centers();
        for center in 0..4 {
            let mut comps = [S; 4];
            comps[center] = PX;
            let analytic = primitive_eri(EXPS, c, comps);
            let numeric = fd_center([S; 4], center, 0) / (2.0 * EXPS[center]);
            assert_relative_eq!(analytic, numeric, max_relative = 1e-7);
        }
    }

    #[test]
    fn test_d_function_from_p_derivative() {
        let c = centers();
        let dxx = primitive_eri(EXPS, c, [DXX, S, S, S]);
        let ss = primitive_eri(EXPS, c, [S; 4]);
        let numeric = fd_center([PX, S, S, S], 0, 0);
        assert_relative_eq!(2.0 * EXPS[0] * dxx - ss, numeric, max_relative = 1e-7);
    }

    #[test]
    fn test_bra_ket_and_pair_exchange() {
        // mixed l so that both base choices are taken
        let c = centers();
        let value = primitive_eri(EXPS, c, [PX, DXX, PY, S]);

        let swapped_bra = primitive_eri(
            [EXPS[1], EXPS[0], EXPS[2], EXPS[3]],
            [c[1], c[0], c[2], c[3]],
            [DXX, PX, PY, S],
        );
        let swapped_ket = primitive_eri(
            [EXPS[0], EXPS[1], EXPS[3], EXPS[2]],
            [c[0], c[1], c[3], c[2]],
            [PX, DXX, S, PY],
        );
        let bra_ket = primitive_eri(
            [EXPS[2], EXPS[3], EXPS[0], EXPS[1]],
            [c[2], c[3], c[0], c[1]],
            [PY, S, PX, DXX],
        );
        assert!(value.abs() > 1e-6);
        assert_relative_eq!(value, swapped_bra, max_relative = 1e-11);
        assert_relative_eq!(value, swapped_ket, max_relative = 1e-11);
        assert_relative_eq!(value, bra_ket, max_relative = 1e-11);
    }

    #[test]
    fn test_layout_strides() {
        let layout = GLayout::new([2, 1, 1, 0], 1, 3);
        assert_eq!((layout.i_ceil, layout.j_ceil), (3, 2));
        assert_eq!((layout.nmax, layout.mmax), (4, 1));
        assert_eq!((layout.nk, layout.nl), (2, 1));
        assert_eq!((layout.dk, layout.dj, layout.di), (1, 2, 6));
        assert_eq!(layout.g_size, 24);
        assert_eq!(layout.total_size(), 3 * 3 * 24);
        assert_eq!(layout.funcs.len(), 6 * 3 * 3);
        assert!(layout.ibase && layout.kbase);

        let f = layout.funcs[1];
        assert_eq!(f.idx, [1, 0, 0, 0]);
        assert_eq!(f.i, [1, 1, 0]);
        assert_eq!(f.off, [layout.offset(1, 1, 1, 0), layout.offset(1, 0, 0, 0), 0]);
    }
}
