#![allow(non_snake_case)]
extern crate nalgebra as na;

use crate::helper::double_factorial;
use na::Vector3;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Number of Cartesian functions in a shell of angular momentum `l`.
pub const fn ncart(l: usize) -> usize {
    (l + 1) * (l + 2) / 2
}

/// Cartesian exponents of every function in a shell, ordered
/// xx, xy, xz, yy, yz, zz (lx descending, then ly descending).
pub fn cart_components(l: usize) -> Vec<[usize; 3]> {
    let mut comps = Vec::with_capacity(ncart(l));
    for lx in (0..=l).rev() {
        for ly in (0..=l - lx).rev() {
            comps.push([lx, ly, l - lx - ly]);
        }
    }
    comps
}

/// Primitive Cartesian Gaussian x^lx y^ly z^lz exp(-alpha r^2) about `center`.
///
/// `norm` normalises the axial (l,0,0) member of the shell, so every function of
/// a shell shares the same radial factor; off-axis Cartesian functions
/// (xy, xz, ...) are not individually unit-normalised.
#[derive(Debug, Serialize, Deserialize, Copy, Clone)]
pub struct GTO {
    pub alpha: f64,
    pub l_xyz: Vector3<i32>,
    pub center: Vector3<f64>,
    pub norm: f64,
}

impl GTO {
    pub fn new(alpha: f64, l_xyz: Vector3<i32>, center: Vector3<f64>) -> Self {
        let l = (l_xyz.x + l_xyz.y + l_xyz.z) as usize;
        Self {
            alpha,
            l_xyz,
            center,
            norm: GTO::axial_norm(alpha, l),
        }
    }

    /// N with N^2 * integral of x^{2l} exp(-2 alpha r^2) = 1.
    pub fn axial_norm(alpha: f64, l: usize) -> f64 {
        (1.0 / GTO::axial_overlap(alpha, alpha, l)).sqrt()
    }

    /// integral of x^{2l} exp(-(a+b) r^2) over all space,
    /// = pi^{3/2} (2l-1)!! / (2^l (a+b)^{l+3/2}).
    pub fn axial_overlap(a: f64, b: f64, l: usize) -> f64 {
        let p = a + b;
        PI.powf(1.5) * double_factorial(2 * l as i32 - 1)
            / (2.0_f64.powi(l as i32) * p.powf(l as f64 + 1.5))
    }

    pub fn evaluate(&self, r: &Vector3<f64>) -> f64 {
        let d = r - self.center;
        self.norm
            * d.x.powi(self.l_xyz.x)
            * d.y.powi(self.l_xyz.y)
            * d.z.powi(self.l_xyz.z)
            * (-self.alpha * d.norm_squared()).exp()
    }
}
