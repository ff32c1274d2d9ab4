//! Lock-free f64 accumulation shared by all tasks of a launch.

use nalgebra::Vector3;
use std::sync::atomic::{AtomicU64, Ordering};

/// Slots of f64 stored as bit patterns and updated by compare-and-swap.
///
/// Only additions are possible; callers start every accumulation from `zeroed`.
#[derive(Debug)]
pub struct AtomicAccumulator {
    slots: Vec<AtomicU64>,
}

impl AtomicAccumulator {
    pub fn zeroed(len: usize) -> Self {
        AtomicAccumulator {
            slots: (0..len).map(|_| AtomicU64::new(0.0f64.to_bits())).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    #[inline]
    pub fn add(&self, idx: usize, value: f64) {
        // fetch_update retries the closure until the swap succeeds; Err is unreachable
        let _ = self.slots[idx].fetch_update(Ordering::Relaxed, Ordering::Relaxed, |bits| {
            Some((f64::from_bits(bits) + value).to_bits())
        });
    }

    pub fn get(&self, idx: usize) -> f64 {
        f64::from_bits(self.slots[idx].load(Ordering::Relaxed))
    }

    pub fn snapshot(&self) -> Vec<f64> {
        self.slots
            .iter()
            .map(|s| f64::from_bits(s.load(Ordering::Relaxed)))
            .collect()
    }
}

/// Gradient slots, three per shell, laid out `[shell][axis]`.
#[derive(Debug)]
pub struct GradientAccumulator {
    inner: AtomicAccumulator,
}

impl GradientAccumulator {
    pub fn zeroed(nshell: usize) -> Self {
        GradientAccumulator {
            inner: AtomicAccumulator::zeroed(3 * nshell),
        }
    }

    pub fn nshell(&self) -> usize {
        self.inner.len() / 3
    }

    #[inline]
    pub fn add(&self, shell: usize, grad: [f64; 3]) {
        for (axis, &v) in grad.iter().enumerate() {
            self.inner.add(3 * shell + axis, v);
        }
    }

    pub fn snapshot(&self) -> Vec<f64> {
        self.inner.snapshot()
    }

    pub fn per_shell(&self) -> Vec<Vector3<f64>> {
        self.snapshot()
            .chunks_exact(3)
            .map(|c| Vector3::new(c[0], c[1], c[2]))
            .collect()
    }

    /// Sums shell gradients onto their atoms.
    pub fn per_atom(&self, shell_atom: &[usize], natm: usize) -> Vec<Vector3<f64>> {
        let mut out = vec![Vector3::zeros(); natm];
        for (shell, g) in self.per_shell().into_iter().enumerate() {
            out[shell_atom[shell]] += g;
        }
        out
    }
}

/// Six-double gradient scratch of one task: ∂i then ∂j.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskScratch {
    pub grad: [f64; 6],
}

impl TaskScratch {
    pub fn clear(&mut self) {
        self.grad = [0.0; 6];
    }

    #[inline]
    pub fn add_i(&mut self, axis: usize, v: f64) {
        self.grad[axis] += v;
    }

    #[inline]
    pub fn add_j(&mut self, axis: usize, v: f64) {
        self.grad[3 + axis] += v;
    }

    /// Six atomic adds: the scaled ∂i part onto `ish`, ∂j onto `jsh`.
    pub fn flush(&self, out: &GradientAccumulator, ish: usize, jsh: usize, scale: f64) {
        let g = self.grad;
        out.add(ish, [scale * g[0], scale * g[1], scale * g[2]]);
        out.add(jsh, [scale * g[3], scale * g[4], scale * g[5]]);
    }
}
