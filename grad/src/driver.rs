//! Orchestration over all integral classes of a basis.

use crate::accumulate::{AtomicAccumulator, GradientAccumulator};
use crate::error::GradError;
use crate::kernel::{launch_energy, launch_gradient, IntegralClass, KernelPlan};
use crate::pair_cache::{PairCache, PairClass};
use crate::partition::TaskOffsets;
use basis::basis::BasisSet;
use itertools::iproduct;
use nalgebra::{DMatrix, Vector3};
use std::time::Instant;
use tracing::info;

/// Two-electron gradient engine bound to one basis (one geometry).
#[derive(Debug, Clone)]
pub struct EriGradient {
    cache: PairCache,
}

impl EriGradient {
    pub fn new(basis: &BasisSet) -> Self {
        Self::from_cache(PairCache::build(basis))
    }

    pub fn from_cache(cache: PairCache) -> Self {
        EriGradient { cache }
    }

    pub fn cache(&self) -> &PairCache {
        &self.cache
    }

    fn class_batches(&self) -> Vec<(PairClass, PairClass)> {
        let classes: Vec<PairClass> = self.cache.classes().collect();
        iproduct!(classes.iter().copied(), classes.iter().copied()).collect()
    }

    /// Adds the gradient of every class combination to `out`.
    pub fn gradient_into(&self, dm: &DMatrix<f64>, out: &GradientAccumulator) -> Result<(), GradError> {
        let start = Instant::now();
        let batches = self.class_batches();
        for &(bra, ket) in &batches {
            let plan = KernelPlan::gradient(IntegralClass::new(bra, ket))?;
            let offsets = TaskOffsets::for_classes(&self.cache, bra, ket);
            launch_gradient(&plan, &self.cache, &offsets, dm, out)?;
        }
        info!(
            "two-electron gradient: {} shells, {} class batches, {:.3} s",
            self.cache.nshell(),
            batches.len(),
            start.elapsed().as_secs_f64()
        );
        Ok(())
    }

    /// Per-atom two-electron gradient.
    pub fn gradient(&self, dm: &DMatrix<f64>) -> Result<Vec<Vector3<f64>>, GradError> {
        let out = GradientAccumulator::zeroed(self.cache.nshell());
        self.gradient_into(dm, &out)?;
        Ok(out.per_atom(&self.cache.tables.shell_atom, self.cache.natm()))
    }

    /// Two-electron (Coulomb minus half exchange) energy of `dm`.
    pub fn energy(&self, dm: &DMatrix<f64>) -> Result<f64, GradError> {
        let out = AtomicAccumulator::zeroed(1);
        for (bra, ket) in self.class_batches() {
            let plan = KernelPlan::energy(IntegralClass::new(bra, ket))?;
            let offsets = TaskOffsets::for_classes(&self.cache, bra, ket);
            launch_energy(&plan, &self.cache, &offsets, dm, &out)?;
        }
        Ok(out.get(0))
    }
}
