//! Kernel plans and launches: one plan per integral class, one task per
//! (bra pair, ket pair) of a batch.
//!
//! A plan fixes everything that depends only on the class (root solver, g
//! layout, scratch sizes) so that the tasks themselves never allocate and
//! never fail. Tasks run on the rayon pool; each worker owns a `Workspace`
//! and the only shared mutable state is the atomic accumulator.

use crate::accumulate::{AtomicAccumulator, GradientAccumulator, TaskScratch};
use crate::contraction::{contract_energy, contract_gradient, energy_weights, gradient_weights};
use crate::error::GradError;
use crate::pair_cache::{PairCache, PairClass, ShellPair};
use crate::partition::TaskOffsets;
use crate::recursion::{fill_g, GLayout, PairGeometry, PrimQuartet, RecursionWork};
use crate::rys::{RootSolver, MAX_ROOTS};
use nalgebra::DMatrix;
use rayon::prelude::*;
use std::f64::consts::PI;
use tracing::debug;

/// Highest angular momentum per shell.
pub const MAX_L: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelKind {
    Gradient,
    Energy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IntegralClass {
    pub li: usize,
    pub lj: usize,
    pub lk: usize,
    pub ll: usize,
}

impl IntegralClass {
    pub fn new(bra: PairClass, ket: PairClass) -> Self {
        IntegralClass {
            li: bra.li,
            lj: bra.lj,
            lk: ket.li,
            ll: ket.lj,
        }
    }

    pub fn bra(&self) -> PairClass {
        PairClass {
            li: self.li,
            lj: self.lj,
        }
    }

    pub fn ket(&self) -> PairClass {
        PairClass {
            li: self.lk,
            lj: self.ll,
        }
    }

    pub fn l(&self) -> [usize; 4] {
        [self.li, self.lj, self.lk, self.ll]
    }

    pub fn total_l(&self) -> usize {
        self.li + self.lj + self.lk + self.ll
    }
}

/// Per-class constants shared by every task of a launch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntegralEnv {
    pub class: IntegralClass,
    pub nroots: usize,
    /// 2π^{5/2}
    pub common_fac: f64,
    pub ibase: bool,
    pub kbase: bool,
}

#[derive(Debug, Clone)]
pub struct KernelPlan {
    pub kind: KernelKind,
    pub env: IntegralEnv,
    pub layout: GLayout,
    pub solver: RootSolver,
}

impl KernelPlan {
    pub fn gradient(class: IntegralClass) -> Result<Self, GradError> {
        Self::new(class, KernelKind::Gradient)
    }

    pub fn energy(class: IntegralClass) -> Result<Self, GradError> {
        Self::new(class, KernelKind::Energy)
    }

    fn new(class: IntegralClass, kind: KernelKind) -> Result<Self, GradError> {
        if let Some(&l) = class.l().iter().find(|&&l| l > MAX_L) {
            return Err(GradError::CapacityExceeded { l, max: MAX_L });
        }
        let extra = match kind {
            KernelKind::Gradient => 1,
            KernelKind::Energy => 0,
        };
        let nroots = (class.total_l() + extra) / 2 + 1;
        if nroots > MAX_ROOTS {
            return Err(GradError::TooManyRoots {
                nroots,
                max: MAX_ROOTS,
            });
        }
        let solver = RootSolver::new(nroots)?;
        let layout = GLayout::new(class.l(), extra, nroots);
        let env = IntegralEnv {
            class,
            nroots,
            common_fac: 2.0 * PI.powf(2.5),
            ibase: layout.ibase,
            kbase: layout.kbase,
        };
        Ok(KernelPlan {
            kind,
            env,
            layout,
            solver,
        })
    }

    pub fn nfuncs(&self) -> usize {
        self.layout.funcs.len()
    }
}

/// Per-worker scratch sized from a plan.
#[derive(Debug, Clone)]
pub struct Workspace {
    work: RecursionWork,
    g: Vec<f64>,
    wi: Vec<f64>,
    wj: Vec<f64>,
    scratch: TaskScratch,
}

impl Workspace {
    pub fn new(plan: &KernelPlan) -> Self {
        let nf = plan.nfuncs();
        Workspace {
            work: RecursionWork::new(&plan.layout),
            g: vec![0.0; plan.layout.total_size()],
            wi: vec![0.0; nf],
            wj: vec![0.0; nf],
            scratch: TaskScratch::default(),
        }
    }
}

fn check_launch(plan: &KernelPlan, kind: KernelKind, cache: &PairCache, offsets: &TaskOffsets, dm: &DMatrix<f64>) -> Result<(), GradError> {
    if plan.kind != kind {
        return Err(GradError::MalformedTasks(format!(
            "{:?} plan launched as {:?} kernel",
            plan.kind, kind
        )));
    }
    if offsets.bra_class != plan.env.class.bra() || offsets.ket_class != plan.env.class.ket() {
        return Err(GradError::MalformedTasks(format!(
            "batch class ({}, {} | {}, {}) does not match plan {:?}",
            offsets.bra_class.li, offsets.bra_class.lj, offsets.ket_class.li, offsets.ket_class.lj, plan.env.class
        )));
    }
    offsets.validate(cache)?;

    let nao = cache.nao();
    for found in [dm.nrows(), dm.ncols()] {
        if found != nao {
            return Err(GradError::DimensionMismatch {
                what: "density matrix",
                expected: nao,
                found,
            });
        }
    }
    Ok(())
}

struct TaskView<'a> {
    bra: &'a ShellPair,
    ket: &'a ShellPair,
    ao: [usize; 4],
    bra_geom: PairGeometry,
    ket_geom: PairGeometry,
}

impl<'a> TaskView<'a> {
    fn new(plan: &KernelPlan, cache: &'a PairCache, offsets: &TaskOffsets, t: usize) -> Self {
        let (ij, kl) = offsets.task(t);
        let bra = &cache.shell_pairs[ij];
        let ket = &cache.shell_pairs[kl];
        let tables = &cache.tables;
        let center = |s: usize| tables.shell_center[s];
        TaskView {
            bra,
            ket,
            ao: [
                tables.ao_loc[bra.ish],
                tables.ao_loc[bra.jsh],
                tables.ao_loc[ket.ish],
                tables.ao_loc[ket.jsh],
            ],
            bra_geom: PairGeometry::new(center(bra.ish), center(bra.jsh), plan.env.ibase),
            ket_geom: PairGeometry::new(center(ket.ish), center(ket.jsh), plan.env.kbase),
        }
    }
}

fn gradient_task(plan: &KernelPlan, cache: &PairCache, view: &TaskView, dm: &DMatrix<f64>, out: &GradientAccumulator, ws: &mut Workspace) {
    let layout = &plan.layout;
    gradient_weights(layout, dm, view.ao, &mut ws.wi, &mut ws.wj);
    ws.scratch.clear();
    for bp in cache.prims(view.bra) {
        for kp in cache.prims(view.ket) {
            let pq = PrimQuartet::new(bp, kp, plan.env.common_fac);
            fill_g(layout, &plan.solver, &pq, &view.bra_geom, &view.ket_geom, &mut ws.work, &mut ws.g);
            contract_gradient(layout, &ws.g, bp.ai, bp.aj, &ws.wi, &ws.wj, &mut ws.scratch);
        }
    }
    let scale = 2.0 * view.bra.diag_fac * view.ket.diag_fac;
    ws.scratch.flush(out, view.bra.ish, view.bra.jsh, scale);
}

fn energy_task(plan: &KernelPlan, cache: &PairCache, view: &TaskView, dm: &DMatrix<f64>, out: &AtomicAccumulator, ws: &mut Workspace) {
    let layout = &plan.layout;
    energy_weights(layout, dm, view.ao, &mut ws.wi);
    let mut e = 0.0;
    for bp in cache.prims(view.bra) {
        for kp in cache.prims(view.ket) {
            let pq = PrimQuartet::new(bp, kp, plan.env.common_fac);
            fill_g(layout, &plan.solver, &pq, &view.bra_geom, &view.ket_geom, &mut ws.work, &mut ws.g);
            e += contract_energy(layout, &ws.g, &ws.wi);
        }
    }
    let scale = 4.0 * view.bra.diag_fac * view.ket.diag_fac;
    out.add(0, scale * e);
}

/// Runs every task of `offsets` and adds the gradient contributions to `out`.
///
/// Returns once all tasks have completed. Inputs are checked before the first
/// task starts; a refused launch leaves `out` untouched.
pub fn launch_gradient(
    plan: &KernelPlan,
    cache: &PairCache,
    offsets: &TaskOffsets,
    dm: &DMatrix<f64>,
    out: &GradientAccumulator,
) -> Result<(), GradError> {
    check_launch(plan, KernelKind::Gradient, cache, offsets, dm)?;
    if out.nshell() != cache.nshell() {
        return Err(GradError::DimensionMismatch {
            what: "gradient accumulator",
            expected: cache.nshell(),
            found: out.nshell(),
        });
    }
    debug!(
        "gradient launch {:?}: {} x {} tasks, {} roots",
        plan.env.class,
        offsets.ntasks_ij(),
        offsets.ntasks_kl(),
        plan.env.nroots
    );

    (0..offsets.ntasks())
        .into_par_iter()
        .for_each_init(|| Workspace::new(plan), |ws, t| {
            let view = TaskView::new(plan, cache, offsets, t);
            gradient_task(plan, cache, &view, dm, out, ws);
        });
    Ok(())
}

/// Energy counterpart of [`launch_gradient`]; adds into slot 0 of `out`.
pub fn launch_energy(
    plan: &KernelPlan,
    cache: &PairCache,
    offsets: &TaskOffsets,
    dm: &DMatrix<f64>,
    out: &AtomicAccumulator,
) -> Result<(), GradError> {
    check_launch(plan, KernelKind::Energy, cache, offsets, dm)?;
    if out.is_empty() {
        return Err(GradError::DimensionMismatch {
            what: "energy accumulator",
            expected: 1,
            found: 0,
        });
    }
    debug!(
        "energy launch {:?}: {} x {} tasks, {} roots",
        plan.env.class,
        offsets.ntasks_ij(),
        offsets.ntasks_kl(),
        plan.env.nroots
    );

    (0..offsets.ntasks())
        .into_par_iter()
        .for_each_init(|| Workspace::new(plan), |ws, t| {
            let view = TaskView::new(plan, cache, offsets, t);
            energy_task(plan, cache, &view, dm, out, ws);
        });
    Ok(())
}
