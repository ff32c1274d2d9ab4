//! Precomputed shell-pair and primitive-pair data shared read-only by every task.

use crate::error::GradError;
use basis::basis::BasisSet;
use itertools::iproduct;
use nalgebra::Vector3;
use std::collections::HashSet;
use std::ops::Range;

/// Gaussian product of one primitive of each shell of a pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrimitivePair {
    /// Combined exponent ai + aj.
    pub a: f64,
    /// Product center (ai·A + aj·B) / a.
    pub center: Vector3<f64>,
    /// ci·cj·exp(−ai·aj/a·|A − B|²)
    pub e: f64,
    pub ai: f64,
    pub aj: f64,
}

/// Angular-momentum class of a shell pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PairClass {
    pub li: usize,
    pub lj: usize,
}

impl PairClass {
    /// Whether the vertical recursion is built on the first center.
    pub fn ibase(&self) -> bool {
        self.li >= self.lj
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShellPair {
    pub ish: usize,
    pub jsh: usize,
    pub li: usize,
    pub lj: usize,
    pub prim_offset: usize,
    pub nprim_i: usize,
    pub nprim_j: usize,
    /// 0.5 on diagonal pairs (ish == jsh), 1 otherwise.
    pub diag_fac: f64,
}

impl ShellPair {
    pub fn prim_range(&self) -> Range<usize> {
        self.prim_offset..self.prim_offset + self.nprim_i * self.nprim_j
    }

    pub fn class(&self) -> PairClass {
        PairClass {
            li: self.li,
            lj: self.lj,
        }
    }
}

/// Per-shell lookup tables copied out of the basis.
#[derive(Debug, Clone, Default)]
pub struct ShellTables {
    pub ao_loc: Vec<usize>,
    pub shell_l: Vec<usize>,
    pub shell_atom: Vec<usize>,
    pub shell_center: Vec<Vector3<f64>>,
    pub atom_coords: Vec<Vector3<f64>>,
}

impl ShellTables {
    pub fn from_basis(basis: &BasisSet) -> Self {
        ShellTables {
            ao_loc: basis.ao_loc.clone(),
            shell_l: basis.shells.iter().map(|s| s.l).collect(),
            shell_atom: basis.shell_atom(),
            shell_center: basis.shells.iter().map(|s| s.center).collect(),
            atom_coords: basis.atom_coords.clone(),
        }
    }

    pub fn nshell(&self) -> usize {
        self.shell_l.len()
    }

    pub fn nao(&self) -> usize {
        self.ao_loc.last().copied().unwrap_or(0)
    }

    pub fn natm(&self) -> usize {
        self.atom_coords.len()
    }
}

/// Shell pairs grouped by class, with their primitive pairs stored contiguously.
///
/// Each stored pair (I, J) stands for the unordered pair {I, J}; the kernels
/// account for the transposed ordering through `diag_fac`.
#[derive(Debug, Clone, Default)]
pub struct PairCache {
    pub tables: ShellTables,
    pub prim_pairs: Vec<PrimitivePair>,
    pub shell_pairs: Vec<ShellPair>,
    class_ranges: Vec<(PairClass, Range<usize>)>,
}

impl PairCache {
    /// All pairs with ish >= jsh.
    pub fn build(basis: &BasisSet) -> Self {
        let n = basis.nshell();
        let pairs: Vec<(usize, usize)> = iproduct!(0..n, 0..n).filter(|(i, j)| i >= j).collect();
        Self::assemble(basis, &pairs)
    }

    /// Pairs given explicitly; every unordered shell pair must appear exactly once.
    pub fn build_with_pairs(basis: &BasisSet, pairs: &[(usize, usize)]) -> Result<Self, GradError> {
        let n = basis.nshell();
        let mut seen = HashSet::new();
        for &(i, j) in pairs {
            if i >= n || j >= n {
                return Err(GradError::MalformedTasks(format!(
                    "shell pair ({}, {}) outside {} shells",
                    i, j, n
                )));
            }
            if !seen.insert((i.max(j), i.min(j))) {
                return Err(GradError::MalformedTasks(format!(
                    "shell pair ({}, {}) listed twice",
                    i, j
                )));
            }
        }
        let expected = n * (n + 1) / 2;
        if seen.len() != expected {
            return Err(GradError::MalformedTasks(format!(
                "{} shell pairs given, {} needed",
                seen.len(),
                expected
            )));
        }
        Ok(Self::assemble(basis, pairs))
    }

    fn assemble(basis: &BasisSet, pairs: &[(usize, usize)]) -> Self {
        let mut ordered = pairs.to_vec();
        ordered.sort_by_key(|&(i, j)| (basis.shells[i].l, basis.shells[j].l));

        let mut prim_pairs = Vec::new();
        let mut shell_pairs = Vec::with_capacity(ordered.len());
        for (ish, jsh) in ordered {
            let si = &basis.shells[ish];
            let sj = &basis.shells[jsh];
            let prim_offset = prim_pairs.len();
            let rab2 = (si.center - sj.center).norm_squared();
            for (p, q) in iproduct!(0..si.nprim(), 0..sj.nprim()) {
                let (ai, aj) = (si.exponents[p], sj.exponents[q]);
                let a = ai + aj;
                prim_pairs.push(PrimitivePair {
                    a,
                    center: (si.center * ai + sj.center * aj) / a,
                    e: si.coefficients[p] * sj.coefficients[q] * (-ai * aj / a * rab2).exp(),
                    ai,
                    aj,
                });
            }
            shell_pairs.push(ShellPair {
                ish,
                jsh,
                li: si.l,
                lj: sj.l,
                prim_offset,
                nprim_i: si.nprim(),
                nprim_j: sj.nprim(),
                diag_fac: if ish == jsh { 0.5 } else { 1.0 },
            });
        }

        let mut class_ranges: Vec<(PairClass, Range<usize>)> = Vec::new();
        for (idx, pair) in shell_pairs.iter().enumerate() {
            match class_ranges.last_mut() {
                Some((class, range)) if *class == pair.class() => range.end = idx + 1,
                _ => class_ranges.push((pair.class(), idx..idx + 1)),
            }
        }

        PairCache {
            tables: ShellTables::from_basis(basis),
            prim_pairs,
            shell_pairs,
            class_ranges,
        }
    }

    pub fn classes(&self) -> impl Iterator<Item = PairClass> + '_ {
        self.class_ranges.iter().map(|(c, _)| *c)
    }

    /// Indices into `shell_pairs` of the pairs of `class` (empty if none).
    pub fn pairs_of_class(&self, class: PairClass) -> Range<usize> {
        self.class_ranges
            .iter()
            .find(|(c, _)| *c == class)
            .map(|(_, r)| r.clone())
            .unwrap_or(0..0)
    }

    pub fn prims(&self, pair: &ShellPair) -> &[PrimitivePair] {
        &self.prim_pairs[pair.prim_range()]
    }

    pub fn nshell(&self) -> usize {
        self.tables.nshell()
    }

    pub fn nao(&self) -> usize {
        self.tables.nao()
    }

    pub fn natm(&self) -> usize {
        self.tables.natm()
    }

    pub fn max_l(&self) -> usize {
        self.tables.shell_l.iter().copied().max().unwrap_or(0)
    }
}
