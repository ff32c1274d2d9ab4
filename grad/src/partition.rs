//! Task grid of one integral class: bra shell pairs × ket shell pairs.

use crate::error::GradError;
use crate::pair_cache::{PairCache, PairClass};

/// Rectangular task batch. Task `t` covers bra pair `bra_pairs[t % ntasks_ij]`
/// and ket pair `ket_pairs[t / ntasks_ij]`.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskOffsets {
    pub bra_class: PairClass,
    pub ket_class: PairClass,
    pub bra_pairs: Vec<usize>,
    pub ket_pairs: Vec<usize>,
}

impl TaskOffsets {
    pub fn new(bra_class: PairClass, ket_class: PairClass, bra_pairs: Vec<usize>, ket_pairs: Vec<usize>) -> Self {
        TaskOffsets {
            bra_class,
            ket_class,
            bra_pairs,
            ket_pairs,
        }
    }

    /// Every pair of `bra_class` against every pair of `ket_class`.
    pub fn for_classes(cache: &PairCache, bra_class: PairClass, ket_class: PairClass) -> Self {
        TaskOffsets {
            bra_class,
            ket_class,
            bra_pairs: cache.pairs_of_class(bra_class).collect(),
            ket_pairs: cache.pairs_of_class(ket_class).collect(),
        }
    }

    pub fn ntasks_ij(&self) -> usize {
        self.bra_pairs.len()
    }

    pub fn ntasks_kl(&self) -> usize {
        self.ket_pairs.len()
    }

    pub fn ntasks(&self) -> usize {
        self.ntasks_ij() * self.ntasks_kl()
    }

    pub fn is_empty(&self) -> bool {
        self.ntasks() == 0
    }

    /// (bra pair, ket pair) indices of task `t`.
    #[inline]
    pub fn task(&self, t: usize) -> (usize, usize) {
        let nij = self.ntasks_ij();
        (self.bra_pairs[t % nij], self.ket_pairs[t / nij])
    }

    /// Checks that every referenced pair exists and has the declared class.
    pub fn validate(&self, cache: &PairCache) -> Result<(), GradError> {
        let sides = [
            ("bra", self.bra_class, &self.bra_pairs),
            ("ket", self.ket_class, &self.ket_pairs),
        ];
        for (side, class, pairs) in sides {
            for &idx in pairs.iter() {
                let pair = cache.shell_pairs.get(idx).ok_or_else(|| {
                    GradError::MalformedTasks(format!(
                        "{} pair {} out of range ({} pairs)",
                        side,
                        idx,
                        cache.shell_pairs.len()
                    ))
                })?;
                if pair.class() != class {
                    return Err(GradError::MalformedTasks(format!(
                        "{} pair {} has class ({}, {}), batch expects ({}, {})",
                        side, idx, pair.li, pair.lj, class.li, class.lj
                    )));
                }
            }
        }
        Ok(())
    }
}
