use crate::cgto::{ElementBasis, Shell, ShellDef};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Molecular basis: atoms, their shells and the AO offset table.
///
/// Shells are stored atom by atom in insertion order. `ao_loc[s]..ao_loc[s + 1]`
/// is the AO range of shell `s`, so `ao_loc` has `nshell + 1` entries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BasisSet {
    pub atom_coords: Vec<Vector3<f64>>,
    pub atomic_numbers: Vec<u32>,
    pub shells: Vec<Shell>,
    pub ao_loc: Vec<usize>,
}

impl BasisSet {
    pub fn new() -> Self {
        BasisSet {
            atom_coords: Vec::new(),
            atomic_numbers: Vec::new(),
            shells: Vec::new(),
            ao_loc: vec![0],
        }
    }

    /// Adds an atom with the given shells and returns its index.
    pub fn add_atom(&mut self, center: Vector3<f64>, atomic_number: u32, shells: &[ShellDef]) -> usize {
        let atom = self.atom_coords.len();
        self.atom_coords.push(center);
        self.atomic_numbers.push(atomic_number);
        for def in shells {
            let shell = Shell::new(atom, center, def);
            let last = *self.ao_loc.last().unwrap_or(&0);
            self.ao_loc.push(last + shell.nfunc());
            self.shells.push(shell);
        }
        atom
    }

    /// Builds a basis from (coordinates, element basis) pairs.
    pub fn from_atoms(atoms: &[(Vector3<f64>, &ElementBasis)]) -> Self {
        let mut basis = BasisSet::new();
        for (center, element) in atoms {
            basis.add_atom(*center, element.atomic_number, &element.shells);
        }
        basis
    }

    pub fn natm(&self) -> usize {
        self.atom_coords.len()
    }

    pub fn nshell(&self) -> usize {
        self.shells.len()
    }

    pub fn nao(&self) -> usize {
        *self.ao_loc.last().unwrap_or(&0)
    }

    pub fn shell_atom(&self) -> Vec<usize> {
        self.shells.iter().map(|s| s.atom).collect()
    }

    pub fn max_l(&self) -> usize {
        self.shells.iter().map(|s| s.l).max().unwrap_or(0)
    }

    /// Copy of the basis with `atom` moved by `delta` along `axis`; its shells follow.
    pub fn displaced(&self, atom: usize, axis: usize, delta: f64) -> Self {
        let mut shift = Vector3::zeros();
        shift[axis] = delta;
        let mut moved = self.clone();
        moved.atom_coords[atom] += shift;
        for shell in moved.shells.iter_mut().filter(|s| s.atom == atom) {
            shell.center += shift;
        }
        moved
    }

    /// Copy of the basis with every atom moved by `shift`.
    pub fn translated(&self, shift: Vector3<f64>) -> Self {
        let mut moved = self.clone();
        moved.atom_coords.iter_mut().for_each(|c| *c += shift);
        moved.shells.iter_mut().for_each(|s| s.center += shift);
        moved
    }
}
