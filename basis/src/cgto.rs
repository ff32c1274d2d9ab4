/* Contracted Cartesian shells, built on the primitive normalisation in gto.rs,
   and the NWChem basis-file reader that produces their definitions.
*/

use crate::gto::{cart_components, ncart, GTO};
use itertools::iproduct;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Element-level shell definition as it appears in a basis file:
/// raw exponents and contraction coefficients, before normalisation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShellDef {
    pub l: usize,
    pub exponents: Vec<f64>,
    pub coefficients: Vec<f64>,
}

impl ShellDef {
    /// The conditions `Shell::new` asserts, as an error message.
    pub fn check(&self) -> Result<(), String> {
        if self.exponents.len() != self.coefficients.len() {
            return Err(format!(
                "shell with {} exponents but {} coefficients",
                self.exponents.len(),
                self.coefficients.len()
            ));
        }
        if self.exponents.is_empty() {
            return Err("shell without primitives".to_string());
        }
        if let Some(a) = self.exponents.iter().find(|&&a| !(a > 0.0 && a.is_finite())) {
            return Err(format!("non-positive exponent {} in l = {} shell", a, self.l));
        }
        Ok(())
    }
}

/// A contracted shell placed on an atom.
///
/// `coefficients` already contain the primitive normalisation and are scaled
/// so that the axial function (x^l) of the contraction has unit norm.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shell {
    pub atom: usize,
    pub l: usize,
    pub center: Vector3<f64>,
    pub exponents: Vec<f64>,
    pub coefficients: Vec<f64>,
}

impl Shell {
    pub fn new(atom: usize, center: Vector3<f64>, def: &ShellDef) -> Self {
        if let Err(e) = def.check() {
            panic!("{}", e);
        }

        let l = def.l;
        let mut coefficients: Vec<f64> = def
            .exponents
            .iter()
            .zip(&def.coefficients)
            .map(|(&a, &c)| c * GTO::axial_norm(a, l))
            .collect();

        let n = def.exponents.len();
        let self_overlap: f64 = iproduct!(0..n, 0..n)
            .map(|(p, q)| {
                coefficients[p]
                    * coefficients[q]
                    * GTO::axial_overlap(def.exponents[p], def.exponents[q], l)
            })
            .sum();
        let scale = 1.0 / self_overlap.sqrt();
        coefficients.iter_mut().for_each(|c| *c *= scale);

        Shell {
            atom,
            l,
            center,
            exponents: def.exponents.clone(),
            coefficients,
        }
    }

    pub fn nprim(&self) -> usize {
        self.exponents.len()
    }

    pub fn nfunc(&self) -> usize {
        ncart(self.l)
    }

    /// Value of Cartesian function `ifunc` of this shell at `r`.
    pub fn evaluate(&self, ifunc: usize, r: &Vector3<f64>) -> f64 {
        let [lx, ly, lz] = cart_components(self.l)[ifunc];
        let d = r - self.center;
        let angular = d.x.powi(lx as i32) * d.y.powi(ly as i32) * d.z.powi(lz as i32);
        let radial: f64 = self
            .exponents
            .iter()
            .zip(&self.coefficients)
            .map(|(&a, &c)| c * (-a * d.norm_squared()).exp())
            .sum();
        angular * radial
    }
}

/// All shells of one element, as read from a basis file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementBasis {
    pub name: String,
    pub atomic_number: u32,
    pub shells: Vec<ShellDef>,
}

fn shell_label_l(label: &str) -> Option<usize> {
    match label {
        "S" => Some(0),
        "P" => Some(1),
        "D" => Some(2),
        "F" => Some(3),
        "G" => Some(4),
        _ => None,
    }
}

impl ElementBasis {
    // Example of nwchem format:
    // #----------------------------------------------------------------------
    // #   Basis set: 6-31G
    // #----------------------------------------------------------------------
    // BASIS "ao basis" SPHERICAL PRINT
    // #BASIS SET: (4s) -> [2s]
    // H    S
    //       0.1873113696E+02       0.3349460434E-01
    //       0.2825394365E+01       0.2347269535E+00
    //       0.6401216923E+00       0.8137573261E+00
    // H    S
    //       0.1612777588E+00       1.0000000
    // END
    //
    // SP blocks carry a third column with the p coefficients and produce one
    // s shell and one p shell sharing exponents.
    fn parse_primitive_block(lines: &[&str], label: &str) -> Result<Vec<ShellDef>, String> {
        let columns: Vec<usize> = match label {
            "SP" => vec![0, 1],
            other => match shell_label_l(other) {
                Some(l) => vec![l],
                None => return Err(format!("Unsupported basis type: {}", other)),
            },
        };

        let mut res: Vec<ShellDef> = columns
            .iter()
            .map(|&l| ShellDef {
                l,
                exponents: Vec::new(),
                coefficients: Vec::new(),
            })
            .collect();

        for line in lines {
            let tokens: Vec<f64> = line
                .split_whitespace()
                .map(|t| {
                    t.replace(['D', 'd'], "E")
                        .parse::<f64>()
                        .map_err(|_| format!("Malformed number in basis line: {}", line))
                })
                .collect::<Result<_, _>>()?;
            if tokens.len() < columns.len() + 1 {
                continue;
            }
            for (icol, shell) in res.iter_mut().enumerate() {
                shell.exponents.push(tokens[0]);
                shell.coefficients.push(tokens[icol + 1]);
            }
        }

        Ok(res)
    }

    /// Parses one element's basis in NWChem format. Bad numbers, an unknown
    /// element or shell label and empty shells are errors.
    pub fn parse_nwchem(input: &str) -> Result<Self, String> {
        let mut basis = ElementBasis {
            name: String::new(),
            atomic_number: 0,
            shells: Vec::new(),
        };

        let mut current_block: Vec<&str> = Vec::new();
        let mut current_label: Option<&str> = None;

        for line in input.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with("BASIS") {
                continue;
            }
            if line == "END" {
                break;
            }

            let tokens: Vec<&str> = line.split_whitespace().collect();
            let is_header = tokens.len() == 2 && tokens[0].chars().all(|c| c.is_ascii_alphabetic());
            if is_header {
                if let Some(label) = current_label {
                    basis.shells.extend(Self::parse_primitive_block(&current_block, label)?);
                }
                let element = periodic_table_on_an_enum::Element::from_symbol(tokens[0])
                    .ok_or_else(|| format!("Unknown element symbol: {}", tokens[0]))?;
                basis.name = element.get_symbol().to_string();
                basis.atomic_number = element.get_atomic_number() as u32;

                current_block.clear();
                current_label = Some(tokens[1]);
            } else if current_label.is_some() {
                current_block.push(line);
            }
        }

        if let Some(label) = current_label {
            basis.shells.extend(Self::parse_primitive_block(&current_block, label)?);
        }
        for shell in &basis.shells {
            shell.check()?;
        }

        Ok(basis)
    }
}
