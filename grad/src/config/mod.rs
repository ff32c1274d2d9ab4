//! Configuration for gradient runs
//!
//! YAML layout: the molecule (`geometry`, `units`), per-element basis
//! sources (`basis`), the density matrix (`density`) and an optional
//! finite-difference check (`validation`). Missing sections fall back to
//! `with_defaults`.

mod args;

pub use args::Args;

use basis::cgto::ShellDef;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const BOHR_PER_ANGSTROM: f64 = 1.0 / 0.529177210903;

/// Main configuration structure
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    pub geometry: Vec<Atom>,
    pub units: Option<String>,
    #[serde(default)]
    pub basis: HashMap<String, BasisSpec>,
    pub default_basis: Option<String>,
    pub density: Option<DensityParams>,
    pub validation: Option<ValidationParams>,
    pub threads: Option<usize>,
}

/// Atomic position configuration
#[derive(Debug, Deserialize, Serialize)]
pub struct Atom {
    pub element: String,
    pub coords: [f64; 3],
}

/// Where an element's shells come from. Inline shells win over a file,
/// a file over a named set.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct BasisSpec {
    pub name: Option<String>,
    pub file: Option<String>,
    pub shells: Option<Vec<ShellDef>>,
}

/// Density matrix source: "identity", "matrix" (inline rows) or "file"
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DensityParams {
    pub source: Option<String>,
    pub matrix: Option<Vec<Vec<f64>>>,
    pub file: Option<String>,
}

impl Default for DensityParams {
    fn default() -> Self {
        DensityParams {
            source: Some("identity".to_string()),
            matrix: None,
            file: None,
        }
    }
}

impl DensityParams {
    /// Apply default values to any missing parameters
    pub fn with_defaults(mut self) -> Self {
        if self.source.is_none() {
            self.source = if self.matrix.is_some() {
                Some("matrix".to_string())
            } else if self.file.is_some() {
                Some("file".to_string())
            } else {
                Self::default().source
            };
        }
        self
    }
}

/// Finite-difference validation parameters
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ValidationParams {
    pub enabled: Option<bool>,
    pub delta: Option<f64>,
}

impl Default for ValidationParams {
    fn default() -> Self {
        ValidationParams {
            enabled: Some(false),
            delta: Some(1e-4),
        }
    }
}

impl ValidationParams {
    /// Apply default values to any missing parameters
    pub fn with_defaults(mut self) -> Self {
        let defaults = Self::default();
        if self.enabled.is_none() {
            self.enabled = defaults.enabled;
        }
        if self.delta.is_none() {
            self.delta = defaults.delta;
        }
        self
    }
}

impl Config {
    /// Apply defaults to all configuration sections
    pub fn with_defaults(mut self) -> Self {
        if self.units.is_none() {
            self.units = Some("bohr".to_string());
        }
        if self.default_basis.is_none() {
            self.default_basis = Some("6-31g".to_string());
        }
        self.density = Some(self.density.take().unwrap_or_default().with_defaults());
        self.validation = Some(self.validation.take().unwrap_or_default().with_defaults());
        self
    }

    /// Conversion factor from the configured units to bohr
    pub fn length_scale(&self) -> Result<f64, String> {
        match self.units.as_deref().unwrap_or("bohr").to_lowercase().as_str() {
            "bohr" | "au" => Ok(1.0),
            "angstrom" | "ang" => Ok(BOHR_PER_ANGSTROM),
            other => Err(format!("Unknown length unit: {}", other)),
        }
    }

    /// Basis source for an element symbol, falling back to the default set name
    pub fn basis_for(&self, symbol: &str) -> BasisSpec {
        let mut spec = self.basis.get(symbol).cloned().unwrap_or_default();
        if spec.name.is_none() && spec.file.is_none() && spec.shells.is_none() {
            spec.name = self.default_basis.clone();
        }
        spec
    }

    pub fn is_validation_enabled(&self) -> bool {
        self.validation.as_ref().and_then(|v| v.enabled).unwrap_or(false)
    }

    pub fn validation_delta(&self) -> f64 {
        self.validation.as_ref().and_then(|v| v.delta).unwrap_or(1e-4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INPUT: &str = r#"
geometry:
  - element: O
    coords: [0.0, 0.0, 0.0]
  - element: H
    coords: [0.0, 0.757, 0.587]
units: angstrom
basis:
  O:
    file: basis_sets/6-31g.o.nwchem
  H:
    shells:
      - l: 0
        exponents: [3.42525091, 0.62391373, 0.16885540]
        coefficients: [0.15432897, 0.53532814, 0.44463454]
density:
  file: dm.txt
validation:
  enabled: true
"#;

    #[test]
    fn test_parse_and_defaults() {
        let config: Config = serde_yml::from_str::<Config>(INPUT).unwrap().with_defaults();
        assert_eq!(config.geometry.len(), 2);
        assert_eq!(config.geometry[1].coords, [0.0, 0.757, 0.587]);
        assert!((config.length_scale().unwrap() - 1.8897261246).abs() < 1e-9);

        let density = config.density.as_ref().unwrap();
        assert_eq!(density.source.as_deref(), Some("file"));
        assert_eq!(density.file.as_deref(), Some("dm.txt"));

        assert!(config.is_validation_enabled());
        assert_eq!(config.validation_delta(), 1e-4);

        let h = config.basis_for("H");
        assert_eq!(h.shells.as_ref().unwrap()[0].exponents.len(), 3);
        assert!(h.name.is_none());
        assert_eq!(config.basis_for("O").file.as_deref(), Some("basis_sets/6-31g.o.nwchem"));
        assert_eq!(config.basis_for("C").name.as_deref(), Some("6-31g"));
    }

    #[test]
    fn test_minimal_config() {
        let config: Config = serde_yml::from_str::<Config>(
            "geometry:\n  - element: He\n    coords: [0.0, 0.0, 0.0]\n",
        )
        .unwrap()
        .with_defaults();
        assert_eq!(config.length_scale(), Ok(1.0));
        assert_eq!(
            config.density.as_ref().and_then(|d| d.source.clone()).as_deref(),
            Some("identity")
        );
        assert!(!config.is_validation_enabled());
        assert!(config.threads.is_none());
    }

    #[test]
    fn test_unknown_units() {
        let mut config: Config = serde_yml::from_str::<Config>("geometry: []\nunits: furlong\n").unwrap();
        assert!(config.length_scale().is_err());
        config.units = Some("Bohr".to_string());
        assert_eq!(config.length_scale(), Ok(1.0));
    }
}
