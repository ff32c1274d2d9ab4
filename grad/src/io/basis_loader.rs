//! Basis set loading utilities

use crate::config::BasisSpec;
use basis::cgto::ElementBasis;
use color_eyre::eyre::{bail, eyre, Result, WrapErr};
use periodic_table_on_an_enum::Element;
use std::fs;
use std::path::Path;
use tracing::info;

/// Shells of one element from inline definitions, a local NWChem file or a named set
pub fn load_basis(symbol: &str, spec: &BasisSpec) -> Result<ElementBasis> {
    if let Some(shells) = &spec.shells {
        let element = Element::from_symbol(symbol).ok_or_else(|| eyre!("Invalid element symbol: {}", symbol))?;
        for (ishell, shell) in shells.iter().enumerate() {
            if let Err(e) = shell.check() {
                bail!("Inline shell {} for {}: {}", ishell, symbol, e);
            }
        }
        return Ok(ElementBasis {
            name: element.get_symbol().to_string(),
            atomic_number: element.get_atomic_number() as u32,
            shells: shells.clone(),
        });
    }
    if let Some(path) = &spec.file {
        info!("Loading basis for {} from {}", symbol, path);
        let basis_str =
            fs::read_to_string(path).wrap_err_with(|| format!("Failed to read basis set file: {}", path))?;
        return parse_nwchem(&basis_str, path);
    }
    let name = spec.name.as_deref().unwrap_or("6-31g");
    fetch_basis(name, symbol)
}

/// Named basis from `basis_sets/<name>.<symbol>.nwchem` or the Basis Set Exchange
fn fetch_basis(name: &str, symbol: &str) -> Result<ElementBasis> {
    let local_path = format!("basis_sets/{}.{}.nwchem", name.to_lowercase(), symbol.to_lowercase());
    if Path::new(&local_path).exists() {
        info!("Loading basis for {} from local file {}", symbol, local_path);
        let basis_str = fs::read_to_string(&local_path)
            .wrap_err_with(|| format!("Failed to read local basis set file: {}", local_path))?;
        return parse_nwchem(&basis_str, &local_path);
    }

    let url = format!(
        "https://www.basissetexchange.org/api/basis/{}/format/nwchem?elements={}",
        name, symbol
    );
    info!("Fetching {} basis for {} from {}", name, symbol, url);
    let response =
        reqwest::blocking::get(&url).wrap_err_with(|| format!("Failed to fetch basis set for {}", symbol))?;
    let basis_str = response
        .text()
        .wrap_err("Failed to get response text from basis set API")?;
    parse_nwchem(&basis_str, &url)
}

fn parse_nwchem(input: &str, source: &str) -> Result<ElementBasis> {
    ElementBasis::parse_nwchem(input).map_err(|e| eyre!("Invalid NWChem basis from {}: {}", source, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use basis::cgto::ShellDef;

    #[test]
    fn test_inline_shells() {
        let spec = BasisSpec {
            shells: Some(vec![ShellDef {
                l: 0,
                exponents: vec![1.0],
                coefficients: vec![1.0],
            }]),
            ..Default::default()
        };
        let basis = load_basis("He", &spec).unwrap();
        assert_eq!(basis.atomic_number, 2);
        assert_eq!(basis.shells.len(), 1);
        assert!(load_basis("Xx", &spec).is_err());
    }

    #[test]
    fn test_inconsistent_inline_shell_is_an_error() {
        let spec = BasisSpec {
            shells: Some(vec![ShellDef {
                l: 1,
                exponents: vec![1.0, 0.2],
                coefficients: vec![1.0],
            }]),
            ..Default::default()
        };
        let err = load_basis("H", &spec).unwrap_err().to_string();
        assert!(err.contains("2 exponents but 1 coefficients"), "{}", err);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let path = std::env::temp_dir().join(format!("eri_grad_bad_basis_{}.nwchem", std::process::id()));
        fs::write(&path, "H    S\n      1.0E+00       abc\nEND\n").unwrap();
        let spec = BasisSpec {
            file: Some(path.to_string_lossy().into_owned()),
            ..Default::default()
        };
        let err = load_basis("H", &spec).unwrap_err().to_string();
        fs::remove_file(&path).unwrap();
        assert!(err.contains("Malformed number"), "{}", err);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let spec = BasisSpec {
            file: Some("does/not/exist.nwchem".to_string()),
            ..Default::default()
        };
        assert!(load_basis("H", &spec).is_err());
    }
}
