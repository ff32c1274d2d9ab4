//! Density matrix input

use color_eyre::eyre::{bail, Result, WrapErr};
use nalgebra::DMatrix;
use std::fs;

/// Square matrix from row vectors
pub fn density_from_rows(rows: &[Vec<f64>]) -> Result<DMatrix<f64>> {
    let n = rows.len();
    if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != n) {
        bail!("Density row {} has {} entries, expected {}", i, row.len(), n);
    }
    Ok(DMatrix::from_fn(n, n, |i, j| rows[i][j]))
}

fn parse_density(text: &str) -> Result<DMatrix<f64>> {
    let rows = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(|l| {
            l.split_whitespace()
                .map(|t| t.parse::<f64>().wrap_err_with(|| format!("Malformed density entry: {}", t)))
                .collect::<Result<Vec<f64>>>()
        })
        .collect::<Result<Vec<_>>>()?;
    density_from_rows(&rows)
}

/// Whitespace-separated square matrix, one row per line; `#` starts a comment line
pub fn read_density(path: &str) -> Result<DMatrix<f64>> {
    let text = fs::read_to_string(path).wrap_err_with(|| format!("Unable to read density file: {}", path))?;
    parse_density(&text).wrap_err_with(|| format!("Invalid density file: {}", path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_density() {
        let dm = parse_density("# 2x2\n 1.0 0.25\n0.25 2e-1\n\n").unwrap();
        assert_eq!(dm.nrows(), 2);
        assert_eq!(dm[(0, 1)], 0.25);
        assert_eq!(dm[(1, 1)], 0.2);
    }

    #[test]
    fn test_rejects_ragged_or_bad_input() {
        assert!(parse_density("1 2\n3\n").is_err());
        assert!(parse_density("1 x\n3 4\n").is_err());
        assert!(density_from_rows(&[vec![1.0, 0.0]]).is_err());
    }
}
