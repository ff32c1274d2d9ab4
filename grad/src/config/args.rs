//! Command-line argument parsing for gradient runs

use clap::Parser;

/// Two-electron nuclear gradient from a YAML-described molecule and density
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the YAML configuration file
    #[arg(short, long, default_value = "config.yaml")]
    pub config_file: String,

    /// Override output file: (default stdout)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Number of worker threads (default: all cores)
    #[arg(long)]
    pub threads: Option<usize>,

    /// Compare against central finite differences of the energy
    #[arg(long)]
    pub validate: bool,

    /// Finite-difference step in bohr
    #[arg(long)]
    pub delta: Option<f64>,

    /// Basis set name used for elements without an explicit entry
    #[arg(long)]
    pub basis_name: Option<String>,
}
