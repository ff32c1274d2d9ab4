//! Input/Output operations for gradient runs
//!
//! This module handles logging setup, basis set loading and density input.

mod basis_loader;
mod density;
mod output;

pub use basis_loader::load_basis;
pub use density::{density_from_rows, read_density};
pub use output::{print_gradient, setup_output};
