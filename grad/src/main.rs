//! Two-electron gradient command-line interface
//!
//! Reads a molecule, basis sources and a density matrix from YAML, prints the
//! per-atom two-electron gradient and optionally checks it against finite
//! differences of the energy.

use basis::basis::BasisSet;
use basis::cgto::ElementBasis;
use clap::Parser;
use color_eyre::eyre::{bail, eyre, Result, WrapErr};
use eri_grad::validation::FiniteDifference;
use eri_grad::EriGradient;
use nalgebra::{DMatrix, Vector3};
use periodic_table_on_an_enum::Element;
use std::collections::HashMap;
use std::fs;
use tracing::info;

mod config;
mod io;

use config::{Args, Config};
use io::{density_from_rows, load_basis, print_gradient, read_density, setup_output};

fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    setup_output(args.output.as_ref());

    info!("Reading configuration from: {}", args.config_file);
    let config_content = fs::read_to_string(&args.config_file)
        .wrap_err_with(|| format!("Unable to read configuration file: {}", args.config_file))?;
    let mut config: Config = serde_yml::from_str::<Config>(&config_content)
        .wrap_err("Failed to parse configuration file")?
        .with_defaults();
    if let Some(name) = &args.basis_name {
        info!("Overriding default basis with: {}", name);
        config.default_basis = Some(name.clone());
    }
    info!("Configuration loaded:\n{:?}", config);

    match args.threads.or(config.threads) {
        Some(n) => {
            info!("Using {} worker threads", n);
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(n)
                .build()
                .wrap_err("Failed to build thread pool")?;
            pool.install(|| run(&config, &args))
        }
        None => run(&config, &args),
    }
}

fn run(config: &Config, args: &Args) -> Result<()> {
    let (elements, coords) = prepare_geometry(config)?;
    let basis = prepare_basis(config, &elements, &coords)?;
    info!(
        "Basis: {} atoms, {} shells, {} functions, max l = {}",
        basis.natm(),
        basis.nshell(),
        basis.nao(),
        basis.max_l()
    );
    let dm = prepare_density(config, basis.nao())?;

    let engine = EriGradient::new(&basis);
    let energy = engine.energy(&dm)?;
    info!("Two-electron energy: {:.10} au", energy);
    let gradient = engine.gradient(&dm)?;

    let symbols: Vec<&str> = elements.iter().map(|e| e.get_symbol()).collect();
    let mut table = Vec::new();
    print_gradient(&mut table, &symbols, &gradient)?;
    info!("\n{}", String::from_utf8_lossy(&table));

    if args.validate || config.is_validation_enabled() {
        let delta = args.delta.unwrap_or_else(|| config.validation_delta());
        let report = FiniteDifference::new(delta).check(&basis, &dm)?;
        info!("Finite-difference max deviation: {:.3e}", report.max_abs_error);
    }

    Ok(())
}

fn prepare_geometry(config: &Config) -> Result<(Vec<Element>, Vec<Vector3<f64>>)> {
    info!("\nPreparing geometry...");
    let scale = config.length_scale().map_err(|e| eyre!(e))?;
    let mut elements = Vec::new();
    let mut coords = Vec::new();

    for atom in &config.geometry {
        let element = Element::from_symbol(&atom.element)
            .ok_or_else(|| eyre!("Invalid element symbol: {}", atom.element))?;
        elements.push(element);
        coords.push(Vector3::new(atom.coords[0], atom.coords[1], atom.coords[2]) * scale);
    }
    if elements.is_empty() {
        bail!("Geometry contains no atoms");
    }

    Ok((elements, coords))
}

fn prepare_basis(config: &Config, elements: &[Element], coords: &[Vector3<f64>]) -> Result<BasisSet> {
    info!("\nPreparing basis sets...");
    let mut per_element: HashMap<&str, ElementBasis> = HashMap::new();
    for elem in elements {
        let symbol = elem.get_symbol();
        if per_element.contains_key(symbol) {
            continue;
        }
        let element_basis = load_basis(symbol, &config.basis_for(symbol))?;
        if element_basis.shells.is_empty() {
            bail!("No shells found for {}", symbol);
        }
        per_element.insert(symbol, element_basis);
    }

    let mut atoms = Vec::with_capacity(elements.len());
    for (elem, center) in elements.iter().zip(coords) {
        let element_basis = per_element
            .get(elem.get_symbol())
            .ok_or_else(|| eyre!("Missing basis for {}", elem.get_symbol()))?;
        atoms.push((*center, element_basis));
    }
    Ok(BasisSet::from_atoms(&atoms))
}

fn prepare_density(config: &Config, nao: usize) -> Result<DMatrix<f64>> {
    let params = config.density.clone().unwrap_or_default().with_defaults();
    let dm = match params.source.as_deref().unwrap_or("identity") {
        "identity" => DMatrix::identity(nao, nao),
        "matrix" => {
            let rows = params
                .matrix
                .as_ref()
                .ok_or_else(|| eyre!("density source 'matrix' needs a 'matrix' entry"))?;
            density_from_rows(rows)?
        }
        "file" => {
            let path = params
                .file
                .as_ref()
                .ok_or_else(|| eyre!("density source 'file' needs a 'file' entry"))?;
            read_density(path)?
        }
        other => bail!("Unknown density source: {}", other),
    };
    if dm.nrows() != nao {
        bail!("Density matrix is {}x{}, basis has {} functions", dm.nrows(), dm.ncols(), nao);
    }
    Ok(dm)
}
