use basis::basis::BasisSet;
use basis::cgto::ShellDef;
use eri_grad::validation::FiniteDifference;
use nalgebra::{DMatrix, Vector3};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    println!("##############################################################");
    println!("     Two-electron gradient: analytic vs finite differences");
    println!("##############################################################\n");

    let s = ShellDef {
        l: 0,
        exponents: vec![5.0, 1.2, 0.3],
        coefficients: vec![0.15, 0.55, 0.45],
    };
    let p = ShellDef {
        l: 1,
        exponents: vec![1.4, 0.35],
        coefficients: vec![0.4, 0.7],
    };
    let d = ShellDef {
        l: 2,
        exponents: vec![0.8],
        coefficients: vec![1.0],
    };

    let mut basis = BasisSet::new();
    basis.add_atom(Vector3::new(0.0, 0.0, 0.0), 8, &[s.clone(), p.clone(), d]);
    basis.add_atom(Vector3::new(0.0, 1.43, -1.1), 1, &[s.clone(), p]);
    basis.add_atom(Vector3::new(0.0, -1.43, -1.1), 1, &[s]);

    let n = basis.nao();
    let a = DMatrix::from_fn(n, n, |i, j| (0.3 * (i + 2 * j) as f64).cos() / n as f64);
    let dm = &a * a.transpose() + DMatrix::identity(n, n) * 0.5;

    for delta in [1e-3, 1e-4] {
        let report = FiniteDifference::new(delta).check(&basis, &dm)?;
        println!("step {:.0e}: max error {:.3e}", delta, report.max_abs_error);
    }
    Ok(())
}
