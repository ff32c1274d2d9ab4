//! Finite-difference check of the analytic two-electron gradient.

use crate::driver::EriGradient;
use crate::error::GradError;
use basis::basis::BasisSet;
use nalgebra::{DMatrix, Vector3};
use tracing::info;

/// Central differences of the two-electron energy with step `delta` (bohr).
#[derive(Debug, Clone, Copy)]
pub struct FiniteDifference {
    pub delta: f64,
}

impl Default for FiniteDifference {
    fn default() -> Self {
        FiniteDifference { delta: 1e-4 }
    }
}

#[derive(Debug, Clone)]
pub struct ValidationReport {
    pub analytic: Vec<Vector3<f64>>,
    pub numerical: Vec<Vector3<f64>>,
    pub max_abs_error: f64,
    pub rms_error: f64,
}

impl FiniteDifference {
    pub fn new(delta: f64) -> Self {
        FiniteDifference { delta }
    }

    /// dE/dR for every atom, the density held fixed.
    pub fn numerical_gradient(&self, basis: &BasisSet, dm: &DMatrix<f64>) -> Result<Vec<Vector3<f64>>, GradError> {
        let mut numerical = vec![Vector3::zeros(); basis.natm()];
        for (atom, grad) in numerical.iter_mut().enumerate() {
            for axis in 0..3 {
                let plus = EriGradient::new(&basis.displaced(atom, axis, self.delta)).energy(dm)?;
                let minus = EriGradient::new(&basis.displaced(atom, axis, -self.delta)).energy(dm)?;
                grad[axis] = (plus - minus) / (2.0 * self.delta);
            }
        }
        Ok(numerical)
    }

    pub fn check(&self, basis: &BasisSet, dm: &DMatrix<f64>) -> Result<ValidationReport, GradError> {
        info!("=======================================================");
        info!("     Two-electron gradient: finite-difference check");
        info!("=======================================================");

        let analytic = EriGradient::new(basis).gradient(dm)?;
        let numerical = self.numerical_gradient(basis, dm)?;

        let mut max_abs_error: f64 = 0.0;
        let mut total_squared_error = 0.0;
        info!("  Atom |       Analytic gradient       |       Numerical gradient      |  Max error");
        for (i, (ana, num)) in analytic.iter().zip(&numerical).enumerate() {
            let error = (ana - num).amax();
            max_abs_error = max_abs_error.max(error);
            total_squared_error += (ana - num).norm_squared();
            info!(
                "   {:2}  | [{:9.6}, {:9.6}, {:9.6}] | [{:9.6}, {:9.6}, {:9.6}] | {:10.3e}",
                i + 1,
                ana.x,
                ana.y,
                ana.z,
                num.x,
                num.y,
                num.z,
                error
            );
        }
        let rms_error = (total_squared_error / (3 * analytic.len().max(1)) as f64).sqrt();
        info!("  step {:.1e}: RMS error {:.3e}, max error {:.3e}", self.delta, rms_error, max_abs_error);

        Ok(ValidationReport {
            analytic,
            numerical,
            max_abs_error,
            rms_error,
        })
    }
}
