//! Two-electron Coulomb/exchange nuclear gradients from Rys quadrature.
//!
//! The engine evaluates derivative integrals (∂i j|kl) shell quartet by shell
//! quartet, contracts them with the density matrix as they are produced and
//! adds the result into a shared, atomically updated gradient array:
//!
//! * [`pair_cache`]: read-only primitive-pair data and shell tables
//! * [`partition`]: (bra pair × ket pair) task grids
//! * [`rys`]: quadrature roots and weights
//! * [`recursion`]: vertical/horizontal recursion into the g-tensor
//! * [`contraction`]: density weights and per-task reduction
//! * [`accumulate`]: task scratch and the atomic accumulator
//! * [`kernel`]: per-class plans and the parallel launch
//! * [`driver`]: loops over all integral classes of a basis
//! * [`validation`]: finite-difference check of the analytic gradient

pub mod accumulate;
pub mod contraction;
pub mod driver;
pub mod error;
pub mod kernel;
pub mod pair_cache;
pub mod partition;
pub mod recursion;
pub mod rys;
pub mod validation;

pub use accumulate::{AtomicAccumulator, GradientAccumulator};
pub use driver::EriGradient;
pub use error::GradError;
pub use kernel::{IntegralClass, KernelPlan};
pub use pair_cache::PairCache;
