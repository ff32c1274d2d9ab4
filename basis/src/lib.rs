//! Gaussian basis-set tables consumed by the integral engines.
//!
//! Primitive normalisation lives in [`gto`], contracted shells and NWChem
//! parsing in [`cgto`], molecule-level tables (`ao_loc`, shell to atom maps)
//! in [`basis`], and the Boys function plus quadrature helpers in [`helper`].

pub mod basis;
pub mod cgto;
pub mod gto;
pub mod helper;
