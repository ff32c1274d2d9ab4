//! Typed errors for kernel setup and launch.
//!
//! Everything here is detected before any task runs: the engine itself is pure
//! numerics over validated inputs, so a launch either completes or is refused.

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum GradError {
    /// A shell's angular momentum exceeds what the fixed-size scratch supports.
    CapacityExceeded { l: usize, max: usize },

    /// The integral class needs more quadrature roots than the solver provides.
    TooManyRoots { nroots: usize, max: usize },

    /// Task offsets reference missing shell pairs or pairs of another class.
    MalformedTasks(String),

    /// Density matrix or accumulator does not match the basis.
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },
}

impl fmt::Display for GradError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CapacityExceeded { l, max } => write!(
                f,
                "angular momentum {l} exceeds kernel capacity (max {max})"
            ),
            Self::TooManyRoots { nroots, max } => {
                write!(f, "{nroots} Rys roots requested, at most {max} supported")
            }
            Self::MalformedTasks(msg) => write!(f, "malformed task offsets: {msg}"),
            Self::DimensionMismatch {
                what,
                expected,
                found,
            } => write!(f, "{what}: expected dimension {expected}, found {found}"),
        }
    }
}

impl std::error::Error for GradError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_capacity() {
        let err = GradError::CapacityExceeded { l: 5, max: 4 };
        assert_eq!(
            err.to_string(),
            "angular momentum 5 exceeds kernel capacity (max 4)"
        );
    }

    #[test]
    fn display_dimension_mismatch() {
        let err = GradError::DimensionMismatch {
            what: "density matrix",
            expected: 7,
            found: 5,
        };
        assert_eq!(err.to_string(), "density matrix: expected dimension 7, found 5");
    }

    #[test]
    fn error_trait_works() {
        let err = GradError::MalformedTasks("pair 12 out of range".into());
        let dyn_err: &dyn std::error::Error = &err;
        assert!(dyn_err.to_string().contains("pair 12"));
    }
}
