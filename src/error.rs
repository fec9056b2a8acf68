// src/error.rs

use crate::grid::Grid3D;

/// Errors surfaced by the solvers.
///
/// Everything here is a precondition or sanity failure detected before (or
/// while) doing well-defined arithmetic. Running out of iterations is NOT an
/// error: it is a normal terminal state reported through
/// [`crate::polarization::StopReason`].
#[derive(thiserror::Error, Debug)]
pub enum GpeError {
    #[error("permittivity must be strictly positive everywhere; found {value} at flat index {index}")]
    NonPositivePermittivity { index: usize, value: f64 },

    #[error("{context}: fields live on different grids ({a:?} vs {b:?})")]
    GridMismatch {
        context: &'static str,
        a: Grid3D,
        b: Grid3D,
    },

    #[error("invalid solver parameter `{parameter}`: {message}")]
    InvalidParameter {
        parameter: &'static str,
        message: String,
    },

    #[error(
        "inverse transform produced a non-negligible imaginary part: \
         relative residue {residue:.3e} exceeds the allowed {allowed:.3e}"
    )]
    SpectralResidue { residue: f64, allowed: f64 },
}
