//! Error types shared by all sampling entry points.

use thiserror::Error;

/// Errors returned by the constrained and structured-precision samplers.
///
/// Shape and size violations are reported before any drawing happens, so a
/// validation error leaves the output buffer untouched. A
/// [`NotPositiveDefinite`](HtnormError::NotPositiveDefinite) error can occur
/// mid-computation, in which case the output buffer contents are unspecified
/// and must be discarded.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum HtnormError {
    #[error("matrix must be square; found {nrows}x{ncols}")]
    MatrixNotSquare { nrows: usize, ncols: usize },
    #[error("mean length ({mean_len}) must match the distribution dimension ({dim})")]
    MeanLengthMismatch { mean_len: usize, dim: usize },
    #[error("output length ({out_len}) must match the distribution dimension ({dim})")]
    OutputLengthMismatch { out_len: usize, dim: usize },
    #[error("constraint matrix has {g_cols} columns but the distribution dimension is {dim}")]
    ConstraintColumnMismatch { g_cols: usize, dim: usize },
    #[error("target length ({r_len}) must match the constraint row count ({g_rows})")]
    TargetLengthMismatch { r_len: usize, g_rows: usize },
    #[error("constraint matrix must have at least one row")]
    EmptyConstraint,
    #[error(
        "coupling matrix is {phi_rows}x{phi_cols} but the precision matrices \
         have dimensions {omega_dim} and {a_dim}"
    )]
    PhiDimensionMismatch {
        phi_rows: usize,
        phi_cols: usize,
        a_dim: usize,
        omega_dim: usize,
    },
    #[error("intermediate buffer of {rows}x{cols} doubles exceeds addressable memory")]
    AllocationFailure { rows: usize, cols: usize },
    #[error("matrix is not positive definite")]
    NotPositiveDefinite,
}
