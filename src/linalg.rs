//! Dense linear-algebra helpers shared by the samplers.
//!
//! Positive-definite systems are solved through faer's Cholesky
//! factorization; the small triangular kernels used to color white noise
//! and to apply a factored inverse are written out directly.

use faer::linalg::solvers::{Llt, Solve};
use faer::{Mat, Side};

use crate::error::HtnormError;

/// Lower Cholesky factor of a symmetric positive-definite matrix.
///
/// Returns `None` when a non-positive pivot is encountered, which is how
/// non-positive-definite input manifests.
#[must_use]
pub(crate) fn cholesky_lower(matrix: &Mat<f64>) -> Option<Mat<f64>> {
    let dim = matrix.ncols();
    if matrix.nrows() != dim {
        return None;
    }
    let mut lower = Mat::<f64>::zeros(dim, dim);
    for row in 0..dim {
        for col in 0..=row {
            let mut sum = matrix[(row, col)];
            for k in 0..col {
                sum -= lower[(row, k)] * lower[(col, k)];
            }
            if row == col {
                if sum <= 0.0 {
                    return None;
                }
                lower[(row, col)] = sum.sqrt();
            } else {
                let denom = lower[(col, col)];
                if denom <= 0.0 {
                    return None;
                }
                lower[(row, col)] = sum / denom;
            }
        }
    }
    Some(lower)
}

/// Solve `L x = b` for lower-triangular `L`, column by column.
#[must_use]
pub(crate) fn solve_lower_triangular(lower: &Mat<f64>, rhs: &Mat<f64>) -> Mat<f64> {
    let dim = lower.nrows();
    let mut solution = rhs.clone();
    for col in 0..solution.ncols() {
        for row in 0..dim {
            let mut sum = solution[(row, col)];
            for k in 0..row {
                sum -= lower[(row, k)] * solution[(k, col)];
            }
            solution[(row, col)] = sum / lower[(row, row)];
        }
    }
    solution
}

/// Solve `L^T x = b` for lower-triangular `L`, column by column.
#[must_use]
pub(crate) fn solve_lower_triangular_transpose(lower: &Mat<f64>, rhs: &Mat<f64>) -> Mat<f64> {
    let dim = lower.nrows();
    let mut solution = rhs.clone();
    for col in 0..solution.ncols() {
        for row in (0..dim).rev() {
            let mut sum = solution[(row, col)];
            for k in (row + 1)..dim {
                sum -= lower[(k, row)] * solution[(k, col)];
            }
            solution[(row, col)] = sum / lower[(row, row)];
        }
    }
    solution
}

/// Solve `a x = b` for symmetric positive-definite `a`.
///
/// # Errors
///
/// Returns `HtnormError::NotPositiveDefinite` if the Cholesky factorization
/// fails or the solution contains non-finite values.
pub(crate) fn solve_positive_definite(
    a: &Mat<f64>,
    b: &Mat<f64>,
) -> Result<Mat<f64>, HtnormError> {
    let llt = Llt::new(a.as_ref(), Side::Lower).map_err(|_| HtnormError::NotPositiveDefinite)?;
    let solution = llt.solve(b.as_ref());
    if !matrix_is_finite(&solution) {
        return Err(HtnormError::NotPositiveDefinite);
    }
    Ok(solution)
}

#[must_use]
pub(crate) fn matrix_is_finite(matrix: &Mat<f64>) -> bool {
    for i in 0..matrix.nrows() {
        for j in 0..matrix.ncols() {
            if !matrix[(i, j)].is_finite() {
                return false;
            }
        }
    }
    true
}

/// Dimension of a square matrix, or a shape error.
pub(crate) fn check_square(matrix: &Mat<f64>) -> Result<usize, HtnormError> {
    if matrix.nrows() != matrix.ncols() {
        return Err(HtnormError::MatrixNotSquare {
            nrows: matrix.nrows(),
            ncols: matrix.ncols(),
        });
    }
    Ok(matrix.nrows())
}

#[must_use]
pub(crate) fn vec_to_column(values: &[f64]) -> Mat<f64> {
    Mat::from_fn(values.len(), 1, |i, _| values[i])
}

/// Guard an intermediate buffer request against size overflow.
///
/// This is the Rust rendering of the allocation-error class: a `rows x cols`
/// double buffer whose element or byte count does not fit in `usize` is
/// rejected up front with a distinguished error.
pub(crate) fn ensure_allocatable(rows: usize, cols: usize) -> Result<(), HtnormError> {
    rows.checked_mul(cols)
        .and_then(|len| len.checked_mul(std::mem::size_of::<f64>()))
        .and_then(|bytes| isize::try_from(bytes).ok())
        .map(|_| ())
        .ok_or(HtnormError::AllocationFailure { rows, cols })
}
