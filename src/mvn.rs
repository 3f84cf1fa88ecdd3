//! Unconstrained multivariate normal draws.
//!
//! Two parameterizations are supported: mean/covariance, which writes the
//! draw into a caller-owned buffer, and zero-mean/precision, which returns
//! the draw together with the realized inverse of the precision matrix.
//! The structured-precision sampler consumes the latter.

use faer::Mat;
use rand::Rng;

use crate::error::HtnormError;
use crate::linalg::{
    check_square, cholesky_lower, solve_lower_triangular, solve_lower_triangular_transpose,
    vec_to_column,
};

/// Storage hint for a covariance or precision matrix.
///
/// Under [`MatrixStructure::Diagonal`] only the diagonal entries of the
/// flagged matrix are read, and the samplers take O(n) fast paths instead of
/// dense O(n^2) or O(n^3) operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatrixStructure {
    Full,
    Diagonal,
}

/// Realized inverse of a precision matrix, in the cheapest form that still
/// serves the caller.
///
/// The variant is selected by the `full_inv` argument of
/// [`mv_normal_rand_prec`]:
///
/// - [`Full`](PrecisionInverse::Full) holds the dense inverse `P^-1`,
///   required when the caller accumulates other terms onto it;
/// - [`Factor`](PrecisionInverse::Factor) holds the lower Cholesky factor
///   `L` of `P`, which suffices to apply `P^-1` to any right-hand side via
///   two triangular solves without ever forming the inverse;
/// - [`Diagonal`](PrecisionInverse::Diagonal) holds the inverse diagonal of
///   a diagonal precision, serving both uses at O(n).
#[derive(Debug, Clone)]
pub enum PrecisionInverse {
    Full(Mat<f64>),
    Factor(Mat<f64>),
    Diagonal(Vec<f64>),
}

impl PrecisionInverse {
    /// Compute `P^-1 * rhs` without materializing the inverse when a factor
    /// or diagonal is held.
    #[must_use]
    pub fn apply(&self, rhs: &Mat<f64>) -> Mat<f64> {
        match self {
            Self::Full(inverse) => inverse * rhs,
            Self::Factor(lower) => {
                solve_lower_triangular_transpose(lower, &solve_lower_triangular(lower, rhs))
            }
            Self::Diagonal(inv_diag) => {
                Mat::from_fn(rhs.nrows(), rhs.ncols(), |i, j| inv_diag[i] * rhs[(i, j)])
            }
        }
    }

    /// Materialize the dense inverse `P^-1`.
    #[must_use]
    pub fn into_full(self) -> Mat<f64> {
        match self {
            Self::Full(inverse) => inverse,
            Self::Factor(lower) => {
                let dim = lower.nrows();
                let identity = Mat::from_fn(dim, dim, |i, j| if i == j { 1.0 } else { 0.0 });
                solve_lower_triangular_transpose(
                    &lower,
                    &solve_lower_triangular(&lower, &identity),
                )
            }
            Self::Diagonal(inv_diag) => Mat::from_fn(inv_diag.len(), inv_diag.len(), |i, j| {
                if i == j { inv_diag[i] } else { 0.0 }
            }),
        }
    }
}

/// A zero-mean precision-parameterized draw together with the realized
/// inverse of its precision matrix.
#[derive(Debug, Clone)]
pub struct MvnOutput {
    /// The sample, an `n x 1` column.
    pub v: Mat<f64>,
    /// The realized inverse of the precision used for the draw.
    pub cov: PrecisionInverse,
}

/// Draw `out ~ N(mean, cov)`.
///
/// # Errors
///
/// Returns a shape error if `cov` is not square or `mean`/`out` do not match
/// its dimension, and `HtnormError::NotPositiveDefinite` if `cov` cannot be
/// factorized (or has a non-positive diagonal entry under the diagonal
/// hint).
pub fn mv_normal_rand<R: Rng>(
    rng: &mut R,
    mean: &[f64],
    cov: &Mat<f64>,
    structure: MatrixStructure,
    out: &mut [f64],
) -> Result<(), HtnormError> {
    let dim = check_square(cov)?;
    if mean.len() != dim {
        return Err(HtnormError::MeanLengthMismatch {
            mean_len: mean.len(),
            dim,
        });
    }
    if out.len() != dim {
        return Err(HtnormError::OutputLengthMismatch {
            out_len: out.len(),
            dim,
        });
    }

    match structure {
        MatrixStructure::Diagonal => {
            for i in 0..dim {
                let variance = cov[(i, i)];
                if variance <= 0.0 {
                    return Err(HtnormError::NotPositiveDefinite);
                }
                out[i] = variance.sqrt().mul_add(sample_standard_normal(rng), mean[i]);
            }
        }
        MatrixStructure::Full => {
            let lower = cholesky_lower(cov).ok_or(HtnormError::NotPositiveDefinite)?;
            let noise = standard_normal_column(rng, dim);
            let colored = &lower * &noise;
            for i in 0..dim {
                out[i] = mean[i] + colored[(i, 0)];
            }
        }
    }
    Ok(())
}

/// Draw `v ~ N(0, prec^-1)` and return the realized inverse of `prec`.
///
/// `full_inv` selects the form of the realized inverse for a dense
/// precision: `true` materializes the dense inverse, `false` keeps only the
/// Cholesky factor (see [`PrecisionInverse`]). A diagonal precision always
/// yields [`PrecisionInverse::Diagonal`], which serves both modes.
///
/// # Errors
///
/// Returns `HtnormError::MatrixNotSquare` for a non-square precision and
/// `HtnormError::NotPositiveDefinite` if the factorization fails.
pub fn mv_normal_rand_prec<R: Rng>(
    rng: &mut R,
    prec: &Mat<f64>,
    structure: MatrixStructure,
    full_inv: bool,
) -> Result<MvnOutput, HtnormError> {
    let dim = check_square(prec)?;

    match structure {
        MatrixStructure::Diagonal => {
            let mut v = Mat::<f64>::zeros(dim, 1);
            let mut inv_diag = vec![0.0; dim];
            for i in 0..dim {
                let precision = prec[(i, i)];
                if precision <= 0.0 {
                    return Err(HtnormError::NotPositiveDefinite);
                }
                v[(i, 0)] = sample_standard_normal(rng) / precision.sqrt();
                inv_diag[i] = precision.recip();
            }
            Ok(MvnOutput {
                v,
                cov: PrecisionInverse::Diagonal(inv_diag),
            })
        }
        MatrixStructure::Full => {
            let lower = cholesky_lower(prec).ok_or(HtnormError::NotPositiveDefinite)?;
            let noise = standard_normal_column(rng, dim);
            // prec = L L^T, so L^-T z has covariance prec^-1.
            let v = solve_lower_triangular_transpose(&lower, &noise);
            let factor = PrecisionInverse::Factor(lower);
            let cov = if full_inv {
                PrecisionInverse::Full(factor.into_full())
            } else {
                factor
            };
            Ok(MvnOutput { v, cov })
        }
    }
}

/// One standard normal variate via the Box-Muller transform.
pub(crate) fn sample_standard_normal<R: Rng>(rng: &mut R) -> f64 {
    let u1 = (1.0_f64 - rng.random::<f64>()).max(f64::MIN_POSITIVE);
    let u2 = rng.random::<f64>();
    (-2.0_f64 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
}

fn standard_normal_column<R: Rng>(rng: &mut R, dim: usize) -> Mat<f64> {
    let noise: Vec<f64> = (0..dim).map(|_| sample_standard_normal(rng)).collect();
    vec_to_column(&noise)
}
