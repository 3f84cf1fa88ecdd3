//! Constrained and structured-precision sampling entry points.
//!
//! `htnorm_rand` draws from a multivariate normal restricted to the
//! hyperplane `g * y = r` by correcting an unconstrained draw with a
//! generalized least-squares step. `htnorm_rand2` composes two
//! precision-parameterized draws into one sample of a two-stage
//! hierarchical Gaussian model.

use faer::Mat;
use rand::Rng;

use crate::error::HtnormError;
use crate::linalg::{check_square, ensure_allocatable, solve_positive_definite, vec_to_column};
use crate::mvn::{MatrixStructure, mv_normal_rand, mv_normal_rand_prec};

/// Draw from `N(mean, cov)` conditioned on `g * out = r`.
///
/// `cov` is `n x n` (symmetric positive definite, diagonal entries only
/// under the diagonal hint), `g` is `m x n` with full row rank, `r` has
/// length `m`, and `out` is a caller-owned buffer of length `n`, fully
/// overwritten on success. A single constraint row takes a closed-form
/// path that avoids the linear solve.
///
/// # Errors
///
/// Shape violations and oversized intermediate buffers are reported before
/// any drawing happens. `HtnormError::NotPositiveDefinite` is returned when
/// `cov` cannot be factorized or when `g * cov * g^T` is not positive
/// definite (rank-deficient constraints); `out` must then be discarded.
pub fn htnorm_rand<R: Rng>(
    rng: &mut R,
    mean: &[f64],
    cov: &Mat<f64>,
    structure: MatrixStructure,
    g: &Mat<f64>,
    r: &[f64],
    out: &mut [f64],
) -> Result<(), HtnormError> {
    let dim = check_square(cov)?;
    let g_rows = g.nrows();
    if g_rows == 0 {
        return Err(HtnormError::EmptyConstraint);
    }
    if g.ncols() != dim {
        return Err(HtnormError::ConstraintColumnMismatch {
            g_cols: g.ncols(),
            dim,
        });
    }
    if r.len() != g_rows {
        return Err(HtnormError::TargetLengthMismatch {
            r_len: r.len(),
            g_rows,
        });
    }
    ensure_allocatable(dim, g_rows)?;
    ensure_allocatable(g_rows, g_rows)?;

    mv_normal_rand(rng, mean, cov, structure, out)?;

    if g_rows == 1 {
        return single_constraint_update(cov, structure, g, r[0], out);
    }

    let y = vec_to_column(out);
    // gy = r - g * y
    let gy = &vec_to_column(r) - &(g * &y);
    // cov_g = cov * g^T, an n x m block
    let cov_g = match structure {
        MatrixStructure::Diagonal => Mat::from_fn(dim, g_rows, |i, j| cov[(i, i)] * g[(j, i)]),
        MatrixStructure::Full => cov * g.transpose(),
    };
    let g_cov_g = g * &cov_g;
    // solve (g * cov * g^T) * alpha = r - g * y
    let alpha = solve_positive_definite(&g_cov_g, &gy)?;
    let correction = &cov_g * &alpha;
    for i in 0..dim {
        out[i] += correction[(i, 0)];
    }
    Ok(())
}

/// Closed-form correction for a single constraint row: no linear solve,
/// O(n) under the diagonal hint.
fn single_constraint_update(
    cov: &Mat<f64>,
    structure: MatrixStructure,
    g: &Mat<f64>,
    target: f64,
    out: &mut [f64],
) -> Result<(), HtnormError> {
    let dim = out.len();

    // alpha = r - g * y, where y is the unconstrained draw
    let mut alpha = target;
    for i in 0..dim {
        alpha -= g[(0, i)] * out[i];
    }

    let cov_g = match structure {
        MatrixStructure::Diagonal => Mat::from_fn(dim, 1, |i, _| cov[(i, i)] * g[(0, i)]),
        MatrixStructure::Full => cov * g.transpose(),
    };

    let mut g_cov_g = 0.0;
    for i in 0..dim {
        g_cov_g += g[(0, i)] * cov_g[(i, 0)];
    }
    if !g_cov_g.is_finite() || g_cov_g <= 0.0 {
        return Err(HtnormError::NotPositiveDefinite);
    }

    // out = y + cov * g^T * (r - g * y) / (g * cov * g^T)
    for i in 0..dim {
        out[i] += alpha * cov_g[(i, 0)] / g_cov_g;
    }
    Ok(())
}

/// Draw one sample from the two-stage structured-precision model
///
/// ```text
/// y1 ~ N(0, A^-1),    y2 ~ N(0, Omega^-1),
/// out = mean + y1 - A^-1 phi^T (Omega^-1 + phi A^-1 phi^T)^-1 (phi y1 + y2)
/// ```
///
/// `a` is `pncol x pncol`, `omega` is `pnrow x pnrow`, `phi` is
/// `pnrow x pncol`, and `mean`/`out` have length `pncol`. The first draw
/// keeps only the inverse factor of `a` (enough to apply `A^-1` to
/// `phi^T`); the second materializes the dense `Omega^-1` because the
/// combination step accumulates onto it.
///
/// # Errors
///
/// Shape violations and oversized intermediates are reported before any
/// drawing happens. Factorization failures from either precision draw or
/// from the combination solve surface as
/// `HtnormError::NotPositiveDefinite`, in which case `out` must be
/// discarded.
pub fn htnorm_rand2<R: Rng>(
    rng: &mut R,
    mean: &[f64],
    a: &Mat<f64>,
    a_structure: MatrixStructure,
    phi: &Mat<f64>,
    omega: &Mat<f64>,
    o_structure: MatrixStructure,
    out: &mut [f64],
) -> Result<(), HtnormError> {
    let pnrow = phi.nrows();
    let pncol = phi.ncols();
    let a_dim = check_square(a)?;
    let omega_dim = check_square(omega)?;
    if a_dim != pncol || omega_dim != pnrow {
        return Err(HtnormError::PhiDimensionMismatch {
            phi_rows: pnrow,
            phi_cols: pncol,
            a_dim,
            omega_dim,
        });
    }
    if mean.len() != pncol {
        return Err(HtnormError::MeanLengthMismatch {
            mean_len: mean.len(),
            dim: pncol,
        });
    }
    if out.len() != pncol {
        return Err(HtnormError::OutputLengthMismatch {
            out_len: out.len(),
            dim: pncol,
        });
    }
    ensure_allocatable(pncol, pnrow)?;

    let y1 = mv_normal_rand_prec(rng, a, a_structure, false)?;
    let y2 = mv_normal_rand_prec(rng, omega, o_structure, true)?;

    // x = A^-1 * phi^T, applied through the realized inverse
    let x = y1.cov.apply(&phi.transpose().to_owned());
    // combined = phi * A^-1 * phi^T + Omega^-1
    let combined = &(phi * &x) + &y2.cov.into_full();
    // rhs = phi * y1 + y2
    let rhs = &(phi * &y1.v) + &y2.v;

    for i in 0..pncol {
        out[i] = mean[i] + y1.v[(i, 0)];
    }

    // solve (Omega^-1 + phi * A^-1 * phi^T) * alpha = phi * y1 + y2
    let alpha = solve_positive_definite(&combined, &rhs)?;
    let shift = &x * &alpha;
    for i in 0..pncol {
        out[i] -= shift[(i, 0)];
    }
    Ok(())
}
