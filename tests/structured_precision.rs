//! End-to-end checks for the two-stage structured-precision sampler.

use approx::assert_relative_eq;
use faer::linalg::solvers::{Llt, Solve};
use faer::{Mat, Side};
use htnorm::{MatrixStructure, htnorm_rand2, mv_normal_rand_prec};
use rand::SeedableRng;
use rand::rngs::StdRng;

fn identity(dim: usize) -> Mat<f64> {
    Mat::from_fn(dim, dim, |i, j| if i == j { 1.0 } else { 0.0 })
}

fn spd(dim: usize, diagonal: f64, off: f64) -> Mat<f64> {
    Mat::from_fn(dim, dim, |i, j| if i == j { diagonal } else { off })
}

#[test]
fn zero_coupling_reduces_to_unconstrained_draw() {
    // With phi = 0 every coupling term vanishes and the sample is exactly
    // mean + y1.
    let a = spd(3, 2.0, 0.5);
    let omega = spd(2, 1.5, 0.25);
    let phi = Mat::from_fn(2, 3, |_, _| 0.0);
    let mean = [1.0, -2.0, 0.5];

    let mut rng = StdRng::seed_from_u64(404);
    let mut out = [0.0; 3];
    htnorm_rand2(
        &mut rng,
        &mean,
        &a,
        MatrixStructure::Full,
        &phi,
        &omega,
        MatrixStructure::Full,
        &mut out,
    )
    .expect("structured draw should succeed");

    // replay the first-stage draw with the same generator state
    let mut rng = StdRng::seed_from_u64(404);
    let y1 = mv_normal_rand_prec(&mut rng, &a, MatrixStructure::Full, false)
        .expect("first-stage draw should succeed");

    for i in 0..3 {
        assert_relative_eq!(out[i], mean[i] + y1.v[(i, 0)], epsilon = 1.0e-12);
    }
}

#[test]
fn output_matches_explicit_combination() {
    // Replay both stage draws and rebuild the combination with plain faer
    // operations; the sampler must agree term for term.
    let a = spd(3, 4.0, 1.0);
    let omega = spd(2, 3.0, 0.5);
    let phi = Mat::from_fn(2, 3, |i, j| {
        [[1.0, 0.5, -0.5], [0.0, 1.0, 2.0]][i][j]
    });
    let mean = [0.5, 1.0, -1.0];

    let mut rng = StdRng::seed_from_u64(99);
    let mut out = [0.0; 3];
    htnorm_rand2(
        &mut rng,
        &mean,
        &a,
        MatrixStructure::Full,
        &phi,
        &omega,
        MatrixStructure::Full,
        &mut out,
    )
    .expect("structured draw should succeed");

    let mut rng = StdRng::seed_from_u64(99);
    let y1 = mv_normal_rand_prec(&mut rng, &a, MatrixStructure::Full, false)
        .expect("first-stage draw should succeed");
    let y2 = mv_normal_rand_prec(&mut rng, &omega, MatrixStructure::Full, true)
        .expect("second-stage draw should succeed");

    let x = y1.cov.apply(&phi.transpose().to_owned());
    let combined = &(&phi * &x) + &y2.cov.into_full();
    let rhs = &(&phi * &y1.v) + &y2.v;
    let llt = Llt::new(combined.as_ref(), Side::Lower).expect("combined matrix is SPD");
    let alpha = llt.solve(rhs.as_ref());
    let shift = &x * &alpha;

    for i in 0..3 {
        let expected = mean[i] + y1.v[(i, 0)] - shift[(i, 0)];
        assert_relative_eq!(out[i], expected, epsilon = 1.0e-10);
    }
}

#[test]
fn diagonal_hints_match_dense_computation() {
    let a = Mat::from_fn(3, 3, |i, j| if i == j { [2.0, 4.0, 8.0][i] } else { 0.0 });
    let omega = Mat::from_fn(2, 2, |i, j| if i == j { [1.0, 0.5][i] } else { 0.0 });
    let phi = Mat::from_fn(2, 3, |i, j| {
        [[0.5, 1.0, 0.0], [1.0, 0.0, -1.0]][i][j]
    });
    let mean = [0.0, 1.0, 2.0];

    let mut rng = StdRng::seed_from_u64(7);
    let mut dense_out = [0.0; 3];
    htnorm_rand2(
        &mut rng,
        &mean,
        &a,
        MatrixStructure::Full,
        &phi,
        &omega,
        MatrixStructure::Full,
        &mut dense_out,
    )
    .expect("dense draw should succeed");

    let mut rng = StdRng::seed_from_u64(7);
    let mut diag_out = [0.0; 3];
    htnorm_rand2(
        &mut rng,
        &mean,
        &a,
        MatrixStructure::Diagonal,
        &phi,
        &omega,
        MatrixStructure::Diagonal,
        &mut diag_out,
    )
    .expect("diagonal draw should succeed");

    for i in 0..3 {
        assert_relative_eq!(dense_out[i], diag_out[i], epsilon = 1.0e-8);
    }
}

#[test]
fn repeated_draws_stay_finite_and_distinct() {
    let a = spd(4, 5.0, 1.0);
    let omega = spd(3, 2.0, 0.5);
    let phi = Mat::from_fn(3, 4, |i, j| if (i + j) % 2 == 0 { 1.0 } else { -0.5 });
    let mean = [0.0; 4];

    let mut rng = StdRng::seed_from_u64(1234);
    let mut previous = [0.0; 4];
    for draw in 0..25 {
        let mut out = [0.0; 4];
        htnorm_rand2(
            &mut rng,
            &mean,
            &a,
            MatrixStructure::Full,
            &phi,
            &omega,
            MatrixStructure::Full,
            &mut out,
        )
        .expect("structured draw should succeed");
        assert!(out.iter().all(|value| value.is_finite()));
        if draw > 0 {
            assert!(out.iter().zip(previous.iter()).any(|(a, b)| a != b));
        }
        previous = out;
    }
}

#[test]
fn identity_model_shrinks_toward_half_the_first_stage_draw() {
    // With a = omega = phi = I the combination solve is (2 I) alpha = y1 + y2,
    // so out = mean + y1 - (y1 + y2) / 2.
    let a = identity(2);
    let omega = identity(2);
    let phi = identity(2);
    let mean = [1.0, -1.0];

    let mut rng = StdRng::seed_from_u64(55);
    let mut out = [0.0; 2];
    htnorm_rand2(
        &mut rng,
        &mean,
        &a,
        MatrixStructure::Full,
        &phi,
        &omega,
        MatrixStructure::Full,
        &mut out,
    )
    .expect("structured draw should succeed");

    let mut rng = StdRng::seed_from_u64(55);
    let y1 = mv_normal_rand_prec(&mut rng, &a, MatrixStructure::Full, false)
        .expect("first-stage draw should succeed");
    let y2 = mv_normal_rand_prec(&mut rng, &omega, MatrixStructure::Full, true)
        .expect("second-stage draw should succeed");

    for i in 0..2 {
        let expected = mean[i] + y1.v[(i, 0)] - 0.5 * (y1.v[(i, 0)] + y2.v[(i, 0)]);
        assert_relative_eq!(out[i], expected, epsilon = 1.0e-10);
    }
}
