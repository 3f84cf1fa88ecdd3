#![forbid(unsafe_code)]

//! # `htnorm`
//!
//! Sampling from hyperplane-truncated multivariate normal distributions:
//! draws from `N(mean, cov)` conditioned on linear constraints `g * y = r`,
//! and from a two-stage structured-precision hierarchical Gaussian model.
//! One constrained draw per call, designed for use inside Gibbs and other
//! Monte Carlo loops.
//!
//! The generator is caller-supplied (`rand::Rng`), so determinism and
//! cross-thread usage are entirely under the caller's control; every call
//! runs to completion on the calling thread with no shared state.
//!
//! ```
//! use faer::Mat;
//! use htnorm::{MatrixStructure, htnorm_rand};
//! use rand::SeedableRng;
//! use rand::rngs::StdRng;
//!
//! // draw from N(0, I3) conditioned on the components summing to 5
//! let cov = Mat::from_fn(3, 3, |i, j| if i == j { 1.0 } else { 0.0 });
//! let g = Mat::from_fn(1, 3, |_, _| 1.0);
//! let mut rng = StdRng::seed_from_u64(42);
//! let mut sample = [0.0; 3];
//! htnorm_rand(
//!     &mut rng,
//!     &[0.0; 3],
//!     &cov,
//!     MatrixStructure::Full,
//!     &g,
//!     &[5.0],
//!     &mut sample,
//! )
//! .unwrap();
//! assert!((sample.iter().sum::<f64>() - 5.0).abs() < 1.0e-10);
//! ```

pub mod error;
mod linalg;
pub mod mvn;
pub mod sampler;

pub use error::HtnormError;
pub use mvn::{MatrixStructure, MvnOutput, PrecisionInverse, mv_normal_rand, mv_normal_rand_prec};
pub use sampler::{htnorm_rand, htnorm_rand2};
