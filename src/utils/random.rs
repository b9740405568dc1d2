//! Seeded normal random vectors and matrices.
//!
//! Used by the Jacobian check and by test harnesses that need reproducible
//! synthetic data. The same seed always produces the same values.

use crate::error::{NllsError, Result};
use ndarray::{Array1, Array2};
use rand::prelude::*;
use rand_distr::{Distribution, Normal};

fn normal(mu: f64, sigma: f64) -> Result<Normal<f64>> {
    Normal::new(mu, sigma).map_err(|e| {
        NllsError::InvalidConfig(format!(
            "invalid normal distribution (mu = {}, sigma = {}): {}",
            mu, sigma, e
        ))
    })
}

/// Generate a vector of `n` i.i.d. samples from N(`mu`, `sigma`²).
pub fn randn_vector(n: usize, seed: u64, mu: f64, sigma: f64) -> Result<Array1<f64>> {
    let dist = normal(mu, sigma)?;
    let mut rng = StdRng::seed_from_u64(seed);
    Ok((0..n).map(|_| dist.sample(&mut rng)).collect())
}

/// Generate an `m`×`n` matrix of i.i.d. samples from N(`mu`, `sigma`²).
pub fn randn_matrix(m: usize, n: usize, seed: u64, mu: f64, sigma: f64) -> Result<Array2<f64>> {
    let dist = normal(mu, sigma)?;
    let mut rng = StdRng::seed_from_u64(seed);
    Ok(Array2::from_shape_simple_fn((m, n), || dist.sample(&mut rng)))
}
