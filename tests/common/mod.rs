//! Shared test problems.

#![allow(dead_code)]

use std::sync::Mutex;

use ndarray::{array, Array1, Array2};
use nlls_rs::utils::randn_vector;
use nlls_rs::{Evaluation, Problem, Result};

/// Ground truth of the double exponential model.
pub fn x_gt() -> Array1<f64> {
    array![1.0, -0.5, 2.0, 3.0]
}

/// The same model with the two exponential terms swapped.
pub fn x_gt_twin() -> Array1<f64> {
    array![-0.5, 1.0, 3.0, 2.0]
}

/// Fits `m(t) = x2·exp(x0·t) + x3·exp(x1·t)` to samples `m`.
pub struct DoubleExponential {
    pub t: Array1<f64>,
    pub m: Array1<f64>,
}

impl DoubleExponential {
    /// Noise-free samples of the model at `x_gt`, with `t` drawn from N(1, 1).
    pub fn new(samples: usize, seed: u64) -> Self {
        let t = randn_vector(samples, seed, 1.0, 1.0).unwrap();
        let m = Self::model(&x_gt(), &t);
        Self { t, m }
    }

    pub fn model(x: &Array1<f64>, t: &Array1<f64>) -> Array1<f64> {
        t.mapv(|ti| x[2] * (x[0] * ti).exp() + x[3] * (x[1] * ti).exp())
    }
}

impl Problem for DoubleExponential {
    fn evaluate(&self, x: &Array1<f64>, want_jacobian: bool) -> Result<Evaluation> {
        let exp0 = self.t.mapv(|ti| (x[0] * ti).exp());
        let exp1 = self.t.mapv(|ti| (x[1] * ti).exp());
        let residuals = &exp0 * x[2] + &exp1 * x[3] - &self.m;
        if !want_jacobian {
            return Ok(Evaluation::residuals_only(residuals));
        }

        let mut jac = Array2::zeros((self.t.len(), 4));
        jac.column_mut(0).assign(&(&self.t * &exp0 * x[2]));
        jac.column_mut(1).assign(&(&self.t * &exp1 * x[3]));
        jac.column_mut(2).assign(&exp0);
        jac.column_mut(3).assign(&exp1);
        Ok(Evaluation::new(residuals, jac))
    }
}

/// Residuals `(1 - x, 10 (y - x²))` of the Rosenbrock function.
pub struct Rosenbrock;

impl Problem for Rosenbrock {
    fn evaluate(&self, p: &Array1<f64>, _want_jacobian: bool) -> Result<Evaluation> {
        let (x, y) = (p[0], p[1]);
        let residuals = array![1.0 - x, 10.0 * (y - x * x)];
        let jac = array![[-1.0, 0.0], [-20.0 * x, 10.0]];
        Ok(Evaluation::new(residuals, jac))
    }
}

/// Wraps a problem and records every point it is evaluated at.
pub struct Recording<P> {
    pub inner: P,
    pub points: Mutex<Vec<Array1<f64>>>,
}

impl<P> Recording<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            points: Mutex::new(Vec::new()),
        }
    }

    pub fn points(&self) -> Vec<Array1<f64>> {
        self.points.lock().unwrap().clone()
    }
}

impl<P: Problem> Problem for Recording<P> {
    fn evaluate(&self, x: &Array1<f64>, want_jacobian: bool) -> Result<Evaluation> {
        self.points.lock().unwrap().push(x.clone());
        self.inner.evaluate(x, want_jacobian)
    }
}
