//! Problem definition trait.
//!
//! This module defines the `Problem` trait, which represents a nonlinear
//! least squares problem to be solved with the Levenberg-Marquardt algorithm.
//! Any closure `Fn(&Array1<f64>, bool) -> Result<Evaluation>` is a problem, so
//! the data a residual function needs can simply be captured.

use crate::error::Result;
use ndarray::{Array1, Array2};

/// Residuals, and optionally the Jacobian, evaluated at one parameter vector.
#[derive(Debug, Clone)]
pub struct Evaluation {
    /// Residual vector `f(x)` of length M
    pub residuals: Array1<f64>,

    /// Jacobian matrix of shape M×N, `J[[i, j]] = ∂f_i/∂x_j`
    pub jacobian: Option<Array2<f64>>,
}

impl Evaluation {
    /// Create an evaluation carrying both residuals and Jacobian.
    pub fn new(residuals: Array1<f64>, jacobian: Array2<f64>) -> Self {
        Self {
            residuals,
            jacobian: Some(jacobian),
        }
    }

    /// Create an evaluation without a Jacobian.
    pub fn residuals_only(residuals: Array1<f64>) -> Self {
        Self {
            residuals,
            jacobian: None,
        }
    }

    /// Sum of squared residuals, `||f||²`.
    pub fn cost(&self) -> f64 {
        self.residuals.dot(&self.residuals)
    }
}

/// A trait representing a nonlinear least squares problem.
///
/// The solver never differentiates: it consumes whatever the problem returns.
pub trait Problem {
    /// Evaluate the residuals at `params`, and the Jacobian when `want_jacobian`
    /// is true.
    ///
    /// Implementations may always return the Jacobian if it is cheap to do so.
    /// When `want_jacobian` is true, returning `None` for the Jacobian is a
    /// contract violation and aborts the solve. The number of residuals must be
    /// the same for every call within one solve.
    ///
    /// # Arguments
    ///
    /// * `params` - The parameter values at which to evaluate
    /// * `want_jacobian` - Whether the caller needs the Jacobian
    fn evaluate(&self, params: &Array1<f64>, want_jacobian: bool) -> Result<Evaluation>;

    /// Evaluate the sum of squared residuals at the given parameters.
    fn eval_cost(&self, params: &Array1<f64>) -> Result<f64> {
        Ok(self.evaluate(params, false)?.cost())
    }
}

impl<F> Problem for F
where
    F: Fn(&Array1<f64>, bool) -> Result<Evaluation>,
{
    fn evaluate(&self, params: &Array1<f64>, want_jacobian: bool) -> Result<Evaluation> {
        self(params, want_jacobian)
    }
}
