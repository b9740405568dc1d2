//! Step calculation for the Levenberg-Marquardt algorithm.
//!
//! This module solves the damped normal equations `(JᵗJ + D)·h = -Jᵗf` and
//! evaluates the denominator of the gain ratio for the resulting step.

use crate::error::{NllsError, Result};
use crate::utils::matrix_convert::{
    nalgebra_vec_to_ndarray, ndarray_to_nalgebra, ndarray_vec_to_nalgebra,
};
use ndarray::{Array1, Array2};

/// Result of a Levenberg-Marquardt step calculation.
#[derive(Debug, Clone)]
pub struct StepResult {
    /// The calculated step vector `h`, before any bound clipping
    pub step: Array1<f64>,

    /// Gain-ratio denominator `hᵗ·(D·h - Jᵗf)`
    pub rho_denom: f64,
}

/// Handles step calculation for the Levenberg-Marquardt algorithm.
pub struct LmStep;

impl LmStep {
    /// Calculates the Levenberg-Marquardt step.
    ///
    /// # Arguments
    ///
    /// * `jtj` - The Gauss-Newton matrix `JᵗJ`
    /// * `jtf` - The gradient-like vector `Jᵗf`
    /// * `damping` - Diagonal of the damping matrix `D`
    ///
    /// # Errors
    ///
    /// * `NllsError::LinearAlgebraError` if `JᵗJ + D` is not positive definite.
    ///   With `D` positive this cannot happen for a finite Jacobian, so the
    ///   failure is reported rather than worked around.
    pub fn calculate_step(
        jtj: &Array2<f64>,
        jtf: &Array1<f64>,
        damping: &Array1<f64>,
    ) -> Result<StepResult> {
        let mut augmented = jtj.clone();
        augmented.diag_mut().zip_mut_with(damping, |a, &d| *a += d);

        let step = Self::solve_cholesky(&augmented, &jtf.mapv(|v| -v))?;
        let rho_denom = Self::gain_ratio_denominator(&step, damping, jtf);

        Ok(StepResult { step, rho_denom })
    }

    /// Solves the symmetric positive definite system `a * x = b` by Cholesky
    /// factorization.
    pub fn solve_cholesky(a: &Array2<f64>, b: &Array1<f64>) -> Result<Array1<f64>> {
        let n = a.nrows();
        let cholesky = ndarray_to_nalgebra(a).cholesky().ok_or_else(|| {
            NllsError::LinearAlgebraError(format!(
                "Cholesky factorization failed: {}x{} damped normal matrix is not positive definite",
                n, n
            ))
        })?;
        let x = cholesky.solve(&ndarray_vec_to_nalgebra(b));
        Ok(nalgebra_vec_to_ndarray(&x))
    }

    /// Denominator of the gain ratio, `hᵗ·(D·h - Jᵗf)`.
    ///
    /// This is twice the decrease predicted by the damped quadratic model.
    pub fn gain_ratio_denominator(step: &Array1<f64>, damping: &Array1<f64>, jtf: &Array1<f64>) -> f64 {
        step.iter()
            .zip(damping.iter())
            .zip(jtf.iter())
            .map(|((h, d), g)| h * (d * h - g))
            .sum()
    }
}
