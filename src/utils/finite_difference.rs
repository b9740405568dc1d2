//! Finite difference methods for numerical differentiation.
//!
//! The solver always consumes caller-supplied Jacobians. These approximations
//! exist for diagnostics, e.g. to compare against an analytical Jacobian.

use crate::error::{NllsError, Result};
use crate::problem::Problem;
use ndarray::{Array1, Array2};

/// Default step size for finite differences.
const DEFAULT_EPSILON: f64 = 1e-8;

/// Compute the Jacobian matrix using forward finite differences.
///
/// The Jacobian is the matrix of partial derivatives of the residuals with
/// respect to the parameters: J[i,j] = ∂residual[i]/∂param[j].
///
/// # Arguments
///
/// * `problem` - The problem to evaluate
/// * `params` - The parameter values at which to evaluate the Jacobian
/// * `epsilon` - The step size for finite differences (optional)
///
/// # Returns
///
/// * `Result<Array2<f64>>` - The Jacobian matrix
pub fn jacobian<P: Problem + ?Sized>(
    problem: &P,
    params: &Array1<f64>,
    epsilon: Option<f64>,
) -> Result<Array2<f64>> {
    let eps = epsilon.unwrap_or(DEFAULT_EPSILON);
    let n_params = params.len();

    // Evaluate residuals at the initial point
    let residuals = problem.evaluate(params, false)?.residuals;
    let n_residuals = residuals.len();

    let mut jac = Array2::zeros((n_residuals, n_params));

    for j in 0..n_params {
        let mut params_perturbed = params.clone();

        // Adapt epsilon to parameter scale
        let param_j = params[j];
        let eps_j = if param_j.abs() > eps {
            param_j.abs() * eps
        } else {
            eps
        };

        params_perturbed[j] += eps_j;

        let residuals_perturbed = problem.evaluate(&params_perturbed, false)?.residuals;
        if residuals_perturbed.len() != n_residuals {
            return Err(NllsError::DimensionMismatch(format!(
                "Expected {} residuals, got {}",
                n_residuals,
                residuals_perturbed.len()
            )));
        }

        let column = (&residuals_perturbed - &residuals) / eps_j;
        jac.column_mut(j).assign(&column);
    }

    Ok(jac)
}
