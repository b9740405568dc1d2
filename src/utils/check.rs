//! Numerical checks for vectors, matrices, and caller-supplied Jacobians.
//!
//! Closeness is measured with the Frobenius norm `||a - b||`, either in the
//! absolute sense (`||a - b|| <= tol`) or relative to the larger of the two
//! operands (`||a - b|| / max(||a||, ||b||, eps) <= tol`).

use crate::error::{NllsError, Result};
use crate::problem::Problem;
use crate::utils::random::randn_vector;
use log::debug;
use ndarray::{Array, Array1, Dimension};

fn frobenius<D: Dimension>(a: &Array<f64, D>) -> f64 {
    a.iter().map(|v| v * v).sum::<f64>().sqrt()
}

fn errors<D: Dimension>(a: &Array<f64, D>, b: &Array<f64, D>) -> Result<(f64, f64)> {
    if a.shape() != b.shape() {
        return Err(NllsError::DimensionMismatch(format!(
            "cannot compare arrays of shape {:?} and {:?}",
            a.shape(),
            b.shape()
        )));
    }
    let err_abs = frobenius(&(a - b));
    let scale = frobenius(a).max(frobenius(b)).max(f64::EPSILON);
    Ok((err_abs, err_abs / scale))
}

/// Check whether `a` and `b` are close in the absolute **or** relative sense.
pub fn check_near<D: Dimension>(a: &Array<f64, D>, b: &Array<f64, D>, tol: f64) -> Result<bool> {
    let (err_abs, err_rel) = errors(a, b)?;
    let near = err_abs <= tol || err_rel <= tol;
    if !near {
        debug!(
            "check_near failed: ||a-b|| = {}, ||a-b|| / max(||a||, ||b||, eps) = {}, tol = {}",
            err_abs, err_rel, tol
        );
    }
    Ok(near)
}

/// Same as [`check_near`] but only in the absolute sense.
pub fn check_near_abs<D: Dimension>(
    a: &Array<f64, D>,
    b: &Array<f64, D>,
    tol: f64,
) -> Result<bool> {
    let (err_abs, _) = errors(a, b)?;
    Ok(err_abs <= tol)
}

/// Same as [`check_near`] but only in the relative sense.
pub fn check_near_rel<D: Dimension>(
    a: &Array<f64, D>,
    b: &Array<f64, D>,
    tol: f64,
) -> Result<bool> {
    let (_, err_rel) = errors(a, b)?;
    Ok(err_rel <= tol)
}

/// Options for [`check_jacobian`].
///
/// The Jacobian `J` of `f` at `x0` is accepted when `f(x) - f(x0)` and
/// `J(x0)·(x - x0)`, with `x = x0 + delta·dx`, are either absolutely close
/// within `m·delta` or relatively close within `big_m·delta`.
#[derive(Debug, Clone)]
pub struct JacobianCheck {
    /// Length of the probe step. Default: 1e-4
    pub delta: f64,

    /// Absolute tolerance factor. Default: 0.01
    pub m: f64,

    /// Relative tolerance factor. Default: 10.0
    pub big_m: f64,

    /// Base point; drawn from N(1, 1) when absent
    pub x0: Option<Array1<f64>>,

    /// Probe direction, normalized before use; drawn from N(1, 1) when absent
    pub dx: Option<Array1<f64>>,

    /// Seed for the random base point and direction. Default: 0
    pub seed: u64,
}

impl Default for JacobianCheck {
    fn default() -> Self {
        Self {
            delta: 1e-4,
            m: 0.01,
            big_m: 10.0,
            x0: None,
            dx: None,
            seed: 0,
        }
    }
}

impl JacobianCheck {
    /// Set the probe step length.
    pub fn with_delta(mut self, delta: f64) -> Self {
        self.delta = delta;
        self
    }

    /// Set the absolute and relative tolerance factors.
    pub fn with_tolerances(mut self, m: f64, big_m: f64) -> Self {
        self.m = m;
        self.big_m = big_m;
        self
    }

    /// Probe around a fixed base point.
    pub fn with_x0(mut self, x0: Array1<f64>) -> Self {
        self.x0 = Some(x0);
        self
    }

    /// Probe along a fixed direction.
    pub fn with_direction(mut self, dx: Array1<f64>) -> Self {
        self.dx = Some(dx);
        self
    }

    /// Set the seed used for random base points and directions.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Outcome of a Jacobian check.
#[derive(Debug, Clone)]
pub struct JacobianCheckReport {
    /// `||(f(x) - f(x0)) - J(x0)·(x - x0)||`
    pub abs_error: f64,

    /// `abs_error` divided by the larger norm of the two compared vectors
    pub rel_error: f64,

    /// Absolute threshold, `m·delta`
    pub abs_threshold: f64,

    /// Relative threshold, `big_m·delta`
    pub rel_threshold: f64,

    /// Whether either threshold was met
    pub passed: bool,
}

/// Numerically check the Jacobian returned by `problem` for `n` parameters.
pub fn check_jacobian<P: Problem + ?Sized>(
    problem: &P,
    n: usize,
    opts: &JacobianCheck,
) -> Result<JacobianCheckReport> {
    let x0 = match &opts.x0 {
        Some(x0) => x0.clone(),
        None => randn_vector(n, opts.seed, 1.0, 1.0)?,
    };
    let mut dx = match &opts.dx {
        Some(dx) => dx.clone(),
        None => randn_vector(n, opts.seed.wrapping_add(1), 1.0, 1.0)?,
    };
    if x0.len() != n || dx.len() != n {
        return Err(NllsError::DimensionMismatch(format!(
            "expected base point and direction of length {}, got {} and {}",
            n,
            x0.len(),
            dx.len()
        )));
    }
    let dx_norm = frobenius(&dx);
    if dx_norm < f64::EPSILON {
        return Err(NllsError::InvalidConfig(
            "probe direction must be non-zero".to_string(),
        ));
    }
    dx /= dx_norm;

    let x = &x0 + &(&dx * opts.delta);
    let base = problem.evaluate(&x0, true)?;
    let j0 = base.jacobian.ok_or_else(|| {
        NllsError::FunctionEvaluation("Jacobian requested but not returned".to_string())
    })?;
    let f0 = base.residuals;
    if j0.dim() != (f0.len(), n) {
        return Err(NllsError::DimensionMismatch(format!(
            "expected a {}x{} Jacobian, got {}x{}",
            f0.len(),
            n,
            j0.nrows(),
            j0.ncols()
        )));
    }
    let f = problem.evaluate(&x, false)?.residuals;

    let v1 = &f - &f0;
    let v2 = j0.dot(&(&x - &x0));
    let (abs_error, rel_error) = errors(&v1, &v2)?;

    let abs_threshold = opts.m * opts.delta;
    let rel_threshold = opts.big_m * opts.delta;
    let passed = abs_error <= abs_threshold || rel_error <= rel_threshold;
    if !passed {
        debug!(
            "Jacobian check failed: absolute difference {} > {}, relative difference {} > {}",
            abs_error, abs_threshold, rel_error, rel_threshold
        );
    }

    Ok(JacobianCheckReport {
        abs_error,
        rel_error,
        abs_threshold,
        rel_threshold,
        passed,
    })
}
