//! Trust region damping for the Levenberg-Marquardt algorithm.
//!
//! The damping parameter `mu` and growth factor `nu` follow Nielsen's update:
//! accepted steps shrink `mu` by a factor depending on the gain ratio and reset
//! `nu` to 2; rejected steps multiply `mu` by `nu` and double `nu`.

use ndarray::{Array1, Array2};

use super::config::DampingMatrix;

/// Lower limit for `mu` after an accepted step.
pub const MU_MIN: f64 = 1e-12;

/// Initial value of the growth factor.
const NU_INIT: f64 = 2.0;

/// Damping state of one solve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrustRegion {
    /// Current value of the damping parameter
    pub mu: f64,

    /// Factor applied to `mu` on the next rejected step
    pub nu: f64,

    /// Minimum value of `mu` after an accepted step
    pub mu_min: f64,
}

impl TrustRegion {
    /// Initial damping `tau * max(diag(JᵗJ))`.
    pub fn initial_mu(tau: f64, jtj: &Array2<f64>) -> f64 {
        tau * jtj.diag().iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    /// Start the damping from the Gauss-Newton matrix at the initial point.
    ///
    /// Returns `None` when the initial damping falls below machine epsilon,
    /// i.e. the Jacobian is numerically zero.
    pub fn initialize(tau: f64, jtj: &Array2<f64>) -> Option<Self> {
        let mu = Self::initial_mu(tau, jtj);
        if mu < f64::EPSILON {
            return None;
        }
        Some(Self {
            mu,
            nu: NU_INIT,
            mu_min: MU_MIN,
        })
    }

    /// Diagonal of the damping matrix `D` for the current `mu`.
    pub fn damping_diagonal(&self, style: DampingMatrix, jtj: &Array2<f64>) -> Array1<f64> {
        match style {
            DampingMatrix::Identity => Array1::from_elem(jtj.nrows(), self.mu),
            DampingMatrix::JtJDiagonal => jtj.diag().mapv(|v| self.mu * v),
        }
    }

    /// Gain ratio: actual decrease over the decrease predicted by the model.
    pub fn gain_ratio(cost: f64, new_cost: f64, rho_denom: f64) -> f64 {
        (cost - new_cost) / rho_denom
    }

    /// Update after an accepted step with gain ratio `rho`.
    pub fn accept(&mut self, rho: f64) {
        let factor = (1.0 / 3.0_f64).max(1.0 - (2.0 * rho - 1.0).powi(3));
        self.mu = self.mu_min.max(self.mu * factor);
        self.nu = NU_INIT;
    }

    /// Update after a rejected step.
    pub fn reject(&mut self) {
        self.mu *= self.nu;
        self.nu *= 2.0;
    }
}
