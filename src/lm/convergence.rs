//! Termination policy for the Levenberg-Marquardt algorithm.
//!
//! This module defines the criteria used to decide, after each step attempt,
//! whether the iteration should continue or stop, and why.

use std::fmt;

use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Why the algorithm stopped, or `Continue` while it is still running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    /// The algorithm is still running.
    Continue,

    /// The iteration cap was reached without any other criterion firing.
    MaxIterationsReached,

    /// The Jacobian vanished at the start, or the gain-ratio denominator
    /// dropped below machine precision.
    LocalMinimum,

    /// An accepted step moved every parameter by less than the tolerance.
    ParameterConverged,

    /// An accepted step decreased the objective by less than the tolerance.
    ObjectiveConverged,
}

impl StopReason {
    /// Returns true for every reason except `Continue`.
    pub fn is_terminated(&self) -> bool {
        !matches!(self, StopReason::Continue)
    }

    /// Returns true if the optimization stopped on a convergence criterion.
    pub fn is_converged(&self) -> bool {
        matches!(
            self,
            StopReason::LocalMinimum
                | StopReason::ParameterConverged
                | StopReason::ObjectiveConverged
        )
    }

    /// Numeric exit code: 0 max iterations, 1 local minimum, 2 parameter
    /// change below tolerance, 3 objective change below tolerance.
    ///
    /// `Continue` has no exit code.
    pub fn exit_flag(&self) -> Option<u8> {
        match self {
            StopReason::Continue => None,
            StopReason::MaxIterationsReached => Some(0),
            StopReason::LocalMinimum => Some(1),
            StopReason::ParameterConverged => Some(2),
            StopReason::ObjectiveConverged => Some(3),
        }
    }

    /// Returns a description of the stop reason.
    pub fn description(&self) -> &'static str {
        match self {
            StopReason::Continue => "optimization is still running",
            StopReason::MaxIterationsReached => "maximum number of iterations reached",
            StopReason::LocalMinimum => "local minimum reached",
            StopReason::ParameterConverged => "change in 'x' less than 'tolX'",
            StopReason::ObjectiveConverged => "change in 'f' less than 'tolF'",
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Criteria for deciding when the iteration stops.
///
/// Both tolerances are absolute and per component: the configured `tol_x` and
/// `tol_f` divided by the number of parameters.
#[derive(Debug, Clone, Copy)]
pub struct ConvergenceCriteria {
    /// Tolerance on the largest parameter change.
    pub a_tol_x: f64,

    /// Tolerance on the objective decrease.
    pub a_tol_f: f64,
}

impl ConvergenceCriteria {
    /// Build the per-component criteria for a problem with `n` parameters.
    pub fn new(tol_x: f64, tol_f: f64, n: usize) -> Self {
        let n = n.max(1) as f64;
        Self {
            a_tol_x: tol_x / n,
            a_tol_f: tol_f / n,
        }
    }

    /// Decide whether to stop after a step attempt.
    ///
    /// Checks, in order: a degenerate quadratic model (`rho_denom` below
    /// machine epsilon), then for accepted steps (`rho > 0`) the objective
    /// decrease, then the largest parameter change. Rejected steps always
    /// continue.
    ///
    /// # Arguments
    ///
    /// * `rho_denom` - Gain-ratio denominator of the step
    /// * `rho` - Gain ratio of the step
    /// * `cost_old` - Objective before the last accepted step
    /// * `cost` - Current objective
    /// * `params_old` - Parameters before the last accepted step
    /// * `params` - Current parameters
    pub fn check(
        &self,
        rho_denom: f64,
        rho: f64,
        cost_old: f64,
        cost: f64,
        params_old: &Array1<f64>,
        params: &Array1<f64>,
    ) -> StopReason {
        if rho_denom < f64::EPSILON {
            return StopReason::LocalMinimum;
        }
        if rho > 0.0 {
            if cost_old - cost < self.a_tol_f {
                return StopReason::ObjectiveConverged;
            }
            let max_change = params_old
                .iter()
                .zip(params.iter())
                .map(|(a, b)| (a - b).abs())
                .fold(0.0, f64::max);
            if max_change < self.a_tol_x {
                return StopReason::ParameterConverged;
            }
        }
        StopReason::Continue
    }
}
