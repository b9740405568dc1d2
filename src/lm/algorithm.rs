//! Implementation of the Levenberg-Marquardt algorithm.
//!
//! This module contains the solver loop: it evaluates the problem, solves the
//! damped normal equations for a step, accepts or rejects the step by its gain
//! ratio, adapts the damping, and stops on the first criterion that fires.

use std::fmt;

use log::{debug, trace};
use ndarray::{Array1, Array2};

use crate::error::{NllsError, Result};
use crate::problem::Problem;

use super::bounds::clip_to_bounds;
use super::config::{Algorithm, DampingMatrix, DisplayLevel, LmConfig};
use super::convergence::{ConvergenceCriteria, StopReason};
use super::display::{DisplaySink, IterationDisplay, LogSink, Summary};
use super::step::{LmStep, StepResult};
use super::trust_region::TrustRegion;

/// State of the solver after one step attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IterationRecord {
    /// Iteration number, starting at 1
    pub iteration: usize,

    /// Objective after the accept/reject decision
    pub cost: f64,

    /// Gain ratio of the attempted step
    pub rho: f64,

    /// Damping parameter after the update
    pub mu: f64,

    /// Growth factor after the update
    pub nu: f64,

    /// Whether the step was accepted
    pub accepted: bool,
}

/// Result of the Levenberg-Marquardt optimization.
#[derive(Debug, Clone)]
pub struct LmResult {
    /// Optimized parameter values
    pub params: Array1<f64>,

    /// Residuals at the solution
    pub residuals: Array1<f64>,

    /// Sum of squared residuals at the solution
    pub cost: f64,

    /// Number of step attempts, accepted and rejected
    pub iterations: usize,

    /// Number of problem evaluations
    pub func_evals: usize,

    /// Why the solver stopped
    pub stop_reason: StopReason,

    /// Per-iteration trace (if requested)
    pub trace: Option<Vec<IterationRecord>>,
}

impl LmResult {
    /// Whether the solver stopped on a convergence criterion rather than the
    /// iteration cap.
    pub fn success(&self) -> bool {
        self.stop_reason.is_converged()
    }
}

impl fmt::Display for LmResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Optimization Result:")?;
        writeln!(f, "  Success: {}", self.success())?;
        writeln!(f, "  Stop reason: {}", self.stop_reason)?;
        writeln!(f, "  Cost: {:.6e}", self.cost)?;
        writeln!(f, "  Iterations: {}", self.iterations)?;
        writeln!(f, "  Function evaluations: {}", self.func_evals)?;
        writeln!(f, "  Parameters: {}", self.params)?;
        Ok(())
    }
}

/// The Levenberg-Marquardt optimizer.
#[derive(Debug, Clone, Default)]
pub struct LevenbergMarquardt {
    /// Configuration options
    config: LmConfig,
}

impl LevenbergMarquardt {
    /// Create a new Levenberg-Marquardt optimizer with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new Levenberg-Marquardt optimizer with the given configuration.
    pub fn with_config(config: LmConfig) -> Self {
        Self { config }
    }

    /// The configuration used by `minimize`.
    pub fn config(&self) -> &LmConfig {
        &self.config
    }

    /// Set the maximum number of iterations.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.config.max_iterations = max_iterations;
        self
    }

    /// Set the tolerance on the parameter step.
    pub fn with_tol_x(mut self, tol_x: f64) -> Self {
        self.config.tol_x = tol_x;
        self
    }

    /// Set the tolerance on the objective decrease.
    pub fn with_tol_f(mut self, tol_f: f64) -> Self {
        self.config.tol_f = tol_f;
        self
    }

    /// Set the initial damping scale factor.
    pub fn with_tau(mut self, tau: f64) -> Self {
        self.config.tau = tau;
        self
    }

    /// Set the damping matrix style.
    pub fn with_damping(mut self, damping: DampingMatrix) -> Self {
        self.config.damping = damping;
        self
    }

    /// Set the lower bounds. NaN entries leave a component unconstrained.
    pub fn with_lower_bound(mut self, lower: Array1<f64>) -> Self {
        self.config.lower_bound = lower;
        self
    }

    /// Set the upper bounds. NaN entries leave a component unconstrained.
    pub fn with_upper_bound(mut self, upper: Array1<f64>) -> Self {
        self.config.upper_bound = upper;
        self
    }

    /// Set the display level.
    pub fn with_display(mut self, display: DisplayLevel) -> Self {
        self.config.display = display;
        self
    }

    /// Set whether to record a per-iteration trace in the result.
    pub fn with_trace(mut self, record_trace: bool) -> Self {
        self.config.record_trace = record_trace;
        self
    }

    /// Minimize the sum of squared residuals for the given problem.
    ///
    /// Display output, if enabled, goes to the `log` facade.
    ///
    /// # Arguments
    ///
    /// * `problem` - The problem to solve
    /// * `x0` - Initial guess for the parameter values
    ///
    /// # Errors
    ///
    /// * `NllsError::InvalidConfig` if the configuration does not fit the problem
    /// * `NllsError::DimensionMismatch` / `NllsError::FunctionEvaluation` if the
    ///   problem breaks its contract
    /// * `NllsError::LinearAlgebraError` if the damped system cannot be factored
    /// * any error returned by the problem itself
    pub fn minimize<P: Problem + ?Sized>(&self, problem: &P, x0: &Array1<f64>) -> Result<LmResult> {
        self.minimize_with_sink(problem, x0, &mut LogSink)
    }

    /// Same as [`minimize`](Self::minimize), writing display output to `sink`.
    pub fn minimize_with_sink<P: Problem + ?Sized>(
        &self,
        problem: &P,
        x0: &Array1<f64>,
        sink: &mut dyn DisplaySink,
    ) -> Result<LmResult> {
        self.config.validate(x0.len())?;
        match self.config.algorithm {
            Algorithm::LevenbergMarquardt => self.minimize_lm(problem, x0, sink),
        }
    }

    fn minimize_lm<P: Problem + ?Sized>(
        &self,
        problem: &P,
        x0: &Array1<f64>,
        sink: &mut dyn DisplaySink,
    ) -> Result<LmResult> {
        let config = &self.config;
        let n = x0.len();
        let mut display = IterationDisplay::new(config.display, sink);

        let mut params = x0.clone();
        let initial = problem.evaluate(&params, true)?;
        let mut func_evals = 1;
        let m = initial.residuals.len();
        let jacobian = checked_jacobian(initial.jacobian, m, n)?;
        let mut residuals = initial.residuals;
        let mut cost = residuals.dot(&residuals);
        let (mut jtj, mut jtf) = normal_equations(&jacobian, &residuals);

        let mut trace = config.record_trace.then(Vec::new);

        let mut region = match TrustRegion::initialize(config.tau, &jtj) {
            Some(region) => region,
            None => {
                debug!("Jacobian vanishes at the initial point, stopping at x0");
                let result = LmResult {
                    params,
                    residuals,
                    cost,
                    iterations: 0,
                    func_evals,
                    stop_reason: StopReason::LocalMinimum,
                    trace,
                };
                display.summary(&self.summary(&result));
                return Ok(result);
            }
        };
        debug!(
            "starting LM with {} parameters, {} residuals, mu = {:e}",
            n, m, region.mu
        );

        let criteria = ConvergenceCriteria::new(config.tol_x, config.tol_f, n);
        // Needed by the first stop check in case x0 is already a minimum
        let mut params_old = params.clone();
        let mut cost_old = cost;

        display.header();
        display.row(0, cost, 0.0, region.mu, region.nu);

        let mut stop_reason = StopReason::MaxIterationsReached;
        let mut iterations = config.max_iterations;

        for iter in 0..config.max_iterations {
            let damping = region.damping_diagonal(config.damping, &jtj);
            let StepResult { step, rho_denom } = LmStep::calculate_step(&jtj, &jtf, &damping)?;

            // Bounds are applied to the trial point only; rho_denom keeps the
            // unclipped step
            let mut trial_params = &params + &step;
            clip_to_bounds(&mut trial_params, &config.lower_bound, &config.upper_bound);

            let trial = problem.evaluate(&trial_params, true)?;
            func_evals += 1;
            if trial.residuals.len() != m {
                return Err(NllsError::DimensionMismatch(format!(
                    "expected {} residuals, got {} at iteration {}",
                    m,
                    trial.residuals.len(),
                    iter + 1
                )));
            }
            let trial_cost = trial.cost();
            let rho = TrustRegion::gain_ratio(cost, trial_cost, rho_denom);

            let accepted = rho > 0.0;
            if accepted {
                let trial_jacobian = checked_jacobian(trial.jacobian, m, n)?;
                (jtj, jtf) = normal_equations(&trial_jacobian, &trial.residuals);
                residuals = trial.residuals;
                params_old = std::mem::replace(&mut params, trial_params);
                cost_old = cost;
                cost = trial_cost;
                region.accept(rho);
            } else {
                trace!(
                    "step {} rejected: rho = {:e}, trial cost = {:e}",
                    iter + 1,
                    rho,
                    trial_cost
                );
                region.reject();
            }

            display.row(iter + 1, cost, rho, region.mu, region.nu);
            if let Some(records) = trace.as_mut() {
                records.push(IterationRecord {
                    iteration: iter + 1,
                    cost,
                    rho,
                    mu: region.mu,
                    nu: region.nu,
                    accepted,
                });
            }

            let status = criteria.check(rho_denom, rho, cost_old, cost, &params_old, &params);
            if status.is_terminated() {
                stop_reason = status;
                iterations = iter + 1;
                break;
            }
        }

        let result = LmResult {
            params,
            residuals,
            cost,
            iterations,
            func_evals,
            stop_reason,
            trace,
        };
        display.summary(&self.summary(&result));
        Ok(result)
    }

    fn summary(&self, result: &LmResult) -> Summary {
        Summary {
            stop_reason: result.stop_reason,
            iterations: result.iterations,
            cost: result.cost,
            func_evals: result.func_evals,
            tol_x: self.config.tol_x,
            tol_f: self.config.tol_f,
        }
    }
}

/// `(JᵗJ, Jᵗf)` for the normal equations.
fn normal_equations(jacobian: &Array2<f64>, residuals: &Array1<f64>) -> (Array2<f64>, Array1<f64>) {
    let jt = jacobian.t();
    (jt.dot(jacobian), jt.dot(residuals))
}

/// Unwrap a requested Jacobian and check it is M×N.
fn checked_jacobian(jacobian: Option<Array2<f64>>, m: usize, n: usize) -> Result<Array2<f64>> {
    let jacobian = jacobian.ok_or_else(|| {
        NllsError::FunctionEvaluation("Jacobian requested but not returned".to_string())
    })?;
    if jacobian.dim() != (m, n) {
        return Err(NllsError::DimensionMismatch(format!(
            "expected a {}x{} Jacobian, got {}x{}",
            m,
            n,
            jacobian.nrows(),
            jacobian.ncols()
        )));
    }
    Ok(jacobian)
}
