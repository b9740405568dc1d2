//! Configuration options for the Levenberg-Marquardt algorithm.
//!
//! This module defines the configuration options and parameter settings for the
//! Levenberg-Marquardt algorithm: algorithm choice, damping matrix style,
//! convergence tolerances, box constraints, and display verbosity.

use std::fmt;
use std::str::FromStr;

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use super::bounds::{nan_as_null, validate_bounds};
use crate::error::{NllsError, Result};

/// Optimization algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Algorithm {
    /// Levenberg-Marquardt with adaptive trust-region damping
    #[default]
    LevenbergMarquardt,
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Algorithm::LevenbergMarquardt => write!(f, "levenberg-marquardt"),
        }
    }
}

impl FromStr for Algorithm {
    type Err = NllsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lm" | "levenberg-marquardt" | "levenberg_marquardt" => {
                Ok(Algorithm::LevenbergMarquardt)
            }
            other => Err(NllsError::InvalidConfig(format!(
                "unknown algorithm '{}'",
                other
            ))),
        }
    }
}

/// How the damping term added to `JᵗJ` is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DampingMatrix {
    /// `μ·I`
    #[default]
    Identity,

    /// `μ·diag(JᵗJ)`, scale-invariant damping
    #[serde(rename = "jtj-diagonal")]
    JtJDiagonal,
}

/// Verbosity of the iteration table and final summary.
///
/// Levels are ordered: each level prints everything the lower ones do.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum DisplayLevel {
    /// Print nothing
    #[default]
    Off,

    /// Print the termination reason
    Final,

    /// Print the termination reason and final objective
    FinalDetailed,

    /// Print one row per iteration, plus the final summary
    Iter,

    /// Print rows with gain ratio, damping, and growth factor
    IterDetailed,
}

/// Configuration options for the Levenberg-Marquardt algorithm.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LmConfig {
    /// Optimization algorithm. Default: LevenbergMarquardt
    pub algorithm: Algorithm,

    /// Damping matrix style. Default: Identity
    pub damping: DampingMatrix,

    /// Initial damping scale; `μ0 = tau * max(diag(JᵗJ))`. Default: 1e-3
    pub tau: f64,

    /// Tolerance on the parameter step, divided by the number of parameters. Default: 1e-6
    pub tol_x: f64,

    /// Tolerance on the objective decrease, divided by the number of parameters. Default: 1e-6
    pub tol_f: f64,

    /// Maximum number of iterations. Default: 400
    pub max_iterations: usize,

    /// Lower bounds; empty means unconstrained, NaN entries are unconstrained
    #[serde(with = "nan_as_null")]
    pub lower_bound: Array1<f64>,

    /// Upper bounds; empty means unconstrained, NaN entries are unconstrained
    #[serde(with = "nan_as_null")]
    pub upper_bound: Array1<f64>,

    /// Display verbosity. Default: Off
    pub display: DisplayLevel,

    /// Whether to keep a per-iteration trace in the result. Default: false
    pub record_trace: bool,
}

impl Default for LmConfig {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::default(),
            damping: DampingMatrix::default(),
            tau: 1e-3,
            tol_x: 1e-6,
            tol_f: 1e-6,
            max_iterations: 400,
            lower_bound: Array1::zeros(0),
            upper_bound: Array1::zeros(0),
            display: DisplayLevel::default(),
            record_trace: false,
        }
    }
}

impl LmConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize the configuration to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check the configuration against a problem with `n` parameters.
    pub fn validate(&self, n: usize) -> Result<()> {
        if n == 0 {
            return Err(NllsError::InvalidConfig(
                "at least one parameter is required".to_string(),
            ));
        }
        if !(self.tau.is_finite() && self.tau > 0.0) {
            return Err(NllsError::InvalidConfig(format!(
                "tau must be positive and finite, got {}",
                self.tau
            )));
        }
        for (name, tol) in [("tol_x", self.tol_x), ("tol_f", self.tol_f)] {
            if !(tol.is_finite() && tol >= 0.0) {
                return Err(NllsError::InvalidConfig(format!(
                    "{} must be non-negative and finite, got {}",
                    name, tol
                )));
            }
        }
        validate_bounds(&self.lower_bound, &self.upper_bound, n)
    }
}
