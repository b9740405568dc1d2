//! # nlls-rs
//!
//! `nlls-rs` solves nonlinear least-squares problems with the
//! Levenberg-Marquardt algorithm, optionally subject to box constraints.
//!
//! The library provides:
//! - A damped Gauss-Newton solver with Nielsen's damping update
//! - Per-component lower/upper bounds, where NaN means unconstrained
//! - An iteration table and final summary written through the `log` facade
//! - Numerical helpers for checking a hand-written Jacobian against finite
//!   differences
//!
//! ## Basic Usage
//!
//! ```
//! use ndarray::{array, Array1, Array2};
//! use nlls_rs::{Evaluation, LevenbergMarquardt, Problem, Result};
//!
//! // Fit y = a * x + b
//! struct Line {
//!     x: Array1<f64>,
//!     y: Array1<f64>,
//! }
//!
//! impl Problem for Line {
//!     fn evaluate(&self, p: &Array1<f64>, _want_jacobian: bool) -> Result<Evaluation> {
//!         let residuals = &self.x * p[0] + p[1] - &self.y;
//!         let mut jac = Array2::ones((self.x.len(), 2));
//!         jac.column_mut(0).assign(&self.x);
//!         Ok(Evaluation::new(residuals, jac))
//!     }
//! }
//!
//! let line = Line {
//!     x: array![0.0, 1.0, 2.0, 3.0],
//!     y: array![1.0, 3.0, 5.0, 7.0],
//! };
//! let result = LevenbergMarquardt::new()
//!     .minimize(&line, &array![0.0, 0.0])
//!     .unwrap();
//! assert!((result.params[0] - 2.0).abs() < 1e-3);
//! assert!((result.params[1] - 1.0).abs() < 1e-3);
//! ```

pub mod error;
pub mod lm;
pub mod problem;
pub mod utils;

// Re-exports for convenience
pub use error::{NllsError, Result};
pub use lm::{
    Algorithm, DampingMatrix, DisplayLevel, DisplaySink, IterationRecord, LevenbergMarquardt,
    LmConfig, LmResult, StopReason,
};
pub use problem::{Evaluation, Problem};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
