//! Levenberg-Marquardt algorithm implementation.
//!
//! This module provides a box-constrained Levenberg-Marquardt solver for
//! nonlinear least-squares problems. The solver loop lives in [`algorithm`];
//! the other submodules hold its building blocks.

pub mod algorithm;
pub mod bounds;
pub mod config;
pub mod convergence;
pub mod display;
pub mod step;
pub mod trust_region;

// Re-export key types
pub use algorithm::{IterationRecord, LevenbergMarquardt, LmResult};
pub use bounds::{clip_to_bounds, is_within_bounds, validate_bounds};
pub use config::{Algorithm, DampingMatrix, DisplayLevel, LmConfig};
pub use convergence::{ConvergenceCriteria, StopReason};
pub use display::{DisplaySink, LogSink};
pub use step::{LmStep, StepResult};
pub use trust_region::TrustRegion;
