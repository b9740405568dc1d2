//! Utility functions and helpers for the nlls-rs library.

pub mod check;
pub mod finite_difference;
pub mod matrix_convert;
pub mod random;

// Re-export commonly used utilities
pub use check::{
    check_jacobian, check_near, check_near_abs, check_near_rel, JacobianCheck,
    JacobianCheckReport,
};
pub use matrix_convert::{
    nalgebra_to_ndarray, nalgebra_vec_to_ndarray, ndarray_to_nalgebra, ndarray_vec_to_nalgebra,
};
pub use random::{randn_matrix, randn_vector};
