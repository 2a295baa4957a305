//! Gradient checking library
//!
//! This library verifies that an analytically computed gradient (for example
//! from a hand-written backpropagation routine) matches the true gradient of
//! a scalar cost with respect to a collection of named parameter tensors.
//!
//! # Modules
//!
//! - `tensor`: Row-major `f64` tensor storage
//! - `params`: Named parameter and gradient collections, iterated in sorted key order
//! - `numerical`: Central-difference numerical gradient
//! - `flatten`: Canonical flattening of a collection into one vector
//! - `compare`: Relative-error comparison and pass/fail reporting
//! - `checker`: End-to-end check driven by a configuration
//! - `config`: JSON configuration loading
//! - `utils`: Shared utilities (RNG)

pub mod checker;
pub mod compare;
pub mod config;
pub mod error;
pub mod flatten;
pub mod numerical;
pub mod params;
pub mod tensor;
pub mod utils;

pub use checker::GradientChecker;
pub use compare::{
    check_gradients, compare_gradients, compare_gradients_to, largest_discrepancies, Discrepancy,
    GradientReport, Verdict, DEFAULT_TOLERANCE,
};
pub use config::{load_config, GradCheckConfig};
pub use error::{GradCheckError, Result};
pub use flatten::to_vector;
pub use numerical::{compute_numerical_gradient, try_compute_numerical_gradient, DEFAULT_EPSILON};
pub use params::{GradientSet, ParameterSet};
pub use tensor::Tensor;
