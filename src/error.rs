//! Error types for gradient checking
//!
//! Every failure mode of the differentiator, the comparator and the config
//! loader is a variant of [`GradCheckError`]. Nothing is downgraded to a
//! warning: a check that cannot be carried out is reported to the caller.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, GradCheckError>;

/// Boxed error returned by a fallible cost function.
pub type BoxedCostError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum GradCheckError {
    #[error("Tensor shape {shape:?} holds {expected} elements but data length is {len}")]
    TensorShape {
        shape: Vec<usize>,
        expected: usize,
        len: usize,
    },

    #[error("Parameter collection is empty")]
    EmptyParameters,

    #[error("Epsilon must be finite and positive, got {0}")]
    InvalidEpsilon(f64),

    #[error("Tolerance must be finite and positive, got {0}")]
    InvalidTolerance(f64),

    #[error("Unknown parameter '{0}'")]
    UnknownParameter(String),

    /// The two gradient collections do not name the same parameters.
    #[error(
        "Gradient key sets differ: missing in analytical {missing_in_analytical:?}, \
         missing in numerical {missing_in_numerical:?}"
    )]
    KeyMismatch {
        missing_in_analytical: Vec<String>,
        missing_in_numerical: Vec<String>,
    },

    #[error(
        "Gradient shape mismatch for '{key}': analytical {analytical:?}, numerical {numerical:?}"
    )]
    ShapeMismatch {
        key: String,
        analytical: Vec<usize>,
        numerical: Vec<usize>,
    },

    #[error(
        "Cost is not finite while perturbing '{key}' at {index:?}: \
         cost+ = {cost_plus}, cost- = {cost_minus}"
    )]
    NonFiniteCost {
        key: String,
        index: Vec<usize>,
        cost_plus: f64,
        cost_minus: f64,
    },

    #[error("Cost function failed while perturbing '{key}' at {index:?}: {source}")]
    CostFunction {
        key: String,
        index: Vec<usize>,
        #[source]
        source: BoxedCostError,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GradCheckError {
    /// True for errors raised by comparing two incompatible gradient collections.
    pub fn is_mismatch(&self) -> bool {
        matches!(
            self,
            GradCheckError::KeyMismatch { .. } | GradCheckError::ShapeMismatch { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_mismatch_message() {
        let err = GradCheckError::ShapeMismatch {
            key: "W1".to_string(),
            analytical: vec![2, 3],
            numerical: vec![3, 2],
        };
        assert_eq!(
            err.to_string(),
            "Gradient shape mismatch for 'W1': analytical [2, 3], numerical [3, 2]"
        );
        assert!(err.is_mismatch());
    }

    #[test]
    fn test_cost_function_error_keeps_source() {
        use std::error::Error as _;

        let source: BoxedCostError = "forward pass exploded".into();
        let err = GradCheckError::CostFunction {
            key: "b1".to_string(),
            index: vec![0],
            source,
        };
        assert!(!err.is_mismatch());
        assert_eq!(
            err.source().map(|s| s.to_string()),
            Some("forward pass exploded".to_string())
        );
    }
}
