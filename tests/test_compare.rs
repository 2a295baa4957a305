//! Tests for flattening and gradient comparison
//!
//! This file tests:
//! - Canonical flattening order (sorted keys, row-major tensors)
//! - Relative error and PASS/FAIL verdicts
//! - The all-zero degenerate case
//! - Explicit key and shape mismatch errors
//! - Discrepancy reporting

use approx::assert_relative_eq;
use grad_check::flatten::coordinate_labels;
use grad_check::{
    check_gradients, compare_gradients, compare_gradients_to, largest_discrepancies, to_vector,
    GradCheckError, GradientSet, Tensor, Verdict, DEFAULT_TOLERANCE,
};

fn small_gradients() -> GradientSet {
    GradientSet::new()
        .with("W1", Tensor::from_rows(&[vec![1e-3, -2e-3], vec![5e-4, 3e-3]]).unwrap())
        .with("b1", Tensor::from_vec(vec![1e-4, -1e-4]))
        .with("W2", Tensor::from_rows(&[vec![2e-3], vec![-7e-4]]).unwrap())
        .with("b2", Tensor::from_vec(vec![4e-4]))
}

// ============================================================================
// Flatten Tests
// ============================================================================

mod flatten_tests {
    use super::*;

    #[test]
    fn test_insertion_order_does_not_matter() {
        let mut first = GradientSet::new();
        first.insert("b", Tensor::from_vec(vec![5.0]));
        first.insert("a", Tensor::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap());

        let mut second = GradientSet::new();
        second.insert("a", Tensor::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap());
        second.insert("b", Tensor::from_vec(vec![5.0]));

        assert_eq!(to_vector(&first), vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(to_vector(&first), to_vector(&second));
        assert_eq!(coordinate_labels(&first), coordinate_labels(&second));
    }

    #[test]
    fn test_uppercase_keys_sort_first() {
        let set = GradientSet::new()
            .with("b1", Tensor::scalar(3.0))
            .with("W1", Tensor::scalar(1.0))
            .with("W2", Tensor::scalar(2.0));

        assert_eq!(to_vector(&set), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_length_matches_scalar_count() {
        let grads = small_gradients();
        assert_eq!(to_vector(&grads).len(), grads.num_scalars());
        assert_eq!(to_vector(&grads).len(), 9);
    }
}

// ============================================================================
// Relative Error Tests
// ============================================================================

mod relative_error_tests {
    use super::*;

    #[test]
    fn test_identical_gradients_pass_with_zero_error() {
        let grads = small_gradients();
        for tolerance in [1e-12, 1e-7, 1.0] {
            let report = check_gradients(&grads, &grads.clone(), tolerance).unwrap();
            assert_eq!(report.relative_error, 0.0);
            assert_eq!(report.verdict, Verdict::Pass);
        }
    }

    #[test]
    fn test_one_large_perturbation_fails() {
        let analytical = small_gradients();
        let mut numerical = analytical.clone();
        numerical.get_mut("b1").unwrap().as_mut_slice()[1] += 1.0;

        let report = check_gradients(&analytical, &numerical, DEFAULT_TOLERANCE).unwrap();
        assert!(report.relative_error > 1e-7);
        assert_eq!(report.verdict, Verdict::Fail);
        assert!(!report.passed());
    }

    #[test]
    fn test_known_value() {
        // a = [3, 0], n = [0, 4]: ||a - n|| = 5, ||a|| + ||n|| = 7
        let a = GradientSet::new().with("g", Tensor::from_vec(vec![3.0, 0.0]));
        let n = GradientSet::new().with("g", Tensor::from_vec(vec![0.0, 4.0]));

        let err = compare_gradients(&a, &n, DEFAULT_TOLERANCE).unwrap();
        assert_relative_eq!(err, 5.0 / 7.0, epsilon = 1e-12);
    }

    #[test]
    fn test_error_is_returned_on_failure() {
        let a = GradientSet::new().with("g", Tensor::from_vec(vec![1.0]));
        let n = GradientSet::new().with("g", Tensor::from_vec(vec![2.0]));

        let err = compare_gradients(&a, &n, 1e-7).unwrap();
        assert_relative_eq!(err, 1.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_error_equal_to_tolerance_fails() {
        let a = GradientSet::new().with("g", Tensor::from_vec(vec![1.0]));
        let n = GradientSet::new().with("g", Tensor::from_vec(vec![3.0]));

        // ||a - n|| / (||a|| + ||n||) = 2 / 4
        let error = check_gradients(&a, &n, 1.0).unwrap().relative_error;
        assert_relative_eq!(error, 0.5, epsilon = 1e-12);

        let report = check_gradients(&a, &n, error).unwrap();
        assert_eq!(report.relative_error, error);
        assert_eq!(report.verdict, Verdict::Fail);
    }

    #[test]
    fn test_symmetric() {
        let a = small_gradients();
        let mut n = a.clone();
        n.get_mut("W1").unwrap().as_mut_slice()[0] = 0.02;

        let ab = check_gradients(&a, &n, 1e-7).unwrap().relative_error;
        let ba = check_gradients(&n, &a, 1e-7).unwrap().relative_error;
        assert_relative_eq!(ab, ba);
    }

    #[test]
    fn test_all_zero_gradients_pass() {
        let zeros = small_gradients().zeros_like();
        let report = check_gradients(&zeros, &zeros.clone(), DEFAULT_TOLERANCE).unwrap();

        assert_eq!(report.relative_error, 0.0);
        assert!(report.passed());
        assert_eq!(report.num_scalars, 9);
    }

    #[test]
    fn test_scale_does_not_change_the_verdict() {
        // a = [1, -1], n = [1, 0] at scale s has error 1 / (sqrt(2) + 1) for any s.
        for scale in [1e-200, 1e-150, 1.0, 1e150, 1e200] {
            let a = GradientSet::new().with("W", Tensor::from_vec(vec![scale, -scale]));
            let n = GradientSet::new().with("W", Tensor::from_vec(vec![scale, 0.0]));

            let report = check_gradients(&a, &n, DEFAULT_TOLERANCE).unwrap();
            assert!(report.relative_error.is_finite(), "scale {}", scale);
            assert_relative_eq!(
                report.relative_error,
                1.0 / (2.0_f64.sqrt() + 1.0),
                max_relative = 1e-12
            );
            assert_eq!(report.verdict, Verdict::Fail);
        }
    }

    #[test]
    fn test_tiny_differing_gradients_fail() {
        let a = GradientSet::new().with("W", Tensor::from_vec(vec![1e-200]));
        let n = GradientSet::new().with("W", Tensor::from_vec(vec![2e-200]));

        let report = check_gradients(&a, &n, DEFAULT_TOLERANCE).unwrap();
        assert_relative_eq!(report.relative_error, 1.0 / 3.0, max_relative = 1e-12);
        assert!(!report.passed());
    }

    #[test]
    fn test_invalid_tolerance_rejected() {
        let grads = small_gradients();
        for tolerance in [0.0, -1e-7, f64::NAN] {
            let err = check_gradients(&grads, &grads, tolerance).unwrap_err();
            assert!(matches!(err, GradCheckError::InvalidTolerance(_)));
        }
    }

    #[test]
    fn test_report_format_is_stable() {
        let a = GradientSet::new().with("g", Tensor::from_vec(vec![1.0]));
        let n = GradientSet::new().with("g", Tensor::from_vec(vec![2.0]));

        let report = check_gradients(&a, &n, 1e-7).unwrap();
        assert_eq!(
            report.to_string(),
            "Gradient check FAILED: relative error 3.333333e-1 >= tolerance 1e-7"
        );

        let report = check_gradients(&a, &a, 1e-7).unwrap();
        assert_eq!(
            report.to_string(),
            "Gradient check PASSED: relative error 0.000000e0 < tolerance 1e-7"
        );
    }

    #[test]
    fn test_compare_gradients_prints_report() {
        let a = GradientSet::new().with("g", Tensor::from_vec(vec![1.0]));
        let n = GradientSet::new().with("g", Tensor::from_vec(vec![2.0]));
        let mut out = Vec::new();

        let error = compare_gradients_to(&mut out, &a, &n, 1e-7).unwrap();

        assert_relative_eq!(error, 1.0 / 3.0, max_relative = 1e-12);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Gradient check FAILED: relative error 3.333333e-1 >= tolerance 1e-7\n"
        );
    }

    #[test]
    fn test_nothing_printed_on_mismatch() {
        let a = GradientSet::new().with("g", Tensor::from_vec(vec![1.0]));
        let n = GradientSet::new().with("h", Tensor::from_vec(vec![1.0]));
        let mut out = Vec::new();

        assert!(compare_gradients_to(&mut out, &a, &n, 1e-7).is_err());
        assert!(out.is_empty());
    }
}

// ============================================================================
// Mismatch Tests
// ============================================================================

mod mismatch_tests {
    use super::*;

    #[test]
    fn test_missing_key_is_an_error() {
        let analytical = small_gradients();
        let mut numerical = GradientSet::new();
        for (key, tensor) in analytical.iter().filter(|(k, _)| *k != "b2") {
            numerical.insert(key, tensor.clone());
        }

        let err = compare_gradients(&analytical, &numerical, DEFAULT_TOLERANCE).unwrap_err();
        match err {
            GradCheckError::KeyMismatch {
                missing_in_analytical,
                missing_in_numerical,
            } => {
                assert!(missing_in_analytical.is_empty());
                assert_eq!(missing_in_numerical, vec!["b2".to_string()]);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_shape_mismatch_with_same_length_is_an_error() {
        // Same number of scalars, so a naive flatten would silently "succeed".
        let a = GradientSet::new().with("W", Tensor::zeros(&[2, 3]));
        let n = GradientSet::new().with("W", Tensor::zeros(&[3, 2]));

        let err = check_gradients(&a, &n, DEFAULT_TOLERANCE).unwrap_err();
        match err {
            GradCheckError::ShapeMismatch {
                key,
                analytical,
                numerical,
            } => {
                assert_eq!(key, "W");
                assert_eq!(analytical, vec![2, 3]);
                assert_eq!(numerical, vec![3, 2]);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_mismatch_errors_are_flagged() {
        let a = GradientSet::new().with("W", Tensor::zeros(&[2]));
        let n = GradientSet::new().with("V", Tensor::zeros(&[2]));
        assert!(check_gradients(&a, &n, 1e-7).unwrap_err().is_mismatch());
    }
}

// ============================================================================
// Discrepancy Tests
// ============================================================================

mod discrepancy_tests {
    use super::*;

    #[test]
    fn test_largest_discrepancy_locates_perturbed_entry() {
        let analytical = small_gradients();
        let mut numerical = analytical.clone();
        numerical.get_mut("W1").unwrap().as_mut_slice()[3] += 0.5;

        let top = largest_discrepancies(&analytical, &numerical, 3).unwrap();
        assert_eq!(top.len(), 3);
        assert_eq!(top[0].key, "W1");
        assert_eq!(top[0].index, vec![1, 1]);
        assert_relative_eq!(top[0].abs_diff, 0.5, epsilon = 1e-12);
        assert_eq!(top[1].abs_diff, 0.0);
    }

    #[test]
    fn test_count_larger_than_entries() {
        let grads = small_gradients();
        let top = largest_discrepancies(&grads, &grads, 100).unwrap();
        assert_eq!(top.len(), 9);
    }

    #[test]
    fn test_discrepancy_display() {
        let a = GradientSet::new().with("b", Tensor::from_vec(vec![0.25]));
        let n = GradientSet::new().with("b", Tensor::from_vec(vec![0.5]));

        let top = largest_discrepancies(&a, &n, 1).unwrap();
        assert_eq!(
            top[0].to_string(),
            "b[0]: analytical=0.2500000000, numerical=0.5000000000, |diff|=2.500e-1"
        );
    }
}
