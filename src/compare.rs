//! Analytical vs numerical gradient comparison
//!
//! Both collections are flattened in canonical order and compared with the
//! normalised relative error
//!
//! ```text
//! ||a - n|| / (||a|| + ||n||)
//! ```
//!
//! under the Euclidean norm. A check passes when the error is strictly below
//! the tolerance.

use crate::error::{GradCheckError, Result};
use crate::flatten::{coordinate_labels, to_vector};
use crate::params::GradientSet;
use std::fmt;
use std::io::{self, Write};

/// Default pass threshold for the relative error.
pub const DEFAULT_TOLERANCE: f64 = 1e-7;

/// Outcome of a gradient check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    Fail,
}

impl Verdict {
    pub fn passed(self) -> bool {
        self == Verdict::Pass
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Pass => write!(f, "PASSED"),
            Verdict::Fail => write!(f, "FAILED"),
        }
    }
}

/// Result of comparing two gradient collections.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientReport {
    pub relative_error: f64,
    pub tolerance: f64,
    pub verdict: Verdict,
    /// Number of scalar gradient entries compared.
    pub num_scalars: usize,
}

impl GradientReport {
    pub fn passed(&self) -> bool {
        self.verdict.passed()
    }
}

impl fmt::Display for GradientReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let relation = if self.passed() { "<" } else { ">=" };
        write!(
            f,
            "Gradient check {}: relative error {:.6e} {} tolerance {:e}",
            self.verdict, self.relative_error, relation, self.tolerance
        )
    }
}

/// A single coordinate where the two gradients disagree.
#[derive(Debug, Clone, PartialEq)]
pub struct Discrepancy {
    pub key: String,
    pub index: Vec<usize>,
    pub analytical: f64,
    pub numerical: f64,
    pub abs_diff: f64,
}

impl fmt::Display for Discrepancy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{:?}: analytical={:.10}, numerical={:.10}, |diff|={:.3e}",
            self.key, self.index, self.analytical, self.numerical, self.abs_diff
        )
    }
}

/// Compare two gradient collections and print the verdict to stdout.
///
/// Returns the relative error whatever the verdict; use [`check_gradients`]
/// to get the full report without printing.
///
/// # Example
///
/// ```
/// use grad_check::{compare_gradients, ParameterSet, Tensor};
///
/// let grads = ParameterSet::new().with("W", Tensor::from_vec(vec![0.1, -0.2]));
/// let error = compare_gradients(&grads, &grads.clone(), 1e-7).unwrap();
/// assert_eq!(error, 0.0);
/// ```
pub fn compare_gradients(
    analytical: &GradientSet,
    numerical: &GradientSet,
    tolerance: f64,
) -> Result<f64> {
    compare_gradients_to(&mut io::stdout().lock(), analytical, numerical, tolerance)
}

/// Like [`compare_gradients`], writing the report line to `out`.
pub fn compare_gradients_to<W: Write>(
    out: &mut W,
    analytical: &GradientSet,
    numerical: &GradientSet,
    tolerance: f64,
) -> Result<f64> {
    let report = check_gradients(analytical, numerical, tolerance)?;
    writeln!(out, "{}", report)?;
    Ok(report.relative_error)
}

/// Compare two gradient collections without printing.
///
/// # Errors
///
/// * [`GradCheckError::InvalidTolerance`] unless `tolerance` is finite and positive
/// * [`GradCheckError::KeyMismatch`] if the key sets differ
/// * [`GradCheckError::ShapeMismatch`] if any key has differently shaped tensors
pub fn check_gradients(
    analytical: &GradientSet,
    numerical: &GradientSet,
    tolerance: f64,
) -> Result<GradientReport> {
    if !tolerance.is_finite() || tolerance <= 0.0 {
        return Err(GradCheckError::InvalidTolerance(tolerance));
    }
    ensure_compatible(analytical, numerical)?;

    let a = to_vector(analytical);
    let n = to_vector(numerical);
    let relative_error = relative_error(&a, &n);

    let verdict = if relative_error < tolerance {
        Verdict::Pass
    } else {
        Verdict::Fail
    };

    Ok(GradientReport {
        relative_error,
        tolerance,
        verdict,
        num_scalars: a.len(),
    })
}

/// Check that two gradient collections have the same keys and per-key shapes.
pub fn ensure_compatible(analytical: &GradientSet, numerical: &GradientSet) -> Result<()> {
    let missing_in_numerical: Vec<String> = analytical
        .keys()
        .filter(|k| !numerical.contains_key(k))
        .map(str::to_string)
        .collect();
    let missing_in_analytical: Vec<String> = numerical
        .keys()
        .filter(|k| !analytical.contains_key(k))
        .map(str::to_string)
        .collect();

    if !missing_in_numerical.is_empty() || !missing_in_analytical.is_empty() {
        return Err(GradCheckError::KeyMismatch {
            missing_in_analytical,
            missing_in_numerical,
        });
    }

    for ((key, a), (_, n)) in analytical.iter().zip(numerical.iter()) {
        if a.shape() != n.shape() {
            return Err(GradCheckError::ShapeMismatch {
                key: key.to_string(),
                analytical: a.shape().to_vec(),
                numerical: n.shape().to_vec(),
            });
        }
    }

    Ok(())
}

/// `||a - n|| / (||a|| + ||n||)`, defined as 0 when both vectors are zero.
///
/// Entries are divided by the largest magnitude across both vectors before
/// squaring, so gradients near the limits of `f64` neither underflow to a
/// zero error nor overflow to NaN.
///
/// # Panics
///
/// Panics if the slices have different lengths.
pub fn relative_error(a: &[f64], n: &[f64]) -> f64 {
    assert_eq!(a.len(), n.len(), "gradient vectors differ in length");

    let scale = a.iter().chain(n).fold(0.0_f64, |m, v| m.max(v.abs()));
    if scale == 0.0 {
        return 0.0;
    }

    let numerator = scaled_norm(a.iter().zip(n).map(|(x, y)| x / scale - y / scale));
    let denominator = scaled_norm(a.iter().map(|x| x / scale))
        + scaled_norm(n.iter().map(|y| y / scale));
    numerator / denominator
}

/// Coordinates with the largest absolute difference, largest first.
///
/// Useful after a failed check to see which parameter the backprop routine
/// gets wrong.
pub fn largest_discrepancies(
    analytical: &GradientSet,
    numerical: &GradientSet,
    count: usize,
) -> Result<Vec<Discrepancy>> {
    ensure_compatible(analytical, numerical)?;

    let mut all: Vec<Discrepancy> = coordinate_labels(analytical)
        .into_iter()
        .zip(to_vector(analytical))
        .zip(to_vector(numerical))
        .map(|(((key, index), a), n)| Discrepancy {
            key,
            index,
            analytical: a,
            numerical: n,
            abs_diff: (a - n).abs(),
        })
        .collect();

    all.sort_by(|x, y| y.abs_diff.total_cmp(&x.abs_diff));
    all.truncate(count);
    Ok(all)
}

fn scaled_norm(values: impl Iterator<Item = f64>) -> f64 {
    values.map(|v| v * v).sum::<f64>().sqrt()
}
