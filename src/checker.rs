//! End-to-end gradient check
//!
//! [`GradientChecker`] ties the differentiator and the comparator together:
//! it computes the numerical gradient of a cost function, compares it with
//! the caller's analytical gradient, and prints the verdict (plus the worst
//! coordinates when the check fails).

use crate::compare::{check_gradients, largest_discrepancies, GradientReport};
use crate::config::GradCheckConfig;
use crate::error::{BoxedCostError, Result};
use crate::numerical::{evaluations_required, try_compute_numerical_gradient};
use crate::params::{GradientSet, ParameterSet};
use std::convert::Infallible;

/// Runs gradient checks with a fixed configuration.
///
/// # Example
///
/// ```
/// use grad_check::{GradientChecker, ParameterSet, Tensor};
///
/// let mut params = ParameterSet::new().with("w", Tensor::from_vec(vec![1.0, -3.0]));
/// let analytical = ParameterSet::new().with("w", Tensor::from_vec(vec![2.0, -6.0]));
///
/// let cost = |_x: &(), _y: &(), p: &ParameterSet| {
///     (p["w"].as_slice().iter().map(|v| v * v).sum::<f64>(), ())
/// };
///
/// let report = GradientChecker::default()
///     .run(&mut params, cost, &(), &(), &analytical)
///     .unwrap();
/// assert!(report.relative_error < 1e-6);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct GradientChecker {
    config: GradCheckConfig,
}

impl GradientChecker {
    pub fn new(config: GradCheckConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GradCheckConfig {
        &self.config
    }

    /// Check `analytical` against the numerical gradient of `cost_fn`.
    pub fn run<X, Y, A, F>(
        &self,
        params: &mut ParameterSet,
        mut cost_fn: F,
        x: &X,
        y: &Y,
        analytical: &GradientSet,
    ) -> Result<GradientReport>
    where
        X: ?Sized,
        Y: ?Sized,
        F: FnMut(&X, &Y, &ParameterSet) -> (f64, A),
    {
        self.try_run(
            params,
            |x, y, p| Ok::<_, Infallible>(cost_fn(x, y, p)),
            x,
            y,
            analytical,
        )
    }

    /// Like [`run`](Self::run), for a cost function that can fail.
    pub fn try_run<X, Y, A, E, F>(
        &self,
        params: &mut ParameterSet,
        cost_fn: F,
        x: &X,
        y: &Y,
        analytical: &GradientSet,
    ) -> Result<GradientReport>
    where
        X: ?Sized,
        Y: ?Sized,
        F: FnMut(&X, &Y, &ParameterSet) -> std::result::Result<(f64, A), E>,
        E: Into<BoxedCostError>,
    {
        self.config.validate()?;
        println!(
            "Checking {} parameter entries across {} tensors ({} cost evaluations, epsilon {:e})",
            params.num_scalars(),
            params.len(),
            evaluations_required(params),
            self.config.epsilon
        );

        let numerical = try_compute_numerical_gradient(params, cost_fn, x, y, self.config.epsilon)?;
        let report = check_gradients(analytical, &numerical, self.config.tolerance)?;
        println!("{}", report);

        if !report.passed() && self.config.report_top > 0 {
            println!("Largest discrepancies:");
            for d in largest_discrepancies(analytical, &numerical, self.config.report_top)? {
                println!("  {}", d);
            }
        }

        Ok(report)
    }
}
